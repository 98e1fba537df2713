#![allow(dead_code)]

pub mod app_builder;

pub use app_builder::{bearer_get, login, login_from, TestContext, API, TEST_SECRET};
