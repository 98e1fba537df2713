//! Repository functions over `ConnectionTrait`, returning domain models.

pub mod users;
