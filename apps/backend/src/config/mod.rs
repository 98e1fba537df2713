pub mod db;
pub mod settings;

pub use settings::Settings;
