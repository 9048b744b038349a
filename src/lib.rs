pub mod config;
pub mod error;
pub mod update;

pub use config::Config;
pub use error::{Error, ErrorCategory, Result};
