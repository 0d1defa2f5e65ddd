pub mod config;
pub mod error;
pub mod types;

pub use config::{BuildConfig, load_build_config};
pub use error::{Error, Result};
pub use types::*;
