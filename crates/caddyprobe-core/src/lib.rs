pub mod config;
pub mod env;
pub mod error;
pub mod types;

pub use config::ProbeConfig;
pub use env::ProbeEnv;
pub use error::{ConfigError, ConfigResult};
pub use types::*;
