pub mod config;
pub mod dates;
pub mod error;
pub mod types;

pub use config::{Config, RunConfig};
pub use error::ChronicleError;
pub use types::*;
