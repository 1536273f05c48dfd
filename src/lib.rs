pub mod broker;
pub mod config;
pub mod error;
pub mod instruments;
pub mod types;

pub use error::{KiteError, Result};
pub use types::*;
