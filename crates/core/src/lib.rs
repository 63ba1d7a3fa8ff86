pub mod config;
pub mod error;
pub mod model;
pub mod stats;
pub mod time;

pub use error::{Result, WormError};
