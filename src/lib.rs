pub mod args;
pub mod chart;
pub mod classify;
pub mod commands;
mod config;
mod error;
pub mod model;
pub mod normalize;
pub mod store;
pub mod summary;
pub mod tracker;
mod utils;


pub use classify::Mode;
pub use config::{ClassifierSettings, Config, API_KEY_ENV};
pub use error::{Error, IndexError, Result, ValidationError};
pub use tracker::Tracker;
