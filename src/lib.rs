pub mod aggregate;
pub mod args;
pub mod commands;
mod config;
mod error;
pub mod load;
pub mod model;
pub mod present;
pub mod server;
pub mod state;
mod utils;


pub use config::Config;
pub use error::Error;
pub use error::LoadError;
pub use error::Result;
