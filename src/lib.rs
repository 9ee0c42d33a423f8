pub mod args;
mod backup;
pub mod commands;
mod config;
mod db;
mod error;
mod import;
mod mail;
mod model;
mod portfolio;
mod report;
#[cfg(test)]
mod test;
mod utils;

pub use config::Config;
pub use error::Error;
pub use error::Result;
pub use mail::Mode;
pub use model::Amount;
