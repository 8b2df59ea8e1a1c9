pub mod auth;
pub mod cli;
pub mod contract;
pub mod credentials;
pub mod data;
pub mod error;
pub mod firestore;
pub mod load_config;
pub mod report;
pub mod upload;

pub use cli::{run, run_with, Cli};
pub use contract::DocumentStore;
pub use error::SeedError;
