pub mod config;
pub mod instance;
pub mod manager;
pub mod mode;
pub mod snapshot;
pub mod status;
