pub mod cli;
pub mod config;
pub mod models;
pub mod scene;
pub mod socket;
pub mod store;
