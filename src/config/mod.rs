pub mod client;

pub use client::ClientConfig;
