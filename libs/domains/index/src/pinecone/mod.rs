mod client;
mod config;

pub use client::{PineconeIndexHandle, PineconeStore};
pub use config::PineconeConfig;
