//! Device REST client

pub mod client;
pub mod device;
