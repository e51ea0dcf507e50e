//! Wattrix Agent Library
//!
//! Polls a Wattrix heating controller over its REST API, keeps the last known
//! state in shared coordinators and forwards mode changes back to the device.

pub mod app;
pub mod entities;
pub mod errors;
pub mod http;
pub mod logs;
pub mod models;
pub mod server;
pub mod storage;
pub mod sync;
pub mod utils;
pub mod workers;
