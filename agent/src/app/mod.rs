//! Integration lifecycle: options, per-device context, setup and unload

pub mod config_flow;
pub mod options;
pub mod run;
pub mod state;
