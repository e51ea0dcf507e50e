//! Local HTTP API exposing entity states and user actions

pub mod handlers;
pub mod serve;
