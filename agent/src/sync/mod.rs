//! Periodic refresh and shared device state

pub mod coordinator;
pub mod listeners;
pub mod source;
