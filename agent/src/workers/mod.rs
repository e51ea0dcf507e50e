//! Background workers

pub mod events;
pub mod poller;
