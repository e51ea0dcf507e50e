//! Domain models shared by the client, coordinators and entities

pub mod mode;
pub mod pending;
pub mod status;
