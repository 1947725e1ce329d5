//! Request and response bodies. These carry no database formats (IDs are hex
//! strings, times are RFC 3339).

pub mod join_request;
pub mod scoring;
pub mod settings;
pub mod team;
