pub mod api;
pub mod auth;
pub mod mongodb;
pub mod scoring;
pub mod settings;
pub mod team;
