pub mod commands;
pub mod config;
pub mod context;
pub mod github;
pub mod sender;
pub mod server;
pub mod webhook;
