pub mod command;
pub mod config;
pub mod control;
pub mod guard;
pub mod hal;
pub mod messages;
pub mod motor;
pub mod runtime;
pub mod sensor;
pub mod server;
