pub mod analysis;
pub mod config;
pub mod editor;
pub mod lang;
pub mod server;
pub mod telemetry;
