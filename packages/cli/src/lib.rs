// ABOUTME: Server bootstrap for Slips
// ABOUTME: Configuration, logging setup, and the serve loop used by the slips-server binary

pub mod config;
pub mod server;
pub mod telemetry;

pub use config::{Config, ConfigError, LogFormat};
