pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod standings;
pub mod standings_export;
pub mod store;
pub mod uploads;
