pub mod app;
pub mod braille;
pub mod chart;
pub mod client;
pub mod color;
pub mod config;
pub mod dashboard;
pub mod map;
pub mod orchestrator;
pub mod record;
pub mod session;
pub mod telemetry;
pub mod ui;
