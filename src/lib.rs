pub mod actuator;
pub mod app;
pub mod binding_table;
pub mod capture;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod frontend;
pub mod hotkey;
pub mod input;
pub mod logging;
pub mod marker;
pub mod paths;
pub mod persistence;
pub mod service;
pub mod style;
