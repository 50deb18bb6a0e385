pub mod app;
pub mod config;
pub mod error;
pub mod event;
pub mod lifecycle;
pub mod navigation;
pub mod panel;
pub mod rules;
pub mod system;
pub mod ui;
pub mod variables;
