pub mod app;
pub mod cache;
pub mod config;
pub mod domain;
pub mod drive;
pub mod error;
pub mod labels;
pub mod manifest;
pub mod output;
pub mod render;
pub mod selection;
pub mod store;
pub mod tui;
