pub mod api;
pub mod config;
pub mod display;
pub mod models;
pub mod scanner;
pub mod utils;
pub mod views;
