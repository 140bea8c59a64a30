pub mod app;
pub mod client;
pub mod clock;
pub mod comments;
pub mod config;
pub mod db;
pub mod error;
pub mod menu;
pub mod ratings;
pub mod state;
