// Public API for integration tests and potential library usage

pub mod api;
pub mod config;
pub mod game;
pub mod handlers;
pub mod llm;
pub mod persist;
pub mod protocol;
pub mod state;
pub mod types;
pub mod words;
