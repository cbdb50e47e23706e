pub mod app;
pub mod config;
pub mod db;
pub mod error;
#[cfg(test)]
mod memory;
pub mod posts;
pub mod security;
pub mod state;
pub mod users;
