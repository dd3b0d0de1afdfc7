pub mod config;
pub mod error;
pub mod message;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
