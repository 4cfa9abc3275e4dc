pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod store;

#[cfg(test)]
pub mod testing;
