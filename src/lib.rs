pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod orders;
pub mod payment;
pub mod routes;
pub mod sms;
pub mod state;
pub mod store;

pub use routes::app;
pub use state::AppState;

#[cfg(test)]
pub mod testing;
