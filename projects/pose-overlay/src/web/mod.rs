pub mod api;
pub mod error;
pub mod server;
pub mod state;
