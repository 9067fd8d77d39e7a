pub mod app;
pub mod config;
pub mod error;
pub mod gql;
pub mod seed;
pub mod state;

pub use state::AppState;
