pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod server;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;
