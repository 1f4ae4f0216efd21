pub mod config;
pub mod error;
pub mod geo;
pub mod handlers;
pub mod middleware;
pub mod rate_limiter;
pub mod response;
pub mod server;

pub use config::Config;
pub use error::ApiError;
pub use geo::{LocationRecord, RecordStore, Resolver};
pub use rate_limiter::RateLimiter;
pub use server::{create_app, Server};
