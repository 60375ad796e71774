mod admin_routes;
pub mod config;
pub mod envelope;
mod favorites_routes;
mod http_layers;
pub mod metrics;
pub mod server;
pub(self) mod session;
pub mod state;
mod tools_routes;

pub use config::ServerConfig;
pub use envelope::{ApiError, RequestContext, ResponseEnvelope, REQUEST_ID_HEADER};
pub use http_layers::*;
pub use server::{make_app, run_server, HealthStatus};
pub use session::{COOKIE_CLIENT_ID_KEY, HEADER_CLIENT_ID_KEY};
pub use tools_routes::{CACHE_STATUS_HEADER, MAX_SUGGESTIONS, MIN_SUGGESTION_QUERY_GRAPHEMES};
