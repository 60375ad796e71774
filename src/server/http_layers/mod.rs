mod http_cache;
#[cfg(feature = "slowdown")]
mod random_slowdown;
mod request_id;
mod requests_logging;

pub use http_cache::{http_cache, CachePolicy};
#[cfg(feature = "slowdown")]
pub use random_slowdown::slowdown_request;
pub use request_id::assign_request_id;
pub use requests_logging::{log_requests, RequestsLoggingLevel};
