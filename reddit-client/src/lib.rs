pub mod backend;
pub mod metrics;
pub mod orchestrator;
pub mod ranking;
pub mod rate_limiter;
pub mod service;
pub mod session;
pub mod transport;


pub use backend::{ArchivalBackend, Backend, LiveBackend};
pub use metrics::{ApiMetrics, MetricsCollector};
pub use orchestrator::{
    Admission, AttemptOutcome, BackendAttempt, FetchStep, HybridRouting, Orchestrator,
    RoutingPolicy, SearchOutcome, SearchStatus,
};
pub use rate_limiter::{RateLimitConfig, RateLimitStatus, RateLimiter};
pub use service::{SearchResponse, SearchService, ServiceStats};
pub use session::{RefineOptions, Session, SessionStore};
pub use transport::HttpTransport;
