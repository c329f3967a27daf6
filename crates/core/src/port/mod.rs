// Port Layer - Interfaces for external dependencies

pub mod metrics;
pub mod repository;
pub mod time_provider;

// Re-exports
pub use metrics::{InMemoryMetrics, Metrics, MetricsSnapshot, NoopMetrics};
pub use repository::{ArtistRepository, EventRepository, HealthCheck, LocationRepository};
pub use time_provider::{SystemTimeProvider, TimeProvider};
