pub mod metrics;
pub mod router;
pub mod types;

pub use metrics::{RouterMetrics, RouterMetricsSnapshot};
pub use router::{CommandRouter, RouterConfig, RouterHandle};
pub use types::DispatchOutcome;
