pub mod metrics;
pub mod security_headers;
pub mod tracing;

pub use self::metrics::{init_metrics, metrics_middleware, render_metrics};
pub use self::security_headers::security_headers_middleware;
pub use self::tracing::request_id_middleware;
