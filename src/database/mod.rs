pub mod connection;
pub mod operations;

pub use connection::{InfluxClient, MetricsSink};
pub use operations::MetricsPublisher;
