pub mod data_point;
pub mod metric;
pub mod monitor_datetime;

pub use data_point::MetricDataPoint;
pub use metric::{Metric, MetricStatus, NewMetric};
pub use monitor_datetime::MonitorDateTime;
