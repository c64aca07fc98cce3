use super::MonitorDateTime;
use super::monitor_datetime::MonitorDateTimeExt;

/// One ingested row of a metric's time series.
#[derive(Debug, Clone, Copy)]
pub struct MetricDataPoint {
    pub value: f64,
    pub timestamp: MonitorDateTime,
}

impl MetricDataPoint {
    pub fn new(value: f64, timestamp: MonitorDateTime) -> Self {
        Self { value, timestamp }
    }

    pub fn from_unix_seconds(value: f64, seconds: i64) -> Self {
        Self::new(value, MonitorDateTime::from_unix_seconds_i64(seconds))
    }
}

// Rows come back from storage with microsecond precision, so equality is
// defined at that resolution.
impl PartialEq for MetricDataPoint {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
            && self.timestamp.to_unix_microseconds_i64() == other.timestamp.to_unix_microseconds_i64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_at_microsecond_resolution() {
        let a = MetricDataPoint::from_unix_seconds(1.5, 1_704_067_200);
        let b = MetricDataPoint::new(
            1.5,
            MonitorDateTime::from_unix_microseconds_i64(1_704_067_200_000_000),
        );
        assert_eq!(a, b);

        let c = MetricDataPoint::from_unix_seconds(2.0, 1_704_067_200);
        assert_ne!(a, c);
    }
}
