//! Decides whether a newly monitored metric gets a model right away.

use crate::datamodel::MetricStatus;
use crate::spec::MonitoringMode;

/// Status reached by a monitored metric holding `count` data points.
pub fn activation_status(count: u64, threshold: u64) -> MetricStatus {
    if count >= threshold {
        MetricStatus::CreatePending
    } else {
        MetricStatus::PendingData
    }
}

/// A known value range or a complete model configuration makes the model
/// buildable without any history.
pub fn decide_activation(mode: &MonitoringMode, count: u64, threshold: u64) -> MetricStatus {
    match mode {
        MonitoringMode::Complete(_) => MetricStatus::CreatePending,
        MonitoringMode::Simple(params) if params.explicit_range().is_some() => {
            MetricStatus::CreatePending
        }
        _ => activation_status(count, threshold),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::SimpleModelParams;

    #[test]
    fn test_threshold_boundary() {
        assert_eq!(activation_status(1000, 1000), MetricStatus::CreatePending);
        assert_eq!(activation_status(999, 1000), MetricStatus::PendingData);
        assert_eq!(activation_status(1001, 1000), MetricStatus::CreatePending);
        assert_eq!(activation_status(0, 1000), MetricStatus::PendingData);
    }

    #[test]
    fn test_zero_threshold_activates_immediately() {
        assert_eq!(activation_status(0, 0), MetricStatus::CreatePending);
    }

    #[test]
    fn test_explicit_range_skips_threshold() {
        let mode = MonitoringMode::Simple(SimpleModelParams {
            min: Some(0.0),
            max: Some(100.0),
            ..Default::default()
        });
        assert_eq!(decide_activation(&mode, 0, 1000), MetricStatus::CreatePending);
    }

    #[test]
    fn test_partial_range_waits_for_data() {
        let mode = MonitoringMode::Simple(SimpleModelParams {
            min: Some(0.0),
            enable_classifier: Some(true),
            ..Default::default()
        });
        assert_eq!(decide_activation(&mode, 10, 1000), MetricStatus::PendingData);
        assert_eq!(
            decide_activation(&MonitoringMode::Automatic, 1000, 1000),
            MetricStatus::CreatePending
        );
    }
}
