use anyhow::{Result, anyhow};
use hifitime::{UNIX_REF_EPOCH, Unit};

pub type MonitorDateTime = hifitime::Epoch;

pub trait MonitorDateTimeExt: Sized {
    fn from_unix_microseconds_i64(timestamp: i64) -> Self;
    fn from_unix_seconds_i64(timestamp: i64) -> Self;
    fn to_unix_microseconds_i64(&self) -> i64;
    fn parse_rfc3339(datetime_str: &str) -> Result<Self>;
}

impl MonitorDateTimeExt for MonitorDateTime {
    fn from_unix_microseconds_i64(timestamp: i64) -> Self {
        Self::from_utc_duration(UNIX_REF_EPOCH.to_utc_duration() + timestamp * Unit::Microsecond)
    }

    fn from_unix_seconds_i64(timestamp: i64) -> Self {
        Self::from_utc_duration(UNIX_REF_EPOCH.to_utc_duration() + timestamp * Unit::Second)
    }

    fn to_unix_microseconds_i64(&self) -> i64 {
        self.to_unix(Unit::Microsecond).round() as i64
    }

    /// Accepts the forms hifitime understands, e.g. `2024-01-15T10:30:00Z`
    /// or `2024-01-15T10:30:00+01:00`.
    fn parse_rfc3339(datetime_str: &str) -> Result<Self> {
        Self::from_gregorian_str(datetime_str)
            .map_err(|e| anyhow!("Invalid datetime format '{}': {}", datetime_str, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send<T: Send>() {}

    #[test]
    fn test_send() {
        assert_send::<MonitorDateTime>();
    }

    #[test]
    fn test_microseconds_roundtrip() {
        let test_cases: &[i64] = &[
            0,
            1_000,
            1_704_067_200_000_000, // Jan 1, 2024 00:00:00 UTC
            1_704_067_200_123_456,
        ];

        for &input in test_cases {
            let datetime = MonitorDateTime::from_unix_microseconds_i64(input);
            assert_eq!(
                datetime.to_unix_microseconds_i64(),
                input,
                "microseconds should roundtrip for {}",
                input
            );
        }
    }

    #[test]
    fn test_seconds_match_microseconds() {
        let from_seconds = MonitorDateTime::from_unix_seconds_i64(1_704_067_200);
        let from_micros = MonitorDateTime::from_unix_microseconds_i64(1_704_067_200_000_000);
        assert_eq!(from_seconds, from_micros);
    }

    #[test]
    fn test_parse_rfc3339() {
        let parsed = MonitorDateTime::parse_rfc3339("2024-01-01T00:00:00Z").unwrap();
        assert_eq!(parsed.to_unix_microseconds_i64(), 1_704_067_200_000_000);

        assert!(MonitorDateTime::parse_rfc3339("not a date").is_err());
    }

    #[test]
    fn test_rfc3339_roundtrip() {
        let datetime = MonitorDateTime::from_unix_seconds_i64(1_704_067_200);
        let parsed = MonitorDateTime::parse_rfc3339(&datetime.to_rfc3339()).unwrap();
        assert_eq!(
            parsed.to_unix_microseconds_i64(),
            datetime.to_unix_microseconds_i64()
        );
    }
}
