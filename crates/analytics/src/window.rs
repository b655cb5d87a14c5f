use crate::error::AnalyticsError;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// A span of time that orders are filtered on.
///
/// The start is always inclusive. The end is inclusive only when
/// `end_inclusive` is set, which is the case for the window ending "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub end_inclusive: bool,
}

impl TimeWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        if instant < self.start {
            return false;
        }
        if self.end_inclusive {
            instant <= self.end
        } else {
            instant < self.end
        }
    }
}

/// The current reporting period and the one immediately before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportingWindow {
    pub current: TimeWindow,
    pub previous: TimeWindow,
}

impl ReportingWindow {
    /// The trailing `days` ending at `now`, and the equally long period that ends
    /// where it starts.
    pub fn trailing(now: DateTime<Utc>, days: u32) -> Result<Self, AnalyticsError> {
        if days == 0 {
            return Err(AnalyticsError::InvalidWindow(
                "window must span at least one day".to_string(),
            ));
        }
        let length = Duration::days(i64::from(days));
        let start = now - length;

        Ok(Self {
            current: TimeWindow {
                start,
                end: now,
                end_inclusive: true,
            },
            previous: TimeWindow {
                start: start - length,
                end: start,
                end_inclusive: false,
            },
        })
    }
}
