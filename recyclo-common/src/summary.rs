//! Progress summaries
//!
//! Builds the per-user totals and the trailing 14-day series from decision
//! log rows. Every stored label is re-normalized before it is counted, so
//! rows written with older label spellings still land in the right bucket.

use crate::outcome::{normalize, CategoryCounts};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Days in the trailing window, today included
pub const WINDOW_DAYS: i64 = 14;

/// Summary view for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Sum of `totals`
    pub total: u64,
    /// Counts over the whole history
    pub totals: CategoryCounts,
    /// ISO date -> counts, oldest first, one entry per day in the window
    pub per_day: BTreeMap<String, CategoryCounts>,
}

/// First day of the window ending on `today`
pub fn window_start(today: NaiveDate) -> NaiveDate {
    today - Duration::days(WINDOW_DAYS - 1)
}

/// Window days oldest to newest
pub fn window_days(today: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let start = window_start(today);
    (0..WINDOW_DAYS).map(move |offset| start + Duration::days(offset))
}

impl Summary {
    /// Empty summary for the window ending on `today`
    pub fn empty(today: NaiveDate) -> Self {
        Self {
            total: 0,
            totals: CategoryCounts::zeroed(),
            per_day: window_days(today)
                .map(|day| (day.format("%Y-%m-%d").to_string(), CategoryCounts::zeroed()))
                .collect(),
        }
    }

    /// Build a summary.
    ///
    /// `label_counts` covers the user's entire history (label, count);
    /// `recent` holds (label, timestamp) rows, at least those inside the
    /// window. Rows outside the window are ignored for `per_day`.
    pub fn build<'a>(
        label_counts: impl IntoIterator<Item = (&'a str, u64)>,
        recent: impl IntoIterator<Item = (&'a str, DateTime<Utc>)>,
        today: NaiveDate,
    ) -> Self {
        let mut summary = Self::empty(today);

        for (label, count) in label_counts {
            summary.totals.add(normalize(label), count);
        }
        summary.total = summary.totals.sum();

        for (label, ts) in recent {
            let key = ts.date_naive().format("%Y-%m-%d").to_string();
            if let Some(day) = summary.per_day.get_mut(&key) {
                day.add(normalize(label), 1);
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::NormalizedCategory;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_empty_window_is_complete() {
        let summary = Summary::build(Vec::new(), Vec::new(), day(2025, 3, 5));

        assert_eq!(summary.total, 0);
        assert_eq!(summary.per_day.len(), 14);
        let keys: Vec<_> = summary.per_day.keys().cloned().collect();
        assert_eq!(keys.first().unwrap(), "2025-02-20");
        assert_eq!(keys.last().unwrap(), "2025-03-05");
        for counts in summary.per_day.values() {
            assert_eq!(counts, &CategoryCounts::zeroed());
        }
    }

    #[test]
    fn test_totals_merge_labels_of_same_category() {
        let summary = Summary::build(
            vec![("Recyclable", 3), ("recycle", 2), ("Drop-off", 1)],
            Vec::new(),
            day(2025, 3, 5),
        );

        assert_eq!(summary.totals.get(NormalizedCategory::Recyclable), 5);
        assert_eq!(summary.totals.get(NormalizedCategory::Other), 1);
        assert_eq!(summary.total, 6);
    }

    #[test]
    fn test_recent_rows_bucketed_by_utc_day() {
        let today = day(2025, 3, 5);
        let recent = vec![
            ("Compost", Utc.with_ymd_and_hms(2025, 3, 5, 23, 59, 0).unwrap()),
            ("Landfill", Utc.with_ymd_and_hms(2025, 2, 20, 0, 0, 0).unwrap()),
            // day before the window
            ("Landfill", Utc.with_ymd_and_hms(2025, 2, 19, 23, 59, 59).unwrap()),
        ];
        let summary = Summary::build(vec![("Compost", 1), ("Landfill", 2)], recent, today);

        assert_eq!(summary.per_day["2025-03-05"].get(NormalizedCategory::Compost), 1);
        assert_eq!(summary.per_day["2025-02-20"].get(NormalizedCategory::Landfill), 1);
        assert!(!summary.per_day.contains_key("2025-02-19"));
        assert_eq!(summary.totals.get(NormalizedCategory::Landfill), 2);
    }

    #[test]
    fn test_window_crosses_year_boundary() {
        let days: Vec<_> = window_days(day(2025, 1, 3)).collect();
        assert_eq!(days.len(), 14);
        assert_eq!(days[0], day(2024, 12, 21));
        assert_eq!(days[13], day(2025, 1, 3));
    }
}
