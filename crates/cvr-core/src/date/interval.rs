use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Any single raw interval spanning 50 years or more is a bogus parse
/// (e.g. a phone number read as a year range) and would swallow the
/// whole union if merged.
pub const MAX_INTERVAL_MONTHS: i32 = 600;

/// A calendar month in the total-month index: `year * 12 + (month - 1)`.
/// The injected clock of every analysis; never read from the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    /// 1-based calendar month.
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self {
            year,
            month: month.clamp(1, 12),
        }
    }

    pub fn index(&self) -> i32 {
        self.year * 12 + (self.month as i32 - 1)
    }

    pub fn from_naive_date(date: chrono::NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }
}

/// Right-open month interval `[start, end)` over the total-month index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthInterval {
    pub start: i32,
    pub end: i32,
}

impl MonthInterval {
    /// `None` unless `end > start`.
    pub fn new(start: i32, end: i32) -> Option<Self> {
        (end > start).then_some(Self { start, end })
    }

    pub fn months(&self) -> i32 {
        self.end - self.start
    }
}

/// Union of raw intervals: oversized spans dropped, then sorted and
/// merged (overlapping or touching). The result is monotone and
/// non-overlapping.
pub fn merge_intervals(raw: &[MonthInterval]) -> Vec<MonthInterval> {
    let mut intervals: Vec<MonthInterval> = raw
        .iter()
        .copied()
        .filter(|iv| {
            if iv.months() >= MAX_INTERVAL_MONTHS {
                debug!(start = iv.start, end = iv.end, "dropping oversized interval");
                return false;
            }
            true
        })
        .collect();

    intervals.sort_by_key(|iv| (iv.start, iv.end));

    let mut merged: Vec<MonthInterval> = Vec::with_capacity(intervals.len());
    for iv in intervals {
        match merged.last_mut() {
            Some(last) if iv.start <= last.end => last.end = last.end.max(iv.end),
            _ => merged.push(iv),
        }
    }
    merged
}

pub fn total_months(merged: &[MonthInterval]) -> i32 {
    merged.iter().map(MonthInterval::months).sum()
}

/// Months → years, clamped to `[0, 50]`, rounded to 0.1.
pub fn months_to_years(months: i32) -> f64 {
    let years = (months.max(0) as f64 / 12.0).clamp(0.0, 50.0);
    (years * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iv(start: i32, end: i32) -> MonthInterval {
        MonthInterval::new(start, end).unwrap()
    }

    #[test]
    fn month_index_orders_calendar_months() {
        let jan_2019 = YearMonth::new(2019, 1);
        let jun_2025 = YearMonth::new(2025, 6);
        assert_eq!(jan_2019.index(), 2019 * 12);
        assert_eq!(jun_2025.index() - jan_2019.index(), 77);
    }

    #[test]
    fn clock_converts_from_calendar_dates() {
        let date = chrono::NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        assert_eq!(YearMonth::from_naive_date(date), YearMonth::new(2025, 6));
        assert_eq!(YearMonth::new(2025, 0), YearMonth::new(2025, 1));
    }

    #[test]
    fn rejects_empty_intervals() {
        assert!(MonthInterval::new(100, 100).is_none());
        assert!(MonthInterval::new(100, 99).is_none());
    }

    #[test]
    fn merges_overlapping_and_touching() {
        let merged = merge_intervals(&[iv(10, 20), iv(0, 5), iv(5, 8), iv(15, 30)]);
        assert_eq!(merged, vec![iv(0, 8), iv(10, 30)]);
        assert_eq!(total_months(&merged), 28);
    }

    #[test]
    fn merged_union_is_monotone_non_overlapping() {
        let merged = merge_intervals(&[iv(3, 9), iv(1, 4), iv(20, 22), iv(8, 12)]);
        for pair in merged.windows(2) {
            assert!(pair[0].end < pair[1].start);
        }
    }

    #[test]
    fn drops_bogus_half_century_spans() {
        let merged = merge_intervals(&[iv(0, 700), iv(10, 20)]);
        assert_eq!(merged, vec![iv(10, 20)]);
    }

    #[test]
    fn converts_months_to_clamped_rounded_years() {
        assert_eq!(months_to_years(77), 6.4);
        assert_eq!(months_to_years(29), 2.4);
        assert_eq!(months_to_years(0), 0.0);
        assert_eq!(months_to_years(1000), 50.0);
    }
}
