//! Year/month period helpers shared by the statistics and billing services.

use chrono::{DateTime, TimeZone, Utc};

use crate::errors::ServiceError;

/// Validate a (year, month) pair and return the UTC bounds
/// `[start_of_month, start_of_next_month)`.
pub fn month_bounds(year: i32, month: u32) -> Result<(DateTime<Utc>, DateTime<Utc>), ServiceError> {
    if !(1..=12).contains(&month) {
        return Err(ServiceError::Validation(format!("month must be 1..=12, got {}", month)));
    }
    if !(2000..=3000).contains(&year) {
        return Err(ServiceError::Validation(format!("year out of range: {}", year)));
    }
    let start = Utc
        .with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| ServiceError::Validation("invalid period".into()))?;
    let (next_y, next_m) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let end = Utc
        .with_ymd_and_hms(next_y, next_m, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| ServiceError::Validation("invalid period".into()))?;
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_cover_exactly_one_month() {
        let (start, end) = month_bounds(2026, 2).unwrap();
        assert_eq!(start.to_rfc3339(), "2026-02-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2026-03-01T00:00:00+00:00");
    }

    #[test]
    fn december_rolls_into_next_year() {
        let (_, end) = month_bounds(2025, 12).unwrap();
        assert_eq!(end.to_rfc3339(), "2026-01-01T00:00:00+00:00");
    }

    #[test]
    fn rejects_bad_month() {
        assert!(month_bounds(2026, 0).is_err());
        assert!(month_bounds(2026, 13).is_err());
    }
}
