use chrono::{DateTime, Utc};

/// `October 19, 2026`
pub fn format_long_date(time: DateTime<Utc>) -> String {
    time.format("%B %-d, %Y").to_string()
}

/// `October 19, 2026 at 03:04 PM`
pub fn format_date_time(time: DateTime<Utc>) -> String {
    time.format("%B %-d, %Y at %I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_long_date() {
        let time = Utc.with_ymd_and_hms(2024, 3, 7, 15, 4, 0).unwrap();
        assert_eq!(format_long_date(time), "March 7, 2024");
        assert_eq!(format_date_time(time), "March 7, 2024 at 03:04 PM");
    }
}
