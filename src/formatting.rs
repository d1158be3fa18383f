use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Renders a timestamp as e.g. "March 5, 2025" in the given zone.
pub fn format_date(date: &DateTime<Utc>, tz: &Tz) -> String {
    date.with_timezone(tz).format("%B %-d, %Y").to_string()
}
