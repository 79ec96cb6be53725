//! Human-readable rendering of session times.

use chrono::{DateTime, Duration, Local, Utc};

/// Render the time left on a session, rounded down to the minute.
pub fn format_remaining(remaining: Duration) -> String {
    if remaining <= Duration::zero() {
        return "expired".to_string();
    }

    let minutes = remaining.num_minutes();
    if minutes < 1 {
        "less than a minute left".to_string()
    } else if minutes < 60 {
        format!("{}m left", minutes)
    } else if minutes < 1440 {
        let hours = minutes / 60;
        let remaining_mins = minutes % 60;
        if remaining_mins == 0 {
            format!("{}h left", hours)
        } else {
            format!("{}h {}m left", hours, remaining_mins)
        }
    } else {
        let days = minutes / 1440;
        let remaining_hours = (minutes % 1440) / 60;
        if remaining_hours == 0 {
            format!("{}d left", days)
        } else {
            format!("{}d {}h left", days, remaining_hours)
        }
    }
}

/// Expiry instant in the local timezone
pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S %Z")
        .to_string()
}
