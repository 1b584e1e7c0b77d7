use chrono::{DateTime, Local, Utc};

/// Link an affiliate shares: `<track base>/track/<code>`.
pub fn referral_link(track_base_url: &str, referral_code: &str) -> String {
    format!("{}/track/{}", track_base_url.trim_end_matches('/'), referral_code)
}

/// Commission rate as the server sent it: `10`, `12.5`.
pub fn format_rate(rate: f64) -> String {
    if rate.fract() == 0.0 {
        format!("{:.0}", rate)
    } else {
        let s = format!("{:.2}", rate);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// One decimal place with a percent sign: `33.3%`.
pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Short day/month/year date for tables, in the local time zone.
pub fn format_date(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%d/%m/%Y").to_string()
}

/// Truncate a string to a maximum number of characters, adding ellipsis if needed
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}
