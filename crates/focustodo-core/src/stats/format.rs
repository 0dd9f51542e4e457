/// `MM:SS`. Minutes are not wrapped into hours.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// `1h 5m` above an hour, `5m` below. Negative or non-finite input reads
/// as `0m`.
pub fn format_minutes(minutes: f64) -> String {
    if !minutes.is_finite() || minutes < 0.0 {
        return "0m".to_string();
    }
    let total = minutes.round() as u64;
    let (hours, mins) = (total / 60, total % 60);
    if hours > 0 {
        format!("{hours}h {mins}m")
    } else {
        format!("{mins}m")
    }
}
