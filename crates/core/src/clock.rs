//! Stopwatch time helpers shared by the timer display and score submission.

/// Clamp a raw elapsed reading to a submittable completion time.
///
/// Negative readings (clock skew) become 0.
pub fn clamp_completion_seconds(elapsed_seconds: i64) -> u32 {
    elapsed_seconds.clamp(0, u32::MAX as i64) as u32
}

/// Render whole seconds as `MM:SS`.
///
/// Minutes are zero-padded to two digits and keep growing past 99.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
