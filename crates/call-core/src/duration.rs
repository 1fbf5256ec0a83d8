//! Elapsed-time formatting for call durations

/// Format a duration in whole seconds as `mm:ss`, or `HH:mm:ss` from one hour on
///
/// ```rust
/// use callkeeper_call_core::format_duration;
///
/// assert_eq!(format_duration(342), "05:42");
/// assert_eq!(format_duration(4530), "01:15:30");
/// ```
pub fn format_duration(seconds: u64) -> String {
    let hrs = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hrs > 0 {
        format!("{:02}:{:02}:{:02}", hrs, mins, secs)
    } else {
        format!("{:02}:{:02}", mins, secs)
    }
}
