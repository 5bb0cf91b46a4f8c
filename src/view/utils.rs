//! Utility functions for rendering UI components

use crate::model::format_time;

pub fn format_duration(seconds: f64) -> String {
    format_time(seconds)
}

/// Width needed for the index column (digits + padding)
pub fn calculate_num_width(item_count: usize) -> usize {
    if item_count == 0 {
        2
    } else {
        let digits = (item_count as f64).log10().floor() as usize + 1;
        digits + 1
    }
}

pub fn truncate_string(s: &str, max_width: usize) -> String {
    if s.chars().count() > max_width {
        let truncated: String = s.chars().take(max_width.saturating_sub(3)).collect();
        format!("{:<width$}", format!("{}...", truncated), width = max_width)
    } else {
        format!("{:<width$}", s, width = max_width)
    }
}

/// Total playlist length as `h:mm:ss` or `m:ss`
pub fn format_total(seconds: u64) -> String {
    let hours = seconds / 3600;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, (seconds % 3600) / 60, seconds % 60)
    } else {
        format!("{}:{:02}", seconds / 60, seconds % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_long_titles() {
        assert_eq!(truncate_string("abcdefghij", 6), "abc...");
        assert_eq!(truncate_string("abc", 6), "abc   ");
    }

    #[test]
    fn totals_switch_to_hours() {
        assert_eq!(format_total(59), "0:59");
        assert_eq!(format_total(3_725), "1:02:05");
    }

    #[test]
    fn index_column_grows_with_playlist() {
        assert_eq!(calculate_num_width(0), 2);
        assert_eq!(calculate_num_width(9), 2);
        assert_eq!(calculate_num_width(10), 3);
    }
}
