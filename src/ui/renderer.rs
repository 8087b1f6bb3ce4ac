// Renderer module - formatting utilities for the dashboard tables

/// Format a mean inter-arrival duration
pub fn format_avg_duration(avg: f64) -> String {
    format!("{:.1}", avg)
}

/// Format per-slot window maxima, empty slots shown as `-`
pub fn format_maxs(maxs: &[Option<i64>]) -> String {
    let cells: Vec<String> = maxs
        .iter()
        .map(|max| match max {
            Some(v) => format!("{:3}", v),
            None => "  -".to_string(),
        })
        .collect();
    format!("\u{00B7}{}", cells.join(" "))
}

pub fn format_same(all_same: bool) -> String {
    if all_same { "yes" } else { "no" }.to_string()
}

pub fn format_indicators(indicators: &[String]) -> String {
    if indicators.is_empty() {
        "-".to_string()
    } else {
        indicators.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_maxs() {
        assert_eq!(format_maxs(&[Some(5), None, Some(255)]), "\u{00B7}  5   - 255");
        assert_eq!(format_maxs(&[]), "\u{00B7}");
    }

    #[test]
    fn test_format_avg_duration() {
        assert_eq!(format_avg_duration(62.5), "62.5");
        assert_eq!(format_avg_duration(0.0), "0.0");
    }

    #[test]
    fn test_format_indicators() {
        assert_eq!(format_indicators(&[]), "-");
        assert_eq!(
            format_indicators(&["RO".to_string(), "2".to_string()]),
            "RO 2"
        );
    }
}
