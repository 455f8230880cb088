//! Metric extraction from place-and-route output.

use std::sync::OnceLock;

use regex::Regex;

use crate::schema::MetricLabels;

/// Area and delay reported by one tool run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    /// Logic block area plus routing area.
    pub area: f64,
    /// Critical path delay.
    pub delay: f64,
}

/// Extract the metrics from tool output.
///
/// Returns `None` unless all three labels are found, each followed by a
/// number on the same line.
pub fn parse_metrics(output: &str, labels: &MetricLabels) -> Option<Metrics> {
    let logic = value_after(output, &labels.logic_area)?;
    let routing = value_after(output, &labels.routing_area)?;
    let delay = value_after(output, &labels.critical_path)?;

    Some(Metrics {
        area: logic + routing,
        delay,
    })
}

/// First number following `label` on the first line that contains it.
///
/// Only whitespace-separated tokens that are numbers, optionally wrapped in
/// parentheses or followed by punctuation, count. Tokens such as `x86` or
/// `v2` are skipped.
pub fn value_after(output: &str, label: &str) -> Option<f64> {
    if label.is_empty() {
        return None;
    }

    let line = output.lines().find(|line| line.contains(label))?;
    let start = line.find(label)? + label.len();

    line[start..].split_whitespace().find_map(parse_number)
}

/// Decimal or scientific number filling a whole token
fn number_regex() -> &'static Regex {
    static NUMBER_REGEX: OnceLock<Regex> = OnceLock::new();
    NUMBER_REGEX.get_or_init(|| {
        Regex::new(r"^\(?([-+]?[0-9]+(?:\.[0-9]*)?(?:[eE][-+]?[0-9]+)?)[)\],;:]*$")
            .expect("Invalid regex")
    })
}

fn parse_number(token: &str) -> Option<f64> {
    let captures = number_regex().captures(token)?;
    captures[1].parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VPR_OUTPUT: &str = "\
Netlist clb blocks: 58
Total used logic block area: 1.38622e+06
Total routing area: 652731., per logic tile: 3563.48
Final critical path: 4.68537 ns, f_max: 213.43 MHz
";

    #[test]
    fn test_parse_metrics() {
        let metrics = parse_metrics(VPR_OUTPUT, &MetricLabels::default()).unwrap();
        assert!((metrics.area - (1.38622e6 + 652731.0)).abs() < 1e-6);
        assert!((metrics.delay - 4.68537).abs() < 1e-12);
    }

    #[test]
    fn test_missing_label() {
        let output = "Total used logic block area: 10\nTotal routing area: 5\n";
        assert_eq!(parse_metrics(output, &MetricLabels::default()), None);
    }

    #[test]
    fn test_value_after_skips_words() {
        assert_eq!(value_after("delay: about 3.5e-9 s", "delay:"), Some(3.5e-9));
        assert_eq!(value_after("delay: (12)", "delay:"), Some(12.0));
        assert_eq!(value_after("delay: n/a", "delay:"), None);
        assert_eq!(value_after("no label here", "delay:"), None);
    }

    #[test]
    fn test_value_after_ignores_words_with_digits() {
        assert_eq!(value_after("Final critical path: v2 4.5 ns", "path:"), Some(4.5));
        assert_eq!(value_after("Total routing area: e5 100", "area:"), Some(100.0));
        assert_eq!(value_after("Total routing area: x86 123.0", "area:"), Some(123.0));
        assert_eq!(value_after("delay: 86x", "delay:"), None);
    }

    #[test]
    fn test_first_matching_line_wins() {
        let output = "area: 1\narea: 2\n";
        assert_eq!(value_after(output, "area:"), Some(1.0));
    }
}
