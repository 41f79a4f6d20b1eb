//! Parsing of judge annotations of the form `<score>Step 1: 1/1, Step 2: 0/1</score>`

use regex::Regex;
use std::sync::OnceLock;

fn span_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<score>(.*?)</score>").expect("Invalid score span regex pattern")
    })
}

/// Matches both the legacy `: 1/1` dialect and arbitrary `: 12/15` fractions.
fn step_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r":\s*([0-9]+)/([0-9]+)").expect("Invalid step fraction regex pattern")
    })
}

/// Return the contents of the first `<score>...</score>` span, if any.
///
/// The span must open and close on the same line.
pub fn extract_span(text: &str) -> Option<&str> {
    span_regex()
        .captures(text)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str())
}

/// Parse a judge annotation into per-step scores, in the order the judge wrote them.
///
/// Returns `None` when no score span is present. A span without any
/// recognizable fraction yields an empty sequence. Zero denominators score 0.0.
/// Ratios above 1.0 are returned as-is; range handling is left to the caller.
pub fn parse(text: &str) -> Option<Vec<f64>> {
    let span = extract_span(text)?;

    let scores = step_regex()
        .captures_iter(span)
        .map(|cap| ratio(&cap[1], &cap[2]))
        .collect();

    Some(scores)
}

fn ratio(numerator: &str, denominator: &str) -> f64 {
    // ASCII digit runs always parse as f64, even past u64::MAX
    let num: f64 = numerator.parse().unwrap_or(0.0);
    let den: f64 = denominator.parse().unwrap_or(0.0);
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}
