// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Small formatting helpers shared by the command handlers.

/// Currency name shown in every balance message.
pub const ROKDA: &str = "₹okda";

/// Rounds to two decimals, the precision balances are kept at.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Formats a balance without trailing zeros: `500`, `12.5`, `0.33`.
pub fn format_rokda(value: f64) -> String {
    let rounded = round2(value);
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}")
    } else {
        let s = format!("{rounded:.2}");
        s.trim_end_matches('0').to_string()
    }
}

/// Human readable duration, e.g. `1d 2h 3m 4s`, `5m 0s`, `9s`.
pub fn pretty_time_delta(seconds: i64) -> String {
    let sign = if seconds < 0 { "-" } else { "" };
    let seconds = seconds.unsigned_abs();
    let (days, rem) = (seconds / 86_400, seconds % 86_400);
    let (hours, rem) = (rem / 3600, rem % 3600);
    let (minutes, secs) = (rem / 60, rem % 60);
    if days > 0 {
        format!("{sign}{days}d {hours}h {minutes}m {secs}s")
    } else if hours > 0 {
        format!("{sign}{hours}h {minutes}m {secs}s")
    } else if minutes > 0 {
        format!("{sign}{minutes}m {secs}s")
    } else {
        format!("{sign}{secs}s")
    }
}

/// Longest span a configured duration is allowed to mean (100 years).
const MAX_SPAN_SECS: u64 = 100 * 365 * 86_400;

/// Configured seconds as a [`chrono::Duration`], capped at 100 years so date
/// arithmetic never overflows.
pub fn seconds(secs: u64) -> chrono::Duration {
    chrono::Duration::seconds(secs.min(MAX_SPAN_SECS) as i64)
}

/// Escapes text for Telegram's HTML parse mode.
///
/// Only `<`, `>` and `&` are special there.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_are_capped() {
        assert_eq!(seconds(60), chrono::Duration::seconds(60));
        assert_eq!(seconds(u64::MAX), seconds(MAX_SPAN_SECS));
    }

    #[test]
    fn round2_rounds_half_away() {
        assert_eq!(round2(1.005_1), 1.01);
        assert_eq!(round2(10.0 / 3.0), 3.33);
        assert_eq!(round2(-2.499), -2.5);
    }

    #[test]
    fn format_rokda_trims() {
        assert_eq!(format_rokda(500.0), "500");
        assert_eq!(format_rokda(12.5), "12.5");
        assert_eq!(format_rokda(0.333), "0.33");
    }

    #[test]
    fn pretty_time_delta_units() {
        assert_eq!(pretty_time_delta(9), "9s");
        assert_eq!(pretty_time_delta(300), "5m 0s");
        assert_eq!(pretty_time_delta(3725), "1h 2m 5s");
        assert_eq!(pretty_time_delta(93_784), "1d 2h 3m 4s");
        assert_eq!(pretty_time_delta(-61), "-1m 1s");
    }

    #[test]
    fn escape_html_special_chars() {
        assert_eq!(escape_html("a<b>&c"), "a&lt;b&gt;&amp;c");
        assert_eq!(escape_html("plain ₹okda"), "plain ₹okda");
    }
}
