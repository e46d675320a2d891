// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parsing of `/remind` arguments.

/// Seconds per unit suffix. Unknown suffixes count as seconds.
fn unit_seconds(unit: &str) -> i64 {
    match unit.to_lowercase().as_str() {
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3600,
        "d" | "day" | "days" => 86_400,
        _ => 1,
    }
}

/// Total delay in seconds described by `args`.
///
/// Every token starting with a digit contributes. A bare number takes its
/// unit from the following token (`5 m`); otherwise the unit is the suffix
/// glued to the number (`5m`). Non-numeric tokens are skipped, so
/// `["1", "h", "30", "m"]` is 5400 and `[]` is 0. Overflow saturates.
pub fn parse_reminder_due<S: AsRef<str>>(args: &[S]) -> i64 {
    let mut total: i64 = 0;
    for (idx, arg) in args.iter().enumerate() {
        let arg = arg.as_ref();
        if !arg.starts_with(|c: char| c.is_ascii_digit()) {
            continue;
        }
        let split = arg
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(arg.len());
        let (digits, suffix) = arg.split_at(split);
        let value: i64 = digits.parse().unwrap_or(i64::MAX);
        let unit = if suffix.is_empty() {
            args.get(idx + 1).map(|s| s.as_ref()).unwrap_or("")
        } else {
            suffix
        };
        total = total.saturating_add(value.saturating_mul(unit_seconds(unit)));
    }
    total
}

/// The free-text reminder message: everything between the first double
/// quote and the end, with the remaining quotes dropped.
pub fn extract_reminder_message(text: &str) -> String {
    let mut parts = text.split('"');
    parts.next();
    parts.collect::<Vec<_>>().concat()
}
