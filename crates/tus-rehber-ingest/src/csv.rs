// SPDX-License-Identifier: Apache-2.0

/// Split delimited text into records of trimmed fields. Empty lines are
/// skipped; a trailing carriage return is stripped. The sources carry no
/// quoting, so fields split on the raw delimiter.
#[must_use]
pub fn parse_delimited_records(content: &str, delimiter: char) -> Vec<Vec<String>> {
    content
        .lines()
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            line.split(delimiter)
                .map(|field| field.trim().to_string())
                .collect()
        })
        .collect()
}

/// `NULL`, `--`, and empty fields decode to None; a decimal comma is
/// normalized to a dot before parsing. Anything else unparseable is also
/// treated as unreported.
#[must_use]
pub fn parse_opt_f64(value: &str) -> Option<f64> {
    if is_null_token(value) {
        return None;
    }
    value.replace(',', ".").parse::<f64>().ok()
}

#[must_use]
pub fn parse_opt_i64(value: &str) -> Option<i64> {
    if is_null_token(value) {
        return None;
    }
    value.trim().parse::<i64>().ok()
}

fn is_null_token(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed == "NULL" || trimmed == "--"
}
