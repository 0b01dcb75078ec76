// SPDX-License-Identifier: Apache-2.0

use std::cmp::Ordering;

/// Chronological ordering key for a "YYYY/half" admission-period token.
///
/// Tokens sort by year, then half ("2024/2" > "2024/1", "2025/1" > "2024/2").
/// Tokens that do not parse sort before every well-formed token and fall back
/// to lexical comparison among themselves, so ordering stays total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodKey {
    token: String,
    parsed: Option<(u16, u8)>,
}

impl PeriodKey {
    #[must_use]
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
            parsed: parse_token(token),
        }
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.parsed.is_some()
    }

    #[must_use]
    pub fn into_token(self) -> String {
        self.token
    }
}

fn parse_token(token: &str) -> Option<(u16, u8)> {
    let (year, half) = token.split_once('/')?;
    let year: u16 = year.trim().parse().ok()?;
    let half: u8 = half.trim().parse().ok()?;
    if half == 0 || half > 2 {
        return None;
    }
    Some((year, half))
}

impl Ord for PeriodKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.parsed, &other.parsed) {
            (Some(a), Some(b)) => a.cmp(b).then_with(|| self.token.cmp(&other.token)),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => self.token.cmp(&other.token),
        }
    }
}

impl PartialOrd for PeriodKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
