use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GolkError;

// --- Timestamps ---

/// Weather update stamps are stored as naive UTC ISO strings (`2000-01-01T00:00:00`).
pub const RESET_TIMESTAMP: &str = "2000-01-01T00:00:00";

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.naive_utc().format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Accepts naive ISO strings (with or without fractional seconds) and RFC 3339.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(naive) = raw.parse::<NaiveDateTime>() {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Sri Lanka Standard Time, UTC+05:30, no DST.
pub fn sri_lanka_time(now: DateTime<Utc>) -> NaiveDateTime {
    (now + chrono::Duration::minutes(5 * 60 + 30)).naive_utc()
}

// --- Month ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    /// 1-based calendar month.
    pub fn from_number(n: u32) -> Option<Month> {
        Self::ALL.get((n as usize).checked_sub(1)?).copied()
    }

    pub fn number(self) -> u32 {
        self as u32 + 1
    }

    pub fn name(self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }

    pub fn season(self) -> Season {
        Season::for_month(self)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Month {
    type Err = GolkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Month::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| GolkError::Validation(format!("unknown month: {s}")))
    }
}

/// A `/weather/{month}` path segment: a month name or `all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthSelector {
    Month(Month),
    All,
}

impl FromStr for MonthSelector {
    type Err = GolkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(MonthSelector::All)
        } else {
            s.parse().map(MonthSelector::Month)
        }
    }
}

impl fmt::Display for MonthSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthSelector::Month(m) => m.fmt(f),
            MonthSelector::All => f.write_str("all"),
        }
    }
}

// --- Season ---

/// Sri Lankan monsoon seasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Season {
    NortheastMonsoon,
    FirstInterMonsoon,
    SouthwestMonsoon,
    SecondInterMonsoon,
}

impl Season {
    pub fn for_month(month: Month) -> Season {
        match month.number() {
            12 | 1 | 2 => Season::NortheastMonsoon,
            3 | 4 => Season::FirstInterMonsoon,
            5..=9 => Season::SouthwestMonsoon,
            _ => Season::SecondInterMonsoon,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Season::NortheastMonsoon => "Northeast Monsoon",
            Season::FirstInterMonsoon => "First Inter-monsoon",
            Season::SouthwestMonsoon => "Southwest Monsoon",
            Season::SecondInterMonsoon => "Second Inter-monsoon",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
