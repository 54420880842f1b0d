//! HTTP date parsing.
//!
//! Clients still send every date format HTTP has ever allowed, so parsing
//! tries an ordered list of candidate formats on each token:
//!
//! | Format | Example |
//! |--------|---------|
//! | RFC 1123 | `Sun, 06 Nov 1994 08:49:37 GMT` |
//! | RFC 850 | `Sunday, 06-Nov-94 08:49:37 GMT` |
//! | RFC 850, four-digit year | `Sunday, 06-Nov-1994 08:49:37 GMT` |
//! | RFC 850, abbreviated day | `Sun, 06-Nov-94 08:49:37 GMT` |
//! | ANSI C `asctime` | `Sun Nov  6 08:49:37 1994` |
//! | Touchstone (no zone, GMT assumed) | `Sat, 28-Sep-19 16:11:14` |
//!
//! A token is valid only if it parses completely and its day name matches the
//! calendar date. Two-digit years fall in 1940..=2039.

use chrono::{DateTime, Datelike, NaiveDateTime, Utc, Weekday};

/// Format used when rendering `Last-Modified`.
pub const RFC1123_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

const SHORT_DAY_NAMES: [(&str, Weekday); 7] = [
    ("Mon", Weekday::Mon),
    ("Tue", Weekday::Tue),
    ("Wed", Weekday::Wed),
    ("Thu", Weekday::Thu),
    ("Fri", Weekday::Fri),
    ("Sat", Weekday::Sat),
    ("Sun", Weekday::Sun),
];

const LONG_DAY_NAMES: [(&str, Weekday); 7] = [
    ("Monday", Weekday::Mon),
    ("Tuesday", Weekday::Tue),
    ("Wednesday", Weekday::Wed),
    ("Thursday", Weekday::Thu),
    ("Friday", Weekday::Fri),
    ("Saturday", Weekday::Sat),
    ("Sunday", Weekday::Sun),
];

#[derive(Debug, Clone, Copy)]
enum DayName {
    Short,
    Long,
}

impl DayName {
    fn strip<'a>(&self, input: &'a str) -> Option<(Weekday, &'a str)> {
        let names: &[(&str, Weekday)] = match self {
            DayName::Short => &SHORT_DAY_NAMES,
            DayName::Long => &LONG_DAY_NAMES,
        };
        names
            .iter()
            .find_map(|(name, day)| input.strip_prefix(name).map(|rest| (*day, rest)))
    }
}

#[derive(Debug)]
struct DateFormat {
    day: DayName,
    separator: &'static str,
    pattern: &'static str,
    two_digit_year: bool,
}

const FORMATS: &[DateFormat] = &[
    // RFC 1123
    DateFormat {
        day: DayName::Short,
        separator: ", ",
        pattern: "%d %b %Y %H:%M:%S GMT",
        two_digit_year: false,
    },
    // RFC 850
    DateFormat {
        day: DayName::Long,
        separator: ", ",
        pattern: "%d-%b-%y %H:%M:%S GMT",
        two_digit_year: true,
    },
    DateFormat {
        day: DayName::Long,
        separator: ", ",
        pattern: "%d-%b-%Y %H:%M:%S GMT",
        two_digit_year: false,
    },
    DateFormat {
        day: DayName::Short,
        separator: ", ",
        pattern: "%d-%b-%y %H:%M:%S GMT",
        two_digit_year: true,
    },
    // ANSI C asctime, after whitespace has been collapsed
    DateFormat {
        day: DayName::Short,
        separator: " ",
        pattern: "%b %d %H:%M:%S %Y",
        two_digit_year: false,
    },
    // Touchstone
    DateFormat {
        day: DayName::Short,
        separator: ", ",
        pattern: "%d-%b-%y %H:%M:%S",
        two_digit_year: true,
    },
];

impl DateFormat {
    fn parse_prefix<'a>(&self, input: &'a str) -> Option<(DateTime<Utc>, &'a str)> {
        let (weekday, rest) = self.day.strip(input)?;
        let rest = rest.strip_prefix(self.separator)?;
        let (naive, remainder) = NaiveDateTime::parse_and_remainder(rest, self.pattern).ok()?;

        if !at_token_boundary(remainder) {
            return None;
        }

        let consumed = &rest[..rest.len() - remainder.len()];
        if !self.renders_as(&naive, consumed) {
            return None;
        }

        let naive = if self.two_digit_year {
            widen_two_digit_year(naive)?
        } else {
            naive
        };

        if naive.weekday() != weekday {
            return None;
        }

        Some((naive.and_utc(), remainder))
    }

    /// Chrono lets a pattern space match any run of whitespace, including
    /// none, so the parsed text must also be exactly what the pattern renders.
    /// Only the day of month may drop its leading zero.
    fn renders_as(&self, naive: &NaiveDateTime, consumed: &str) -> bool {
        let unpadded = self.pattern.replace("%d", "%-d");
        [self.pattern, unpadded.as_str()]
            .into_iter()
            .any(|pattern| naive.format(pattern).to_string().eq_ignore_ascii_case(consumed))
    }
}

fn at_token_boundary(remainder: &str) -> bool {
    remainder.is_empty() || remainder.starts_with(',') || remainder.starts_with(' ')
}

/// Maps a two-digit year into 1940..=2039.
fn widen_two_digit_year(naive: NaiveDateTime) -> Option<NaiveDateTime> {
    if naive.year() >= 2040 {
        naive.with_year(naive.year() - 100)
    } else if naive.year() < 1940 {
        naive.with_year(naive.year() + 100)
    } else {
        Some(naive)
    }
}

/// Splits one header occurrence into date tokens.
///
/// Each element is `Some(instant)` for a valid token and `None` for an
/// unparseable one. After an unparseable token, scanning resumes after the
/// next comma.
pub fn scan(value: &str) -> Vec<Option<DateTime<Utc>>> {
    let normalized = value.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut rest = normalized.as_str();
    let mut tokens = Vec::new();

    loop {
        rest = rest.trim_start_matches([',', ' ']);
        if rest.is_empty() {
            break;
        }

        match FORMATS.iter().find_map(|format| format.parse_prefix(rest)) {
            Some((instant, remainder)) => {
                tokens.push(Some(instant));
                rest = remainder;
            }
            None => {
                tokens.push(None);
                rest = match rest.find(',') {
                    Some(pos) => &rest[pos + 1..],
                    None => "",
                };
            }
        }
    }

    tokens
}

/// Parses a value holding exactly one valid HTTP date.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    match scan(value).as_slice() {
        [Some(instant)] => Some(*instant),
        _ => None,
    }
}

/// Renders an instant as an RFC 1123 HTTP date.
pub fn format_http_date(instant: &DateTime<Utc>) -> String {
    instant.format(RFC1123_FORMAT).to_string()
}
