//! Natural-language query parsing.
//!
//! A deterministic, regex-table-driven translator from free text into the
//! same entity-type / date-range / privacy vocabulary the structured query
//! engine consumes. No model calls, no state: the same text always parses
//! to the same query.
//!
//! The tables are ordered data, not scattered conditionals, so the matching
//! semantics stay auditable: entity extraction dedups per entity type, date
//! extraction is strict first-match-wins over the phrase table, privacy
//! extraction collects every matching level. Unmatched optional parts are
//! `None` — never an empty list, because downstream an empty list means
//! "constrain to nothing" while `None` means "no constraint".

use std::sync::OnceLock;

use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::recurrence::days_in_month;
use crate::schema::EntityType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyLevel {
    Public,
    Personal,
    Private,
}

impl PrivacyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrivacyLevel::Public => "public",
            PrivacyLevel::Personal => "personal",
            PrivacyLevel::Private => "private",
        }
    }
}

/// Parsed form of a free-text query.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedQuery {
    pub entity_types: Option<Vec<EntityType>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub privacy_levels: Option<Vec<PrivacyLevel>>,
    /// Whatever is left after stripping command verbs and every matched
    /// pattern; feeds fallback full-text search.
    pub search_text: Option<String>,
    /// Always true — single-user deployment, no tenant access control.
    pub include_private: bool,
}

/// Name-phrase patterns per entity type. Each entity may have several
/// synonymous phrasings; checking order across entities is table order.
const ENTITY_PATTERNS: &[(EntityType, &[&str])] = &[
    (
        EntityType::WorkSession,
        &[
            r"work\s+sessions?",
            r"sessions?",
            r"time\s+entr(?:y|ies)",
            r"hours\s+(?:worked|logged)",
            r"time\s+track(?:ing|ed)",
        ],
    ),
    (
        EntityType::Meeting,
        &[r"meetings?", r"calls?", r"appointments?"],
    ),
    (
        EntityType::Person,
        &[r"people", r"persons?", r"contacts?", r"colleagues?"],
    ),
    (EntityType::Project, &[r"projects?"]),
    (EntityType::Client, &[r"clients?", r"customers?"]),
    (EntityType::Employer, &[r"employers?"]),
    (
        EntityType::Reminder,
        &[r"reminders?", r"follow[-\s]?ups?"],
    ),
    (EntityType::Note, &[r"notes?"]),
    (
        EntityType::ActionItem,
        &[r"action\s+items?", r"tasks?", r"to-?dos?"],
    ),
    (
        EntityType::Bookmark,
        &[r"bookmarks?", r"links?", r"saved\s+(?:pages|articles)"],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DatePhrase {
    Today,
    Yesterday,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    ThisYear,
}

/// Relative-date phrases in priority order: the first phrase that matches
/// wins; later matches only get stripped from the residual text.
const DATE_PATTERNS: &[(DatePhrase, &str)] = &[
    (DatePhrase::Today, r"today"),
    (DatePhrase::Yesterday, r"yesterday"),
    (DatePhrase::ThisWeek, r"this\s+week"),
    (DatePhrase::LastWeek, r"last\s+week"),
    (DatePhrase::ThisMonth, r"this\s+month"),
    (DatePhrase::LastMonth, r"last\s+month"),
    (DatePhrase::ThisYear, r"this\s+year"),
];

const PRIVACY_PATTERNS: &[(PrivacyLevel, &str)] = &[
    (PrivacyLevel::Private, r"private"),
    (PrivacyLevel::Personal, r"personal"),
    (PrivacyLevel::Public, r"public"),
];

fn compile(pattern: &str) -> Regex {
    Regex::new(&format!(r"(?i)\b(?:{pattern})\b")).expect("static pattern compiles")
}

fn entity_table() -> &'static Vec<(EntityType, Vec<Regex>)> {
    static TABLE: OnceLock<Vec<(EntityType, Vec<Regex>)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        ENTITY_PATTERNS
            .iter()
            .map(|(entity, patterns)| (*entity, patterns.iter().map(|p| compile(p)).collect()))
            .collect()
    })
}

fn date_table() -> &'static Vec<(DatePhrase, Regex)> {
    static TABLE: OnceLock<Vec<(DatePhrase, Regex)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        DATE_PATTERNS
            .iter()
            .map(|(phrase, pattern)| (*phrase, compile(pattern)))
            .collect()
    })
}

fn privacy_table() -> &'static Vec<(PrivacyLevel, Regex)> {
    static TABLE: OnceLock<Vec<(PrivacyLevel, Regex)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        PRIVACY_PATTERNS
            .iter()
            .map(|(level, pattern)| (*level, compile(pattern)))
            .collect()
    })
}

fn re_command_verbs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(?:(?:show\s+me|find|search|get|list|what|how\s+many)\b\s*)+")
            .expect("static pattern compiles")
    })
}

fn re_whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static pattern compiles"))
}

/// Parse free text against today's local date.
pub fn parse(text: &str) -> ParsedQuery {
    parse_with_today(text, Local::now().date_naive())
}

/// Parse with an explicit "today", so relative dates are testable.
pub fn parse_with_today(text: &str, today: NaiveDate) -> ParsedQuery {
    let mut residual = re_command_verbs().replace(text, " ").into_owned();

    // Entity types: each added at most once, in table order, no matter how
    // many of its phrasings matched.
    let mut entity_types: Vec<EntityType> = Vec::new();
    for (entity, patterns) in entity_table() {
        let mut matched = false;
        for re in patterns {
            if re.is_match(&residual) {
                matched = true;
                residual = re.replace_all(&residual, " ").into_owned();
            }
        }
        if matched {
            entity_types.push(*entity);
        }
    }

    // Date range: first phrase in table order wins; every recognized phrase
    // is still stripped from the residual.
    let mut date_range: Option<(NaiveDate, NaiveDate)> = None;
    for (phrase, re) in date_table() {
        if re.is_match(&residual) {
            if date_range.is_none() {
                date_range = Some(range_for(*phrase, today));
            }
            residual = re.replace_all(&residual, " ").into_owned();
        }
    }

    // Privacy levels: collect every matching level, unlike dates.
    let mut privacy_levels: Vec<PrivacyLevel> = Vec::new();
    for (level, re) in privacy_table() {
        if re.is_match(&residual) {
            privacy_levels.push(*level);
            residual = re.replace_all(&residual, " ").into_owned();
        }
    }

    let residual = re_whitespace().replace_all(&residual, " ");
    let residual = residual
        .trim()
        .trim_matches(|c: char| matches!(c, '?' | '!' | '.' | ','))
        .trim();
    let search_text = if residual.is_empty() {
        None
    } else {
        Some(residual.to_string())
    };

    ParsedQuery {
        entity_types: if entity_types.is_empty() {
            None
        } else {
            Some(entity_types)
        },
        start_date: date_range.map(|(start, _)| start),
        end_date: date_range.map(|(_, end)| end),
        privacy_levels: if privacy_levels.is_empty() {
            None
        } else {
            Some(privacy_levels)
        },
        search_text,
        include_private: true,
    }
}

/// Inclusive date range for a relative phrase. Real calendar arithmetic:
/// weeks start Monday, month lengths and leap years are exact, January
/// rolls back into the previous December.
fn range_for(phrase: DatePhrase, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    match phrase {
        DatePhrase::Today => (today, today),
        DatePhrase::Yesterday => {
            let y = today - chrono::Duration::days(1);
            (y, y)
        }
        DatePhrase::ThisWeek => {
            let monday = today - chrono::Duration::days(today.weekday().num_days_from_monday() as i64);
            (monday, monday + chrono::Duration::days(6))
        }
        DatePhrase::LastWeek => {
            let monday = today - chrono::Duration::days(today.weekday().num_days_from_monday() as i64);
            (monday - chrono::Duration::days(7), monday - chrono::Duration::days(1))
        }
        DatePhrase::ThisMonth => month_range(today.year(), today.month()),
        DatePhrase::LastMonth => {
            let (year, month) = if today.month() == 1 {
                (today.year() - 1, 12)
            } else {
                (today.year(), today.month() - 1)
            };
            month_range(year, month)
        }
        DatePhrase::ThisYear => (
            NaiveDate::from_ymd_opt(today.year(), 1, 1).expect("Jan 1 is valid"),
            NaiveDate::from_ymd_opt(today.year(), 12, 31).expect("Dec 31 is valid"),
        ),
    }
}

fn month_range(year: i32, month: u32) -> (NaiveDate, NaiveDate) {
    let start = NaiveDate::from_ymd_opt(year, month, 1).expect("first of month is valid");
    let end = NaiveDate::from_ymd_opt(year, month, days_in_month(year, month))
        .expect("month length is valid");
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_overlapping_session_phrases_dedup_to_one_entity() {
        let parsed = parse_with_today("work sessions time entries hours worked", day(2026, 3, 4));
        assert_eq!(parsed.entity_types, Some(vec![EntityType::WorkSession]));
    }

    #[test]
    fn test_unmatched_entities_yield_none_not_empty() {
        let parsed = parse_with_today("something else entirely", day(2026, 3, 4));
        assert!(parsed.entity_types.is_none());
        assert!(parsed.privacy_levels.is_none());
    }

    #[test]
    fn test_first_date_phrase_wins() {
        let parsed = parse_with_today("today and yesterday and this week", day(2026, 3, 4));
        assert_eq!(parsed.start_date, Some(day(2026, 3, 4)));
        assert_eq!(parsed.end_date, Some(day(2026, 3, 4)));
    }

    #[test]
    fn test_this_week_starts_monday() {
        // 2026-03-04 is a Wednesday.
        let parsed = parse_with_today("meetings this week", day(2026, 3, 4));
        assert_eq!(parsed.start_date, Some(day(2026, 3, 2)));
        assert_eq!(parsed.end_date, Some(day(2026, 3, 8)));
    }

    #[test]
    fn test_last_month_rolls_january_into_december() {
        let parsed = parse_with_today("work sessions last month", day(2026, 1, 15));
        assert_eq!(parsed.start_date, Some(day(2025, 12, 1)));
        assert_eq!(parsed.end_date, Some(day(2025, 12, 31)));
    }

    #[test]
    fn test_last_month_respects_leap_february() {
        let parsed = parse_with_today("hours worked last month", day(2024, 3, 10));
        assert_eq!(parsed.start_date, Some(day(2024, 2, 1)));
        assert_eq!(parsed.end_date, Some(day(2024, 2, 29)));
    }

    #[test]
    fn test_this_year_spans_the_calendar_year() {
        let parsed = parse_with_today("notes this year", day(2026, 7, 19));
        assert_eq!(parsed.start_date, Some(day(2026, 1, 1)));
        assert_eq!(parsed.end_date, Some(day(2026, 12, 31)));
    }

    #[test]
    fn test_privacy_levels_collect_all_matches() {
        let parsed = parse_with_today("private and personal notes", day(2026, 3, 4));
        assert_eq!(
            parsed.privacy_levels,
            Some(vec![PrivacyLevel::Private, PrivacyLevel::Personal])
        );
    }

    #[test]
    fn test_residual_text_survives_as_search_text() {
        let parsed = parse_with_today("find notes about the kubernetes migration", day(2026, 3, 4));
        assert_eq!(parsed.entity_types, Some(vec![EntityType::Note]));
        assert_eq!(
            parsed.search_text.as_deref(),
            Some("about the kubernetes migration")
        );
    }

    #[test]
    fn test_fully_consumed_text_yields_no_search_text() {
        let parsed = parse_with_today("show me meetings today", day(2026, 3, 4));
        assert_eq!(parsed.entity_types, Some(vec![EntityType::Meeting]));
        assert!(parsed.search_text.is_none());
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let parsed = parse_with_today("LIST Work Sessions THIS WEEK", day(2026, 3, 4));
        assert_eq!(parsed.entity_types, Some(vec![EntityType::WorkSession]));
        assert!(parsed.start_date.is_some());
    }

    #[test]
    fn test_include_private_is_always_set() {
        assert!(parse_with_today("anything", day(2026, 3, 4)).include_private);
    }
}
