use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use scraper::{ElementRef, Selector};
use tracing::warn;

use crate::error::{ExtractError, Result};
use crate::parser::dom;
use crate::record::{EntryType, RecordBuilder};

static CREDITS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span[class*='credits']").unwrap());

static CREDITS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"This \S* has been viewed (\d+) times since (.*?), was added by (.*?) on (.*) and last edited on (.*)")
        .unwrap()
});
static CREDITS_NO_EDIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"This \S* has been viewed (\d+) times since (.*?), was added by (.*?) on (.*)").unwrap()
});
static SENTENCE_CREDITS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"This sentence was added by (.*?) and last edited on (.*)").unwrap());
static ORDINAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})(?:st|nd|rd|th)\b").unwrap());

const LAST_EDITED: &str = "and last edited on";
const WEEKDAYS: &[&str] = &[
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
];
const DATE_FORMATS: &[&str] = &[
    "%d %B %Y", "%d %b %Y", "%B %d %Y", "%b %d %Y", "%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d",
];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

#[derive(Debug, Default, PartialEq)]
pub struct Credits {
    pub views: Option<u64>,
    pub addedby: Option<String>,
    pub created: Option<NaiveDate>,
    pub modified: Option<NaiveDate>,
}

/// Views, author and dates from the card's credits blob.
///
/// A blob matching no template is a `FieldParse` error; the caller keeps
/// the rest of the record.
pub fn extract(card: ElementRef<'_>, record: &mut RecordBuilder) -> Result<()> {
    let blob = card
        .select(&CREDITS)
        .map(dom::text_of)
        .collect::<Vec<_>>()
        .join(" ");
    let credits = parse(&blob, record.entry_type())?;

    if let Some(views) = credits.views {
        record.views(views);
    }
    if let Some(addedby) = credits.addedby {
        record.addedby(addedby);
    }
    if let Some(created) = credits.created {
        record.created(created);
    }
    if let Some(modified) = credits.modified {
        record.modified(modified);
    }
    Ok(())
}

pub fn parse(blob: &str, entry_type: EntryType) -> Result<Credits> {
    let text = dom::normalize_space(blob);
    let mut credits = Credits::default();

    // Sentences carry no view count.
    if entry_type == EntryType::Sentence {
        let caps = SENTENCE_CREDITS_RE
            .captures(&text)
            .ok_or_else(|| ExtractError::field("credits", text.as_str()))?;
        credits.addedby = non_empty(&caps[1]);
        credits.modified = date_field("modified", &caps[2]);
        return Ok(credits);
    }

    let template = if text.contains(LAST_EDITED) {
        &*CREDITS_RE
    } else {
        &*CREDITS_NO_EDIT_RE
    };
    let caps = template
        .captures(&text)
        .ok_or_else(|| ExtractError::field("credits", text.as_str()))?;

    credits.views = caps[1].parse().ok();
    credits.addedby = non_empty(&caps[3]);
    credits.created = date_field("created", &caps[4]);
    credits.modified = caps.get(5).and_then(|m| date_field("modified", m.as_str()));
    Ok(credits)
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn date_field(field: &'static str, raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let date = parse_date(raw);
    if date.is_none() {
        warn!(error = %ExtractError::field(field, raw), "Unparsed credits date");
    }
    date
}

/// Lenient date parsing for the site's human-readable dates
/// ("Sunday 27th March 2005", "27 Mar 2005 at 10:02", "2005-03-27").
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim().trim_end_matches('.');
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
    {
        return Some(dt.date());
    }

    let cleaned = ORDINAL_RE.replace_all(raw, "${1}").replace(',', " ");
    let candidate = cleaned
        .split_whitespace()
        .filter(|t| !is_weekday(t))
        .filter(|t| !t.contains(':'))
        .filter(|t| !["at", "am", "pm"].contains(&t.to_ascii_lowercase().as_str()))
        .collect::<Vec<_>>()
        .join(" ");
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(&candidate, f).ok())
}

fn is_weekday(token: &str) -> bool {
    let lower = token.to_ascii_lowercase();
    WEEKDAYS.iter().any(|d| lower == *d || lower == d[..3])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn sentence_credits() {
        let c = parse(
            "This sentence was added by bybell and last edited on Tuesday 8th May 2012",
            EntryType::Sentence,
        )
        .unwrap();
        assert_eq!(c.addedby.as_deref(), Some("bybell"));
        assert_eq!(c.modified, Some(ymd(2012, 5, 8)));
        assert_eq!(c.created, None);
        assert_eq!(c.views, None);
    }

    #[test]
    fn character_credits_without_edit() {
        let c = parse(
            "This character has been viewed 21591 times since 30th Oct 2012, was added by sheik on Sunday 27th March 2005",
            EntryType::Character,
        )
        .unwrap();
        assert_eq!(c.views, Some(21591));
        assert_eq!(c.addedby.as_deref(), Some("sheik"));
        assert_eq!(c.created, Some(ymd(2005, 3, 27)));
        assert_eq!(c.modified, None);
    }

    #[test]
    fn compound_credits_with_edit() {
        let c = parse(
            "This word has been viewed 45 times since 30th Oct 2012, was added by C Chiu on Monday 1st January 2007 and last edited on 2nd Feb 2009 at 10:02",
            EntryType::Compound,
        )
        .unwrap();
        assert_eq!(c.views, Some(45));
        assert_eq!(c.addedby.as_deref(), Some("C Chiu"));
        assert_eq!(c.created, Some(ymd(2007, 1, 1)));
        assert_eq!(c.modified, Some(ymd(2009, 2, 2)));
    }

    #[test]
    fn unmatched_blob_is_field_error() {
        let err = parse("Views: lots", EntryType::Character).unwrap_err();
        assert!(matches!(err, ExtractError::FieldParse { field: "credits", .. }));
        assert!(parse("", EntryType::Sentence).is_err());
    }

    #[test]
    fn unparsable_date_leaves_field_absent() {
        let c = parse(
            "This character has been viewed 3 times since 30th Oct 2012, was added by tym on sometime",
            EntryType::Character,
        )
        .unwrap();
        assert_eq!(c.views, Some(3));
        assert_eq!(c.created, None);
    }

    #[test]
    fn date_shapes() {
        assert_eq!(parse_date("2005-03-27"), Some(ymd(2005, 3, 27)));
        assert_eq!(parse_date("2005-03-27 12:00:01"), Some(ymd(2005, 3, 27)));
        assert_eq!(parse_date("March 27, 2005"), Some(ymd(2005, 3, 27)));
        assert_eq!(parse_date("Sat 3rd Jun 2006."), Some(ymd(2006, 6, 3)));
        assert_eq!(parse_date("yesterday"), None);
    }
}
