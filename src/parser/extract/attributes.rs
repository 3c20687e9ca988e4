use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};
use tracing::warn;

use crate::error::ExtractError;
use crate::parser::dom::{self, Child};
use crate::record::{Dialect, EntryType, RecordBuilder};

static CANTONESE_ONLY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"This \S+ is used in Cantonese, not Mandarin/Standard written Chinese\.").unwrap()
});
static MANDARIN_ONLY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"This \S+ is used in Mandarin/Standard written Chinese, not Cantonese\.").unwrap()
});
static BOTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"This \S+ is used in both Cantonese and Mandarin/Standard written Chinese\.").unwrap()
});
static RADICAL_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(#(\d+)\)").unwrap());
static LEVEL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Level: \d").unwrap());
static GOOGLE_FREQUENCY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Google Frequency: (.*)").unwrap());

static CHINESE_MED: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span[class*='chinesemed']").unwrap());

/// A meaning-cell child claimed by one of the field extractors.
#[derive(Debug)]
pub enum Attribute<'a> {
    Notes(String),
    PartOfSpeech(String),
    Flag(String),
    StrokeCount(Option<u32>),
    Radical(ElementRef<'a>),
    Dialect(Dialect),
    Level(Option<u32>),
    WordLevel(ElementRef<'a>),
    Player,
}

pub type Rule = for<'a> fn(ElementRef<'a>) -> Option<Attribute<'a>>;

/// Tried first for every entry type, in order.
pub const COMMON_RULES: &[Rule] = &[notes, pos_icon, flag_icon, stroke_count, radical];
const CHARACTER_RULES: &[Rule] = &[dialect, char_level];
const COMPOUND_RULES: &[Rule] = &[word_level];
const SENTENCE_RULES: &[Rule] = &[word_level, player];

pub fn type_rules(entry_type: EntryType) -> &'static [Rule] {
    match entry_type {
        EntryType::Character => CHARACTER_RULES,
        EntryType::Compound => COMPOUND_RULES,
        EntryType::Sentence => SENTENCE_RULES,
    }
}

pub fn classify(el: ElementRef<'_>, entry_type: EntryType) -> Option<Attribute<'_>> {
    COMMON_RULES
        .iter()
        .chain(type_rules(entry_type))
        .find_map(|rule| rule(el))
}

/// Claim `el` for a field group and record its value. Returns whether it was claimed.
pub fn extract(el: ElementRef<'_>, record: &mut RecordBuilder) -> bool {
    match classify(el, record.entry_type()) {
        Some(attr) => {
            apply(attr, record);
            true
        }
        None => false,
    }
}

pub fn apply(attr: Attribute<'_>, record: &mut RecordBuilder) {
    match attr {
        Attribute::Notes(text) => {
            if !text.is_empty() {
                record.notes(text);
            }
        }
        Attribute::PartOfSpeech(pos) => {
            if !pos.is_empty() {
                record.push_pos(pos);
            }
        }
        Attribute::Flag(flag) => {
            if !flag.is_empty() {
                record.push_flag(flag);
            }
        }
        Attribute::StrokeCount(count) => {
            if let Some(count) = count {
                record.stroke_count(count);
            }
        }
        Attribute::Radical(el) => apply_radical(el, record),
        Attribute::Dialect(d) => record.dialect(d),
        Attribute::Level(level) => {
            if let Some(level) = level {
                record.level(level);
            }
        }
        Attribute::WordLevel(el) => apply_word_level(el, record),
        Attribute::Player => {}
    }
}

// ── Rules ──

fn notes(el: ElementRef<'_>) -> Option<Attribute<'_>> {
    dom::has_class(el, "charnotes").then(|| Attribute::Notes(dom::text_of(el).trim().to_string()))
}

fn pos_icon(el: ElementRef<'_>) -> Option<Attribute<'_>> {
    dom::has_class(el, "posicon").then(|| Attribute::PartOfSpeech(alt_text(el)))
}

fn flag_icon(el: ElementRef<'_>) -> Option<Attribute<'_>> {
    dom::has_class(el, "flagicon").then(|| Attribute::Flag(alt_text(el).trim().to_string()))
}

fn stroke_count(el: ElementRef<'_>) -> Option<Attribute<'_>> {
    dom::has_class(el, "charstrokecount")
        .then(|| Attribute::StrokeCount(colon_number(&dom::text_of(el))))
}

fn radical(el: ElementRef<'_>) -> Option<Attribute<'_>> {
    dom::has_class(el, "charradical").then_some(Attribute::Radical(el))
}

fn dialect(el: ElementRef<'_>) -> Option<Attribute<'_>> {
    dom::has_class(el, "typedesc").then(|| Attribute::Dialect(classify_dialect(&dom::text_of(el))))
}

fn char_level(el: ElementRef<'_>) -> Option<Attribute<'_>> {
    dom::has_class(el, "charlevel").then(|| Attribute::Level(colon_number(&dom::text_of(el))))
}

fn word_level(el: ElementRef<'_>) -> Option<Attribute<'_>> {
    dom::has_class(el, "wordlevel").then_some(Attribute::WordLevel(el))
}

/// Embedded flash player in sentence cards.
fn player(el: ElementRef<'_>) -> Option<Attribute<'_>> {
    dom::tag_is(el, &["script", "center"]).then_some(Attribute::Player)
}

// ── Field parsing ──

fn alt_text(el: ElementRef<'_>) -> String {
    el.value().attr("alt").unwrap_or_default().to_string()
}

/// Integer after the last `:`. Zero counts as absent.
pub fn colon_number(text: &str) -> Option<u32> {
    let tail = text.rsplit(':').next().unwrap_or_default();
    leading_number(tail)
}

/// Leading decimal digits of trimmed text. Zero counts as absent.
pub fn leading_number(text: &str) -> Option<u32> {
    let digits: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse::<u32>().ok().filter(|n| *n != 0)
}

/// Every dialect-description node maps to a value; unmatched text is `Unknown`.
pub fn classify_dialect(text: &str) -> Dialect {
    let text = dom::normalize_space(text);
    if CANTONESE_ONLY_RE.is_match(&text) {
        Dialect::CantoneseOnly
    } else if MANDARIN_ONLY_RE.is_match(&text) {
        Dialect::MandarinOrWrittenOnly
    } else if BOTH_RE.is_match(&text) {
        Dialect::All
    } else {
        Dialect::Unknown
    }
}

pub fn parse_google_frequency(text: &str) -> Option<Result<u64, ExtractError>> {
    let caps = GOOGLE_FREQUENCY_RE.captures(text.trim())?;
    let digits: String = caps[1]
        .chars()
        .filter(|c| *c != ',')
        .take_while(|c| c.is_ascii_digit())
        .collect();
    Some(
        digits
            .parse::<u64>()
            .map_err(|_| ExtractError::field("google_frequency", text.trim())),
    )
}

fn apply_radical(el: ElementRef<'_>, record: &mut RecordBuilder) {
    let text = dom::text_of(el);
    let spans: Vec<_> = el.select(&CHINESE_MED).collect();
    if spans.len() > 1 {
        warn!(
            id = record.cantodict_id(),
            count = spans.len(),
            text = %dom::normalize_space(&text),
            "Radical cell has several chinesemed spans, using the first"
        );
    }
    if let Some(span) = spans.first() {
        let radical = dom::text_of(*span).trim().to_string();
        if !radical.is_empty() {
            record.radical(radical);
        }
    }
    match RADICAL_NUMBER_RE
        .captures(&text)
        .and_then(|c| c[1].parse::<u32>().ok())
    {
        Some(0) => {}
        Some(n) => record.radical_number(n),
        None => warn!(
            id = record.cantodict_id(),
            error = %ExtractError::field("radical_number", dom::normalize_space(&text)),
            "Radical number missing"
        ),
    }
}

fn apply_word_level(el: ElementRef<'_>, record: &mut RecordBuilder) {
    for child in dom::children(el) {
        match child {
            Child::Element(e) if dom::has_class(e, "typedesc") => {
                record.dialect(classify_dialect(&dom::text_of(e)));
            }
            Child::Element(e) if dom::tag_is(e, &["small"]) => {
                match parse_google_frequency(&dom::text_of(e)) {
                    Some(Ok(freq)) => record.google_frequency(freq),
                    Some(Err(err)) => warn!(id = record.cantodict_id(), error = %err, "Bad Google frequency"),
                    None => {}
                }
            }
            Child::Element(_) | Child::Text(_) => {
                let text = child.text();
                if LEVEL_RE.is_match(text.trim()) {
                    if let Some(level) = colon_number(&text) {
                        record.level(level);
                    }
                }
            }
            Child::Comment(_) | Child::Other => {}
        }
    }
}
