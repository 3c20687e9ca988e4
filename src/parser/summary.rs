use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::dom;
use super::extract::attributes::leading_number;
use super::ENTRY_URL_RE;
use crate::error::{ExtractError, Result};
use crate::fallback;
use crate::record::{Dialect, EntryType, Record, RecordBuilder};

static ROWS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());
static WATERMARK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[www\.cantonese\.sheik\.co\.uk\]").unwrap());
/// The watermark as it appears in markup, with its wrapping span when present.
static WATERMARK_MARKUP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:<span[^>]*>\s*)?\[www\.cantonese\.sheik\.co\.uk\](?:\s*</span>)?").unwrap()
});

/// Column positions for one listing layout. They are fixed per entry type,
/// the header row is never consulted.
#[derive(Debug)]
struct Columns {
    id: usize,
    chinese: usize,
    jyutping: Option<usize>,
    pinyin: Option<usize>,
    definition: usize,
    level: Option<usize>,
    addedby: Option<usize>,
    editbox: usize,
}

impl Columns {
    fn width(&self) -> usize {
        [
            Some(self.id),
            Some(self.chinese),
            self.jyutping,
            self.pinyin,
            Some(self.definition),
            self.level,
            self.addedby,
            Some(self.editbox),
        ]
        .into_iter()
        .flatten()
        .max()
        .map_or(0, |m| m + 1)
    }
}

const CHARACTER_COLUMNS: Columns = Columns {
    id: 0,
    chinese: 0,
    jyutping: Some(1),
    pinyin: Some(2),
    definition: 3,
    level: None,
    addedby: None,
    editbox: 4,
};

const COMPOUND_COLUMNS: Columns = Columns {
    id: 0,
    chinese: 0,
    jyutping: Some(1),
    pinyin: Some(2),
    definition: 3,
    level: Some(5),
    addedby: Some(6),
    editbox: 4,
};

const SENTENCE_COLUMNS: Columns = Columns {
    id: 0,
    chinese: 1,
    jyutping: None,
    pinyin: None,
    definition: 2,
    level: Some(3),
    addedby: Some(4),
    editbox: 4,
};

fn columns(entry_type: EntryType) -> &'static Columns {
    match entry_type {
        EntryType::Character => &CHARACTER_COLUMNS,
        EntryType::Compound => &COMPOUND_COLUMNS,
        EntryType::Sentence => &SENTENCE_COLUMNS,
    }
}

/// One result per entry row in the listing. Rows that fail are returned as
/// errors so the caller can log and skip them.
pub fn process_summary(document: &Html, entry_type: EntryType) -> Vec<Result<Record>> {
    document
        .select(&ROWS)
        .filter(|row| is_entry_row(*row, entry_type))
        .map(|row| process_row(row, entry_type))
        .collect()
}

fn is_entry_row(row: ElementRef<'_>, entry_type: EntryType) -> bool {
    dom::child_elements(row)
        .filter(|cell| dom::tag_is(*cell, &["td"]))
        .any(|cell| match entry_type {
            EntryType::Character => class_contains(cell, "chinese"),
            EntryType::Compound => class_contains(cell, "wl_uni"),
            EntryType::Sentence => dom::child_elements(cell)
                .any(|span| dom::tag_is(span, &["span"]) && class_contains(span, "chinesemed")),
        })
}

fn class_contains(el: ElementRef<'_>, needle: &str) -> bool {
    el.value().attr("class").is_some_and(|c| c.contains(needle))
}

fn process_row(row: ElementRef<'_>, entry_type: EntryType) -> Result<Record> {
    let cols = columns(entry_type);
    let cells: Vec<ElementRef<'_>> = dom::child_elements(row).collect();
    if cells.len() < cols.width() {
        return Err(ExtractError::structure(format!(
            "{} summary columns (row has {}, layout needs {})",
            entry_type,
            cells.len(),
            cols.width()
        )));
    }
    let text = |i: usize| dom::text_of(cells[i]).trim().to_string();

    let chinese = text(cols.chinese);
    let id = resolve_id(cells[cols.id], &chinese)?;
    let mut record = RecordBuilder::new(entry_type, id);

    if !chinese.is_empty() {
        record.chinese(chinese);
    }
    if let Some(jyutping) = cols.jyutping.map(text).filter(|s| !s.is_empty()) {
        record.jyutping(jyutping);
    }
    if let Some(pinyin) = cols.pinyin.map(text).filter(|s| !s.is_empty()) {
        record.pinyin(pinyin);
    }
    let definition_cell = cells[cols.definition];
    let definition = WATERMARK_RE
        .replace(&dom::text_of(definition_cell), "")
        .trim()
        .to_string();
    if !definition.is_empty() {
        let markup = definition_cell.inner_html();
        let raw_html = format!("<div>{}</div>", WATERMARK_MARKUP_RE.replace_all(&markup, "").trim());
        record.definition(definition, raw_html);
    }
    if let Some(level) = cols.level.and_then(|i| leading_number(&text(i))) {
        record.level(level);
    }
    if let Some(addedby) = cols.addedby.map(text).filter(|s| !s.is_empty()) {
        record.addedby(addedby);
    }
    if let Some(dialect) = editbox_dialect(cells[cols.editbox]) {
        record.dialect(dialect);
    }

    Ok(record.build())
}

/// Id from the row's first link, else the static headword table.
fn resolve_id(cell: ElementRef<'_>, chinese: &str) -> Result<u32> {
    let from_link = cell
        .select(&ANCHOR)
        .next()
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| ENTRY_URL_RE.captures(href))
        .and_then(|caps| caps[2].parse::<u32>().ok());
    if let Some(id) = from_link {
        return Ok(id);
    }
    match fallback::summary_id(chinese) {
        Some(id) => {
            debug!(chinese, id, "Summary id recovered from fallback table");
            Ok(id)
        }
        None => Err(ExtractError::IdentifierUnresolved {
            headword: chinese.to_string(),
        }),
    }
}

/// The edit box shows a dialect glyph as its first element when it has more than one.
fn editbox_dialect(cell: ElementRef<'_>) -> Option<Dialect> {
    let children: Vec<_> = dom::child_elements(cell).collect();
    if children.len() <= 1 {
        return None;
    }
    Some(match dom::text_of(children[0]).trim() {
        "?" => Dialect::Unknown,
        "國" => Dialect::MandarinOrWrittenOnly,
        "粵" => Dialect::CantoneseOnly,
        _ => Dialect::All,
    })
}
