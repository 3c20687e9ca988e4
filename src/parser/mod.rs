pub mod card;
pub mod dom;
pub mod extract;
pub mod meaning;
pub mod summary;

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use tracing::warn;

use crate::error::{ExtractError, Result};
use crate::record::{EntryType, Record, RecordBuilder};
use extract::{credits, identity, incomplete, relations, romanization};

pub use summary::process_summary;

/// Entry URL on the dictionary site. Group 1 is the type segment, group 2 the id.
pub static ENTRY_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:www\.)?cantonese\.sheik\.co\.uk/dictionary/(characters|words|examples)/(\d+)/?$")
        .unwrap()
});

static CANONICAL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("link[rel='canonical'][href]").unwrap());
static OG_URL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta[property='og:url'][content]").unwrap());

/// Detail page pipeline: identity check → card → field groups → record.
///
/// Every field group runs in a fixed order against the same builder. Only a
/// missing card (or headword span) and a type/id mismatch fail the document;
/// credits that match no template are logged and the record is kept.
pub fn process_detail(document: &Html, entry_type: EntryType, cantodict_id: u32) -> Result<Record> {
    check_identity(document, entry_type, cantodict_id)?;
    let card = card::locate(document, entry_type)?;
    let mut record = RecordBuilder::new(entry_type, cantodict_id);

    identity::extract(card, &mut record)?;
    romanization::extract(card, &mut record);
    meaning::extract(card, &mut record)?;
    relations::extract(card, &mut record);
    if let Err(err) = credits::extract(card, &mut record) {
        warn!(id = cantodict_id, %entry_type, error = %err, "Credits not parsed");
    }
    incomplete::extract(card, &mut record);

    Ok(record.build())
}

/// Compare the page's own URL, when it has one, with the declared type and id.
fn check_identity(document: &Html, entry_type: EntryType, cantodict_id: u32) -> Result<()> {
    let Some(self_url) = self_url(document) else {
        return Ok(());
    };
    let Some(caps) = ENTRY_URL_RE.captures(&self_url) else {
        return Ok(());
    };
    let found_type = EntryType::from_url_segment(&caps[1]);
    let found_id = caps[2].parse::<u32>().ok();
    if found_type == Some(entry_type) && found_id == Some(cantodict_id) {
        return Ok(());
    }
    Err(ExtractError::TypeMismatch {
        declared: format!("{entry_type} {cantodict_id}"),
        found: format!("{} {}", &caps[1], &caps[2]),
    })
}

fn self_url(document: &Html) -> Option<String> {
    document
        .select(&CANONICAL)
        .filter_map(|el| el.value().attr("href"))
        .chain(document.select(&OG_URL).filter_map(|el| el.value().attr("content")))
        .map(|url| url.trim().to_string())
        .next()
}
