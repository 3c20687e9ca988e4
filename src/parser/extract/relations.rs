use std::sync::LazyLock;

use scraper::{ElementRef, Selector};
use tracing::debug;

use crate::record::{EntryType, RecordBuilder};

static CHARACTER_COMPOUNDS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td[class*='cantodictbg1'] > a[href^='http']").unwrap());
static EXAMPLES: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("td[class*='cantodictexamplesblock'] > div[class*='example_in_block'] > a[href^='http']")
        .unwrap()
});
static COMPOUND_CHARACTERS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("td[class*='cantodictcharacterblock'] > span > a[href^='http'][class*='linkchar']")
        .unwrap()
});
static COMPOUND_WORDS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("td[class*='cantodictcharacterblock'] > span > a[href^='http'][class*='wordlink']")
        .unwrap()
});
static SENTENCE_CHARACTERS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("td[class*='cantodictwordblock'] > span > a[href*='/characters/'][class*='linkchar']")
        .unwrap()
});
static SENTENCE_WORDS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("td[class*='cantodictwordblock'] > span > a[href*='/words/'][class*='linkchar']")
        .unwrap()
});

/// Cross-reference ids, in the order the page displays them.
pub fn extract(card: ElementRef<'_>, record: &mut RecordBuilder) {
    match record.entry_type() {
        EntryType::Character => {
            record.compound_cantodictids(link_ids(card, &CHARACTER_COMPOUNDS));
            record.sentence_cantodictids(link_ids(card, &EXAMPLES));
        }
        EntryType::Compound => {
            record.character_cantodictids(link_ids(card, &COMPOUND_CHARACTERS));
            record.compound_cantodictids(link_ids(card, &COMPOUND_WORDS));
            record.sentence_cantodictids(link_ids(card, &EXAMPLES));
        }
        EntryType::Sentence => {
            record.character_cantodictids(link_ids(card, &SENTENCE_CHARACTERS));
            record.compound_cantodictids(link_ids(card, &SENTENCE_WORDS));
        }
    }
}

fn link_ids(card: ElementRef<'_>, selector: &Selector) -> Vec<u32> {
    card.select(selector)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| {
            let id = trailing_id(href);
            if id.is_none() {
                debug!(href, "Link without a numeric id");
            }
            id
        })
        .collect()
}

/// Last non-empty path segment as an integer.
pub fn trailing_id(href: &str) -> Option<u32> {
    href.trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse().ok())
}
