use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::error::{ExtractError, Result};
use crate::record::EntryType;

static CHARACTER_CARD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table[class*='charactercard']").unwrap());
static WORD_CARD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table[class*='wordcard']").unwrap());
static SENTENCE_CARD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table[class*='sentencecard']").unwrap());

static MEANING_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td[class*='wordmeaning']").unwrap());
static SENTENCE_MEANING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td[class*='wordmeaning'] > div[class*='audioplayer']").unwrap());

/// The info card table holding one entry's data.
pub fn locate(document: &Html, entry_type: EntryType) -> Result<ElementRef<'_>> {
    let (selector, what) = match entry_type {
        EntryType::Character => (&*CHARACTER_CARD, "charactercard table"),
        EntryType::Compound => (&*WORD_CARD, "wordcard table"),
        EntryType::Sentence => (&*SENTENCE_CARD, "sentencecard table"),
    };
    document
        .select(selector)
        .next()
        .ok_or_else(|| ExtractError::structure(what))
}

/// The cell whose children make up the definition. Sentences nest it in the audio player.
pub fn meaning_cell(card: ElementRef<'_>, entry_type: EntryType) -> Result<ElementRef<'_>> {
    let (selector, what) = match entry_type {
        EntryType::Sentence => (&*SENTENCE_MEANING, "wordmeaning audioplayer"),
        _ => (&*MEANING_CELL, "wordmeaning cell"),
    };
    card.select(selector)
        .next()
        .ok_or_else(|| ExtractError::structure(what))
}
