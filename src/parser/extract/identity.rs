use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

use crate::error::{ExtractError, Result};
use crate::parser::dom;
use crate::record::{EntryType, RecordBuilder};

static CHINESE_BIGGER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td[class*='chinesebigger']").unwrap());
static CHINESE_BIG: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td[class*='chinesebig']").unwrap());
static SIMILAR_LINKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span[class*='cd_similar'] a[class*='linkchar']").unwrap());
static WORD: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span[class*='word']").unwrap());
static SENTENCE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span[class*='sentence']").unwrap());

/// Headword, variants and similar characters.
pub fn extract(card: ElementRef<'_>, record: &mut RecordBuilder) -> Result<()> {
    match record.entry_type() {
        EntryType::Character => character(card, record),
        EntryType::Compound => compound(card, record)?,
        EntryType::Sentence => {
            let chinese = first_text(card, &SENTENCE).ok_or_else(|| ExtractError::structure("sentence span"))?;
            record.chinese(chinese);
        }
    }
    Ok(())
}

fn character(card: ElementRef<'_>, record: &mut RecordBuilder) {
    let similar: Vec<String> = card
        .select(&SIMILAR_LINKS)
        .map(|a| dom::text_of(a).trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    record.similar(similar);

    let chinese = card
        .select(&CHINESE_BIGGER)
        .map(dom::text_of)
        .collect::<String>()
        .trim()
        .to_string();

    // The "big" selector also matches the "bigger" cell, so the headword is filtered out here.
    let big = card
        .select(&CHINESE_BIG)
        .map(dom::text_of)
        .collect::<Vec<_>>()
        .join(" ");
    let variants: Vec<String> = big
        .split_whitespace()
        .filter(|token| *token != chinese && !token.is_ascii())
        .map(str::to_string)
        .collect();
    record.variants(variants);

    if !chinese.is_empty() {
        record.chinese(chinese);
    }
}

fn compound(card: ElementRef<'_>, record: &mut RecordBuilder) -> Result<()> {
    let chinese = first_text(card, &WORD).ok_or_else(|| ExtractError::structure("word span"))?;
    if let Some(big) = card.select(&CHINESE_BIG).next() {
        let variants: Vec<String> = dom::text_of(big)
            .trim()
            .split('/')
            .map(str::trim)
            .filter(|v| !v.is_empty() && *v != chinese)
            .map(str::to_string)
            .collect();
        record.variants(variants);
    }
    record.chinese(chinese);
    Ok(())
}

fn first_text(card: ElementRef<'_>, selector: &Selector) -> Option<String> {
    card.select(selector)
        .next()
        .map(|el| dom::text_of(el).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::card;
    use scraper::Html;

    fn run(html: &str, entry_type: EntryType) -> Result<crate::record::Record> {
        let doc = Html::parse_document(html);
        let card = card::locate(&doc, entry_type)?;
        let mut record = RecordBuilder::new(entry_type, 1);
        extract(card, &mut record)?;
        Ok(record.build())
    }

    #[test]
    fn character_variants_skip_headword_and_ascii() {
        let r = run(
            "<table class='charactercard'><tr>\
             <td class='chinesebigger'> 過 </td>\
             <td class='chinesebig'>过 (simp) 過</td>\
             <td><span class='cd_similar'><a class='linkchar'>渦</a><a class='linkchar'>鍋</a></span></td>\
             </tr></table>",
            EntryType::Character,
        )
        .unwrap();
        assert_eq!(r.chinese.as_deref(), Some("過"));
        assert_eq!(r.variants, vec!["过"]);
        assert_eq!(r.similar, vec!["渦", "鍋"]);
    }

    #[test]
    fn compound_variants_are_slash_delimited() {
        let r = run(
            "<table class='wordcard'><tr><td class='chinesebig'><span class='word'>過大海</span> / 过大海</td></tr></table>",
            EntryType::Compound,
        )
        .unwrap();
        assert_eq!(r.chinese.as_deref(), Some("過大海"));
        assert_eq!(r.variants, vec!["过大海"]);
    }

    #[test]
    fn compound_without_word_span_fails() {
        let err = run(
            "<table class='wordcard'><tr><td class='chinesebig'>過大海</td></tr></table>",
            EntryType::Compound,
        )
        .unwrap_err();
        assert!(matches!(err, ExtractError::Structure { .. }));
    }

    #[test]
    fn sentence_headword_only() {
        let r = run(
            "<table class='sentencecard'><tr><td><span class='sentence'> 你食咗飯未呀？ </span></td></tr></table>",
            EntryType::Sentence,
        )
        .unwrap();
        assert_eq!(r.chinese.as_deref(), Some("你食咗飯未呀？"));
        assert!(r.variants.is_empty());
    }
}
