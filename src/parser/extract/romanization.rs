use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

use crate::parser::dom;
use crate::record::RecordBuilder;

static JYUTPING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span[class*='cardjyutping']").unwrap());
static PINYIN: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span[class*='cardpinyin']").unwrap());

/// Jyutping and pinyin spans anywhere under the card, not just the meaning cell.
pub fn extract(card: ElementRef<'_>, record: &mut RecordBuilder) {
    if let Some(jyutping) = spans_text(card, &JYUTPING) {
        record.jyutping(jyutping);
    }
    if let Some(pinyin) = spans_text(card, &PINYIN) {
        record.pinyin(pinyin);
    }
}

fn spans_text(card: ElementRef<'_>, selector: &Selector) -> Option<String> {
    let text = card
        .select(selector)
        .map(dom::text_of)
        .collect::<Vec<_>>()
        .join(" ");
    let text = dom::normalize_space(&text);
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::EntryType;
    use scraper::Html;

    #[test]
    fn syllables_are_space_separated() {
        let doc = Html::parse_fragment(
            "<table><tr><td><span class='cardjyutping'>gwo3  daai6\n hoi2</span></td>\
             <td><span class='cardpinyin'>guo4 da4 hai3</span></td></tr></table>",
        );
        let card = doc.select(&Selector::parse("table").unwrap()).next().unwrap();
        let mut record = RecordBuilder::new(EntryType::Compound, 1);
        extract(card, &mut record);
        let r = record.build();
        assert_eq!(r.jyutping.as_deref(), Some("gwo3 daai6 hoi2"));
        assert_eq!(r.pinyin.as_deref(), Some("guo4 da4 hai3"));
    }

    #[test]
    fn missing_spans_leave_fields_absent() {
        let doc = Html::parse_fragment("<table><tr><td>nothing</td></tr></table>");
        let card = doc.select(&Selector::parse("table").unwrap()).next().unwrap();
        let mut record = RecordBuilder::new(EntryType::Character, 1);
        extract(card, &mut record);
        let r = record.build();
        assert!(r.jyutping.is_none());
        assert!(r.pinyin.is_none());
    }
}
