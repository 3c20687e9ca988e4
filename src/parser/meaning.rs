use scraper::ElementRef;

use super::card;
use super::dom::{self, Child};
use super::extract::attributes;
use crate::error::Result;
use crate::record::RecordBuilder;

/// Labels that introduce the part-of-speech icons; the icons themselves carry the value.
const POS_LABELS: &[&str] = &["Default PoS:", "Additional PoS:"];
const BREAKS: &[&str] = &["br", "hr"];
const LAYOUT: &[&str] = &["script", "style"];

/// Walk the meaning cell in order. Children claimed by a field extractor feed
/// their fields; everything else becomes the definition.
pub fn extract(card: ElementRef<'_>, record: &mut RecordBuilder) -> Result<()> {
    let cell = card::meaning_cell(card, record.entry_type())?;
    let mut body = Body::default();

    for child in dom::children(cell) {
        if let Child::Element(el) = child {
            if attributes::extract(el, record) {
                continue;
            }
        }
        body.push(child);
    }

    if let Some((text, html)) = body.finish() {
        record.definition(text, html);
    }
    Ok(())
}

/// Plain-text and markup-preserving accumulators for unclaimed children.
#[derive(Debug, Default)]
struct Body {
    text: Vec<String>,
    html: Vec<String>,
}

impl Body {
    fn push(&mut self, child: Child<'_>) {
        self.html.push(child.html());
        match child {
            Child::Element(el) if dom::tag_is(el, BREAKS) => {
                if self.text.last().map(String::as_str) != Some("\n") {
                    self.text.push("\n".to_string());
                }
            }
            Child::Element(el) if dom::tag_is(el, LAYOUT) => {}
            Child::Element(_) | Child::Text(_) => {
                let text = child.text();
                let text = text.trim();
                if !text.is_empty() && !POS_LABELS.contains(&text) {
                    self.text.push(text.to_string());
                }
            }
            Child::Comment(_) | Child::Other => {}
        }
    }

    /// `None` when no definition text was collected, even if whitespace or
    /// layout markup reached the HTML accumulator.
    fn finish(self) -> Option<(String, String)> {
        let text = dom::squeeze(&self.text.join(" "), &[' ', '\n'])
            .trim()
            .to_string();
        if text.is_empty() {
            return None;
        }
        let html = dom::squeeze(&format!("<div>{}</div>", self.html.join(" ")), &[' '])
            .trim()
            .to_string();
        Some((text, html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Dialect, EntryType, Record};
    use scraper::Html;

    fn run(html: &str, entry_type: EntryType) -> Record {
        let doc = Html::parse_document(html);
        let card = card::locate(&doc, entry_type).unwrap();
        let mut record = RecordBuilder::new(entry_type, 1);
        extract(card, &mut record).unwrap();
        record.build()
    }

    #[test]
    fn claimed_children_stay_out_of_definition() {
        let r = run(
            "<table class='charactercard'><tr><td class='wordmeaning'>\
             Default PoS: <img class='posicon' alt='verb'> to pass; to cross<br><br>\
             <div class='charnotes'>See also 过</div>\
             <div class='typedesc'>This character is used in both Cantonese and Mandarin/Standard written Chinese.</div>\
             <div class='charlevel'>Level: 2</div>\
             <hr>(2) to go through\
             </td></tr></table>",
            EntryType::Character,
        );
        assert_eq!(r.pos, vec!["verb"]);
        assert_eq!(r.notes.as_deref(), Some("See also 过"));
        assert_eq!(r.dialect, Some(Dialect::All));
        assert_eq!(r.level, Some(2));
        assert_eq!(r.definition.as_deref(), Some("to pass; to cross \n (2) to go through"));
        let raw = r.definition_raw_html.unwrap();
        assert!(raw.starts_with("<div>Default PoS: to pass"));
        assert!(raw.contains("<br> <br>"));
        assert!(!raw.contains("charnotes"));
        assert!(raw.ends_with("(2) to go through</div>"));
    }

    #[test]
    fn consecutive_breaks_collapse_to_one_newline() {
        let r = run(
            "<table class='wordcard'><tr><td class='wordmeaning'>a<br><br><hr>b</td></tr></table>",
            EntryType::Compound,
        );
        assert_eq!(r.definition.as_deref(), Some("a \n b"));
    }

    #[test]
    fn sentence_player_is_skipped() {
        let r = run(
            "<table class='sentencecard'><tr><td class='wordmeaning'><div class='audioplayer'>\
             <script>var player = 1;</script><center>flash</center>Have you eaten yet?\
             <span class='wordlevel'>Level: 1</span></div></td></tr></table>",
            EntryType::Sentence,
        );
        assert_eq!(r.definition.as_deref(), Some("Have you eaten yet?"));
        assert_eq!(r.level, Some(1));
        assert!(!r.definition_raw_html.unwrap().contains("flash"));
    }

    #[test]
    fn layout_nodes_only_reach_markup() {
        let r = run(
            "<table class='wordcard'><tr><td class='wordmeaning'>food<style>p{}</style></td></tr></table>",
            EntryType::Compound,
        );
        assert_eq!(r.definition.as_deref(), Some("food"));
        assert!(r.definition_raw_html.unwrap().contains("<style>"));
    }

    #[test]
    fn empty_cell_leaves_definition_absent() {
        let r = run(
            "<table class='wordcard'><tr><td class='wordmeaning'><div class='wordlevel'>Level: 2</div></td></tr></table>",
            EntryType::Compound,
        );
        assert!(r.definition.is_none());
        assert!(r.definition_raw_html.is_none());
        assert_eq!(r.level, Some(2));
    }

    #[test]
    fn whitespace_around_claimed_children_leaves_definition_absent() {
        let r = run(
            "<table class='wordcard'><tr><td class='wordmeaning'>\n  <div class='wordlevel'>Level: 2</div>\n</td></tr></table>",
            EntryType::Compound,
        );
        assert!(r.definition.is_none());
        assert!(r.definition_raw_html.is_none());
        assert_eq!(r.level, Some(2));
    }

    #[test]
    fn breaks_alone_are_not_a_definition() {
        let r = run(
            "<table class='wordcard'><tr><td class='wordmeaning'> <br>\n<hr> </td></tr></table>",
            EntryType::Compound,
        );
        assert!(r.definition.is_none());
    }
}
