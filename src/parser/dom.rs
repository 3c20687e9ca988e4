use scraper::node::Node;
use scraper::ElementRef;

/// A direct child of an element, as the meaning classifier sees it.
#[derive(Debug, Clone, Copy)]
pub enum Child<'a> {
    Element(ElementRef<'a>),
    Text(&'a str),
    Comment(&'a str),
    Other,
}

impl<'a> Child<'a> {
    /// Markup of the node as it appeared in the page.
    pub fn html(&self) -> String {
        match self {
            Child::Element(el) => el.html(),
            Child::Text(t) => escape_text(t),
            Child::Comment(c) => format!("<!--{}-->", c),
            Child::Other => String::new(),
        }
    }

    /// Concatenated descendant text.
    pub fn text(&self) -> String {
        match self {
            Child::Element(el) => text_of(*el),
            Child::Text(t) => t.to_string(),
            Child::Comment(_) | Child::Other => String::new(),
        }
    }
}

pub fn children(el: ElementRef<'_>) -> impl Iterator<Item = Child<'_>> {
    el.children().map(|node| match node.value() {
        Node::Element(_) => ElementRef::wrap(node).map_or(Child::Other, Child::Element),
        Node::Text(t) => Child::Text(&t.text),
        Node::Comment(c) => Child::Comment(&c.comment),
        _ => Child::Other,
    })
}

pub fn child_elements(el: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    el.children().filter_map(ElementRef::wrap)
}

pub fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect()
}

/// XPath `normalize-space()`: trim and collapse internal whitespace runs.
pub fn normalize_space(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn normalized_text(el: ElementRef<'_>) -> String {
    normalize_space(&text_of(el))
}

/// Exact class-token match.
pub fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

pub fn tag_is(el: ElementRef<'_>, names: &[&str]) -> bool {
    names.contains(&el.value().name())
}

/// Collapse runs of the same character for each character in `chars`.
pub fn squeeze(s: &str, chars: &[char]) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev = None;
    for c in s.chars() {
        if prev == Some(c) && chars.contains(&c) {
            continue;
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    #[test]
    fn squeeze_only_named_chars() {
        assert_eq!(squeeze("a   b\n\n\nc\t\td", &[' ', '\n']), "a b\nc\t\td");
        assert_eq!(squeeze("a \n \n b", &[' ', '\n']), "a \n \n b");
    }

    #[test]
    fn normalize() {
        assert_eq!(normalize_space("  Level:\n  3 "), "Level: 3");
    }

    #[test]
    fn children_keep_text_and_comments() {
        let doc = Html::parse_fragment("<div id=x>one <b>two</b><!-- c --> a&amp;b</div>");
        let sel = Selector::parse("#x").unwrap();
        let div = doc.select(&sel).next().unwrap();
        let kids: Vec<_> = children(div).collect();
        assert_eq!(kids.len(), 4);
        assert!(matches!(kids[0], Child::Text("one ")));
        assert_eq!(kids[1].html(), "<b>two</b>");
        assert_eq!(kids[2].html(), "<!-- c -->");
        assert_eq!(kids[3].html(), " a&amp;b");
        assert_eq!(kids[3].text(), " a&b");
    }

    #[test]
    fn class_tokens_match_exactly() {
        let doc = Html::parse_fragment("<span class='posicon big'>x</span>");
        let sel = Selector::parse("span").unwrap();
        let span = doc.select(&sel).next().unwrap();
        assert!(has_class(span, "posicon"));
        assert!(!has_class(span, "pos"));
    }
}
