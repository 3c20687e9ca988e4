use scraper::ElementRef;

use crate::parser::dom;
use crate::record::RecordBuilder;

const MARKER: &str = "INCOMPLETE";

/// Any element whose normalized text is exactly the marker flags the entry.
pub fn extract(card: ElementRef<'_>, record: &mut RecordBuilder) {
    let marked = card
        .descendants()
        .filter_map(ElementRef::wrap)
        .any(|el| dom::normalized_text(el) == MARKER);
    if marked {
        record.mark_incomplete();
    }
}
