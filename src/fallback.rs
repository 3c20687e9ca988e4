use std::collections::BTreeMap;
use std::sync::LazyLock;

use serde::Deserialize;

use crate::record::Record;

/// Hand-curated entries that cross-references point at but the site never
/// serves, plus headword → id pairs for summary rows without a usable link.
#[derive(Debug, Deserialize)]
struct FallbackTable {
    version: u32,
    records: Vec<Record>,
    summary_ids: BTreeMap<String, u32>,
}

static TABLE: LazyLock<FallbackTable> = LazyLock::new(|| {
    serde_json::from_str(include_str!("../assets/fallback.json")).unwrap()
});

pub fn version() -> u32 {
    TABLE.version
}

pub fn records() -> &'static [Record] {
    &TABLE.records
}

pub fn summary_id(headword: &str) -> Option<u32> {
    TABLE.summary_ids.get(headword).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Dialect, EntryType};

    #[test]
    fn table_loads() {
        assert_eq!(version(), 1);
        let ids: Vec<u32> = records().iter().map(|r| r.cantodict_id).collect();
        assert_eq!(ids, vec![50835, 50837, 50838]);
        assert!(records().iter().all(|r| r.entry_type == EntryType::Compound));
    }

    #[test]
    fn records_are_complete() {
        let r = &records()[0];
        assert_eq!(r.chinese.as_deref(), Some("過大海"));
        assert_eq!(r.dialect, Some(Dialect::CantoneseOnly));
        assert_eq!(r.pos, vec!["verb"]);
        assert_eq!(r.views, Some(0));
        assert!(r.incomplete);
        assert_eq!(r.character_cantodictids, vec![930, 47, 26]);
        assert!(r.created.is_none());
        assert!(records()[2].variants.is_empty());
    }

    #[test]
    fn summary_headwords() {
        assert_eq!(summary_id("IQ"), Some(31480));
        assert_eq!(summary_id("pat pat"), Some(50177));
        assert_eq!(summary_id("iq"), None);
    }
}
