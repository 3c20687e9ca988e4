use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::warn;

use crate::collect::{Entries, Mode};
use crate::record::{EntryType, Record};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS EntryTypes (
    entry_type TEXT PRIMARY KEY
);
INSERT OR IGNORE INTO EntryTypes (entry_type) VALUES ('character'), ('compound'), ('sentence');

CREATE TABLE IF NOT EXISTS Dialects (
    dialect TEXT PRIMARY KEY
);
INSERT OR IGNORE INTO Dialects (dialect)
    VALUES ('cantonese-only'), ('mandarin-or-written-only'), ('all'), ('unknown');

CREATE TABLE IF NOT EXISTS {prefix}Entries (
    entry_id            INTEGER PRIMARY KEY AUTOINCREMENT,
    chinese             TEXT,
    entry_type          TEXT NOT NULL REFERENCES EntryTypes(entry_type),
    cantodict_id        INTEGER NOT NULL,
    definition          TEXT,
    definition_raw_html TEXT,
    notes               TEXT,
    level               INTEGER,
    jyutping            TEXT,
    pinyin              TEXT,
    dialect             TEXT REFERENCES Dialects(dialect),
    pos                 TEXT,    -- comma-joined, first is the default part of speech
    flag                TEXT,
    views               INTEGER,
    addedby             TEXT,
    created             DATE,
    modified            DATE,
    incomplete          BOOLEAN NOT NULL DEFAULT 0,
    radical             TEXT,
    radical_number      INTEGER,
    stroke_count        INTEGER,
    google_frequency    INTEGER,
    similar             TEXT,
    variants            TEXT,
    character_cantodictids TEXT,
    compound_cantodictids  TEXT,
    sentence_cantodictids  TEXT,
    UNIQUE(entry_type, cantodict_id)
);

CREATE TABLE IF NOT EXISTS {prefix}Variants (
    entry_id INTEGER NOT NULL REFERENCES {prefix}Entries(entry_id) ON DELETE CASCADE,
    ordering INTEGER NOT NULL,
    chinese  TEXT,
    PRIMARY KEY (entry_id, ordering)
);

CREATE TABLE IF NOT EXISTS {prefix}Similars (
    entry_id INTEGER NOT NULL REFERENCES {prefix}Entries(entry_id) ON DELETE CASCADE,
    ordering INTEGER NOT NULL,
    chinese  TEXT,
    PRIMARY KEY (entry_id, ordering)
);

-- related_cantodict_id may point at an entry missing from this export
CREATE TABLE IF NOT EXISTS {prefix}RelatedEntries (
    entry_id             INTEGER NOT NULL REFERENCES {prefix}Entries(entry_id) ON DELETE CASCADE,
    ordering             INTEGER NOT NULL,
    entry_type           TEXT NOT NULL REFERENCES EntryTypes(entry_type),
    related_cantodict_id INTEGER NOT NULL,
    PRIMARY KEY (entry_id, entry_type, ordering)
);
CREATE INDEX IF NOT EXISTS IDX_{prefix}RelatedEntriesEntryType ON {prefix}RelatedEntries(entry_type);
CREATE INDEX IF NOT EXISTS IDX_{prefix}RelatedEntriesEntryId ON {prefix}RelatedEntries(entry_id);
";

/// Table-name prefix per mode; summary data lives beside detail data.
pub fn prefix(mode: Mode) -> &'static str {
    match mode {
        Mode::Detail => "",
        Mode::Summary => "Summary",
    }
}

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let conn = Connection::open(path).with_context(|| format!("opening {}", path.display()))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection, mode: Mode) -> Result<()> {
    conn.execute_batch(&SCHEMA.replace("{prefix}", prefix(mode)))?;
    Ok(())
}

#[derive(Debug, Default, PartialEq)]
pub struct ExportCounts {
    pub entries: usize,
    pub skipped: usize,
    pub variants: usize,
    pub similars: usize,
    pub related: usize,
}

/// Replace the mode's tables with `data` in one transaction.
///
/// An entry stored under a key other than its own `cantodict_id` is skipped
/// with a warning.
pub fn export<'a>(
    conn: &Connection,
    mode: Mode,
    data: impl IntoIterator<Item = (EntryType, &'a Entries)>,
) -> Result<ExportCounts> {
    let p = prefix(mode);
    let mut counts = ExportCounts::default();
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(&format!(
        "DELETE FROM {p}RelatedEntries; DELETE FROM {p}Similars; DELETE FROM {p}Variants; DELETE FROM {p}Entries;"
    ))?;
    {
        let mut e_stmt = tx.prepare(&format!(
            "INSERT INTO {p}Entries
             (chinese, entry_type, cantodict_id, definition, definition_raw_html, notes, level,
              jyutping, pinyin, dialect, pos, flag, views, addedby, created, modified, incomplete,
              radical, radical_number, stroke_count, google_frequency, similar, variants,
              character_cantodictids, compound_cantodictids, sentence_cantodictids)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19,?20,?21,?22,?23,?24,?25,?26)"
        ))?;
        let mut v_stmt = tx.prepare(&format!(
            "INSERT INTO {p}Variants (entry_id, ordering, chinese) VALUES (?1, ?2, ?3)"
        ))?;
        let mut s_stmt = tx.prepare(&format!(
            "INSERT INTO {p}Similars (entry_id, ordering, chinese) VALUES (?1, ?2, ?3)"
        ))?;
        let mut r_stmt = tx.prepare(&format!(
            "INSERT INTO {p}RelatedEntries (entry_id, ordering, entry_type, related_cantodict_id)
             VALUES (?1, ?2, ?3, ?4)"
        ))?;

        for (entry_type, entries) in data {
            for (key, r) in entries {
                if *key != r.cantodict_id || r.entry_type != entry_type {
                    warn!(
                        key,
                        id = r.cantodict_id,
                        declared = %entry_type,
                        found = %r.entry_type,
                        "Skipping entry stored under the wrong key"
                    );
                    counts.skipped += 1;
                    continue;
                }

                e_stmt.execute(rusqlite::params![
                    r.chinese,
                    r.entry_type.as_str(),
                    r.cantodict_id,
                    r.definition,
                    r.definition_raw_html,
                    r.notes,
                    r.level,
                    r.jyutping,
                    r.pinyin,
                    r.dialect.map(|d| d.as_str()),
                    r.pos.join(","),
                    r.flag.join(","),
                    r.views,
                    r.addedby,
                    r.created.map(|d| d.to_string()),
                    r.modified.map(|d| d.to_string()),
                    r.incomplete,
                    r.radical,
                    r.radical_number,
                    r.stroke_count,
                    r.google_frequency,
                    r.similar.join(","),
                    r.variants.join(","),
                    join_ids(&r.character_cantodictids),
                    join_ids(&r.compound_cantodictids),
                    join_ids(&r.sentence_cantodictids),
                ])?;
                let entry_id = tx.last_insert_rowid();
                counts.entries += 1;

                for (i, chinese) in r.variants.iter().enumerate() {
                    counts.variants += v_stmt.execute(rusqlite::params![entry_id, i, chinese])?;
                }
                for (i, chinese) in r.similar.iter().enumerate() {
                    counts.similars += s_stmt.execute(rusqlite::params![entry_id, i, chinese])?;
                }
                for (related_type, ids) in related(r) {
                    for (i, id) in ids.iter().enumerate() {
                        counts.related += r_stmt.execute(rusqlite::params![
                            entry_id,
                            i,
                            related_type.as_str(),
                            id
                        ])?;
                    }
                }
            }
        }
    }
    tx.commit()?;
    Ok(counts)
}

fn related(r: &Record) -> [(EntryType, &[u32]); 3] {
    [
        (EntryType::Character, r.character_cantodictids.as_slice()),
        (EntryType::Compound, r.compound_cantodictids.as_slice()),
        (EntryType::Sentence, r.sentence_cantodictids.as_slice()),
    ]
}

fn join_ids(ids: &[u32]) -> String {
    ids.iter().map(u32::to_string).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Dialect;

    fn memory(mode: Mode) -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
        init_schema(&conn, mode).unwrap();
        conn
    }

    fn compound() -> Record {
        let mut r = Record::new(EntryType::Compound, 50835);
        r.chinese = Some("過大海".to_string());
        r.dialect = Some(Dialect::CantoneseOnly);
        r.pos = vec!["verb".to_string(), "noun".to_string()];
        r.variants = vec!["过大海".to_string()];
        r.character_cantodictids = vec![930, 47, 26];
        r.sentence_cantodictids = vec![1205];
        r.created = chrono::NaiveDate::from_ymd_opt(2007, 1, 1);
        r
    }

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn entries_and_children_are_written() {
        let conn = memory(Mode::Detail);
        let entries: Entries = [(50835, compound())].into_iter().collect();
        let counts = export(&conn, Mode::Detail, [(EntryType::Compound, &entries)]).unwrap();
        assert_eq!(
            counts,
            ExportCounts {
                entries: 1,
                skipped: 0,
                variants: 1,
                similars: 0,
                related: 4,
            }
        );

        let (pos, dialect, created, ids): (String, String, String, String) = conn
            .query_row(
                "SELECT pos, dialect, created, character_cantodictids FROM Entries WHERE cantodict_id = 50835",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .unwrap();
        assert_eq!(pos, "verb,noun");
        assert_eq!(dialect, "cantonese-only");
        assert_eq!(created, "2007-01-01");
        assert_eq!(ids, "930,47,26");

        let order: Vec<i64> = conn
            .prepare("SELECT related_cantodict_id FROM RelatedEntries WHERE entry_type = 'character' ORDER BY ordering")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        assert_eq!(order, vec![930, 47, 26]);
    }

    #[test]
    fn mismatched_key_is_skipped() {
        let conn = memory(Mode::Detail);
        let entries: Entries = [(1, compound())].into_iter().collect();
        let counts = export(&conn, Mode::Detail, [(EntryType::Compound, &entries)]).unwrap();
        assert_eq!(counts.entries, 0);
        assert_eq!(counts.skipped, 1);
        assert_eq!(count(&conn, "Entries"), 0);
    }

    #[test]
    fn export_replaces_previous_run() {
        let conn = memory(Mode::Detail);
        let entries: Entries = [(50835, compound())].into_iter().collect();
        export(&conn, Mode::Detail, [(EntryType::Compound, &entries)]).unwrap();
        export(&conn, Mode::Detail, [(EntryType::Compound, &entries)]).unwrap();
        assert_eq!(count(&conn, "Entries"), 1);
        assert_eq!(count(&conn, "Variants"), 1);
        assert_eq!(count(&conn, "RelatedEntries"), 4);
    }

    #[test]
    fn summary_tables_are_prefixed() {
        let conn = memory(Mode::Summary);
        let mut r = Record::new(EntryType::Sentence, 1205);
        r.level = Some(1);
        let entries: Entries = [(1205, r)].into_iter().collect();
        export(&conn, Mode::Summary, [(EntryType::Sentence, &entries)]).unwrap();
        assert_eq!(count(&conn, "SummaryEntries"), 1);
        assert!(conn.prepare("SELECT * FROM Entries").is_err());
    }
}
