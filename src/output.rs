use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::collect::{Collection, Entries, Mode};
use crate::record::EntryType;

/// `<dir>/<mode>-<type>s.json`, e.g. `output/detail-compounds.json`.
pub fn json_path(dir: &Path, mode: Mode, entry_type: EntryType) -> PathBuf {
    dir.join(format!("{}-{}.json", mode, entry_type.plural()))
}

/// One flat JSON object per entry type, keyed by decimal id.
pub fn write_collection(dir: &Path, mode: Mode, collection: &Collection) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let mut written = Vec::with_capacity(EntryType::ALL.len());
    for entry_type in EntryType::ALL {
        let path = json_path(dir, mode, entry_type);
        let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, collection.of(entry_type))
            .with_context(|| format!("writing {}", path.display()))?;
        writer.flush()?;
        written.push(path);
    }
    Ok(written)
}

/// Entries exactly as stored, keyed by the JSON object key.
pub fn read_entries(dir: &Path, mode: Mode, entry_type: EntryType) -> Result<Entries> {
    let path = json_path(dir, mode, entry_type);
    let file = File::open(&path).with_context(|| format!("opening {}", path.display()))?;
    let entries = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(entries)
}

pub fn print_collection(collection: &Collection) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, collection)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    #[test]
    fn file_names_follow_mode_and_type() {
        let p = json_path(Path::new("output"), Mode::Summary, EntryType::Compound);
        assert_eq!(p, PathBuf::from("output/summary-compounds.json"));
    }

    #[test]
    fn written_files_read_back() {
        let dir = std::env::temp_dir().join(format!("cantodict-output-{}", std::process::id()));
        let mut collection = Collection::default();
        let mut record = Record::new(EntryType::Character, 930);
        record.chinese = Some("過".to_string());
        collection.insert(record.clone());

        let written = write_collection(&dir, Mode::Detail, &collection).unwrap();
        assert_eq!(written.len(), 3);

        let characters = read_entries(&dir, Mode::Detail, EntryType::Character).unwrap();
        assert_eq!(characters.get(&930), Some(&record));
        assert!(read_entries(&dir, Mode::Detail, EntryType::Sentence).unwrap().is_empty());

        let raw = fs::read_to_string(json_path(&dir, Mode::Detail, EntryType::Character)).unwrap();
        assert!(raw.starts_with("{\"930\":{"));
        fs::remove_dir_all(&dir).unwrap();
    }
}
