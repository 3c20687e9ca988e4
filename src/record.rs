use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Character,
    Compound,
    Sentence,
}

impl EntryType {
    pub const ALL: [EntryType; 3] = [EntryType::Character, EntryType::Compound, EntryType::Sentence];

    pub fn as_str(self) -> &'static str {
        match self {
            EntryType::Character => "character",
            EntryType::Compound => "compound",
            EntryType::Sentence => "sentence",
        }
    }

    /// Plural form used for data directories and output files.
    pub fn plural(self) -> &'static str {
        match self {
            EntryType::Character => "characters",
            EntryType::Compound => "compounds",
            EntryType::Sentence => "sentences",
        }
    }

    /// Path segment the dictionary site uses in entry URLs.
    pub fn url_segment(self) -> &'static str {
        match self {
            EntryType::Character => "characters",
            EntryType::Compound => "words",
            EntryType::Sentence => "examples",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    pub fn from_url_segment(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.url_segment() == segment)
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dialect {
    CantoneseOnly,
    MandarinOrWrittenOnly,
    All,
    Unknown,
}

impl Dialect {
    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::CantoneseOnly => "cantonese-only",
            Dialect::MandarinOrWrittenOnly => "mandarin-or-written-only",
            Dialect::All => "all",
            Dialect::Unknown => "unknown",
        }
    }
}

/// One dictionary entry. `None` means the source page did not carry the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub entry_type: EntryType,
    pub cantodict_id: u32,
    pub chinese: Option<String>,
    pub definition: Option<String>,
    pub definition_raw_html: Option<String>,
    pub notes: Option<String>,
    pub jyutping: Option<String>,
    pub pinyin: Option<String>,
    pub dialect: Option<Dialect>,
    #[serde(default)]
    pub pos: Vec<String>,
    #[serde(default)]
    pub flag: Vec<String>,
    pub views: Option<u64>,
    pub level: Option<u32>,
    pub addedby: Option<String>,
    pub created: Option<NaiveDate>,
    pub modified: Option<NaiveDate>,
    #[serde(default)]
    pub incomplete: bool,
    pub radical: Option<String>,
    pub radical_number: Option<u32>,
    pub stroke_count: Option<u32>,
    pub google_frequency: Option<u64>,
    #[serde(default)]
    pub similar: Vec<String>,
    #[serde(default)]
    pub variants: Vec<String>,
    #[serde(default)]
    pub character_cantodictids: Vec<u32>,
    #[serde(default)]
    pub compound_cantodictids: Vec<u32>,
    #[serde(default)]
    pub sentence_cantodictids: Vec<u32>,
}

impl Record {
    pub fn new(entry_type: EntryType, cantodict_id: u32) -> Self {
        Self {
            entry_type,
            cantodict_id,
            chinese: None,
            definition: None,
            definition_raw_html: None,
            notes: None,
            jyutping: None,
            pinyin: None,
            dialect: None,
            pos: Vec::new(),
            flag: Vec::new(),
            views: None,
            level: None,
            addedby: None,
            created: None,
            modified: None,
            incomplete: false,
            radical: None,
            radical_number: None,
            stroke_count: None,
            google_frequency: None,
            similar: Vec::new(),
            variants: Vec::new(),
            character_cantodictids: Vec::new(),
            compound_cantodictids: Vec::new(),
            sentence_cantodictids: Vec::new(),
        }
    }
}

/// Append-only view over a [`Record`] under construction.
///
/// Scalar fields keep the first value written; a later conflicting write is
/// dropped and logged. List fields are either filled once or appended to,
/// never replaced.
pub struct RecordBuilder {
    record: Record,
}

macro_rules! once_setters {
    ($($field:ident: $ty:ty),* $(,)?) => {
        $(
            pub fn $field(&mut self, value: $ty) {
                set_once(&mut self.record.$field, value, stringify!($field));
            }
        )*
    };
}

macro_rules! list_setters {
    ($($field:ident: $ty:ty),* $(,)?) => {
        $(
            pub fn $field(&mut self, values: Vec<$ty>) {
                set_list(&mut self.record.$field, values, stringify!($field));
            }
        )*
    };
}

impl RecordBuilder {
    pub fn new(entry_type: EntryType, cantodict_id: u32) -> Self {
        Self {
            record: Record::new(entry_type, cantodict_id),
        }
    }

    pub fn entry_type(&self) -> EntryType {
        self.record.entry_type
    }

    pub fn cantodict_id(&self) -> u32 {
        self.record.cantodict_id
    }

    once_setters! {
        chinese: String,
        notes: String,
        jyutping: String,
        pinyin: String,
        dialect: Dialect,
        views: u64,
        level: u32,
        addedby: String,
        created: NaiveDate,
        modified: NaiveDate,
        radical: String,
        radical_number: u32,
        stroke_count: u32,
        google_frequency: u64,
    }

    list_setters! {
        similar: String,
        variants: String,
        character_cantodictids: u32,
        compound_cantodictids: u32,
        sentence_cantodictids: u32,
    }

    pub fn definition(&mut self, text: String, raw_html: String) {
        set_once(&mut self.record.definition, text, "definition");
        set_once(&mut self.record.definition_raw_html, raw_html, "definition_raw_html");
    }

    pub fn push_pos(&mut self, pos: String) {
        self.record.pos.push(pos);
    }

    pub fn push_flag(&mut self, flag: String) {
        self.record.flag.push(flag);
    }

    pub fn mark_incomplete(&mut self) {
        self.record.incomplete = true;
    }

    pub fn build(self) -> Record {
        self.record
    }
}

fn set_once<T: PartialEq + fmt::Debug>(slot: &mut Option<T>, value: T, field: &'static str) {
    match slot {
        None => *slot = Some(value),
        Some(existing) if *existing == value => {}
        Some(existing) => {
            debug!(field, ?existing, rejected = ?value, "field already set, keeping first value");
        }
    }
}

fn set_list<T: fmt::Debug>(slot: &mut Vec<T>, values: Vec<T>, field: &'static str) {
    if slot.is_empty() {
        *slot = values;
    } else if !values.is_empty() {
        debug!(field, existing = ?slot, rejected = ?values, "list already filled, keeping first value");
    }
}
