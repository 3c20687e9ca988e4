use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// Expected card, cell or column is missing. Fatal to the document (or row).
    #[error("structure: no {what} found")]
    Structure { what: String },

    /// A sub-field's text did not match its pattern. The record is still emitted.
    #[error("could not parse {field} from {text:?}")]
    FieldParse { field: &'static str, text: String },

    #[error("type mismatch: declared {declared}, found {found}")]
    TypeMismatch { declared: String, found: String },

    #[error("no cantodict id for summary row {headword:?}")]
    IdentifierUnresolved { headword: String },

    #[error("reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("decompressing {}: {source}", .path.display())]
    Decompress {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid UTF-8", .path.display())]
    Encoding { path: PathBuf },
}

impl ExtractError {
    pub fn structure(what: impl Into<String>) -> Self {
        ExtractError::Structure { what: what.into() }
    }

    /// Short label for failure summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractError::Structure { .. } => "structure",
            ExtractError::FieldParse { .. } => "field parse",
            ExtractError::TypeMismatch { .. } => "type mismatch",
            ExtractError::IdentifierUnresolved { .. } => "unresolved id",
            ExtractError::Io { .. } | ExtractError::Decompress { .. } | ExtractError::Encoding { .. } => "io",
        }
    }

    pub fn field(field: &'static str, text: impl Into<String>) -> Self {
        ExtractError::FieldParse {
            field,
            text: text.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;
