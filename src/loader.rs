use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use scraper::Html;
use tracing::debug;

use crate::error::{ExtractError, Result};
use crate::record::EntryType;

const BROTLI_BUFFER: usize = 4096;

/// Read a scraped page, inflating `.br` archives, and parse it.
pub fn load(path: &Path) -> Result<Html> {
    let source = read_source(path)?;
    Ok(Html::parse_document(&source))
}

pub fn read_source(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let bytes = if path.extension().is_some_and(|ext| ext == "br") {
        inflate(path, &bytes)?
    } else {
        bytes
    };
    String::from_utf8(bytes).map_err(|_| ExtractError::Encoding {
        path: path.to_path_buf(),
    })
}

fn inflate(path: &Path, compressed: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(compressed.len() * 4);
    brotli::Decompressor::new(compressed, BROTLI_BUFFER)
        .read_to_end(&mut out)
        .map_err(|source| ExtractError::Decompress {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(out)
}

/// Entry type and id declared by a file name such as `compound-50835.html.br`.
///
/// The type is the first `-` token of the base name; the id is the number
/// between the last `-` and the following `.`, when there is one.
pub fn parse_file_name(path: &Path) -> Result<(EntryType, Option<u32>)> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let type_token = name.split('-').next().unwrap_or_default();
    let entry_type = EntryType::from_name(type_token).ok_or_else(|| ExtractError::TypeMismatch {
        declared: name.to_string(),
        found: format!("unknown entry type {type_token:?}"),
    })?;
    let id = name
        .rsplit('-')
        .next()
        .and_then(|tail| tail.split('.').next())
        .and_then(|token| token.parse::<u32>().ok());
    Ok((entry_type, id))
}

fn is_page(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    name.ends_with(".html") || name.ends_with(".html.br") || name.ends_with(".htm")
}

/// Expand files and directories (recursively) into a sorted, de-duplicated page list.
pub fn discover(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for path in paths {
        walk(path, &mut found)?;
    }
    found.sort();
    found.dedup();
    debug!("Discovered {} pages", found.len());
    Ok(found)
}

fn walk(path: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
    let io_err = |source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    };
    if path.is_dir() {
        for entry in fs::read_dir(path).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            walk(&entry.path(), found)?;
        }
    } else if path.is_file() {
        if is_page(path) {
            found.push(path.to_path_buf());
        }
    } else {
        return Err(io_err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no such file or directory",
        )));
    }
    Ok(())
}
