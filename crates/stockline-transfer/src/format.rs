//! # File Format Layer
//!
//! Extension-driven reading and writing of transfer rows.
//!
//! ## Format Detection
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Format Detection                                    │
//! │                                                                         │
//! │  products.csv  ──► FileFormat::Csv   (header-driven, cells trimmed)    │
//! │  products.JSON ──► FileFormat::Json  (case-insensitive extension)      │
//! │  products.xml  ──► FileFormat::Xml   (wrapper element per entity set)  │
//! │  products.txt  ──► TransferError::UnsupportedFormat                    │
//! │                                                                         │
//! │  The same row structs serve all three formats; serde attributes on     │
//! │  them (renames, aliases, defaults) carry the tolerance rules.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## XML Wrapper Documents
//!
//! XML needs a named root element and a named repeating element, which the
//! bare row structs cannot express. Each row type gets a private wrapper:
//!
//! ```text
//! <Products>               <Branches>               <Mappings>
//!   <Product>...</Product>   <Branch>...</Branch>     <Mapping>...</Mapping>
//! </Products>              </Branches>              </Mappings>
//! ```

use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, Trim, WriterBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{TransferError, TransferResult};
use stockline_core::{BranchRow, MappingRow, ProductRow};

// =============================================================================
// Format Detection
// =============================================================================

/// Supported transfer file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Json,
    Xml,
}

impl FileFormat {
    /// Detects the format from a path's extension (case-insensitive).
    ///
    /// ## Example
    /// ```rust
    /// use stockline_transfer::FileFormat;
    /// use std::path::Path;
    ///
    /// assert_eq!(FileFormat::from_path(Path::new("out.CSV")).unwrap(), FileFormat::Csv);
    /// assert!(FileFormat::from_path(Path::new("out.txt")).is_err());
    /// ```
    pub fn from_path(path: &Path) -> TransferResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "csv" => Ok(FileFormat::Csv),
            "json" => Ok(FileFormat::Json),
            "xml" => Ok(FileFormat::Xml),
            _ => Err(TransferError::UnsupportedFormat(
                path.display().to_string(),
            )),
        }
    }
}

// =============================================================================
// WireRow - Per-Type XML Hooks
// =============================================================================

/// A row type that can travel through all three file formats.
///
/// CSV and JSON work uniformly through serde; XML needs the per-type
/// wrapper documents, so each row type supplies its own XML hooks.
pub trait WireRow: Serialize + DeserializeOwned + Clone {
    fn from_xml(text: &str) -> TransferResult<Vec<Self>>;
    fn to_xml(rows: &[Self]) -> TransferResult<String>;
}

fn parse_err(e: impl std::fmt::Display) -> TransferError {
    TransferError::Parse(e.to_string())
}

#[derive(Serialize, Deserialize)]
#[serde(rename = "Products")]
struct ProductsDoc {
    #[serde(rename = "Product", default)]
    rows: Vec<ProductRow>,
}

impl WireRow for ProductRow {
    fn from_xml(text: &str) -> TransferResult<Vec<Self>> {
        let doc: ProductsDoc = quick_xml::de::from_str(text).map_err(parse_err)?;
        Ok(doc.rows)
    }

    fn to_xml(rows: &[Self]) -> TransferResult<String> {
        quick_xml::se::to_string(&ProductsDoc { rows: rows.to_vec() }).map_err(parse_err)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename = "Branches")]
struct BranchesDoc {
    #[serde(rename = "Branch", default)]
    rows: Vec<BranchRow>,
}

impl WireRow for BranchRow {
    fn from_xml(text: &str) -> TransferResult<Vec<Self>> {
        let doc: BranchesDoc = quick_xml::de::from_str(text).map_err(parse_err)?;
        Ok(doc.rows)
    }

    fn to_xml(rows: &[Self]) -> TransferResult<String> {
        quick_xml::se::to_string(&BranchesDoc { rows: rows.to_vec() }).map_err(parse_err)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename = "Mappings")]
struct MappingsDoc {
    #[serde(rename = "Mapping", default)]
    rows: Vec<MappingRow>,
}

impl WireRow for MappingRow {
    fn from_xml(text: &str) -> TransferResult<Vec<Self>> {
        let doc: MappingsDoc = quick_xml::de::from_str(text).map_err(parse_err)?;
        Ok(doc.rows)
    }

    fn to_xml(rows: &[Self]) -> TransferResult<String> {
        quick_xml::se::to_string(&MappingsDoc { rows: rows.to_vec() }).map_err(parse_err)
    }
}

// =============================================================================
// Reading
// =============================================================================

/// Reads all rows from a transfer file, format chosen by extension.
///
/// A syntax error anywhere aborts the whole file: no rows reach the store
/// from a file that cannot be fully parsed.
pub fn read_rows<R: WireRow>(path: &Path) -> TransferResult<Vec<R>> {
    let format = FileFormat::from_path(path)?;
    let text = fs::read_to_string(path)?;

    let rows = match format {
        FileFormat::Csv => read_csv(&text)?,
        FileFormat::Json => serde_json::from_str(&text).map_err(parse_err)?,
        FileFormat::Xml => R::from_xml(&text)?,
    };

    debug!(path = %path.display(), count = rows.len(), "Read transfer rows");
    Ok(rows)
}

/// CSV reading: headers required, cells trimmed, ragged rows tolerated.
/// Missing columns fall back to the row structs' serde defaults.
fn read_csv<R: DeserializeOwned>(text: &str) -> TransferResult<Vec<R>> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record.map_err(parse_err)?);
    }
    Ok(rows)
}

// =============================================================================
// Writing
// =============================================================================

/// Writes rows to a transfer file, format chosen by extension.
///
/// Output is canonical: callers pass rows in store order, the formats add
/// nothing non-deterministic, so identical stores export identical bytes.
pub fn write_rows<R: WireRow>(path: &Path, rows: &[R]) -> TransferResult<()> {
    let format = FileFormat::from_path(path)?;

    let text = match format {
        FileFormat::Csv => write_csv(rows)?,
        FileFormat::Json => serde_json::to_string_pretty(rows).map_err(parse_err)?,
        FileFormat::Xml => R::to_xml(rows)?,
    };

    fs::write(path, text)?;

    debug!(path = %path.display(), count = rows.len(), "Wrote transfer rows");
    Ok(())
}

fn write_csv<R: Serialize>(rows: &[R]) -> TransferResult<String> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(Vec::new());

    for row in rows {
        writer.serialize(row).map_err(parse_err)?;
    }

    let bytes = writer.into_inner().map_err(parse_err)?;
    String::from_utf8(bytes).map_err(parse_err)
}

// =============================================================================
// Unit Tests
// =============================================================================
