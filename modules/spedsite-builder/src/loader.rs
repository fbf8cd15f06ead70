//! Startup loading of every input the generator needs.
//!
//! Missing or unreadable required inputs are fatal and reported before any
//! output is touched. Individual bad rows are logged and skipped.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use spedsite_common::{DistrictRecord, SharedChrome, SiteError, SourceType};

use crate::contacts::{CseDirectory, CseEntry, StateContact, StateContactDirectory};

/// Where every input lives. Defaults mirror the layout of the data folder.
#[derive(Debug, Clone)]
pub struct InputPaths {
    pub nyc_districts: PathBuf,
    pub state_districts: PathBuf,
    pub cse_directory: PathBuf,
    pub state_contacts: PathBuf,
    pub navbar: PathBuf,
    pub footer: PathBuf,
    /// Optional; copied into `styles/` when present.
    pub stylesheets: Vec<PathBuf>,
}

impl InputPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            nyc_districts: dir.join("nyc_districts.csv"),
            state_districts: dir.join("nys_districts.csv"),
            cse_directory: dir.join("cse_directory.json"),
            state_contacts: dir.join("nysed_contacts.csv"),
            navbar: dir.join("components").join("components-navbar.html"),
            footer: dir.join("components").join("components-footer.html"),
            stylesheets: vec![
                dir.join("styles").join("styles-nav-footer.css"),
                dir.join("styles").join("global.css"),
            ],
        }
    }
}

/// Everything loaded once at startup.
#[derive(Debug)]
pub struct SiteInputs {
    pub nyc: Vec<DistrictRecord>,
    pub state: Vec<DistrictRecord>,
    pub cse: CseDirectory,
    pub state_contacts: StateContactDirectory,
    pub chrome: SharedChrome,
}

pub fn load_inputs(paths: &InputPaths) -> Result<SiteInputs, SiteError> {
    let navbar = read_text(&paths.navbar)?;
    let footer = read_text(&paths.footer)?;

    let nyc = load_districts(&paths.nyc_districts, SourceType::Nyc)?;
    let state = load_districts(&paths.state_districts, SourceType::State)?;
    let cse = load_cse_directory(&paths.cse_directory)?;
    let state_contacts = load_state_contacts(&paths.state_contacts)?;

    info!(
        nyc = nyc.len(),
        state = state.len(),
        cse_entries = cse.len(),
        state_contacts = state_contacts.len(),
        "Inputs loaded"
    );

    Ok(SiteInputs {
        nyc,
        state,
        cse,
        state_contacts,
        chrome: SharedChrome::new(navbar, footer),
    })
}

// ---------------------------------------------------------------------------
// Raw file access
// ---------------------------------------------------------------------------

fn read_required(path: &Path) -> Result<Vec<u8>, SiteError> {
    std::fs::read(path).map_err(|source| SiteError::MissingInput {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a text file as UTF-8, falling back to Latin-1 for legacy exports.
pub fn read_text(path: &Path) -> Result<String, SiteError> {
    Ok(decode_text(read_required(path)?))
}

fn decode_text(bytes: Vec<u8>) -> String {
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => e.into_bytes().iter().map(|&b| b as char).collect(),
    };
    match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

fn csv_reader(text: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes())
}

/// Index of a header, compared case-insensitively after trimming.
fn column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.eq_ignore_ascii_case(name))
}

// ---------------------------------------------------------------------------
// District sources
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct DistrictRow {
    #[serde(rename = "District")]
    district: String,
    #[serde(rename = "URL Slug")]
    slug: String,
    #[serde(rename = "Key Neighborhoods", default)]
    neighborhoods: Option<String>,
    #[serde(rename = "Key Special Ed Focus", default)]
    focus: Option<String>,
}

pub fn load_districts(path: &Path, source: SourceType) -> Result<Vec<DistrictRecord>, SiteError> {
    let text = read_text(path)?;
    parse_districts(&text, source).map_err(|reason| SiteError::parse(path, reason))
}

fn parse_districts(text: &str, source: SourceType) -> Result<Vec<DistrictRecord>, String> {
    let mut reader = csv_reader(text);
    let headers = reader.headers().map_err(|e| e.to_string())?.clone();
    for required in ["District", "URL Slug"] {
        if !headers.iter().any(|h| h == required) {
            return Err(format!("missing required column {required:?}"));
        }
    }

    let mut records = Vec::new();
    for (index, row) in reader.deserialize::<DistrictRow>().enumerate() {
        // Header is line 1.
        let line = index + 2;
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!(%source, line, error = %e, "Skipping unreadable district row");
                continue;
            }
        };
        match DistrictRecord::new(row.district, &row.slug, source) {
            Ok(record) => records.push(record.with_context(row.neighborhoods, row.focus)),
            Err(e) => warn!(%source, line, error = %e, "Skipping invalid district row"),
        }
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// Contact directories
// ---------------------------------------------------------------------------

pub fn load_cse_directory(path: &Path) -> Result<CseDirectory, SiteError> {
    let text = read_text(path)?;
    parse_cse_directory(&text).map_err(|reason| SiteError::parse(path, reason))
}

/// The file must be a JSON object; entries inside it that cannot be read
/// are skipped so one bad entry does not take down the directory.
fn parse_cse_directory(text: &str) -> Result<CseDirectory, String> {
    // BTreeMap keeps collision handling independent of hash order.
    let raw: BTreeMap<String, serde_json::Value> =
        serde_json::from_str(text).map_err(|e| e.to_string())?;

    let mut entries = Vec::with_capacity(raw.len());
    for (id, value) in raw {
        match serde_json::from_value::<CseEntry>(value) {
            Ok(entry) => entries.push((id, entry)),
            Err(e) => warn!(
                id = id.as_str(),
                error = %e,
                "Skipping unreadable CSE directory entry"
            ),
        }
    }
    Ok(CseDirectory::from_entries(entries))
}

pub fn load_state_contacts(path: &Path) -> Result<StateContactDirectory, SiteError> {
    let text = read_text(path)?;
    parse_state_contacts(&text).map_err(|reason| SiteError::parse(path, reason))
}

fn parse_state_contacts(text: &str) -> Result<StateContactDirectory, String> {
    let mut reader = csv_reader(text);
    let headers = reader.headers().map_err(|e| e.to_string())?.clone();
    let district_col = column(&headers, "District")
        .ok_or_else(|| "missing required column \"District\"".to_string())?;
    let address_col = column(&headers, "address");
    let phone_col = column(&headers, "phone");

    let cell = |record: &csv::StringRecord, col: Option<usize>| {
        col.and_then(|c| record.get(c))
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!(line = index + 2, error = %e, "Skipping unreadable contact row");
                continue;
            }
        };
        let Some(district) = cell(&record, Some(district_col)) else {
            continue;
        };
        rows.push(StateContact {
            district,
            address: cell(&record, address_col),
            phone: cell(&record, phone_col),
        });
    }
    Ok(StateContactDirectory::new(rows))
}
