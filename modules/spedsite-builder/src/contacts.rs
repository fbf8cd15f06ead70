//! Contact resolution for district pages.
//!
//! NYC districts are keyed by the digits in their name ("District 75" → `75`)
//! against the CSE directory. STATE districts are matched by name against the
//! NYSED contact export, first row in file order wins.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use spedsite_common::{
    ContactRecord, DistrictRecord, SourceType, NYC_DEFAULT_PHONE, STATE_DEFAULT_PHONE,
};

use crate::templates::html_escape;

// ---------------------------------------------------------------------------
// CSE directory (NYC)
// ---------------------------------------------------------------------------

/// Fields accept any JSON scalar; numbers and booleans are rendered as their
/// JSON text and `null` as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CseEntry {
    #[serde(default, deserialize_with = "scalar_text")]
    pub region: String,
    #[serde(default, deserialize_with = "scalar_text")]
    pub address: String,
    #[serde(default, deserialize_with = "scalar_text")]
    pub phone: String,
}

fn scalar_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        Value::Null => Ok(String::new()),
        scalar @ (Value::Number(_) | Value::Bool(_)) => Ok(scalar.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a text value, found {other}"
        ))),
    }
}

/// Normalize a district identifier: keep digits only, drop leading zeros.
/// Returns `None` when the input has no digits at all.
pub fn district_key(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let trimmed = digits.trim_start_matches('0');
    Some(if trimmed.is_empty() { "0" } else { trimmed }.to_string())
}

#[derive(Debug, Clone, Default)]
pub struct CseDirectory {
    entries: HashMap<String, CseEntry>,
}

impl CseDirectory {
    /// Build from raw ids. Ids that normalize to the same key keep the first
    /// entry; ids without digits are dropped.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, CseEntry)>) -> Self {
        let mut map = HashMap::new();
        for (raw_id, entry) in entries {
            let Some(key) = district_key(&raw_id) else {
                debug!(id = raw_id.as_str(), "Dropping CSE entry without a numeric id");
                continue;
            };
            map.entry(key).or_insert(entry);
        }
        Self { entries: map }
    }

    pub fn get(&self, key: &str) -> Option<&CseEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// NYSED contact export (STATE)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateContact {
    pub district: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

/// Rows in source file order.
#[derive(Debug, Clone, Default)]
pub struct StateContactDirectory {
    rows: Vec<StateContact>,
}

impl StateContactDirectory {
    pub fn new(rows: Vec<StateContact>) -> Self {
        Self { rows }
    }

    /// First row whose district cell contains `name`, ignoring case.
    /// The match is a literal substring, never a pattern.
    pub fn first_match(&self, name: &str) -> Option<&StateContact> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.rows
            .iter()
            .find(|row| row.district.to_lowercase().contains(&needle))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

pub struct ContactResolver {
    cse: CseDirectory,
    state: StateContactDirectory,
}

impl ContactResolver {
    pub fn new(cse: CseDirectory, state: StateContactDirectory) -> Self {
        Self { cse, state }
    }

    /// Never fails; a miss yields [`ContactRecord::unresolved`].
    pub fn resolve(&self, record: &DistrictRecord) -> ContactRecord {
        match record.source {
            SourceType::Nyc => self.resolve_nyc(&record.name),
            SourceType::State => self.resolve_state(&record.name),
        }
    }

    fn resolve_nyc(&self, name: &str) -> ContactRecord {
        let hit = district_key(name).and_then(|key| self.cse.get(&key).map(|e| (key, e)));
        let Some((key, entry)) = hit else {
            return ContactRecord::unresolved(SourceType::Nyc);
        };

        let heading = format!("{} (Serving District {key})", entry.region);
        ContactRecord {
            contact_html: contact_box(&heading, &entry.address, &entry.phone),
            phone: match entry.phone.trim() {
                "" => NYC_DEFAULT_PHONE.to_string(),
                phone => phone.to_string(),
            },
            ..ContactRecord::unresolved(SourceType::Nyc)
        }
    }

    fn resolve_state(&self, name: &str) -> ContactRecord {
        let Some(row) = self.state.first_match(name) else {
            return ContactRecord::unresolved(SourceType::State);
        };

        let address = row.address.as_deref().map(str::trim).unwrap_or_default();
        let phone = row.phone.as_deref().map(str::trim).unwrap_or_default();
        ContactRecord {
            contact_html: contact_box("Special Education Office", address, phone),
            phone: if phone.is_empty() {
                STATE_DEFAULT_PHONE.to_string()
            } else {
                phone.to_string()
            },
            ..ContactRecord::unresolved(SourceType::State)
        }
    }
}

fn contact_box(heading: &str, address: &str, phone: &str) -> String {
    format!(
        r#"
            <div class="contact-box">
                <h3>{heading}</h3>
                <div class="contact-item"><strong>Address:</strong> {address}</div>
                <div class="contact-item"><strong>Phone:</strong> <a href="tel:{tel}">{phone}</a></div>
            </div>"#,
        heading = html_escape(heading),
        address = html_escape(address),
        tel = html_escape(&tel_target(phone)),
        phone = html_escape(phone),
    )
}

/// Digits and a leading `+` only, as `tel:` links expect.
fn tel_target(phone: &str) -> String {
    phone
        .chars()
        .enumerate()
        .filter(|(i, c)| c.is_ascii_digit() || (*i == 0 && *c == '+'))
        .map(|(_, c)| c)
        .collect()
}
