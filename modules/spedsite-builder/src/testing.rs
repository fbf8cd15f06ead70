// Test support for the site builder.
//
// - MockEnricher (Enricher): district name → EnrichmentOutcome, records calls
// - write_fixture_inputs: a small but complete data folder on disk

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use spedsite_common::{DistrictRecord, EnrichmentOutcome, EnrichmentPayload};

use crate::enrichment::Enricher;
use crate::loader::InputPaths;

// ---------------------------------------------------------------------------
// MockEnricher
// ---------------------------------------------------------------------------

/// Returns `ServiceFailure` for unregistered districts unless a default
/// outcome is set.
pub struct MockEnricher {
    outcomes: HashMap<String, EnrichmentOutcome>,
    default_outcome: Option<EnrichmentOutcome>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockEnricher {
    pub fn new() -> Self {
        Self {
            outcomes: HashMap::new(),
            default_outcome: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn on_district(mut self, name: &str, outcome: EnrichmentOutcome) -> Self {
        self.outcomes.insert(name.to_string(), outcome);
        self
    }

    pub fn with_default(mut self, outcome: EnrichmentOutcome) -> Self {
        self.default_outcome = Some(outcome);
        self
    }

    /// Shared handle to the district names enrich() was called with.
    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }
}

impl Default for MockEnricher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Enricher for MockEnricher {
    async fn enrich(&self, record: &DistrictRecord) -> EnrichmentOutcome {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(record.name.clone());
        }
        if let Some(outcome) = self.outcomes.get(&record.name) {
            return outcome.clone();
        }
        self.default_outcome.clone().unwrap_or_else(|| {
            EnrichmentOutcome::ServiceFailure(format!("no mock outcome for {}", record.name))
        })
    }
}

/// Success payload mentioning the district by name.
pub fn payload_for(name: &str) -> EnrichmentPayload {
    EnrichmentPayload::new(
        format!("{name} follows NYSED Part 200."),
        format!("<details><summary>Who runs CSE in {name}?</summary><p>The CSE office.</p></details>"),
        r#"{"@context":"https://schema.org","@type":"FAQPage"}"#,
    )
    .expect("fixture payload is valid")
}

// ---------------------------------------------------------------------------
// Fixture data folder
// ---------------------------------------------------------------------------

pub const NAVBAR_HTML: &str = r#"<nav class="site-nav"><a href="/">NY Special Ed</a></nav>"#;
pub const FOOTER_HTML: &str = r#"<footer class="site-footer">Not legal advice.</footer>"#;

/// Write a complete data folder into `dir` and return its paths.
///
/// NYC: District 2 (in the CSE directory), District 31 (not).
/// STATE: Springfield (two matching contact rows), Example CSD (no match).
pub fn write_fixture_inputs(dir: &Path) -> InputPaths {
    let paths = InputPaths::in_dir(dir);
    std::fs::create_dir_all(dir.join("components")).expect("create components dir");
    std::fs::create_dir_all(dir.join("styles")).expect("create styles dir");

    write(
        &paths.nyc_districts,
        "District,URL Slug,Key Neighborhoods,Key Special Ed Focus\n\
         District 2,/nyc-district-2,Midtown; Chelsea,ASD Nest\n\
         District 31,/nyc-district-31,Staten Island,\n",
    );
    write(
        &paths.state_districts,
        "District,URL Slug,Key Neighborhoods,Key Special Ed Focus\n\
         Springfield,/springfield-csd,,\n\
         Example CSD,/example-csd,,\n",
    );
    write(
        &paths.cse_directory,
        r#"{
  "02": {"region": "CSE Region 9", "address": "333 7th Avenue, New York, NY 10001", "phone": "(212) 356-7400"},
  "75": {"region": "District 75", "address": "400 First Avenue, New York, NY 10010", "phone": "(212) 802-1500"}
}"#,
    );
    write(
        &paths.state_contacts,
        " District ,address,phone\n\
         SPRINGFIELD CENTRAL SD,12 Elm Street,(555) 010-0100\n\
         WEST SPRINGFIELD UFSD,99 Oak Road,(555) 010-0199\n",
    );
    write(&paths.navbar, NAVBAR_HTML);
    write(&paths.footer, FOOTER_HTML);
    write(&paths.stylesheets[0], ".site-nav{display:flex}");
    write(&paths.stylesheets[1], "body{margin:0}");

    paths
}

fn write(path: &Path, contents: &str) {
    std::fs::write(path, contents)
        .unwrap_or_else(|e| panic!("write fixture {}: {e}", path.display()));
}
