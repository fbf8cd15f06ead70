//! End-to-end site builds against a fixture data folder.
//!
//! Fixture → `build_site()` → assert on the files written under a temp
//! output root. Enrichment is mocked; no network.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use spedsite_builder::loader::InputPaths;
use spedsite_builder::site::build_site;
use spedsite_builder::stats::BuildStats;
use spedsite_builder::templates::PageKind;
use spedsite_builder::testing::{payload_for, write_fixture_inputs, MockEnricher, NAVBAR_HTML};
use spedsite_common::{EnrichmentOutcome, SiteError, FALLBACK_SUMMARY};

const DISTRICTS: [(&str, &str); 4] = [
    ("District 2", "nyc-district-2"),
    ("District 31", "nyc-district-31"),
    ("Springfield", "springfield-csd"),
    ("Example CSD", "example-csd"),
];

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Site {
    _tmp: tempfile::TempDir,
    paths: InputPaths,
    output: PathBuf,
}

fn fixture_site() -> Site {
    let tmp = tempfile::tempdir().unwrap();
    let paths = write_fixture_inputs(&tmp.path().join("data"));
    let output = tmp.path().join("output");
    Site {
        _tmp: tmp,
        paths,
        output,
    }
}

/// Every district succeeds with content derived from its name.
fn succeeding_enricher() -> MockEnricher {
    DISTRICTS.iter().fold(MockEnricher::new(), |mock, (name, _)| {
        mock.on_district(name, EnrichmentOutcome::Success(payload_for(name)))
    })
}

async fn build(site: &Site, enricher: MockEnricher) -> BuildStats {
    build_site(&site.paths, &site.output, Arc::new(enricher), Duration::ZERO)
        .await
        .unwrap()
}

fn page(site: &Site, slug: &str, kind: PageKind) -> String {
    let path = site.output.join(slug).join(kind.file_name());
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}

fn snapshot_tree(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    fn walk(root: &Path, dir: &Path, out: &mut BTreeMap<PathBuf, Vec<u8>>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(root, &path, out);
            } else {
                let rel = path.strip_prefix(root).unwrap().to_path_buf();
                out.insert(rel, std::fs::read(&path).unwrap());
            }
        }
    }
    let mut out = BTreeMap::new();
    walk(root, root, &mut out);
    out
}

// ---------------------------------------------------------------------------
// Contact resolution through the whole pipeline
// ---------------------------------------------------------------------------

#[tokio::test]
async fn nyc_directory_hit_fills_leadership_page() {
    let site = fixture_site();
    build(&site, succeeding_enricher()).await;

    let html = page(&site, "nyc-district-2", PageKind::Leadership);
    assert!(html.contains("CSE Region 9 (Serving District 2)"));
    assert!(html.contains("333 7th Avenue, New York, NY 10001"));
    assert!(html.contains("(212) 356-7400"));
    assert!(html.contains("escalate to the NYC DOE Central Region Office."));
}

#[tokio::test]
async fn nyc_directory_miss_uses_hotline() {
    let site = fixture_site();
    build(&site, succeeding_enricher()).await;

    let leadership = page(&site, "nyc-district-31", PageKind::Leadership);
    assert!(!leadership.contains("contact-box"));

    let evaluation = page(&site, "nyc-district-31", PageKind::EvaluationGuide);
    assert!(evaluation.contains("<strong>Email/Fax:</strong> 311"));
    assert!(evaluation.contains("written letter to the CSE Chairperson."));
}

#[tokio::test]
async fn state_district_takes_first_matching_contact_row() {
    let site = fixture_site();
    build(&site, succeeding_enricher()).await;

    let html = page(&site, "springfield-csd", PageKind::Leadership);
    assert!(html.contains("12 Elm Street"));
    assert!(!html.contains("99 Oak Road"));
    assert!(html.contains("NYSED Special Education Quality Assurance (SEQA)"));
}

#[tokio::test]
async fn unmatched_state_district_gets_state_defaults() {
    let site = fixture_site();
    build(&site, succeeding_enricher()).await;

    let path = site.output.join("example-csd/leadership-directory.html");
    assert!(path.is_file());

    let leadership = page(&site, "example-csd", PageKind::Leadership);
    assert!(!leadership.contains("contact-box"));

    let cse = page(&site, "example-csd", PageKind::CseGuide);
    assert!(cse.contains("(often the Director of Special Education)"));

    let evaluation = page(&site, "example-csd", PageKind::EvaluationGuide);
    assert!(evaluation.contains("<strong>Email/Fax:</strong> N/A"));
}

// ---------------------------------------------------------------------------
// Enrichment degradation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn enrichment_failures_still_write_hub_pages() {
    let site = fixture_site();
    let enricher = MockEnricher::new()
        .on_district("District 2", EnrichmentOutcome::ParseFailure("not json".into()))
        .with_default(EnrichmentOutcome::ServiceFailure("connection refused".into()));
    let stats = build(&site, enricher).await;

    assert_eq!(stats.enrichment_parse_failures, 1);
    assert_eq!(stats.enrichment_service_failures, 3);
    assert_eq!(stats.districts_written, 4);

    for (_, slug) in DISTRICTS {
        let hub = page(&site, slug, PageKind::Hub);
        assert!(hub.contains(FALLBACK_SUMMARY), "{slug}");
        assert!(hub.contains(r#"<script type="application/ld+json">{}</script>"#));
    }
}

#[tokio::test]
async fn successful_enrichment_lands_in_hub() {
    let site = fixture_site();
    build(&site, succeeding_enricher()).await;

    let hub = page(&site, "springfield-csd", PageKind::Hub);
    assert!(hub.contains("Springfield follows NYSED Part 200."));
    assert!(hub.contains("<summary>Who runs CSE in Springfield?</summary>"));
    assert!(hub.contains(r#""@type":"FAQPage""#));
    assert!(hub.contains("Phone numbers and emails for Director of Special Education"));
}

// ---------------------------------------------------------------------------
// Site structure
// ---------------------------------------------------------------------------

#[tokio::test]
async fn every_district_has_five_cross_linked_pages() {
    let site = fixture_site();
    let stats = build(&site, succeeding_enricher()).await;
    assert_eq!(stats.files_written, 20);

    for (_, slug) in DISTRICTS {
        for kind in PageKind::ALL {
            let html = page(&site, slug, kind);
            assert!(html.contains(NAVBAR_HTML), "{slug}/{kind:?} missing navbar");
            let back_links = html.matches(r#"href="./index.html""#).count();
            match kind {
                PageKind::Hub => {
                    assert_eq!(html.matches(r#"href="./"#).count(), 4, "{slug} hub");
                    for sub in PageKind::SUB_PAGES {
                        let href = format!(r#"href="{}""#, sub.relative_href());
                        assert_eq!(html.matches(&href).count(), 1, "{slug} -> {sub:?}");
                    }
                }
                _ => assert_eq!(back_links, 1, "{slug}/{kind:?}"),
            }
        }
    }
}

#[tokio::test]
async fn stylesheets_are_staged() {
    let site = fixture_site();
    build(&site, succeeding_enricher()).await;

    assert!(site.output.join("styles/global.css").is_file());
    assert!(site.output.join("styles/styles-nav-footer.css").is_file());
}

#[tokio::test]
async fn rebuild_is_byte_identical() {
    let site = fixture_site();

    build(&site, succeeding_enricher()).await;
    let first = snapshot_tree(&site.output);

    build(&site, succeeding_enricher()).await;
    let second = snapshot_tree(&site.output);

    assert_eq!(first.len(), 22);
    assert_eq!(first, second);
}

#[tokio::test]
async fn rebuild_clears_districts_no_longer_in_sources() {
    let site = fixture_site();
    std::fs::create_dir_all(site.output.join("retired-district")).unwrap();
    std::fs::write(site.output.join("retired-district/index.html"), "old").unwrap();

    build(&site, succeeding_enricher()).await;

    assert!(!site.output.join("retired-district").exists());
}

// ---------------------------------------------------------------------------
// Startup failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_input_aborts_before_touching_output() {
    let site = fixture_site();
    build(&site, succeeding_enricher()).await;
    let before = snapshot_tree(&site.output);

    std::fs::remove_file(&site.paths.cse_directory).unwrap();
    let err = build_site(
        &site.paths,
        &site.output,
        Arc::new(succeeding_enricher()),
        Duration::ZERO,
    )
    .await
    .unwrap_err();

    let site_err = err.downcast_ref::<SiteError>().expect("SiteError");
    assert!(matches!(site_err, SiteError::MissingInput { .. }));
    assert_eq!(snapshot_tree(&site.output), before);
}

#[tokio::test]
async fn missing_stylesheet_is_not_fatal() {
    let site = fixture_site();
    std::fs::remove_file(&site.paths.stylesheets[0]).unwrap();

    let stats = build(&site, succeeding_enricher()).await;

    assert_eq!(stats.districts_written, 4);
    assert!(site.output.join("styles/global.css").is_file());
    assert!(!site.output.join("styles/styles-nav-footer.css").exists());
}
