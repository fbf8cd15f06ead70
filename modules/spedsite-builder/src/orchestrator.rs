use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use spedsite_common::{DistrictRecord, EnrichmentOutcome, SharedChrome};

use crate::contacts::ContactResolver;
use crate::enrichment::Enricher;
use crate::stats::BuildStats;
use crate::templates::{render, Document};

/// Drives generation of one five-page ecosystem per district.
///
/// Sub-pages are written before enrichment is requested, so a district whose
/// enrichment fails still has a complete set of pages. Per-district errors
/// are logged and counted; they never stop the run.
pub struct EcosystemOrchestrator {
    output_root: PathBuf,
    chrome: SharedChrome,
    resolver: ContactResolver,
    enricher: Arc<dyn Enricher>,
    delay: Duration,
    seen_slugs: HashSet<String>,
    stats: BuildStats,
}

impl EcosystemOrchestrator {
    pub fn new(
        output_root: impl Into<PathBuf>,
        chrome: SharedChrome,
        resolver: ContactResolver,
        enricher: Arc<dyn Enricher>,
    ) -> Self {
        Self {
            output_root: output_root.into(),
            chrome,
            resolver,
            enricher,
            delay: Duration::ZERO,
            seen_slugs: HashSet::new(),
            stats: BuildStats::default(),
        }
    }

    /// Fixed pause after each district, to stay under the enrichment
    /// service's rate limit.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Process every record in order and return the final counters.
    pub async fn run<'r>(
        mut self,
        records: impl IntoIterator<Item = &'r DistrictRecord>,
    ) -> BuildStats {
        for record in records {
            self.process(record).await;
        }
        self.stats
    }

    /// Generate one district. Never returns an error.
    pub async fn process(&mut self, record: &DistrictRecord) {
        self.stats.districts_seen += 1;

        if !self.seen_slugs.insert(record.slug.clone()) {
            warn!(
                district = record.name.as_str(),
                slug = record.slug.as_str(),
                "Slug already generated in this run, skipping district"
            );
            self.stats.duplicate_slugs += 1;
            return;
        }

        info!(
            district = record.name.as_str(),
            slug = record.slug.as_str(),
            source = %record.source,
            "Generating ecosystem"
        );

        match self.generate(record).await {
            Ok(()) => {
                self.stats.districts_written += 1;
                info!(district = record.name.as_str(), "Ecosystem complete");
            }
            Err(e) => {
                self.stats.districts_failed += 1;
                warn!(
                    district = record.name.as_str(),
                    slug = record.slug.as_str(),
                    error = %format!("{e:#}"),
                    "Ecosystem generation failed, continuing with next district"
                );
            }
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    async fn generate(&mut self, record: &DistrictRecord) -> Result<()> {
        let contact = self.resolver.resolve(record);
        if contact.is_resolved() {
            self.stats.contacts_resolved += 1;
        } else {
            self.stats.contacts_missing += 1;
        }

        let dir = self.output_root.join(&record.slug);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("creating {}", dir.display()))?;

        for document in Document::sub_pages(&contact) {
            self.write(&dir, &document, record).await?;
        }

        let outcome = self.enricher.enrich(record).await;
        match &outcome {
            EnrichmentOutcome::Success(_) => self.stats.enrichment_succeeded += 1,
            EnrichmentOutcome::ParseFailure(reason) => {
                self.stats.enrichment_parse_failures += 1;
                warn!(
                    district = record.name.as_str(),
                    reason = reason.as_str(),
                    "Enrichment response unusable, using fallback content"
                );
            }
            EnrichmentOutcome::ServiceFailure(reason) => {
                self.stats.enrichment_service_failures += 1;
                warn!(
                    district = record.name.as_str(),
                    reason = reason.as_str(),
                    "Enrichment unavailable, using fallback content"
                );
            }
        }
        let payload = outcome.into_payload();

        self.write(&dir, &Document::hub(&contact, &payload), record)
            .await
    }

    async fn write(
        &mut self,
        dir: &Path,
        document: &Document<'_>,
        record: &DistrictRecord,
    ) -> Result<()> {
        let path = dir.join(document.kind().file_name());
        let html = render(document, record, &self.chrome);
        tokio::fs::write(&path, html)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        self.stats.files_written += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use spedsite_common::{EnrichmentPayload, SourceType};

    use super::*;
    use crate::contacts::{CseDirectory, StateContactDirectory};
    use crate::templates::PageKind;
    use crate::testing::MockEnricher;

    fn orchestrator(root: &Path, enricher: MockEnricher) -> EcosystemOrchestrator {
        EcosystemOrchestrator::new(
            root,
            SharedChrome::new("<nav></nav>", "<footer></footer>"),
            ContactResolver::new(CseDirectory::default(), StateContactDirectory::default()),
            Arc::new(enricher),
        )
    }

    fn record(name: &str, slug: &str) -> DistrictRecord {
        DistrictRecord::new(name, slug, SourceType::State).unwrap()
    }

    #[tokio::test]
    async fn writes_all_five_documents() {
        let tmp = tempfile::tempdir().unwrap();
        let mut orch = orchestrator(tmp.path(), MockEnricher::new());
        orch.process(&record("Example CSD", "/example-csd")).await;

        for kind in PageKind::ALL {
            assert!(tmp.path().join("example-csd").join(kind.file_name()).is_file());
        }
        assert_eq!(orch.stats().files_written, 5);
        assert_eq!(orch.stats().districts_written, 1);
        assert_eq!(orch.stats().contacts_missing, 1);
    }

    #[tokio::test]
    async fn enrichment_outcomes_are_counted() {
        let tmp = tempfile::tempdir().unwrap();
        let enricher = MockEnricher::new()
            .on_district(
                "Good CSD",
                EnrichmentOutcome::Success(
                    EnrichmentPayload::new("Good CSD complies.", "", "{}").unwrap(),
                ),
            )
            .on_district("Junk CSD", EnrichmentOutcome::ParseFailure("junk".into()));
        let stats = orchestrator(tmp.path(), enricher)
            .run(&[
                record("Good CSD", "/good"),
                record("Junk CSD", "/junk"),
                record("Down CSD", "/down"),
            ])
            .await;

        assert_eq!(stats.enrichment_succeeded, 1);
        assert_eq!(stats.enrichment_parse_failures, 1);
        assert_eq!(stats.enrichment_service_failures, 1);
        assert_eq!(stats.districts_written, 3);
    }

    #[tokio::test]
    async fn duplicate_slug_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let enricher = MockEnricher::new();
        let calls = enricher.calls();
        let stats = orchestrator(tmp.path(), enricher)
            .run(&[record("First", "/same"), record("Second", "/same/")])
            .await;

        assert_eq!(stats.duplicate_slugs, 1);
        assert_eq!(stats.districts_written, 1);
        assert_eq!(calls.lock().unwrap().as_slice(), ["First".to_string()]);
        let hub = std::fs::read_to_string(tmp.path().join("same/index.html")).unwrap();
        assert!(hub.contains("First Special Education Hub"));
    }

    #[tokio::test]
    async fn filesystem_error_fails_one_district_only() {
        let tmp = tempfile::tempdir().unwrap();
        // A regular file where the district directory should go.
        std::fs::write(tmp.path().join("blocked"), "not a directory").unwrap();

        let stats = orchestrator(tmp.path(), MockEnricher::new())
            .run(&[record("Blocked", "/blocked"), record("Fine", "/fine")])
            .await;

        assert_eq!(stats.districts_failed, 1);
        assert_eq!(stats.districts_written, 1);
        assert!(tmp.path().join("fine/index.html").is_file());
    }
}
