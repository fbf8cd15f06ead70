use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::bootstrap::SiteBootstrapper;
use crate::contacts::ContactResolver;
use crate::enrichment::Enricher;
use crate::loader::{load_inputs, InputPaths, SiteInputs};
use crate::orchestrator::EcosystemOrchestrator;
use crate::stats::BuildStats;

/// Full build: load inputs, prepare the output tree, generate every district.
///
/// Only startup problems are errors. Inputs are loaded before the output
/// root is cleared, so a missing input leaves the previous site untouched.
pub async fn build_site(
    paths: &InputPaths,
    output_root: &Path,
    enricher: Arc<dyn Enricher>,
    delay: Duration,
) -> Result<BuildStats> {
    let SiteInputs {
        nyc,
        state,
        cse,
        state_contacts,
        chrome,
    } = load_inputs(paths)?;

    SiteBootstrapper::new(output_root, paths.stylesheets.clone())
        .prepare()
        .await?;

    let orchestrator = EcosystemOrchestrator::new(
        output_root,
        chrome,
        ContactResolver::new(cse, state_contacts),
        enricher,
    )
    .with_delay(delay);

    Ok(orchestrator.run(nyc.iter().chain(state.iter())).await)
}
