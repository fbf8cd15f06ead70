//! Hub-page enrichment through a generative model.
//!
//! The adapter never fails: every outcome collapses to an
//! [`EnrichmentPayload`] at the call site, so a district's hub page is always
//! written even when the service is down or answers with junk.

use ai_client::util::strip_code_blocks;
use ai_client::OpenAi;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use spedsite_common::{Config, DistrictRecord, EnrichmentOutcome, EnrichmentPayload};

const SYSTEM_PROMPT: &str = "You write concise, accurate content about New York special education \
for parents. Respond with a single JSON object and nothing else.";

#[async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(&self, record: &DistrictRecord) -> EnrichmentOutcome;
}

// ---------------------------------------------------------------------------
// LlmEnricher
// ---------------------------------------------------------------------------

pub struct LlmEnricher {
    ai: OpenAi,
    max_attempts: u32,
}

impl LlmEnricher {
    pub fn new(ai: OpenAi, max_attempts: u32) -> Self {
        Self {
            ai,
            max_attempts: max_attempts.max(1),
        }
    }

    /// `None` when no API key is configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        let api_key = config.enrichment_api_key.as_deref()?;
        let ai = OpenAi::new(api_key, &config.enrichment_model)
            .with_base_url(&config.enrichment_base_url)
            .with_timeout(config.enrichment_timeout);
        Some(Self::new(ai, config.enrichment_max_attempts))
    }
}

#[async_trait]
impl Enricher for LlmEnricher {
    async fn enrich(&self, record: &DistrictRecord) -> EnrichmentOutcome {
        let prompt = build_prompt(record);
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            match self.ai.json_completion(SYSTEM_PROMPT, prompt.as_str()).await {
                Ok(text) => {
                    debug!(district = record.name.as_str(), attempt, "Enrichment response received");
                    return parse_enrichment(&text);
                }
                Err(e) => {
                    warn!(
                        district = record.name.as_str(),
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Enrichment request failed"
                    );
                    last_error = e.to_string();
                }
            }
        }

        EnrichmentOutcome::ServiceFailure(last_error)
    }
}

// ---------------------------------------------------------------------------
// StaticEnricher
// ---------------------------------------------------------------------------

/// Stand-in when enrichment is switched off. Every district gets the fallback.
pub struct StaticEnricher;

#[async_trait]
impl Enricher for StaticEnricher {
    async fn enrich(&self, _record: &DistrictRecord) -> EnrichmentOutcome {
        EnrichmentOutcome::ServiceFailure("enrichment disabled".to_string())
    }
}

// ---------------------------------------------------------------------------
// Prompt + response handling
// ---------------------------------------------------------------------------

pub fn build_prompt(record: &DistrictRecord) -> String {
    format!(
        r#"Write HTML content for {name} (NY).
Context: {neighborhoods}. Focus: {focus}.

Return a JSON object with exactly these keys:
1. "authority_summary": 2 plain-text sentences on how the district complies with NYSED special education regulations.
2. "faq_html": 3 FAQs for parents in this district, as an HTML fragment.
3. "schema_json": a JSON-LD FAQPage object describing those FAQs."#,
        name = record.name,
        neighborhoods = record.neighborhoods_or_default(),
        focus = record.focus_or_default(),
    )
}

/// Parse a model response into an outcome. Anything short of three usable
/// fields is a [`EnrichmentOutcome::ParseFailure`].
pub fn parse_enrichment(raw: &str) -> EnrichmentOutcome {
    let value: Value = match serde_json::from_str(strip_code_blocks(raw)) {
        Ok(value) => value,
        Err(e) => return EnrichmentOutcome::ParseFailure(format!("response is not JSON: {e}")),
    };
    let Some(fields) = value.as_object() else {
        return EnrichmentOutcome::ParseFailure("response is not a JSON object".to_string());
    };

    let Some(summary) = fields.get("authority_summary").and_then(Value::as_str) else {
        return EnrichmentOutcome::ParseFailure("missing authority_summary".to_string());
    };
    let Some(faq_html) = fields.get("faq_html").and_then(Value::as_str) else {
        return EnrichmentOutcome::ParseFailure("missing faq_html".to_string());
    };
    let structured_data = match fields.get("schema_json") {
        Some(Value::String(text)) => text.clone(),
        Some(inline @ (Value::Object(_) | Value::Array(_))) => inline.to_string(),
        Some(_) => {
            return EnrichmentOutcome::ParseFailure("schema_json has an unusable type".to_string())
        }
        None => return EnrichmentOutcome::ParseFailure("missing schema_json".to_string()),
    };

    match EnrichmentPayload::new(summary, faq_html, &structured_data) {
        Ok(payload) => EnrichmentOutcome::Success(payload),
        Err(e) => EnrichmentOutcome::ParseFailure(e.to_string()),
    }
}
