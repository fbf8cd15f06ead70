use std::fmt;

use crate::error::SiteError;

// --- District records ---

/// Which input source a district came from. Decides the contact lookup
/// strategy and the role names used in the generated pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceType {
    Nyc,
    State,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceType::Nyc => write!(f, "NYC"),
            SourceType::State => write!(f, "STATE"),
        }
    }
}

pub const DEFAULT_NEIGHBORHOODS: &str = "NY State";
pub const DEFAULT_FOCUS: &str = "General";

/// One row of a district source. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistrictRecord {
    pub name: String,
    /// Normalized relative path, no leading or trailing `/`.
    pub slug: String,
    pub source: SourceType,
    pub neighborhoods: Option<String>,
    pub special_ed_focus: Option<String>,
}

impl DistrictRecord {
    pub fn new(
        name: impl Into<String>,
        slug: &str,
        source: SourceType,
    ) -> Result<Self, SiteError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(SiteError::Validation("district name is empty".into()));
        }
        let slug = normalize_slug(slug)?;
        Ok(Self {
            name,
            slug,
            source,
            neighborhoods: None,
            special_ed_focus: None,
        })
    }

    pub fn with_context(
        mut self,
        neighborhoods: Option<String>,
        special_ed_focus: Option<String>,
    ) -> Self {
        self.neighborhoods = neighborhoods.filter(|s| !s.trim().is_empty());
        self.special_ed_focus = special_ed_focus.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn neighborhoods_or_default(&self) -> &str {
        self.neighborhoods.as_deref().unwrap_or(DEFAULT_NEIGHBORHOODS)
    }

    pub fn focus_or_default(&self) -> &str {
        self.special_ed_focus.as_deref().unwrap_or(DEFAULT_FOCUS)
    }
}

/// Turn a source slug like `/example-csd` into a safe relative path.
pub fn normalize_slug(raw: &str) -> Result<String, SiteError> {
    let slug = raw.trim().trim_matches('/');
    if slug.is_empty() {
        return Err(SiteError::Validation(format!("slug {raw:?} is empty")));
    }
    if slug.contains('\\') {
        return Err(SiteError::Validation(format!(
            "slug {raw:?} contains a backslash"
        )));
    }
    for component in slug.split('/') {
        if component.is_empty() || component == "." || component == ".." {
            return Err(SiteError::Validation(format!(
                "slug {raw:?} is not a valid relative path"
            )));
        }
    }
    Ok(slug.to_string())
}

// --- Contacts ---

pub const NYC_LEADER_TITLE: &str = "CSE Chairperson";
pub const NYC_ESCALATION_TARGET: &str = "NYC DOE Central Region Office";
pub const NYC_DEFAULT_PHONE: &str = "311";

pub const STATE_LEADER_TITLE: &str = "Director of Special Education";
pub const STATE_ESCALATION_TARGET: &str = "NYSED Special Education Quality Assurance (SEQA)";
pub const STATE_DEFAULT_PHONE: &str = "N/A";

/// Resolved contact details for one district. Every field is renderable;
/// an empty `contact_html` means no directory entry matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRecord {
    pub contact_html: String,
    pub phone: String,
    pub leader_title: String,
    pub escalation_target: String,
}

impl ContactRecord {
    /// The documented contact for a district with no directory match.
    pub fn unresolved(source: SourceType) -> Self {
        match source {
            SourceType::Nyc => Self {
                contact_html: String::new(),
                phone: NYC_DEFAULT_PHONE.to_string(),
                leader_title: NYC_LEADER_TITLE.to_string(),
                escalation_target: NYC_ESCALATION_TARGET.to_string(),
            },
            SourceType::State => Self {
                contact_html: String::new(),
                phone: STATE_DEFAULT_PHONE.to_string(),
                leader_title: STATE_LEADER_TITLE.to_string(),
                escalation_target: STATE_ESCALATION_TARGET.to_string(),
            },
        }
    }

    pub fn is_resolved(&self) -> bool {
        !self.contact_html.is_empty()
    }
}

// --- Enrichment ---

pub const FALLBACK_SUMMARY: &str =
    "Follows NYSED Part 200 regulations for students with disabilities.";
pub const EMPTY_STRUCTURED_DATA: &str = "{}";

/// Model-written content for a district hub page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentPayload {
    summary: String,
    faq_html: String,
    structured_data: String,
}

impl EnrichmentPayload {
    /// Validates every field for direct embedding in a hub page: a non-empty
    /// summary, an FAQ fragment that passes [`check_fragment`], and
    /// structured data that is a JSON object or array. The stored data block
    /// is compact JSON.
    pub fn new(
        summary: impl Into<String>,
        faq_html: impl Into<String>,
        structured_data: &str,
    ) -> Result<Self, SiteError> {
        let summary = summary.into().trim().to_string();
        if summary.is_empty() {
            return Err(SiteError::Validation("authority summary is empty".into()));
        }
        let faq_html = faq_html.into();
        check_fragment(&faq_html)
            .map_err(|reason| SiteError::Validation(format!("FAQ markup rejected: {reason}")))?;
        let data: serde_json::Value = serde_json::from_str(structured_data)
            .map_err(|e| SiteError::Validation(format!("structured data is not JSON: {e}")))?;
        if !(data.is_object() || data.is_array()) {
            return Err(SiteError::Validation(
                "structured data must be a JSON object or array".into(),
            ));
        }
        Ok(Self {
            summary,
            faq_html,
            structured_data: data.to_string(),
        })
    }

    pub fn fallback() -> Self {
        Self {
            summary: FALLBACK_SUMMARY.to_string(),
            faq_html: String::new(),
            structured_data: EMPTY_STRUCTURED_DATA.to_string(),
        }
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn faq_html(&self) -> &str {
        &self.faq_html
    }

    pub fn structured_data(&self) -> &str {
        &self.structured_data
    }
}

/// Elements that never belong in generated FAQ markup.
const FORBIDDEN_ELEMENTS: [&str; 9] = [
    "script", "style", "iframe", "object", "embed", "link", "meta", "base", "form",
];

/// Document-level elements; a fragment may not open or close these.
const DOCUMENT_ELEMENTS: [&str; 4] = ["html", "head", "body", "main"];

/// Container elements whose open and close tags must balance inside the
/// fragment, so it cannot close the hub's own `<section>`.
const BALANCED_ELEMENTS: [&str; 7] =
    ["section", "div", "details", "article", "ul", "ol", "table"];

/// Check that an HTML fragment is safe to inline into a page body.
///
/// Rejects active content (scripts, styles, embeds, inline event handlers,
/// `javascript:` URLs, comments), document-level tags, and unbalanced
/// container tags. Returns the first problem found.
pub fn check_fragment(html: &str) -> Result<(), String> {
    let lower = html.to_ascii_lowercase();
    if lower.contains("<!--") {
        return Err("contains an HTML comment".into());
    }
    if lower.contains("javascript:") {
        return Err("contains a javascript: URL".into());
    }

    let mut depth: Vec<(&str, i32)> =
        BALANCED_ELEMENTS.iter().map(|name| (*name, 0)).collect();
    let mut rest = lower.as_str();
    while let Some(start) = rest.find('<') {
        rest = &rest[start + 1..];
        let (closing, tag) = match rest.strip_prefix('/') {
            Some(after) => (true, after),
            None => (false, rest),
        };
        let name_len = tag
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(tag.len());
        let name = &tag[..name_len];
        if name.is_empty() {
            continue;
        }
        if FORBIDDEN_ELEMENTS.contains(&name) {
            return Err(format!("contains a <{name}> element"));
        }
        if DOCUMENT_ELEMENTS.contains(&name) {
            return Err(format!("contains a document-level <{name}> tag"));
        }
        let tag_end = tag.find('>').unwrap_or(tag.len());
        if has_event_handler(&tag[name_len..tag_end]) {
            return Err(format!("<{name}> carries an inline event handler"));
        }
        if let Some((_, count)) = depth.iter_mut().find(|(n, _)| *n == name) {
            *count += if closing { -1 } else { 1 };
            if *count < 0 {
                return Err(format!("closes a <{name}> it never opened"));
            }
        }
    }

    match depth.iter().find(|(_, count)| *count != 0) {
        Some((name, _)) => Err(format!("leaves a <{name}> unclosed")),
        None => Ok(()),
    }
}

/// Any attribute named `on...` inside a lowercased tag body.
fn has_event_handler(attributes: &str) -> bool {
    attributes
        .split_ascii_whitespace()
        .any(|token| {
            let token = token.trim_start_matches('/');
            let name = token.split('=').next().unwrap_or_default();
            name.len() > 2 && name.starts_with("on") && token.contains('=')
        })
}

/// Result of one enrichment attempt. Failures carry a reason for logging and
/// collapse to [`EnrichmentPayload::fallback`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentOutcome {
    Success(EnrichmentPayload),
    ParseFailure(String),
    ServiceFailure(String),
}

impl EnrichmentOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, EnrichmentOutcome::Success(_))
    }

    pub fn into_payload(self) -> EnrichmentPayload {
        match self {
            EnrichmentOutcome::Success(payload) => payload,
            EnrichmentOutcome::ParseFailure(_) | EnrichmentOutcome::ServiceFailure(_) => {
                EnrichmentPayload::fallback()
            }
        }
    }
}

// --- Shared chrome ---

pub const CSS_LINKS: &str = r#"<link rel="stylesheet" href="/styles/global.css">
<link rel="stylesheet" href="/styles/styles-nav-footer.css">"#;

/// Fragments injected verbatim into every document.
#[derive(Debug, Clone, Default)]
pub struct SharedChrome {
    pub css_links: String,
    pub navbar: String,
    pub footer: String,
}

impl SharedChrome {
    pub fn new(navbar: impl Into<String>, footer: impl Into<String>) -> Self {
        Self {
            css_links: CSS_LINKS.to_string(),
            navbar: navbar.into(),
            footer: footer.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_strips_slashes() {
        assert_eq!(normalize_slug("/example-csd").unwrap(), "example-csd");
        assert_eq!(normalize_slug(" /nyc/district-1/ ").unwrap(), "nyc/district-1");
    }

    #[test]
    fn slug_rejects_traversal_and_empty() {
        assert!(normalize_slug("/../etc").is_err());
        assert!(normalize_slug("a//b").is_err());
        assert!(normalize_slug("/").is_err());
        assert!(normalize_slug("a\\b").is_err());
    }

    #[test]
    fn blank_context_falls_back_to_defaults() {
        let record = DistrictRecord::new("Example CSD", "/example-csd", SourceType::State)
            .unwrap()
            .with_context(Some("  ".into()), None);
        assert_eq!(record.neighborhoods_or_default(), "NY State");
        assert_eq!(record.focus_or_default(), "General");
    }

    #[test]
    fn unresolved_contacts_match_source_defaults() {
        let nyc = ContactRecord::unresolved(SourceType::Nyc);
        assert_eq!(nyc.phone, "311");
        assert_eq!(nyc.leader_title, "CSE Chairperson");
        assert!(!nyc.is_resolved());

        let state = ContactRecord::unresolved(SourceType::State);
        assert_eq!(state.phone, "N/A");
        assert_eq!(state.leader_title, "Director of Special Education");
    }

    #[test]
    fn payload_rejects_empty_summary_and_bad_json() {
        assert!(EnrichmentPayload::new("", "", "{}").is_err());
        assert!(EnrichmentPayload::new("ok", "", "{not json").is_err());
        let payload = EnrichmentPayload::new("ok", "", "{ \"a\" : 1 }").unwrap();
        assert_eq!(payload.structured_data(), r#"{"a":1}"#);
    }

    #[test]
    fn payload_rejects_scalar_structured_data() {
        for data in ["null", "42", "\"text\"", "true"] {
            assert!(EnrichmentPayload::new("ok", "", data).is_err(), "{data}");
        }
        assert!(EnrichmentPayload::new("ok", "", "[]").is_ok());
    }

    #[test]
    fn fragment_accepts_ordinary_faq_markup() {
        let faq = r#"<details><summary>Who runs CSE?</summary><p>The <a href="/cse">office</a>.</p></details>
<div class="faq"><ul><li>One</li><li>Two<br></li></ul></div>"#;
        assert_eq!(check_fragment(faq), Ok(()));
        assert_eq!(check_fragment(""), Ok(()));
        assert_eq!(check_fragment("Plain text with 3 < 4 in it."), Ok(()));
    }

    #[test]
    fn fragment_rejects_active_and_structural_markup() {
        let cases = [
            "<script>alert(1)</script>",
            "<p>ok</p></section></main></body></html>",
            "<SCRIPT src=x></SCRIPT>",
            "<style>body{display:none}</style>",
            r#"<img src="x" onerror="alert(1)">"#,
            r#"<a href="javascript:alert(1)">x</a>"#,
            "<details><summary>Open</summary>",
            "</div><div>",
            "<!-- <p>",
            "<main>",
        ];
        for html in cases {
            assert!(check_fragment(html).is_err(), "{html}");
            assert!(EnrichmentPayload::new("ok", html, "{}").is_err(), "{html}");
        }
    }

    #[test]
    fn failures_collapse_to_fallback() {
        let payload = EnrichmentOutcome::ParseFailure("bad".into()).into_payload();
        assert_eq!(payload, EnrichmentPayload::fallback());
        assert_eq!(payload.summary(), FALLBACK_SUMMARY);
        assert_eq!(payload.structured_data(), "{}");
    }
}
