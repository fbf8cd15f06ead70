use spedsite_common::{ContactRecord, DistrictRecord, EnrichmentPayload, SharedChrome};

/// The five documents of a district ecosystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageKind {
    Hub,
    Leadership,
    CseGuide,
    EvaluationGuide,
    DisciplineGuide,
}

impl PageKind {
    pub const ALL: [PageKind; 5] = [
        PageKind::Hub,
        PageKind::Leadership,
        PageKind::CseGuide,
        PageKind::EvaluationGuide,
        PageKind::DisciplineGuide,
    ];

    pub const SUB_PAGES: [PageKind; 4] = [
        PageKind::Leadership,
        PageKind::CseGuide,
        PageKind::EvaluationGuide,
        PageKind::DisciplineGuide,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            PageKind::Hub => "index.html",
            PageKind::Leadership => "leadership-directory.html",
            PageKind::CseGuide => "cse-meeting-guide.html",
            PageKind::EvaluationGuide => "evaluation-process.html",
            PageKind::DisciplineGuide => "discipline-rights.html",
        }
    }

    /// Link target relative to the district directory.
    pub fn relative_href(self) -> String {
        format!("./{}", self.file_name())
    }
}

/// A document to render, carrying exactly the parameters its template uses.
#[derive(Debug, Clone, Copy)]
pub enum Document<'a> {
    Leadership {
        contact_html: &'a str,
        escalation_target: &'a str,
    },
    CseGuide {
        leader_title: &'a str,
    },
    EvaluationGuide {
        leader_title: &'a str,
        phone: &'a str,
    },
    DisciplineGuide,
    Hub {
        leader_title: &'a str,
        enrichment: &'a EnrichmentPayload,
    },
}

impl<'a> Document<'a> {
    /// The four sub-pages for a resolved contact.
    pub fn sub_pages(contact: &'a ContactRecord) -> [Document<'a>; 4] {
        [
            Document::Leadership {
                contact_html: &contact.contact_html,
                escalation_target: &contact.escalation_target,
            },
            Document::CseGuide {
                leader_title: &contact.leader_title,
            },
            Document::EvaluationGuide {
                leader_title: &contact.leader_title,
                phone: &contact.phone,
            },
            Document::DisciplineGuide,
        ]
    }

    pub fn hub(contact: &'a ContactRecord, enrichment: &'a EnrichmentPayload) -> Self {
        Document::Hub {
            leader_title: &contact.leader_title,
            enrichment,
        }
    }

    pub fn kind(&self) -> PageKind {
        match self {
            Document::Leadership { .. } => PageKind::Leadership,
            Document::CseGuide { .. } => PageKind::CseGuide,
            Document::EvaluationGuide { .. } => PageKind::EvaluationGuide,
            Document::DisciplineGuide => PageKind::DisciplineGuide,
            Document::Hub { .. } => PageKind::Hub,
        }
    }
}

/// Render one complete HTML document.
pub fn render(document: &Document<'_>, district: &DistrictRecord, chrome: &SharedChrome) -> String {
    let name = html_escape(&district.name);
    match *document {
        Document::Leadership {
            contact_html,
            escalation_target,
        } => render_leadership(&name, contact_html, &html_escape(escalation_target), chrome),
        Document::CseGuide { leader_title } => {
            render_cse_guide(&name, &html_escape(leader_title), chrome)
        }
        Document::EvaluationGuide {
            leader_title,
            phone,
        } => render_evaluation_guide(
            &name,
            &html_escape(leader_title),
            &html_escape(phone),
            chrome,
        ),
        Document::DisciplineGuide => render_discipline_guide(&name, chrome),
        Document::Hub {
            leader_title,
            enrichment,
        } => render_hub(&name, &html_escape(leader_title), enrichment, chrome),
    }
}

// ---------------------------------------------------------------------------
// Sub-pages
// ---------------------------------------------------------------------------

fn render_leadership(
    name: &str,
    contacts_html: &str,
    escalation_target: &str,
    chrome: &SharedChrome,
) -> String {
    let content = format!(
        r#"<h1>{name} Leadership Directory</h1>
    <p class="lead">Who to contact for IEPs, Evaluations, and escalations.</p>

    <div class="contact-grid">
        {contacts_html}
    </div>

    <div class="alert-box" style="background: #fff3cd; padding: 20px; margin-top: 30px; border-radius: 8px;">
        <strong>⚠️ Escalation Tip:</strong> If you do not receive a response within 48 hours, document your attempt and escalate to the {escalation_target}.
    </div>"#
    );

    build_page(
        &format!("Special Education Contacts: {name}"),
        &format!("Direct phone numbers and emails for {name} Committee on Special Education (CSE) and leadership."),
        "",
        &sub_page_body(name, &content),
        chrome,
    )
}

fn render_cse_guide(name: &str, leader_title: &str, chrome: &SharedChrome) -> String {
    let content = format!(
        r#"<h1>CSE Meeting Guide: {name}</h1>
    <p class="lead">Navigating your Annual Review or Initial Eligibility meeting.</p>

    <h2>Who Attends?</h2>
    <ul>
        <li><strong>You (The Parent):</strong> You are an equal member of the team.</li>
        <li><strong>District Representative:</strong> Someone qualified to authorize resources (often the {leader_title}).</li>
        <li><strong>School Psychologist:</strong> To interpret evaluation data.</li>
        <li><strong>Special Education Teacher:</strong> To discuss classroom performance.</li>
    </ul>

    <h2>The Agenda</h2>
    <ol>
        <li><strong>Introduction:</strong> Verify all required members are present.</li>
        <li><strong>Present Levels (PLOP):</strong> How is your child doing right now?</li>
        <li><strong>Goals:</strong> What will they achieve in the next 12 months?</li>
        <li><strong>Services &amp; Placement:</strong> ICT, 12:1:1, or General Ed?</li>
    </ol>

    <div class="cta-box">
        <h3>Need a Checklist?</h3>
        <p>Don't walk in unprepared. Download our NY CSE Meeting Checklist.</p>
        <a href="/resources/cse-meeting-checklist.pdf" class="btn">Download Free PDF</a>
    </div>"#
    );

    build_page(
        &format!("CSE Meeting Guide for {name}"),
        &format!("What to expect at a Committee on Special Education (CSE) meeting in {name}. Your rights and agenda."),
        "",
        &sub_page_body(name, &content),
        chrome,
    )
}

fn render_evaluation_guide(
    name: &str,
    leader_title: &str,
    phone: &str,
    chrome: &SharedChrome,
) -> String {
    let content = format!(
        r#"<h1>Evaluation Process: {name}</h1>

    <div class="timeline-box" style="border-left: 4px solid #0056b3; padding-left: 20px;">
        <h3>The 60-Day Rule</h3>
        <p>In New York State, the district has <strong>60 calendar days</strong> from the moment you sign consent to complete evaluations and hold the eligibility meeting.</p>
    </div>

    <h2>Step 1: The Referral</h2>
    <p>You must submit a written letter to the {leader_title}. Do not just ask verbally.</p>
    <p><strong>Send to:</strong> {name} CSE Office<br>
    <strong>Email/Fax:</strong> {phone} (Call to confirm fax number)</p>

    <h2>Step 2: Consent</h2>
    <p>The district will send you a "Consent to Evaluate" form. The clock does not start until you sign and return this.</p>"#
    );

    build_page(
        &format!("Requesting an Evaluation in {name}"),
        &format!("How to request a special education evaluation in {name}. Timelines and process."),
        "",
        &sub_page_body(name, &content),
        chrome,
    )
}

fn render_discipline_guide(name: &str, chrome: &SharedChrome) -> String {
    let content = format!(
        r#"<h1>Discipline &amp; Rights: {name}</h1>

    <h2>Suspensions Over 10 Days</h2>
    <p>If your child is suspended for more than 10 days (consecutive or cumulative), {name} must hold a <strong>Manifestation Determination Review (MDR)</strong>.</p>

    <h3>The Golden Rule</h3>
    <p>They cannot punish your child for behavior that is a result of their disability.</p>

    <h2>Filing a Complaint</h2>
    <p>If you disagree with a decision, you have the right to:</p>
    <ul>
        <li>File a <strong>State Complaint</strong> with NYSED.</li>
        <li>Request <strong>Mediation</strong>.</li>
        <li>File for an <strong>Impartial Hearing</strong> (Due Process).</li>
    </ul>"#
    );

    build_page(
        &format!("Discipline &amp; Disputes in {name}"),
        &format!("Manifestation Determination (MDR) and Superintendent Hearings in {name}."),
        "",
        &sub_page_body(name, &content),
        chrome,
    )
}

/// Every sub-page opens with the single link back to its hub.
fn sub_page_body(name: &str, content: &str) -> String {
    format!(
        r#"<div class="aeo-authority-block">
        <a href="{hub}">← Back to {name} Hub</a>
    </div>
    {content}"#,
        hub = PageKind::Hub.relative_href(),
    )
}

// ---------------------------------------------------------------------------
// Hub
// ---------------------------------------------------------------------------

const CARD_STYLE: &str = "padding: 20px; border: 1px solid #ddd; border-radius: 8px; text-decoration: none; color: inherit; display: block;";

fn render_hub(
    name: &str,
    leader_title: &str,
    enrichment: &EnrichmentPayload,
    chrome: &SharedChrome,
) -> String {
    let cards = [
        (
            PageKind::Leadership,
            "📞 Leadership Directory",
            format!("Phone numbers and emails for {leader_title} and CSE offices."),
        ),
        (
            PageKind::CseGuide,
            "🤝 CSE Meeting Guide",
            "What to expect at your Annual Review or Initial Eligibility meeting.".to_string(),
        ),
        (
            PageKind::EvaluationGuide,
            "📝 Request Evaluation",
            "How to trigger the 60-day timeline for testing.".to_string(),
        ),
        (
            PageKind::DisciplineGuide,
            "⚖️ Discipline &amp; Rights",
            "Suspensions, Manifestation Determination, and Due Process.".to_string(),
        ),
    ]
    .iter()
    .map(|(kind, heading, blurb)| {
        format!(
            r#"
            <a href="{href}" class="hub-card" style="{CARD_STYLE}">
                <h3 style="color: #0056b3; margin-top: 0;">{heading}</h3>
                <p>{blurb}</p>
            </a>
"#,
            href = kind.relative_href(),
        )
    })
    .collect::<String>();

    let content = format!(
        r#"<div class="aeo-authority-block" style="background: #f0f7ff; padding: 20px; border-left: 5px solid #0056b3; margin: 20px 0;">
        {summary}
    </div>
    <h1>{name} Special Education Hub</h1>

    <div class="hub-grid" style="display: grid; grid-template-columns: repeat(auto-fit, minmax(250px, 1fr)); gap: 20px; margin: 40px 0;">
{cards}
    </div>

    <section class="district-faq">
        <h2>Common Questions in {name}</h2>
        {faq_html}
    </section>"#,
        summary = html_escape(enrichment.summary()),
        faq_html = enrichment.faq_html(),
    );

    let head_extra = format!(
        r#"<script type="application/ld+json">{}</script>"#,
        script_safe_json(enrichment.structured_data())
    );

    build_page(
        &format!("{name} Special Education Hub"),
        &format!("Complete guide to Special Education in {name}. Contacts, CSE meetings, and evaluations."),
        &head_extra,
        &content,
        chrome,
    )
}

// ---------------------------------------------------------------------------
// Shared skeleton
// ---------------------------------------------------------------------------

fn build_page(
    title: &str,
    description: &str,
    head_extra: &str,
    content: &str,
    chrome: &SharedChrome,
) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title}</title>
  <meta name="description" content="{description}">
  {css_links}
  {head_extra}
</head>
<body>
  {navbar}
  <main class="container">
    {content}
  </main>
  {footer}
</body>
</html>
"#,
        css_links = chrome.css_links,
        navbar = chrome.navbar,
        footer = chrome.footer,
    )
}

pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// JSON text is embedded inside `<script>`; `</` must not close the element.
fn script_safe_json(json: &str) -> String {
    json.replace("</", "<\\/")
}
