//! System context compilation.
//!
//! Flattens the whole knowledge base into one plain-text document that is
//! prepended to every generation request. The section order is fixed so the
//! model always sees identity first and the answering rules last.

use folio_schema::{DomainFacts, ExpertiseDomain, FactValue, PortfolioProfile};

const DOMAIN_HEADING: &str =
    "DOMAIN-SPECIFIC EXPERTISE (Use this to answer specific domain questions):";

/// Builds the context document. Pure and uncached: the output always reflects
/// the profile passed in.
pub fn compile_context(profile: &PortfolioProfile) -> String {
    let identity = &profile.identity;
    let knowledge = &profile.knowledge;

    let mut sections = Vec::new();

    sections.push(format!(
        "You are an AI assistant helping visitors learn about {}'s portfolio.",
        identity.name
    ));

    let mut personal = format!(
        "PERSONAL INFO:\nName: {}\nTitle: {}\nBio: {}\nEmail: {}\nLocation: {}",
        identity.name, identity.title, identity.bio, identity.email, identity.location
    );
    for highlight in &identity.highlights {
        personal.push('\n');
        personal.push_str(highlight);
    }
    sections.push(personal);

    let skills = profile
        .skill_categories
        .iter()
        .map(|cat| format!("{}: {}", cat.title, cat.skills.join(", ")))
        .collect::<Vec<_>>()
        .join("\n");
    sections.push(format!("SKILLS:\n{skills}"));

    let expertise = knowledge
        .technical_expertise
        .iter()
        .map(|line| format!("- {}: {}", line.label, line.detail))
        .collect::<Vec<_>>()
        .join("\n");
    sections.push(format!("TECHNICAL EXPERTISE:\n{expertise}"));

    let domains = knowledge
        .expertise_domains
        .iter()
        .map(render_domain)
        .collect::<Vec<_>>()
        .join("\n");
    sections.push(format!("{DOMAIN_HEADING}\n{domains}"));

    let projects = profile
        .projects
        .iter()
        .map(|p| {
            format!(
                "- {}: {} (Technologies: {})",
                p.title,
                p.description,
                p.technologies.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    sections.push(format!("PROJECTS:\n{projects}"));

    let notable = knowledge
        .notable_projects
        .iter()
        .map(|n| format!("- {}: {}", n.label, n.summary))
        .collect::<Vec<_>>()
        .join("\n");
    sections.push(format!("NOTABLE PROJECT DETAILS:\n{notable}"));

    let publications = profile
        .publications
        .iter()
        .map(|p| format!("- {} ({}): {}", p.title, p.year, p.summary))
        .collect::<Vec<_>>()
        .join("\n");
    sections.push(format!("RESEARCH & PUBLICATIONS:\n{publications}"));

    let experience = profile
        .experience
        .iter()
        .map(|e| {
            format!(
                "- {} at {} ({} - {}): {}",
                e.title, e.organization, e.start_date, e.end_date, e.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    sections.push(format!("EXPERIENCE & EDUCATION:\n{experience}"));

    // Only continuation lines carry the dash; the first interest follows the heading bare.
    sections.push(format!(
        "RESEARCH INTERESTS:\n{}",
        knowledge.research_interests.join("\n- ")
    ));
    sections.push(format!("RESEARCH FOCUS:\n{}", knowledge.research_focus));
    sections.push(format!(
        "ACHIEVEMENTS:\n{}",
        bullet_list(&knowledge.achievements)
    ));
    sections.push(format!(
        "COLLABORATION INTERESTS:\n{}",
        knowledge.collaboration_interests
    ));
    sections.push(format!("AVAILABILITY:\n{}", knowledge.availability));

    sections.push(answering_rules(profile));

    sections.join("\n\n")
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `"\nMACHINELEARNING:"` followed by one indented line per present fact.
fn render_domain(domain: &ExpertiseDomain) -> String {
    let mut text = format!("\n{}:", domain.domain.to_uppercase());
    for (label, value, separator) in fact_fields(&domain.facts) {
        if let Some(value) = value {
            text.push_str(&format!("\n  {label}: {}", value.joined(separator)));
        }
    }
    text
}

/// Render order of domain facts. Project, certification and publication lists
/// hold full sentences, so they are separated with semicolons.
fn fact_fields(facts: &DomainFacts) -> [(&'static str, Option<&FactValue>, &'static str); 13] {
    [
        ("Skills", facts.skills.as_ref(), ", "),
        ("Projects", facts.projects.as_ref(), "; "),
        ("Certifications", facts.certifications.as_ref(), "; "),
        ("Publications", facts.publications.as_ref(), "; "),
        ("Experience", facts.experience.as_ref(), ", "),
        ("Technologies", facts.technologies.as_ref(), ", "),
        ("Evidence", facts.evidence.as_ref(), ", "),
        ("Deployment", facts.deployment.as_ref(), ", "),
        ("Applications", facts.applications.as_ref(), ", "),
        ("Research", facts.research.as_ref(), ", "),
        ("Knowledge", facts.knowledge.as_ref(), ", "),
        ("Domains", facts.domains.as_ref(), ", "),
        ("Approach", facts.approach.as_ref(), ", "),
    ]
}

fn answering_rules(profile: &PortfolioProfile) -> String {
    let name = &profile.identity.name;
    let email = &profile.identity.email;
    let availability = &profile.knowledge.availability;
    [
        "When answering questions:".to_string(),
        "- Be helpful and concise (2-3 sentences max)".to_string(),
        "- Provide specific, detailed information from the portfolio".to_string(),
        "- For domain-specific questions (e.g., \"frontend experience\", \"machine learning skills\"), use the DOMAIN-SPECIFIC EXPERTISE section to provide comprehensive answers including relevant projects, skills, certifications, and experience".to_string(),
        "- Connect related information across projects, skills, certifications, and experience".to_string(),
        "- Highlight concrete examples and evidence".to_string(),
        format!("- If asked about availability: {availability}"),
        format!("- If asked for contact: Direct them to email {email}"),
        "- If asked about collaborations: Mention research interests and collaboration opportunities".to_string(),
        format!("- If you don't have specific information, say so and suggest asking {name} directly"),
    ]
    .join("\n")
}
