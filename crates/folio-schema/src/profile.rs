use std::borrow::Cow;
use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Profile bundled into the binary; used when no `profile_path` is configured.
pub const SHIPPED_PROFILE_YAML: &str = include_str!("../data/profile.yaml");

/// Root of the knowledge base. Loaded once at startup and shared read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioProfile {
    pub identity: Identity,
    #[serde(default)]
    pub skill_categories: Vec<SkillCategory>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub publications: Vec<Publication>,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub certifications: Vec<Certification>,
    #[serde(default)]
    pub awards: Vec<Award>,
    #[serde(default)]
    pub languages: Vec<LanguageSkill>,
    /// Extra material that only the chat assistant consumes.
    #[serde(default)]
    pub knowledge: ChatbotKnowledge,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub bio: String,
    pub email: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// Standalone facts rendered right after the identity block (e.g. GPA).
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub social: SocialLinks,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(default)]
    pub github: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub scholar: Option<String>,
    #[serde(default)]
    pub orcid: Option<String>,
    #[serde(default)]
    pub medium: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillCategory {
    pub title: String,
    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: u32,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub links: ProjectLinks,
    #[serde(default)]
    pub featured: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectLinks {
    #[serde(default)]
    pub github: Option<String>,
    #[serde(default)]
    pub demo: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Publication {
    pub id: u32,
    pub title: String,
    pub authors: String,
    pub venue: String,
    /// e.g. "Journal Article"
    pub kind: String,
    #[serde(rename = "abstract")]
    pub summary: String,
    #[serde(default)]
    pub links: PublicationLinks,
    #[serde(default)]
    pub citations: u32,
    pub year: i32,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublicationLinks {
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub pdf: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceKind {
    Education,
    Work,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub id: u32,
    pub kind: ExperienceKind,
    pub title: String,
    pub organization: String,
    #[serde(default)]
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
    #[serde(default)]
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certification {
    pub id: u32,
    pub title: String,
    pub issuer: String,
    pub date: String,
    #[serde(default)]
    pub credential_id: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Award {
    pub id: u32,
    pub title: String,
    pub issuer: String,
    pub date: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageSkill {
    pub language: String,
    pub proficiency: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatbotKnowledge {
    #[serde(default)]
    pub research_interests: Vec<String>,
    #[serde(default)]
    pub availability: String,
    #[serde(default)]
    pub achievements: Vec<String>,
    #[serde(default)]
    pub technical_expertise: Vec<ExpertiseLine>,
    #[serde(default)]
    pub notable_projects: Vec<NotableProject>,
    #[serde(default)]
    pub research_focus: String,
    #[serde(default)]
    pub collaboration_interests: String,
    #[serde(default)]
    pub expertise_domains: Vec<ExpertiseDomain>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpertiseLine {
    pub label: String,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotableProject {
    pub label: String,
    pub summary: String,
}

/// One entry of the domain-expertise map, e.g. `machineLearning`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpertiseDomain {
    pub domain: String,
    #[serde(flatten)]
    pub facts: DomainFacts,
}

/// The closed set of facts a domain may carry. Every field is optional and
/// may be written as a single string or as a list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainFacts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<FactValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projects: Option<FactValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certifications: Option<FactValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publications: Option<FactValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<FactValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technologies: Option<FactValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<FactValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<FactValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applications: Option<FactValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub research: Option<FactValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge: Option<FactValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domains: Option<FactValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approach: Option<FactValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum FactValue {
    Text(String),
    List(Vec<String>),
}

impl FactValue {
    /// Text values are returned as-is; lists are joined with `separator`.
    pub fn joined(&self, separator: &str) -> Cow<'_, str> {
        match self {
            FactValue::Text(text) => Cow::Borrowed(text.as_str()),
            FactValue::List(items) => Cow::Owned(items.join(separator)),
        }
    }
}

impl PortfolioProfile {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let profile: PortfolioProfile =
            serde_yaml::from_str(yaml).context("parsing portfolio profile YAML")?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading profile {}", path.display()))?;
        Self::from_yaml_str(&content).with_context(|| format!("loading profile {}", path.display()))
    }

    pub fn shipped() -> Result<Self> {
        Self::from_yaml_str(SHIPPED_PROFILE_YAML)
    }

    /// All skills across categories, in category order then in-category order.
    pub fn all_skills(&self) -> impl Iterator<Item = &str> {
        self.skill_categories
            .iter()
            .flat_map(|cat| cat.skills.iter().map(String::as_str))
    }

    /// Checks the invariants the rest of the system relies on: a usable
    /// identity and unique ids within each sequence.
    pub fn validate(&self) -> Result<()> {
        if self.identity.name.trim().is_empty() {
            bail!("profile identity.name is empty");
        }
        if self.identity.email.trim().is_empty() {
            bail!("profile identity.email is empty");
        }
        ensure_unique_ids("projects", self.projects.iter().map(|p| p.id))?;
        ensure_unique_ids("publications", self.publications.iter().map(|p| p.id))?;
        ensure_unique_ids("experience", self.experience.iter().map(|e| e.id))?;
        ensure_unique_ids("certifications", self.certifications.iter().map(|c| c.id))?;
        ensure_unique_ids("awards", self.awards.iter().map(|a| a.id))?;
        Ok(())
    }
}

fn ensure_unique_ids(section: &str, ids: impl Iterator<Item = u32>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            bail!("duplicate id {id} in {section}");
        }
    }
    Ok(())
}
