//! Keyword fallback used when the generation backend cannot answer.
//!
//! Rules are evaluated top to bottom against the lower-cased message and the
//! first match wins, so "skills and projects" is answered as a skills question.

use folio_schema::PortfolioProfile;
use serde::Serialize;

/// How many skills the skills answer lists before pointing at the full section.
pub const FALLBACK_SKILL_LIMIT: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackTopic {
    Skills,
    Projects,
    Research,
    Contact,
    General,
}

pub struct FallbackRule {
    pub topic: FallbackTopic,
    matches: fn(&str) -> bool,
    respond: fn(&PortfolioProfile) -> String,
}

pub const FALLBACK_RULES: &[FallbackRule] = &[
    FallbackRule {
        topic: FallbackTopic::Skills,
        matches: |msg| msg.contains("skill"),
        respond: skills_answer,
    },
    FallbackRule {
        topic: FallbackTopic::Projects,
        matches: |msg| msg.contains("project"),
        respond: projects_answer,
    },
    FallbackRule {
        topic: FallbackTopic::Research,
        matches: |msg| msg.contains("research") || msg.contains("publication"),
        respond: research_answer,
    },
    FallbackRule {
        topic: FallbackTopic::Contact,
        matches: |msg| msg.contains("contact") || msg.contains("email"),
        respond: contact_answer,
    },
];

/// Which topic a message falls under. `General` when no rule matches.
pub fn classify(user_message: &str) -> FallbackTopic {
    let lower = user_message.to_lowercase();
    FALLBACK_RULES
        .iter()
        .find(|rule| (rule.matches)(&lower))
        .map(|rule| rule.topic)
        .unwrap_or(FallbackTopic::General)
}

/// Deterministic answer for `user_message`; same inputs, same bytes out.
pub fn fallback_respond(user_message: &str, profile: &PortfolioProfile) -> String {
    let lower = user_message.to_lowercase();
    match FALLBACK_RULES.iter().find(|rule| (rule.matches)(&lower)) {
        Some(rule) => (rule.respond)(profile),
        None => general_answer(),
    }
}

fn skills_answer(profile: &PortfolioProfile) -> String {
    let skills: Vec<&str> = profile.all_skills().take(FALLBACK_SKILL_LIMIT).collect();
    format!(
        "I have expertise in: {}, and more. Check the Skills section for the complete list!",
        skills.join(", ")
    )
}

fn projects_answer(profile: &PortfolioProfile) -> String {
    match profile.projects.first() {
        Some(first) => format!(
            "I've worked on {} featured projects including \"{}\". Visit the Projects section to see details!",
            profile.projects.len(),
            first.title
        ),
        None => "I've worked on 0 featured projects. Visit the Projects section to see details!"
            .to_string(),
    }
}

fn research_answer(profile: &PortfolioProfile) -> String {
    format!(
        "I have {} research publications in areas like quantum cryptography and agricultural AI. Check the Research section!",
        profile.publications.len()
    )
}

fn contact_answer(profile: &PortfolioProfile) -> String {
    format!(
        "You can reach out at {} or use the contact form below!",
        profile.identity.email
    )
}

fn general_answer() -> String {
    "I can help you learn about skills, projects, research, and experience. What would you like to know more about?"
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shipped() -> PortfolioProfile {
        PortfolioProfile::shipped().unwrap()
    }

    #[test]
    fn skills_answer_lists_first_eight_skills() {
        let answer = fallback_respond("What are your skills?", &shipped());
        assert_eq!(
            answer,
            "I have expertise in: Python, SQL, Git, APIs, C++, React, TensorFlow, PyTorch, and more. Check the Skills section for the complete list!"
        );
    }

    #[test]
    fn skills_take_priority_over_projects() {
        let profile = shipped();
        let answer = fallback_respond("tell me about your skills and projects", &profile);
        assert_eq!(answer, fallback_respond("skills", &profile));
        assert_eq!(classify("tell me about your skills and projects"), FallbackTopic::Skills);
    }

    #[test]
    fn projects_answer_names_first_project() {
        let answer = fallback_respond("Tell me about projects", &shipped());
        assert_eq!(
            answer,
            "I've worked on 4 featured projects including \"Unique Person Tracking and Counting\". Visit the Projects section to see details!"
        );
    }

    #[test]
    fn projects_answer_without_projects() {
        let profile = PortfolioProfile::from_yaml_str(
            "identity:\n  name: Ada\n  title: Engineer\n  email: ada@example.com\n",
        )
        .unwrap();
        let answer = fallback_respond("any projects?", &profile);
        assert!(answer.starts_with("I've worked on 0 featured projects."));
    }

    #[test]
    fn research_and_publication_share_a_branch() {
        let profile = shipped();
        let research = fallback_respond("Show research papers", &profile);
        assert_eq!(research, fallback_respond("list your PUBLICATIONS", &profile));
        assert!(research.starts_with("I have 3 research publications"));
    }

    #[test]
    fn contact_answer_contains_stored_email() {
        let profile = shipped();
        let answer = fallback_respond("contact", &profile);
        assert!(answer.contains(&profile.identity.email));
        assert_eq!(classify("what's your Email?"), FallbackTopic::Contact);
    }

    #[test]
    fn unmatched_message_gets_general_prompt() {
        let answer = fallback_respond("hello there", &shipped());
        assert!(answer.starts_with("I can help you learn about skills, projects, research, and experience."));
        assert_eq!(classify("hello there"), FallbackTopic::General);
    }

    #[test]
    fn matching_is_case_insensitive_substring() {
        assert_eq!(classify("SKILLSET"), FallbackTopic::Skills);
        assert_eq!(classify("Projected growth"), FallbackTopic::Projects);
    }

    #[test]
    fn fallback_is_deterministic() {
        let profile = shipped();
        for msg in ["skills", "projects", "research", "contact", "weather"] {
            assert_eq!(fallback_respond(msg, &profile), fallback_respond(msg, &profile));
        }
    }
}
