//! Prompt assembly for grounded answers

use serde::{Deserialize, Serialize};

use crate::store::SearchHit;

const PERSONA: &str = "You are a helpful AI assistant for a college. You provide accurate information about:
- Academic programs, courses, syllabus, and exams
- Hostel facilities, rules, and timings
- Campus facilities and locations
- Question papers and exam patterns
- College events and activities

Use the provided context to answer questions. Be concise, friendly, and student-focused.
If the context doesn't contain relevant information, say so politely.";

/// Who is asking, as claimed by the caller.
///
/// Only shapes the prompt: the model is asked to withhold information beyond
/// the role's access rights, but nothing here checks that it does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    pub role: String,
    pub user_name: String,
}

impl Requester {
    #[inline]
    pub fn new(role: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            user_name: user_name.into(),
        }
    }
}

#[inline]
pub fn system_prompt(requester: Option<&Requester>) -> String {
    match requester {
        None => PERSONA.to_string(),
        Some(requester) => format!(
            "{}\n\nThe user is {}, and they have logged in as a {}. \
             STRICTLY ADHERE to the user's role: if the answer requires information beyond \
             {}'s access rights (e.g., restricted faculty memos), politely state that you \
             cannot provide that information due to their current role.",
            PERSONA, requester.user_name, requester.role, requester.role
        ),
    }
}

#[inline]
pub fn user_prompt(context: &str, query: &str, requester: Option<&Requester>) -> String {
    let asker = requester.map_or_else(String::new, |r| {
        format!(" (from {}, role {})", r.user_name, r.role)
    });

    format!(
        "Context from college database:\n{}\n\nStudent question{}: {}\n\n\
         Answer the question based on the context above. Be helpful and concise.",
        context, asker, query
    )
}

/// Retrieved chunk texts joined by blank lines, closest first
#[inline]
pub fn build_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|hit| hit.chunk.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
