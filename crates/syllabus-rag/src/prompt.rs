//! The counselor prompt.
//!
//! The instructions are a contract with the generation model and are kept
//! word for word. Retrieved text and the question are appended after the
//! instructions, so braces inside either never act as template slots.

use syllabus_core::types::RetrievedChunk;

/// Context used when retrieval returns nothing.
pub const NO_CONTEXT_PLACEHOLDER: &str = "No relevant context found.";

/// Sentence the model is told to give when the context lacks the answer.
pub const MISSING_INFO_REPLY: &str = "I cannot find that specific detail in the official syllabus document.";

const INSTRUCTIONS: &str = r#"You are an expert Academic Counselor for the School of Computer Engineering at KIIT University.
Your goal is to assist students by answering questions strictly based on the provided "Curricula and Syllabi (2022-23)" context.

GUIDELINES:
1.  **Source of Truth:** Answer ONLY using the information provided in the CONTEXT below. Do not make up information.
2.  **Course Queries:** If asked about a specific subject (e.g., "Machine Learning"), provide its Course Code, Credits, Prerequisites, and a summary of the units or textbooks if available.
3.  **Semester Inquiries:** If asked about a semester (e.g., "What subjects are in Sem 6?"), list the courses clearly with their Codes and Credits using bullet points.
4.  **Regulations:** If asked about rules (e.g., "Minor Degree", "Projects", "Internships"), explain the eligibility and requirements exactly as stated in the text.
5.  **Missing Info:** If the answer is not in the context, politely say: "I cannot find that specific detail in the official syllabus document."
6.  **Tone:** Maintain a professional, encouraging, and structured tone suitable for academic advising."#;

/// Join retrieved texts with a blank line, or fall back to the placeholder.
pub fn build_context(hits: &[RetrievedChunk]) -> String {
    if hits.is_empty() {
        return NO_CONTEXT_PLACEHOLDER.to_string();
    }
    hits.iter().map(|h| h.text.as_str()).collect::<Vec<_>>().join("\n\n")
}

pub fn render_prompt(context: &str, question: &str) -> String {
    format!("{INSTRUCTIONS}\n\nCONTEXT:\n{context}\n\nQUESTION:\n{question}\nCOUNSELOR'S ANSWER:\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use syllabus_core::types::Meta;

    fn hit(id: &str, text: &str) -> RetrievedChunk {
        RetrievedChunk { id: id.into(), text: text.into(), metadata: Meta::new(), distance: 0.0 }
    }

    #[test]
    fn empty_retrieval_uses_placeholder() {
        assert_eq!(build_context(&[]), "No relevant context found.");
    }

    #[test]
    fn context_joins_in_rank_order() {
        let ctx = build_context(&[hit("doc_0_chunk_1", "Course Code: CS301"), hit("doc_0_chunk_0", "Credits: 4")]);
        assert_eq!(ctx, "Course Code: CS301\n\nCredits: 4");
    }

    #[test]
    fn prompt_carries_rules_and_slots() {
        let prompt = render_prompt("Course Code: CS301", "What is the course code?");
        assert!(prompt.starts_with("You are an expert Academic Counselor"));
        assert!(prompt.contains(MISSING_INFO_REPLY));
        assert!(prompt.contains("**Semester Inquiries:**"));
        assert!(prompt.contains("CONTEXT:\nCourse Code: CS301\n\nQUESTION:\nWhat is the course code?\n"));
        assert!(prompt.ends_with("COUNSELOR'S ANSWER:\n"));
    }

    #[test]
    fn braces_in_inputs_are_literal() {
        let prompt = render_prompt("{question}", "what is {context}?");
        assert!(prompt.contains("CONTEXT:\n{question}\n"));
        assert!(prompt.contains("QUESTION:\nwhat is {context}?\n"));
    }
}
