//! The fixed prompt contract: how retrieved statute text, the user's
//! agreement and the question are laid out for the model.

/// Placed between consecutive retrieved chunks.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

pub const DOCUMENT_HEADER: &str = "**THE USER'S DOCUMENT:**";
pub const LEGAL_CONTEXT_HEADER: &str = "**RELEVANT LEGAL CONTEXT:**";
pub const QUESTION_HEADER: &str = "**THE USER'S QUESTION:**";
pub const ANSWER_CUE: &str = "**Your Answer:**";

const PREAMBLE: &str = r#"You are "LawGeeks", a specialized AI assistant. Your goal is to answer a user's specific question about their legal document, using *only* the provided context.

You have been given three pieces of information:
1.  **THE USER'S DOCUMENT**: The full text of their agreement.
2.  **RELEVANT LEGAL CONTEXT**: Snippets from Indian law (e.g., The Contract Act, RERA) that are relevant to the user's question.
3.  **THE USER'S QUESTION**: The specific question the user asked."#;

const INSTRUCTIONS: &str = r#"**INSTRUCTIONS:**
1.  First, analyze the **USER'S DOCUMENT** to find clauses that relate to the **USER'S QUESTION**.
2.  Next, use the **RELEVANT LEGAL CONTEXT** to understand the standard legal position or definitions.
3.  Combine these insights to provide a clear, simple, and direct answer.
4.  If the user's document is silent on the issue, say so.
5.  If the user's document *contradicts* the legal context, point this out (e.g., "Your document states X, which is unusual as the standard legal position is Y...").
6.  **DO NOT** make up information. If the answer cannot be found in the provided texts, state that you cannot answer.
7.  **DO NOT** provide legal advice. Frame your answer as "This clause appears to mean..." or "This document states...""#;

/// Joins retrieved chunks in the order given. Empty input gives an empty string.
pub fn format_context<S: AsRef<str>>(chunks: &[S]) -> String {
    chunks
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

/// Fills the template. Field values are inserted literally; braces inside
/// them are not interpreted.
pub fn assemble_prompt(document_text: &str, legal_context: &str, question: &str) -> String {
    format!(
        "{PREAMBLE}\n\n{INSTRUCTIONS}\n\n---\n{DOCUMENT_HEADER}\n{document_text}\n---\n{LEGAL_CONTEXT_HEADER}\n{legal_context}\n---\n{QUESTION_HEADER}\n{question}\n---\n\n{ANSWER_CUE}\n"
    )
}
