//! Prompt templates for RAG generation

use crate::providers::ChatMessage;
use crate::types::Chunk;

/// Separator between context blocks
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Fixed system instructions for every answer
pub const SYSTEM_PROMPT: &str = r#"You are a document assistant. You help users find, understand and summarize information in the documents they have uploaded.

Instructions:
1. Answer from the provided context. Each context block starts with a label of the form [Source: filename, Page: number].
2. Mention documents by filename when you use them, for example "According to Budget_2024.pdf, ...".
3. Connect related information across sections and documents when it helps the answer.
4. Explain complex material plainly and give specific details rather than vague summaries.
5. If the documents do not contain the answer, say so clearly instead of guessing.

Formatting:
- Your answer is rendered as Markdown.
- Use ## headings, bullet or numbered lists and **bold** where they aid readability.
- Put a blank line before and after headings, lists, quotes and code blocks.
- Keep the answer focused on the question and use the user's terminology."#;

/// Prompt builder for RAG queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Render chunks as provenance-tagged blocks, in retrieval order
    pub fn format_context(chunks: &[Chunk]) -> String {
        chunks
            .iter()
            .map(|chunk| format!("{}\n{}", chunk.provenance_tag(), chunk.content))
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR)
    }

    /// Render history as `ROLE: text` lines, oldest first
    pub fn format_history(messages: &[ChatMessage]) -> String {
        messages
            .iter()
            .map(|m| format!("{}: {}", m.role.label(), m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The human turn carrying context, question and history
    pub fn build_user_prompt(context: &str, question: &str, history: &str) -> String {
        format!(
            "Context:\n{context}\n\nQuestion: {question}\n\nChat history (may help):\n{history}"
        )
    }

    /// The fixed two-message prompt: system instructions, then the human turn
    pub fn build_messages(context: &str, question: &str, history: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(Self::build_user_prompt(context, question, history)),
        ]
    }
}
