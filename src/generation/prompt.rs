//! Prompt templates for manual-grounded answering

use crate::providers::ScoredChunk;

/// Refusal line the model must use verbatim when the context lacks the
/// requested information.
pub const MISSING_INFO_REFUSAL: &str = "I couldn't find specific information about that in the available documentation. You might want to check with the manufacturer or your technical support team.";

/// Refusal line the model must use verbatim for out-of-domain questions.
pub const OUT_OF_DOMAIN_REFUSAL: &str = "I specialize in equipment guidance and troubleshooting. I'd be happy to help with questions about usage, maintenance, or technical issues.";

/// Prompt builder for the answer pipeline
pub struct PromptBuilder;

impl PromptBuilder {
    /// Assemble the grounding context: each selected chunk's text followed
    /// by a labeled metadata block, in rank order, blank-line separated.
    pub fn build_context(chunks: &[ScoredChunk]) -> String {
        chunks
            .iter()
            .map(|chunk| {
                let m = &chunk.metadata;
                format!(
                    "page_content: {}\npage_label: {}\ncompany_name: {}\nproduct_name: {}\nsource: {}\ntotal_pages: {}\npage: {}",
                    chunk.text,
                    m.page_label,
                    m.company_name,
                    m.product_name,
                    m.source,
                    m.total_pages,
                    m.page
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n\n")
    }

    /// Build the system prompt binding the assistant to the assembled
    /// context.
    ///
    /// The reference section is forbidden here because the pipeline appends
    /// it programmatically after generation.
    pub fn system_prompt(context: &str) -> String {
        format!(
            r#"You are an experienced technical expert who specializes in equipment manuals, troubleshooting, and maintenance. You provide helpful, human-like guidance grounded in the documentation provided below.

## Response Guidelines:
- **Source Material**: Use ONLY the information provided in the Context below. Never add external knowledge or assumptions.
- **Missing Information**: If the requested information is not in the Context, respond: "{missing}"
- **Scope**: Focus on manual guidance, troubleshooting, maintenance, and usage. For unrelated questions, say: "{out_of_domain}"
- **Safety First**: Always prioritize safety warnings and include power-off or unplugging steps when the documentation mentions them.
- **Page References**: Include page labels in parentheses (Page X) beside every piece of information sourced from the documentation.

## Formatting Requirements:
- Use clear Markdown structure: a single # main heading, ## for major sections, ### for subsections
- Use numbered lists (1., 2., 3.) for step-by-step instructions, with a blank line between steps
- Use bullet points for features, tips, or general information
- Use **bold text** for key terms and emphasis
- Use > blockquotes for important safety warnings
- Answer in the same language as the user's question
- DO NOT include a "Reference Documents" section - it is added automatically
- NEVER include document URLs inline with content or at the end

Context:
{context}"#,
            missing = MISSING_INFO_REFUSAL,
            out_of_domain = OUT_OF_DOMAIN_REFUSAL,
            context = context
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::manual::ChunkMetadata;
    use uuid::Uuid;

    fn chunk(text: &str, page: u32) -> ScoredChunk {
        ScoredChunk {
            text: text.to_string(),
            metadata: ChunkMetadata {
                company_name: "Acme".to_string(),
                product_name: "Widget".to_string(),
                product_code: None,
                filename: "widget.pdf".to_string(),
                db_id: Uuid::new_v4(),
                source: "https://blobs/widget.pdf".to_string(),
                page,
                page_label: (page + 1).to_string(),
                total_pages: 3,
                producer: None,
                creator: None,
                creation_date: None,
                mod_date: None,
            },
            score: 0.9,
        }
    }

    #[test]
    fn context_preserves_rank_order_and_metadata() {
        let chunks = vec![chunk("Second-ranked text", 1), chunk("First page text", 0)];
        let context = PromptBuilder::build_context(&chunks);

        let second = context.find("Second-ranked text").unwrap();
        let first = context.find("First page text").unwrap();
        assert!(second < first, "rank order must be preserved");
        assert!(context.contains("company_name: Acme"));
        assert!(context.contains("source: https://blobs/widget.pdf"));
        assert!(context.contains("total_pages: 3"));
    }

    #[test]
    fn system_prompt_embeds_refusals_and_context() {
        let prompt = PromptBuilder::system_prompt("page_content: reset steps");
        assert!(prompt.contains(MISSING_INFO_REFUSAL));
        assert!(prompt.contains(OUT_OF_DOMAIN_REFUSAL));
        assert!(prompt.contains("page_content: reset steps"));
        assert!(prompt.contains("(Page X)"));
        assert!(prompt.contains("DO NOT include a \"Reference Documents\" section"));
    }
}
