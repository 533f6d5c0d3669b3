//! Reference section appended to generated answers

use crate::providers::ScoredChunk;

const REFERENCES_HEADING: &str = "## Reference Documents";

/// Distinct source URIs of the selected chunks, in rank order.
pub fn collect_sources(chunks: &[ScoredChunk]) -> Vec<String> {
    let mut sources = Vec::new();
    for chunk in chunks {
        let source = &chunk.metadata.source;
        if !source.is_empty() && !sources.contains(source) {
            sources.push(source.clone());
        }
    }
    sources
}

/// Append a reference section linking each source, unless the model
/// already emitted one.
pub fn append_references(answer: &str, sources: &[String]) -> String {
    if sources.is_empty() || answer.contains(REFERENCES_HEADING) {
        return answer.to_string();
    }

    let mut result = String::with_capacity(answer.len() + sources.len() * 64);
    result.push_str(answer);
    result.push_str("\n\n");
    result.push_str(REFERENCES_HEADING);
    result.push('\n');
    for source in sources {
        result.push_str(&format!("[{}]({})\n\n", display_name(source), source));
    }
    result
}

/// Display name for a source URI: its trailing path segment.
fn display_name(uri: &str) -> &str {
    uri.rsplit('/').next().filter(|s| !s.is_empty()).unwrap_or(uri)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::manual::ChunkMetadata;
    use uuid::Uuid;

    fn chunk(source: &str) -> ScoredChunk {
        ScoredChunk {
            text: "text".to_string(),
            metadata: ChunkMetadata {
                company_name: "Acme".to_string(),
                product_name: "Widget".to_string(),
                product_code: None,
                filename: "widget.pdf".to_string(),
                db_id: Uuid::new_v4(),
                source: source.to_string(),
                page: 0,
                page_label: "1".to_string(),
                total_pages: 3,
                producer: None,
                creator: None,
                creation_date: None,
                mod_date: None,
            },
            score: 0.8,
        }
    }

    #[test]
    fn sources_are_distinct_in_rank_order() {
        let chunks = vec![
            chunk("https://blobs/a.pdf"),
            chunk("https://blobs/b.pdf"),
            chunk("https://blobs/a.pdf"),
        ];
        assert_eq!(
            collect_sources(&chunks),
            vec!["https://blobs/a.pdf", "https://blobs/b.pdf"]
        );
    }

    #[test]
    fn appends_linked_section() {
        let answer = "# Reset Guide\n\nHold the button (Page 2).";
        let sources = vec!["https://blobs/pdf_manuals/widget.pdf".to_string()];
        let result = append_references(answer, &sources);

        assert!(result.starts_with(answer));
        assert!(result.contains("## Reference Documents"));
        assert!(result.contains("[widget.pdf](https://blobs/pdf_manuals/widget.pdf)"));
    }

    #[test]
    fn does_not_duplicate_existing_section() {
        let answer = "Answer.\n\n## Reference Documents\n[x](y)";
        let sources = vec!["https://blobs/widget.pdf".to_string()];
        assert_eq!(append_references(answer, &sources), answer);
    }

    #[test]
    fn no_sources_leaves_answer_untouched() {
        assert_eq!(append_references("Answer.", &[]), "Answer.");
    }

    #[test]
    fn display_name_is_trailing_segment() {
        assert_eq!(display_name("https://blobs/pdf_manuals/w.pdf"), "w.pdf");
        assert_eq!(display_name("no-slashes"), "no-slashes");
        assert_eq!(display_name("trailing/slash/"), "trailing/slash/");
    }
}
