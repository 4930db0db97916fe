//! LLM-backed tag suggestion for new notes.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use trellis_core::GenerationBackend;

const TAG_SYSTEM_PROMPT: &str = "You are a helpful assistant that generates relevant tags \
    for notes. Return only a JSON array of strings representing tags, no other text.";

/// Parse a model response into a list of tag names.
///
/// Anything that is not a JSON array of strings yields an empty list.
pub fn parse_tag_array(raw: &str) -> Vec<String> {
    serde_json::from_str::<Vec<String>>(raw.trim()).unwrap_or_default()
}

/// Suggests tags for note content via a generation model.
pub struct TagExtractor {
    backend: Arc<dyn GenerationBackend>,
}

impl TagExtractor {
    /// Create an extractor over the given generation backend.
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    /// Suggest 3-7 tags for the given content.
    ///
    /// Best-effort: any upstream failure or malformed response degrades to
    /// an empty list so note creation never fails on tagging.
    #[instrument(skip(self, content), fields(subsystem = "inference", component = "tagging", op = "extract_tags", content_len = content.len()))]
    pub async fn extract_tags(&self, content: &str) -> Vec<String> {
        let prompt = format!(
            "Generate 3-7 relevant tags for this note content: {}",
            content
        );

        match self
            .backend
            .generate_with_system(TAG_SYSTEM_PROMPT, &prompt)
            .await
        {
            Ok(raw) => {
                let tags = parse_tag_array(&raw);
                debug!(result_count = tags.len(), "Tag extraction complete");
                tags
            }
            Err(e) => {
                warn!(error = %e, "Tag extraction failed, continuing without tags");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockGenerationBackend;

    #[test]
    fn test_parse_tag_array() {
        assert_eq!(
            parse_tag_array(r#"["rust", "async", "testing"]"#),
            vec!["rust", "async", "testing"]
        );
    }

    #[test]
    fn test_parse_tag_array_trims_whitespace() {
        assert_eq!(parse_tag_array("  [\"a\"]\n"), vec!["a"]);
    }

    #[test]
    fn test_parse_tag_array_rejects_non_array() {
        assert!(parse_tag_array(r#"{"tags": ["a"]}"#).is_empty());
        assert!(parse_tag_array("here are some tags: a, b").is_empty());
        assert!(parse_tag_array("").is_empty());
    }

    #[tokio::test]
    async fn test_extract_tags() {
        let backend = Arc::new(
            MockGenerationBackend::new().with_fixed_response(r#"["cooking", "baking"]"#),
        );
        let extractor = TagExtractor::new(backend);

        let tags = extractor.extract_tags("My sourdough recipe").await;
        assert_eq!(tags, vec!["cooking", "baking"]);
    }

    #[tokio::test]
    async fn test_extract_tags_degrades_on_failure() {
        let backend = Arc::new(MockGenerationBackend::new().with_failure());
        let extractor = TagExtractor::new(backend);

        assert!(extractor.extract_tags("anything").await.is_empty());
    }

    #[tokio::test]
    async fn test_extract_tags_degrades_on_malformed_output() {
        let backend =
            Arc::new(MockGenerationBackend::new().with_fixed_response("Sure! Tags: cooking"));
        let extractor = TagExtractor::new(backend);

        assert!(extractor.extract_tags("anything").await.is_empty());
    }
}
