use std::path::Path;

use crate::{Error, Result};

pub const DEFAULT_KNOWLEDGE_BASE_PATH: &str = "knowledge_base.txt";

/// Reads the whole knowledge base file as UTF-8 text.
pub async fn load(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| Error::KnowledgeBase {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::debug!(path = %path.display(), bytes = text.len(), "loaded knowledge base");
    Ok(text)
}

/// Builds the system prompt that grounds every request in the knowledge base.
pub fn system_prompt(knowledge_base: &str) -> String {
    format!(
        "Knowledge Base:\n{knowledge_base}\n\nUse the above knowledge base to answer user questions. If the answer is not in the knowledge base, say 'I don't have enough information to answer that question.'"
    )
}
