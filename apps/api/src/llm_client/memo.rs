//! Prompt-keyed memoization in front of any `TextModel`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

use super::{LlmError, TextModel};

/// Prompts kept before the cache is dropped wholesale.
pub const MEMO_CAPACITY: usize = 256;

/// Caches successful responses by exact prompt text.
///
/// Each prompt owns a `OnceCell`, so concurrent callers with the same prompt
/// wait on a single in-flight request. Errors leave the cell empty and the
/// next caller tries again.
pub struct MemoizedModel<M> {
    inner: M,
    capacity: usize,
    cache: Mutex<HashMap<String, Arc<OnceCell<String>>>>,
}

impl<M: TextModel> MemoizedModel<M> {
    pub fn new(inner: M) -> Self {
        Self::with_capacity(inner, MEMO_CAPACITY)
    }

    pub fn with_capacity(inner: M, capacity: usize) -> Self {
        Self {
            inner,
            capacity: capacity.max(1),
            cache: Mutex::new(HashMap::new()),
        }
    }

    async fn cell_for(&self, prompt: &str) -> Arc<OnceCell<String>> {
        let mut cache = self.cache.lock().await;
        if let Some(cell) = cache.get(prompt) {
            return Arc::clone(cell);
        }
        if cache.len() >= self.capacity {
            debug!("Prompt cache full ({} entries), clearing", cache.len());
            cache.clear();
        }
        let cell = Arc::new(OnceCell::new());
        cache.insert(prompt.to_string(), Arc::clone(&cell));
        cell
    }
}

#[async_trait]
impl<M: TextModel> TextModel for MemoizedModel<M> {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let cell = self.cell_for(prompt).await;
        let text = cell
            .get_or_try_init(|| self.inner.generate(prompt))
            .await?;
        Ok(text.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::llm_client::testing::ScriptedModel;
    use crate::llm_client::LlmClient;

    #[tokio::test]
    async fn test_identical_prompt_hits_network_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "Rust, Go"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = LlmClient::new(
            format!("{}/generate", server.uri()),
            "k".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();
        let model = MemoizedModel::new(client);

        assert_eq!(model.generate("same prompt").await.unwrap(), "Rust, Go");
        assert_eq!(model.generate("same prompt").await.unwrap(), "Rust, Go");
        // MockServer verifies `expect(1)` on drop.
    }

    #[tokio::test]
    async fn test_concurrent_identical_prompts_share_one_call() {
        let model = Arc::new(MemoizedModel::new(ScriptedModel::new().on("p", "answer")));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let model = Arc::clone(&model);
                tokio::spawn(async move { model.generate("p").await })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "answer");
        }
        assert_eq!(model.inner.call_count(), 1);
    }

    #[tokio::test]
    async fn test_distinct_prompts_are_not_shared() {
        let model = MemoizedModel::new(ScriptedModel::new().on("a", "A").on("b", "B"));
        assert_eq!(model.generate("a").await.unwrap(), "A");
        assert_eq!(model.generate("b").await.unwrap(), "B");
        assert_eq!(model.inner.call_count(), 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let model = MemoizedModel::new(ScriptedModel::new().fail_on("x", 500));
        assert!(model.generate("x").await.is_err());
        assert!(model.generate("x").await.is_err());
        assert_eq!(model.inner.call_count(), 2);
    }

    #[tokio::test]
    async fn test_full_cache_is_cleared() {
        let model = MemoizedModel::with_capacity(
            ScriptedModel::new().on("one", "1").on("two", "2"),
            1,
        );
        model.generate("one").await.unwrap();
        model.generate("two").await.unwrap();
        model.generate("one").await.unwrap();
        assert_eq!(model.inner.call_count(), 3);
    }
}
