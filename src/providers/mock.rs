/*!
 * Scripted backend for testing.
 *
 * `ScriptedBackend` answers each request with the next queued `MockReply` and
 * falls back to a default reply once the queue is empty:
 * - `ScriptedBackend::translating(tag)` - prefixes every block body with `tag`
 * - `ScriptedBackend::failing()` - always fails with a connection error
 * - `ScriptedBackend::blocking()` - always reports a policy block
 *
 * Every request content is recorded for later inspection.
 */

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::errors::ProviderError;
use crate::translation::core::TranslationBackend;

/// Kind of error a scripted reply fails with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockErrorType {
    Connection,
    Authentication,
    ContentBlocked,
    RateLimit,
}

/// One scripted answer
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    /// Return this text verbatim
    Text(String),
    /// Translate every block by prefixing its body with the tag
    Translate,
    /// Translate, but leave out the blocks at these zero-based positions in the request
    DropBlocks(Vec<usize>),
    /// Translate only the first `n` blocks
    Truncate(usize),
    /// Fail with an error
    Error(MockErrorType),
    /// Translate after waiting, for pacing and timeout tests
    Delayed(u64),
}

/// Backend that replays a script of replies
#[derive(Debug)]
pub struct ScriptedBackend {
    /// Prefix applied to translated block bodies
    tag: String,
    /// Replies consumed in order
    script: Mutex<VecDeque<MockReply>>,
    /// Reply used once the script runs out
    fallback: MockReply,
    /// Contents received, in call order
    requests: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    /// Create a backend with an explicit script and fallback
    pub fn new(tag: impl Into<String>, script: Vec<MockReply>, fallback: MockReply) -> Self {
        Self {
            tag: tag.into(),
            script: Mutex::new(script.into()),
            fallback,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Backend that translates every block
    pub fn translating(tag: impl Into<String>) -> Self {
        Self::new(tag, Vec::new(), MockReply::Translate)
    }

    /// Backend that always fails
    pub fn failing() -> Self {
        Self::new("", Vec::new(), MockReply::Error(MockErrorType::Connection))
    }

    /// Backend that always reports a policy block
    pub fn blocking() -> Self {
        Self::new("", Vec::new(), MockReply::Error(MockErrorType::ContentBlocked))
    }

    /// Replace the queued replies, keeping the fallback
    pub fn with_script(self, script: Vec<MockReply>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..self
        }
    }

    /// Contents received so far
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Number of calls received so far
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }

    /// Apply the tag to every numbered block of `content`, keeping only positions `keep` accepts
    pub fn translate_blocks<F>(&self, content: &str, keep: F) -> String
    where
        F: Fn(usize) -> bool,
    {
        content
            .split("\n\n")
            .enumerate()
            .filter(|(position, _)| keep(*position))
            .map(|(_, block)| match block.split_once('\n') {
                Some((number, body)) => format!("{}\n{}{}", number, self.tag, body),
                None => block.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn next_reply(&self) -> MockReply {
        self.script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or_else(|| self.fallback.clone())
    }
}

fn mock_error(kind: MockErrorType) -> ProviderError {
    match kind {
        MockErrorType::Connection => ProviderError::ConnectionError("Mock connection error".to_string()),
        MockErrorType::Authentication => ProviderError::AuthenticationError("Mock API key rejected".to_string()),
        MockErrorType::ContentBlocked => ProviderError::ContentBlocked("Mock safety block".to_string()),
        MockErrorType::RateLimit => ProviderError::RateLimitExceeded("Mock rate limit".to_string()),
    }
}

#[async_trait]
impl TranslationBackend for ScriptedBackend {
    async fn translate(&self, content: &str) -> Result<String, ProviderError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(content.to_string());
        }

        match self.next_reply() {
            MockReply::Text(text) => Ok(text),
            MockReply::Translate => Ok(self.translate_blocks(content, |_| true)),
            MockReply::DropBlocks(dropped) => Ok(self.translate_blocks(content, |p| !dropped.contains(&p))),
            MockReply::Truncate(n) => Ok(self.translate_blocks(content, |p| p < n)),
            MockReply::Error(kind) => Err(mock_error(kind)),
            MockReply::Delayed(delay_ms) => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(self.translate_blocks(content, |_| true))
            }
        }
    }
}
