use std::io::Write;

use derive_builder::Builder;
use futures::StreamExt;
use tracing::{debug, warn};

use crate::history::MessageStore;
use crate::messages::{Fragment, MessageCompletion, MessageRequest, MessageRequestBuilder, Turn};
use crate::{Error, Result};

pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20240620";
pub const DEFAULT_MAX_HISTORY_ITEMS: usize = 10;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

#[derive(Debug, Clone, Builder)]
#[builder(pattern = "mutable")]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[builder(derive(Debug))]
pub struct SessionConfig {
    #[builder(default = "DEFAULT_MODEL.to_string()")]
    model_name: String,
    #[builder(default = "DEFAULT_MAX_HISTORY_ITEMS")]
    max_history_items: usize,
    #[builder(default = "DEFAULT_MAX_TOKENS")]
    max_tokens: u32,
    system_prompt: String,
}

impl SessionConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(items) = self.max_history_items {
            if items < 2 {
                return Err(format!("max_history_items must be at least 2, got {items}"));
            }
        }
        if self.max_tokens == Some(0) {
            return Err("max_tokens must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl SessionConfig {
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn max_history_items(&self) -> usize {
        self.max_history_items
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }
}

/// How a single [`Session::ask`] settled.
#[derive(Debug)]
pub enum AskOutcome {
    Completed(String),
    /// The answer stopped early. `partial` holds the text written before the
    /// failure and is what was recorded in the history.
    Interrupted { partial: String, error: Error },
}

impl AskOutcome {
    pub fn text(&self) -> &str {
        match self {
            AskOutcome::Completed(text) => text,
            AskOutcome::Interrupted { partial, .. } => partial,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            AskOutcome::Completed(_) => None,
            AskOutcome::Interrupted { error, .. } => Some(error),
        }
    }
}

/// A bounded conversation with a remote model.
pub struct Session {
    client: Box<dyn MessageCompletion>,
    config: SessionConfig,
    history: MessageStore,
}

impl Session {
    pub fn new(client: Box<dyn MessageCompletion>, config: SessionConfig) -> Self {
        let history = MessageStore::new(config.max_history_items);
        Self {
            client,
            config,
            history,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn history(&self) -> &MessageStore {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Asks `question`, writing each answer fragment to `sink` as it arrives.
    ///
    /// Failures never escape: they are returned in the [`AskOutcome`] and the
    /// session stays usable. Whatever text was received before a failure in
    /// the middle of the stream is kept as the assistant turn. If the stream
    /// could not be opened at all the question is taken back out of the
    /// history.
    pub async fn ask<W: Write>(&mut self, question: impl Into<String>, sink: &mut W) -> AskOutcome {
        self.history.append(Turn::user(question));

        let mut stream = match self.open_stream().await {
            Ok(stream) => stream,
            Err(error) => {
                warn!(%error, "failed to open answer stream");
                self.history.pop();
                return AskOutcome::Interrupted {
                    partial: String::new(),
                    error,
                };
            }
        };

        let mut answer = String::new();
        let mut failure = None;
        while let Some(item) = stream.next().await {
            match item {
                Ok(Fragment::Text(text)) => {
                    if let Err(error) = sink
                        .write_all(text.as_bytes())
                        .and_then(|_| sink.flush())
                    {
                        failure = Some(Error::from(error));
                        break;
                    }
                    answer.push_str(&text);
                }
                Ok(Fragment::Error(api_error)) => {
                    failure = Some(Error::Api(api_error));
                    break;
                }
                Err(error) => {
                    failure = Some(error);
                    break;
                }
            }
        }

        self.history.append(Turn::assistant(answer.clone()));
        let evicted = self.history.trim_if_needed();
        if evicted > 0 {
            debug!(evicted, remaining = self.history.len(), "trimmed conversation history");
        }

        match failure {
            None => AskOutcome::Completed(answer),
            Some(error) => {
                warn!(%error, received = answer.len(), "answer stream interrupted");
                AskOutcome::Interrupted {
                    partial: answer,
                    error,
                }
            }
        }
    }

    async fn open_stream(&self) -> Result<crate::messages::FragmentStream> {
        let request = self.request()?;
        debug!(
            model = %request.model,
            turns = request.messages.len(),
            "sending message request"
        );
        self.client.create_stream(&request).await
    }

    fn request(&self) -> Result<MessageRequest> {
        Ok(MessageRequestBuilder::default()
            .model(self.config.model_name.as_str())
            .system(self.config.system_prompt.as_str())
            .messages(self.history.snapshot().to_vec())
            .max_tokens(self.config.max_tokens)
            .stream(true)
            .build()?)
    }
}
