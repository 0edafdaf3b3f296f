use std::pin::Pin;

use crate::Result;
use async_trait::async_trait;
use derive_builder::Builder;
use dyn_clone::DynClone;
use futures::Stream;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Assistant,
}

/// One message of the conversation. Turns are immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    role: Role,
    #[serde(rename = "content")]
    text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl From<(Role, &str)> for Turn {
    fn from((role, text): (Role, &str)) -> Self {
        Self {
            role,
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Builder, PartialEq)]
#[builder(pattern = "mutable")]
#[builder(setter(into, strip_option))]
#[builder(derive(Debug))]
pub struct MessageRequest {
    pub model: String,
    #[builder(default = "None")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<Turn>,
    pub max_tokens: u32,
    #[builder(default = "None")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

/// Error descriptor reported by the remote endpoint.
#[derive(thiserror::Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct ApiError {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn unknown() -> Self {
        Self::new("unknown_error", "Unknown error occurred")
    }
}

/// One incremental piece of a streamed answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Text(String),
    Error(ApiError),
}

pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<Fragment>> + Send>>;

/// A remote endpoint able to answer a [`MessageRequest`] as a stream of
/// [`Fragment`]s.
#[async_trait]
pub trait MessageCompletion: DynClone + Send + Sync {
    async fn create_stream(&self, request: &MessageRequest) -> Result<FragmentStream>;
}

dyn_clone::clone_trait_object!(MessageCompletion);
