//! Transport adapters. They move bytes; all decisions live in [`crate::client`].

pub mod http;
pub mod ws;



use std::fmt::Display;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::subscription::SubscriptionHandle;

#[derive(Error, Debug)]
pub enum TransportError {
  /// Non-success status. The body is parsed as JSON when possible, else kept as a string.
  #[error("request failed with status {status}: {body}")]
  Status { status: u16, body: Value },

  #[error("subscription error: {0}")]
  Subscription(Value),

  #[error("no tokio runtime available to drive the subscription")]
  NoRuntime,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GraphQLRequest {
  pub query: String,

  #[serde(default, skip_serializing_if = "Map::is_empty")]
  pub variables: Map<String, Value>,

  #[serde(
    default,
    rename = "operationName",
    skip_serializing_if = "Option::is_none"
  )]
  pub operation_name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphQLResponse {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub data: Option<Value>,

  /// Present means the operation failed, even if `data` carries a partial result.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub errors: Option<Vec<GraphQLErrorEntry>>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub extensions: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphQLErrorEntry {
  pub message: String,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub locations: Option<Value>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub path: Option<Vec<Value>>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub extensions: Option<Value>,
}

impl Display for GraphQLResponse {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match &self.errors {
      Some(errors) if !errors.is_empty() => {
        let messages: Vec<&str> = errors.iter().map(|x| x.message.as_str()).collect();
        write!(f, "{}", messages.join("; "))
      }
      Some(_) => write!(f, "empty error list"),
      None => write!(f, "ok"),
    }
  }
}

/// Request/response transport: one query in, one response out.
#[async_trait]
pub trait Transport: Send + Sync {
  async fn execute(&self, query: &str, variables: &Map<String, Value>) -> Result<GraphQLResponse>;
}

/// Persistent subscription transport.
///
/// `subscribe` returns immediately. Connection progress and messages are dispatched to `handle`,
/// and the transport installs a closer on it that ends the subscription.
pub trait SubscriptionTransport: Send + Sync {
  fn subscribe(&self, query: &str, handle: SubscriptionHandle) -> Result<()>;
}
