use std::path::Path;

use anyhow::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("cannot derive a websocket url from endpoint `{0}`")]
  NoWebsocketUrl(String),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
  Get,
  Post,
}

impl Default for HttpMethod {
  fn default() -> Self {
    Self::Post
  }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
  pub endpoint: String,

  /// Defaults to `endpoint` with the scheme switched to `ws`/`wss`.
  #[serde(default)]
  pub websocket_endpoint: Option<String>,

  #[serde(default)]
  pub method: HttpMethod,

  #[serde(default)]
  pub headers: IndexMap<String, String>,

  #[serde(default)]
  pub operation_name: Option<String>,
}

impl ClientConfig {
  pub fn new(endpoint: &str) -> Self {
    Self {
      endpoint: endpoint.to_string(),
      websocket_endpoint: None,
      method: HttpMethod::default(),
      headers: IndexMap::new(),
      operation_name: None,
    }
  }

  pub fn from_yaml(input: &str) -> Result<Self> {
    Ok(serde_yaml::from_str(input)?)
  }

  pub fn load(path: &Path) -> Result<Self> {
    let text = std::fs::read_to_string(path)?;
    Self::from_yaml(&text)
  }

  pub fn websocket_url(&self) -> Result<String> {
    if let Some(x) = &self.websocket_endpoint {
      return Ok(x.clone());
    }
    if let Some(rest) = self.endpoint.strip_prefix("https://") {
      Ok(format!("wss://{}", rest))
    } else if let Some(rest) = self.endpoint.strip_prefix("http://") {
      Ok(format!("ws://{}", rest))
    } else {
      Err(ConfigError::NoWebsocketUrl(self.endpoint.clone()).into())
    }
  }
}
