use anyhow::Result;
use async_trait::async_trait;
use reqwest::{
  header::{HeaderMap, HeaderName, HeaderValue},
  Client,
};
use serde_json::{Map, Value};

use crate::config::{ClientConfig, HttpMethod};

use super::{GraphQLRequest, GraphQLResponse, Transport, TransportError};

pub struct HttpTransport {
  client: Client,
  endpoint: String,
  method: HttpMethod,
  operation_name: Option<String>,
}

impl HttpTransport {
  pub fn new(config: &ClientConfig) -> Result<Self> {
    let mut headers = HeaderMap::new();
    for (k, v) in &config.headers {
      headers.insert(
        HeaderName::from_bytes(k.as_bytes())?,
        HeaderValue::from_str(v)?,
      );
    }
    let client = Client::builder().default_headers(headers).build()?;
    Ok(Self {
      client,
      endpoint: config.endpoint.clone(),
      method: config.method,
      operation_name: config.operation_name.clone(),
    })
  }
}

#[async_trait]
impl Transport for HttpTransport {
  async fn execute(&self, query: &str, variables: &Map<String, Value>) -> Result<GraphQLResponse> {
    let req = match self.method {
      HttpMethod::Post => {
        let body = GraphQLRequest {
          query: query.to_string(),
          variables: variables.clone(),
          operation_name: self.operation_name.clone(),
        };
        self.client.post(&self.endpoint).json(&body)
      }
      HttpMethod::Get => {
        let mut params: Vec<(&str, String)> = vec![("query", query.to_string())];
        if !variables.is_empty() {
          params.push(("variables", serde_json::to_string(variables)?));
        }
        if let Some(name) = &self.operation_name {
          params.push(("operationName", name.clone()));
        }
        self.client.get(&self.endpoint).query(&params)
      }
    };

    let res = req.send().await?;
    let status = res.status();
    let text = res.text().await?;
    log::debug!("{} {} -> {}", self.method_str(), self.endpoint, status);

    if !status.is_success() {
      return Err(
        TransportError::Status {
          status: status.as_u16(),
          body: parse_body(&text),
        }
        .into(),
      );
    }

    match serde_json::from_str::<GraphQLResponse>(&text) {
      Ok(x) => Ok(x),
      Err(_) => Err(
        TransportError::Status {
          status: status.as_u16(),
          body: parse_body(&text),
        }
        .into(),
      ),
    }
  }
}

impl HttpTransport {
  fn method_str(&self) -> &'static str {
    match self.method {
      HttpMethod::Get => "GET",
      HttpMethod::Post => "POST",
    }
  }
}

/// JSON if it parses, the raw text otherwise.
fn parse_body(text: &str) -> Value {
  serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
