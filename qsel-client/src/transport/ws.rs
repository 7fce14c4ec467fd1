//! `graphql-transport-ws` subscription client.

use anyhow::Result;
use futures::{Sink, SinkExt, Stream, StreamExt};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::oneshot;
use tokio_tungstenite::{
  connect_async,
  tungstenite::{
    client::IntoClientRequest,
    http::{HeaderName, HeaderValue},
    Error as WsError, Message,
  },
};

use crate::{config::ClientConfig, subscription::SubscriptionHandle};

use super::{GraphQLRequest, GraphQLResponse, SubscriptionTransport, TransportError};

const SUBPROTOCOL: &str = "graphql-transport-ws";

/// One connection carries exactly one subscription.
const SUBSCRIPTION_ID: &str = "1";

#[derive(Error, Debug)]
pub enum ProtocolError {
  #[error("expecting connection_ack, got {0}")]
  NoAck(String),
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
  ConnectionInit {
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<Value>,
  },
  Subscribe {
    id: String,
    payload: GraphQLRequest,
  },
  Complete {
    id: String,
  },
  Ping {
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<Value>,
  },
  Pong {
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<Value>,
  },
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
  ConnectionAck {
    #[serde(default)]
    payload: Option<Value>,
  },
  Next {
    id: String,
    payload: GraphQLResponse,
  },
  Error {
    #[serde(default)]
    id: Option<String>,
    payload: Value,
  },
  Complete {
    id: String,
  },
  Ping {
    #[serde(default)]
    payload: Option<Value>,
  },
  Pong {
    #[serde(default)]
    payload: Option<Value>,
  },
}

pub struct WsTransport {
  url: String,
  headers: IndexMap<String, String>,
  operation_name: Option<String>,
}

impl WsTransport {
  pub fn new(config: &ClientConfig) -> Result<Self> {
    Ok(Self {
      url: config.websocket_url()?,
      headers: config.headers.clone(),
      operation_name: config.operation_name.clone(),
    })
  }
}

impl SubscriptionTransport for WsTransport {
  fn subscribe(&self, query: &str, handle: SubscriptionHandle) -> Result<()> {
    let rt = tokio::runtime::Handle::try_current().map_err(|_| TransportError::NoRuntime)?;
    let (stop_tx, stop_rx) = oneshot::channel();
    handle.set_closer(move || {
      let _ = stop_tx.send(());
    });

    let session = Session {
      url: self.url.clone(),
      headers: self.headers.clone(),
      request: GraphQLRequest {
        query: query.to_string(),
        variables: Map::new(),
        operation_name: self.operation_name.clone(),
      },
    };
    rt.spawn(async move {
      if let Err(e) = session.run(&handle, stop_rx).await {
        log::error!("subscription to {} failed: {:?}", session.url, e);
        handle.dispatch_error(&e);
      }
      handle.dispatch_close();
    });
    Ok(())
  }
}

struct Session {
  url: String,
  headers: IndexMap<String, String>,
  request: GraphQLRequest,
}

impl Session {
  async fn run(&self, handle: &SubscriptionHandle, mut stop: oneshot::Receiver<()>) -> Result<()> {
    let mut req = self.url.as_str().into_client_request()?;
    req
      .headers_mut()
      .insert("Sec-WebSocket-Protocol", HeaderValue::from_static(SUBPROTOCOL));
    for (k, v) in &self.headers {
      req.headers_mut().insert(
        HeaderName::from_bytes(k.as_bytes())?,
        HeaderValue::from_str(v)?,
      );
    }

    let (socket, _) = connect_async(req).await?;
    let (mut sink, mut stream) = socket.split();

    send(&mut sink, &ClientMessage::ConnectionInit { payload: None }).await?;
    loop {
      match recv(&mut stream).await? {
        Some(ServerMessage::ConnectionAck { .. }) => break,
        Some(ServerMessage::Ping { payload }) => {
          send(&mut sink, &ClientMessage::Pong { payload }).await?
        }
        Some(other) => return Err(ProtocolError::NoAck(format!("{:?}", other)).into()),
        None => return Ok(()),
      }
    }

    send(
      &mut sink,
      &ClientMessage::Subscribe {
        id: SUBSCRIPTION_ID.to_string(),
        payload: self.request.clone(),
      },
    )
    .await?;
    log::debug!("subscribed to {}", self.url);
    handle.dispatch_open();

    loop {
      tokio::select! {
        _ = &mut stop => {
          send(&mut sink, &ClientMessage::Complete { id: SUBSCRIPTION_ID.to_string() }).await?;
          sink.close().await?;
          return Ok(());
        }
        msg = recv(&mut stream) => match msg? {
          Some(ServerMessage::Next { payload, .. }) => match payload.errors {
            Some(errors) => {
              let errors = serde_json::to_value(errors)?;
              handle.dispatch_error(&TransportError::Subscription(errors).into());
            }
            None => handle.dispatch_message(&payload.data.unwrap_or(Value::Null)),
          },
          Some(ServerMessage::Error { payload, .. }) => {
            handle.dispatch_error(&TransportError::Subscription(payload).into());
          }
          Some(ServerMessage::Ping { payload }) => {
            send(&mut sink, &ClientMessage::Pong { payload }).await?;
          }
          Some(ServerMessage::Complete { .. }) | None => return Ok(()),
          Some(ServerMessage::Pong { .. }) | Some(ServerMessage::ConnectionAck { .. }) => {}
        }
      }
    }
  }
}

async fn send<S>(sink: &mut S, msg: &ClientMessage) -> Result<()>
where
  S: Sink<Message, Error = WsError> + Unpin,
{
  sink.send(Message::Text(serde_json::to_string(msg)?)).await?;
  Ok(())
}

/// Next protocol message. `None` once the socket is closed.
async fn recv<S>(stream: &mut S) -> Result<Option<ServerMessage>>
where
  S: Stream<Item = Result<Message, WsError>> + Unpin,
{
  while let Some(msg) = stream.next().await {
    match msg? {
      Message::Text(text) => return Ok(Some(serde_json::from_str(&text)?)),
      Message::Binary(bytes) => return Ok(Some(serde_json::from_slice(&bytes)?)),
      Message::Close(_) => return Ok(None),
      _ => {}
    }
  }
  Ok(None)
}
