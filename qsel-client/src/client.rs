use std::sync::Arc;

use anyhow::Result;
use qsel::{
  query::{compile, CompileOptions, CompiledQuery, OperationType},
  scalar::{decode_response, ScalarCoders},
  schema::SchemaTables,
  selection::SelectionSet,
};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{
  config::ClientConfig,
  subscription::SubscriptionHandle,
  transport::{
    http::HttpTransport, ws::WsTransport, GraphQLResponse, SubscriptionTransport, Transport,
  },
};

#[derive(Error, Debug)]
pub enum ClientError {
  /// The server answered with `errors`. Carries the whole response, partial data included.
  #[error("operation failed: {0}")]
  Operation(GraphQLResponse),

  #[error("no subscription transport configured")]
  NoSubscriptionTransport,
}

/// Compiles selections, sends them and decodes the results.
#[derive(Clone)]
pub struct Client {
  tables: Arc<SchemaTables>,
  scalars: Arc<ScalarCoders>,
  options: CompileOptions,
  transport: Arc<dyn Transport>,
  subscriptions: Option<Arc<dyn SubscriptionTransport>>,
}

impl Client {
  pub fn new(tables: Arc<SchemaTables>, transport: Arc<dyn Transport>) -> Self {
    Self {
      tables,
      scalars: Arc::new(ScalarCoders::new()),
      options: CompileOptions::default(),
      transport,
      subscriptions: None,
    }
  }

  /// HTTP for queries and mutations, `graphql-transport-ws` for subscriptions.
  pub fn from_config(tables: Arc<SchemaTables>, config: &ClientConfig) -> Result<Self> {
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(config)?);
    let subscriptions: Arc<dyn SubscriptionTransport> = Arc::new(WsTransport::new(config)?);
    let mut client = Self::new(tables, transport).with_subscription_transport(subscriptions);
    client.options.operation_name = config.operation_name.clone();
    Ok(client)
  }

  pub fn with_scalars(mut self, scalars: ScalarCoders) -> Self {
    self.scalars = Arc::new(scalars);
    self
  }

  pub fn with_subscription_transport(mut self, t: Arc<dyn SubscriptionTransport>) -> Self {
    self.subscriptions = Some(t);
    self
  }

  pub fn with_operation_name(mut self, name: &str) -> Self {
    self.options.operation_name = Some(name.to_string());
    self
  }

  pub fn tables(&self) -> &SchemaTables {
    &self.tables
  }

  pub fn compile(&self, operation: OperationType, selection: &SelectionSet) -> Result<CompiledQuery> {
    compile(
      &self.tables,
      &self.scalars,
      &self.options,
      operation.as_str(),
      selection,
    )
  }

  /// Runs a query or mutation and returns its decoded `data`.
  pub async fn execute(
    &self,
    operation: OperationType,
    selection: &SelectionSet,
    variables: &Map<String, Value>,
  ) -> Result<Value> {
    let compiled = self.compile(operation, selection)?;
    let res = self.transport.execute(&compiled.text, variables).await?;
    if res.errors.is_some() {
      log::error!("{} rejected: {}", operation, res);
      return Err(ClientError::Operation(res).into());
    }
    let data = res.data.unwrap_or(Value::Null);
    decode_response(
      &self.tables,
      &self.scalars,
      operation.as_str(),
      selection,
      data,
    )
  }

  pub async fn query(&self, selection: &SelectionSet, variables: &Map<String, Value>) -> Result<Value> {
    self.execute(OperationType::Query, selection, variables).await
  }

  pub async fn mutation(
    &self,
    selection: &SelectionSet,
    variables: &Map<String, Value>,
  ) -> Result<Value> {
    self.execute(OperationType::Mutation, selection, variables).await
  }

  /// Starts a subscription. Every message is decoded before it reaches the `on` listeners; a
  /// message that fails to decode is reported to the `error` listeners instead.
  pub fn subscribe(&self, selection: &SelectionSet) -> Result<SubscriptionHandle> {
    let transport = self
      .subscriptions
      .as_ref()
      .ok_or(ClientError::NoSubscriptionTransport)?;
    let compiled = self.compile(OperationType::Subscription, selection)?;

    let raw = SubscriptionHandle::new();
    let decoded = SubscriptionHandle::new();
    {
      let raw = raw.clone();
      decoded.set_closer(move || raw.close());
    }

    let target = decoded.downgrade();
    let tables = self.tables.clone();
    let scalars = self.scalars.clone();
    let selection = selection.clone();
    raw.on(move |data| {
      let target = match target.upgrade() {
        Some(x) => x,
        None => return,
      };
      match decode_response(
        &tables,
        &scalars,
        OperationType::Subscription.as_str(),
        &selection,
        data.clone(),
      ) {
        Ok(x) => target.dispatch_message(&x),
        Err(e) => target.dispatch_error(&e),
      }
    });

    let target = decoded.downgrade();
    raw.error(move |e| {
      if let Some(x) = target.upgrade() {
        x.dispatch_error(e);
      }
    });
    let target = decoded.downgrade();
    raw.open(move || {
      if let Some(x) = target.upgrade() {
        x.dispatch_open();
      }
    });
    let target = decoded.downgrade();
    raw.off(move || {
      if let Some(x) = target.upgrade() {
        x.dispatch_close();
      }
    });

    transport.subscribe(&compiled.text, raw)?;
    Ok(decoded)
  }
}
