use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use qsel::{
  scalar::{ScalarCoders, StockCodec},
  schema::SchemaTables,
};
use serde_json::{Map, Value};

use crate::{
  subscription::SubscriptionHandle,
  transport::{GraphQLResponse, SubscriptionTransport, Transport},
};

pub const MARKET_SCHEMA: &str = r#"
ops:
  query: Query
  mutation: Mutation
  subscription: Subscription
props:
  Query:
    token:
      where: token_bool_exp
  Mutation:
    insert_token:
      object: token_insert_input
  Subscription:
    token:
      where: token_bool_exp
  token_bool_exp:
    ticker: String_comparison_exp
    max_supply: numeric_comparison_exp
  String_comparison_exp:
    _eq: String
  numeric_comparison_exp:
    _eq: numeric
    _gt: numeric
  token_insert_input:
    ticker: String
    max_supply: numeric
  numeric: scalar.numeric
returns:
  Query:
    token: token
  Mutation:
    insert_token: token
  Subscription:
    token: token
  token:
    ticker: String
    max_supply: numeric
  numeric: scalar.numeric
"#;

pub fn market_schema() -> Arc<SchemaTables> {
  Arc::new(SchemaTables::from_yaml(MARKET_SCHEMA).unwrap())
}

pub fn numeric_scalars() -> ScalarCoders {
  ScalarCoders::new().with_coder("numeric", StockCodec::NumericString.coder())
}

/// Replays canned responses and records every request it sees.
#[derive(Default)]
pub struct MockTransport {
  responses: Mutex<Vec<Result<GraphQLResponse>>>,
  pub requests: Mutex<Vec<(String, Map<String, Value>)>>,
}

impl MockTransport {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn respond(&self, res: Result<GraphQLResponse>) {
    self.responses.lock().unwrap().push(res);
  }

  pub fn respond_json(&self, res: Value) {
    self.respond(Ok(serde_json::from_value(res).unwrap()));
  }

  pub fn request_count(&self) -> usize {
    self.requests.lock().unwrap().len()
  }

  pub fn last_query(&self) -> String {
    self.requests.lock().unwrap().last().unwrap().0.clone()
  }
}

#[async_trait]
impl Transport for MockTransport {
  async fn execute(&self, query: &str, variables: &Map<String, Value>) -> Result<GraphQLResponse> {
    self
      .requests
      .lock()
      .unwrap()
      .push((query.to_string(), variables.clone()));
    self.responses.lock().unwrap().remove(0)
  }
}

/// Hands out its handles so tests can drive them.
#[derive(Default)]
pub struct MockSubscriptions {
  pub active: Mutex<Vec<(String, SubscriptionHandle)>>,
  pub closed: Arc<Mutex<usize>>,
}

impl MockSubscriptions {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn handle(&self, i: usize) -> SubscriptionHandle {
    self.active.lock().unwrap()[i].1.clone()
  }
}

impl SubscriptionTransport for MockSubscriptions {
  fn subscribe(&self, query: &str, handle: SubscriptionHandle) -> Result<()> {
    let closed = self.closed.clone();
    let weak = handle.downgrade();
    handle.set_closer(move || {
      *closed.lock().unwrap() += 1;
      if let Some(x) = weak.upgrade() {
        x.dispatch_close();
      }
    });
    self
      .active
      .lock()
      .unwrap()
      .push((query.to_string(), handle));
    Ok(())
  }
}
