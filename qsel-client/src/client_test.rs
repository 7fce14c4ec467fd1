use std::{
  convert::TryFrom,
  sync::{Arc, Mutex},
};

use qsel::{
  query::{variable, CompileError},
  selection::SelectionSet,
};
use serde_json::{json, Map, Value};

use crate::{
  client::{Client, ClientError},
  config::{ClientConfig, HttpMethod},
  mock_transport::{market_schema, numeric_scalars, MockSubscriptions, MockTransport},
  transport::TransportError,
};

fn selection(x: Value) -> SelectionSet {
  SelectionSet::try_from(x).unwrap()
}

fn tokens_over(min: u64) -> SelectionSet {
  selection(json!({
    "token": [
      { "where": { "max_supply": { "_gt": min } } },
      { "ticker": true, "max_supply": true }
    ]
  }))
}

#[tokio::test]
async fn query_encodes_and_decodes_scalars() {
  let _ = pretty_env_logger::try_init();
  let transport = MockTransport::new();
  transport.respond_json(json!({
    "data": { "token": [{ "ticker": "BTC", "max_supply": "21000000" }] }
  }));
  let client = Client::new(market_schema(), transport.clone()).with_scalars(numeric_scalars());

  let data = client.query(&tokens_over(1000), &Map::new()).await.unwrap();
  assert_eq!(
    data,
    json!({ "token": [{ "ticker": "BTC", "max_supply": 21000000 }] })
  );

  let text = transport.last_query();
  assert!(text.starts_with("query {"));
  assert!(text.contains(r#"token(where: {max_supply: {_gt: "1000"}}) { ticker max_supply }"#));
}

#[tokio::test]
async fn data_passes_through_without_scalars() {
  let _ = pretty_env_logger::try_init();
  let transport = MockTransport::new();
  transport.respond_json(json!({
    "data": { "token": [{ "ticker": "BTC", "max_supply": "21000000" }] }
  }));
  let client = Client::new(market_schema(), transport.clone());

  let data = client.query(&tokens_over(1000), &Map::new()).await.unwrap();
  assert_eq!(data["token"][0]["max_supply"], json!("21000000"));
  assert!(transport.last_query().contains("_gt: 1000"));
}

#[tokio::test]
async fn errors_reject_the_call_with_the_full_response() {
  let _ = pretty_env_logger::try_init();
  let transport = MockTransport::new();
  transport.respond_json(json!({
    "data": { "token": [] },
    "errors": [{ "message": "x" }]
  }));
  let client = Client::new(market_schema(), transport.clone()).with_scalars(numeric_scalars());

  let err = client
    .query(&tokens_over(1), &Map::new())
    .await
    .unwrap_err();
  match err.downcast_ref::<ClientError>() {
    Some(ClientError::Operation(res)) => {
      let errors = res.errors.as_ref().unwrap();
      assert_eq!(errors.len(), 1);
      assert_eq!(errors[0].message, "x");
      assert_eq!(res.data, Some(json!({ "token": [] })));
    }
    x => panic!("unexpected error: {:?}", x),
  }
}

#[tokio::test]
async fn empty_error_list_still_rejects() {
  let transport = MockTransport::new();
  transport.respond_json(json!({ "data": null, "errors": [] }));
  let client = Client::new(market_schema(), transport.clone());

  let err = client
    .query(&tokens_over(1), &Map::new())
    .await
    .unwrap_err();
  assert!(matches!(
    err.downcast_ref::<ClientError>(),
    Some(ClientError::Operation(_))
  ));
}

#[tokio::test]
async fn conflicting_variables_fail_before_sending() {
  let _ = pretty_env_logger::try_init();
  let transport = MockTransport::new();
  let client = Client::new(market_schema(), transport.clone());

  let sel = selection(json!({
    "token": [
      {
        "where": {
          "ticker": { "_eq": variable("v", "String!") },
          "max_supply": { "_eq": variable("v", "numeric!") }
        }
      },
      { "ticker": true }
    ]
  }));
  let err = client.query(&sel, &Map::new()).await.unwrap_err();
  match err.downcast_ref::<CompileError>() {
    Some(CompileError::VariableTypeConflict { name, .. }) => assert_eq!(name, "v"),
    x => panic!("unexpected error: {:?}", x),
  }
  assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn transport_failures_propagate() {
  let transport = MockTransport::new();
  transport.respond(Err(
    TransportError::Status {
      status: 502,
      body: json!("bad gateway"),
    }
    .into(),
  ));
  let client = Client::new(market_schema(), transport.clone());

  let err = client
    .query(&tokens_over(1), &Map::new())
    .await
    .unwrap_err();
  match err.downcast_ref::<TransportError>() {
    Some(TransportError::Status { status, body }) => {
      assert_eq!(*status, 502);
      assert_eq!(body, &json!("bad gateway"));
    }
    x => panic!("unexpected error: {:?}", x),
  }
}

#[tokio::test]
async fn mutation_sends_variables_and_declarations() {
  let _ = pretty_env_logger::try_init();
  let transport = MockTransport::new();
  transport.respond_json(json!({
    "data": { "insert_token": { "ticker": "ETH", "max_supply": "5" } }
  }));
  let client = Client::new(market_schema(), transport.clone())
    .with_scalars(numeric_scalars())
    .with_operation_name("AddToken");

  let sel = selection(json!({
    "insert_token": [
      { "object": { "ticker": variable("ticker", "String!"), "max_supply": 5 } },
      { "ticker": true, "max_supply": true }
    ]
  }));
  let mut vars = Map::new();
  vars.insert("ticker".into(), json!("ETH"));

  let data = client.mutation(&sel, &vars).await.unwrap();
  assert_eq!(
    data,
    json!({ "insert_token": { "ticker": "ETH", "max_supply": 5 } })
  );

  let requests = transport.requests.lock().unwrap();
  let (text, sent) = &requests[0];
  assert!(text.starts_with("mutation AddToken($ticker: String!) {"));
  assert!(text.contains(r#"insert_token(object: {ticker: $ticker, max_supply: "5"})"#));
  assert_eq!(sent, &vars);
}

#[test]
fn subscription_messages_are_decoded() {
  let _ = pretty_env_logger::try_init();
  let subs = MockSubscriptions::new();
  let client = Client::new(market_schema(), MockTransport::new())
    .with_scalars(numeric_scalars())
    .with_subscription_transport(subs.clone());

  let handle = client
    .subscribe(&selection(json!({ "token": { "ticker": true, "max_supply": true } })))
    .unwrap();
  assert_eq!(
    subs.active.lock().unwrap()[0].0,
    "subscription { token { ticker max_supply } }"
  );

  let messages = Arc::new(Mutex::new(Vec::new()));
  let errors = Arc::new(Mutex::new(0usize));
  let opened = Arc::new(Mutex::new(false));
  let closed = Arc::new(Mutex::new(0usize));
  {
    let messages = messages.clone();
    let errors = errors.clone();
    let opened = opened.clone();
    let closed = closed.clone();
    handle
      .on(move |x| messages.lock().unwrap().push(x.clone()))
      .error(move |_| *errors.lock().unwrap() += 1)
      .open(move || *opened.lock().unwrap() = true)
      .off(move || *closed.lock().unwrap() += 1);
  }

  let raw = subs.handle(0);
  raw.dispatch_open();
  assert!(*opened.lock().unwrap());

  raw.dispatch_message(&json!({ "token": [{ "ticker": "BTC", "max_supply": "7" }] }));
  raw.dispatch_message(&json!({ "token": [{ "ticker": "BTC", "max_supply": "seven" }] }));
  assert_eq!(
    *messages.lock().unwrap(),
    vec![json!({ "token": [{ "ticker": "BTC", "max_supply": 7 }] })]
  );
  assert_eq!(*errors.lock().unwrap(), 1);

  handle.close();
  handle.close();
  assert_eq!(*subs.closed.lock().unwrap(), 1);
  assert_eq!(*closed.lock().unwrap(), 1);
  assert!(handle.is_closed());
}

#[test]
fn subscribe_requires_a_subscription_transport() {
  let client = Client::new(market_schema(), MockTransport::new());
  let err = client
    .subscribe(&selection(json!({ "token": { "ticker": true } })))
    .unwrap_err();
  assert!(matches!(
    err.downcast_ref::<ClientError>(),
    Some(ClientError::NoSubscriptionTransport)
  ));
}

#[test]
fn config_from_yaml() {
  let config = ClientConfig::from_yaml(
    r#"
endpoint: https://example.com/v1/graphql
method: GET
headers:
  x-hasura-admin-secret: secret
operation_name: Market
"#,
  )
  .unwrap();
  assert_eq!(config.method, HttpMethod::Get);
  assert_eq!(config.headers["x-hasura-admin-secret"], "secret");
  assert_eq!(config.operation_name.as_deref(), Some("Market"));
  assert_eq!(
    config.websocket_url().unwrap(),
    "wss://example.com/v1/graphql"
  );

  let config = ClientConfig::new("http://localhost:8080/graphql");
  assert_eq!(config.method, HttpMethod::Post);
  assert_eq!(
    config.websocket_url().unwrap(),
    "ws://localhost:8080/graphql"
  );
  assert!(ClientConfig::new("localhost:8080").websocket_url().is_err());
  assert!(ClientConfig::from_yaml("endpoint: x\nretries: 3\n").is_err());
}
