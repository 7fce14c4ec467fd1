use crate::schema::SchemaTables;

pub const TOKEN_SCHEMA: &str = r#"
{
  "ops": {
    "query": "Query",
    "mutation": "Mutation",
    "subscription": "Subscription"
  },
  "props": {
    "Query": {
      "token": { "where": "token_bool_exp", "order_by": "token_order_by", "limit": "Int" },
      "user": { "id": "uuid" }
    },
    "Mutation": {
      "update_token": { "where": "token_bool_exp", "_set": "token_set_input" }
    },
    "Subscription": {
      "token": { "where": "token_bool_exp" }
    },
    "user": {
      "tokens": { "where": "token_bool_exp", "order_by": "token_order_by", "limit": "Int" }
    },
    "token_bool_exp": {
      "ticker": "String_comparison_exp",
      "max_supply": "numeric_comparison_exp",
      "_and": "token_bool_exp"
    },
    "String_comparison_exp": { "_eq": "String", "_in": "String" },
    "numeric_comparison_exp": { "_eq": "numeric", "_gt": "numeric", "_in": "numeric" },
    "token_order_by": { "ticker": "order_by", "max_supply": "order_by" },
    "token_set_input": { "ticker": "String", "max_supply": "numeric", "metadata": "jsonb" },
    "order_by": "enum",
    "numeric": "scalar.numeric",
    "uuid": "scalar.uuid",
    "jsonb": "scalar.jsonb"
  },
  "returns": {
    "Query": { "token": "token", "user": "user" },
    "Mutation": { "update_token": "token_mutation_response" },
    "Subscription": { "token": "token" },
    "token_mutation_response": { "affected_rows": "Int", "returning": "token" },
    "token": { "ticker": "String", "max_supply": "numeric", "owner": "user", "__typename": "String" },
    "user": { "id": "uuid", "name": "String", "tokens": "token" },
    "numeric": "scalar.numeric",
    "uuid": "scalar.uuid"
  }
}
"#;

pub fn token_schema() -> SchemaTables {
  SchemaTables::from_json(TOKEN_SCHEMA).unwrap()
}
