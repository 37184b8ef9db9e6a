use client_engine::{ConfigurationError, ExecutionError};
use client_runtime::{GraphqlError, GraphqlResponse, TransportError};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::{engine, mock::MockLink, query};

#[tokio::test(start_paused = true)]
async fn client_fields_survive_transport_failures() {
    let link = MockLink::new().failing(TransportError::request("connection reset"));
    let engine = engine(&link);

    let response = engine.execute(query("query A { a c @client }")).await.unwrap();

    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "a": null,
        "c": 9
      },
      "errors": [
        {
          "message": "request failed: connection reset",
          "extensions": {
            "code": "TRANSPORT_ERROR"
          }
        }
      ]
    }
    "###);
    assert_eq!(0, engine.in_flight_count());
}

#[tokio::test(start_paused = true)]
async fn operation_errors_only_fail_their_operation() {
    let link = MockLink::new()
        .with_data("A", json!({"a": 1}))
        .with_response("B", GraphqlResponse::error(GraphqlError::new("b is broken")));
    let engine = engine(&link);

    let a = engine.execute(query("query A { a }"));
    let b = engine.execute(query("query B { b c @client }"));
    let (a, b) = (a.await.unwrap(), b.await.unwrap());

    assert_eq!(vec![vec!["A", "B"]], link.batches());
    assert!(a.is_ok());
    assert_eq!(Some(&json!(1)), a.get("a"));

    insta::assert_json_snapshot!(b, @r###"
    {
      "data": {
        "b": null,
        "c": 9
      },
      "errors": [
        {
          "message": "b is broken",
          "extensions": {
            "code": "OPERATION_ERROR"
          }
        }
      ]
    }
    "###);

    // Only the successful operation was cached.
    engine.execute(query("query A { a }")).await.unwrap();
    engine.execute(query("query B { b }")).await.unwrap();
    assert_eq!(vec![vec!["A", "B"], vec!["B"]], link.batches());
}

#[tokio::test(start_paused = true)]
async fn partial_data_is_a_success() {
    let link = MockLink::new().with_response(
        "A",
        GraphqlResponse {
            data: json!({"a": 1, "b": null}).as_object().cloned(),
            errors: vec![GraphqlError {
                message: "b is unavailable".into(),
                path: Some(vec![json!("b")]),
                extensions: None,
            }],
        },
    );
    let engine = engine(&link);

    let response = engine.execute(query("query A { a b }")).await.unwrap();
    assert_eq!(Some(&json!(1)), response.get("a"));
    assert_eq!(vec![json!("b")], response.errors[0].path);

    // Cached with its errors.
    let cached = engine.execute(query("query A { a b }")).await.unwrap();
    assert_eq!(response, cached);
    assert_eq!(vec!["A"], link.performed());
}

#[tokio::test(start_paused = true)]
async fn missing_replies_fail_their_operation() {
    let link = MockLink::new()
        .with_data("A", json!({"a": 1}))
        .without_reply_for("B");
    let engine = engine(&link);

    let a = engine.execute(query("query A { a }"));
    let b = engine.execute(query("query B { b }"));
    let (a, b) = (a.await.unwrap(), b.await.unwrap());

    assert!(a.is_ok());
    assert_eq!(None, b.data);
    assert_eq!("no reply received for operation #2", b.errors[0].message);
    assert_eq!(Some("TRANSPORT_ERROR"), b.errors[0].code());
    assert_eq!(0, engine.in_flight_count());
}

#[tokio::test(start_paused = true)]
async fn unknown_replies_are_ignored() {
    let link = MockLink::new().with_data("A", json!({"a": 1})).with_orphan_reply();
    let engine = engine(&link);

    let response = engine.execute(query("query A { a }")).await.unwrap();

    assert_eq!(Some(&json!(1)), response.get("a"));
    assert!(response.is_ok());
}

#[tokio::test(start_paused = true)]
async fn resolver_errors_are_field_errors() {
    let link = MockLink::new().with_data("A", json!({"a": 1}));
    let engine = engine(&link);

    let response = engine.execute(query("query A { a broken @client c @client }")).await.unwrap();

    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "a": 1,
        "broken": null,
        "c": 9
      },
      "errors": [
        {
          "message": "resolver exploded",
          "path": [
            "broken"
          ],
          "extensions": {
            "code": "RESOLVER_ERROR"
          }
        }
      ]
    }
    "###);
}

#[tokio::test(start_paused = true)]
async fn missing_resolvers_are_rejected_before_dispatch() {
    let link = MockLink::new();
    let engine = engine(&link);
    let query = query("query A { a unknown @client }");

    assert_eq!(
        Err(ConfigurationError::MissingResolver {
            path: "unknown".into()
        }),
        engine.validate(&query)
    );
    assert_eq!(
        Err(ExecutionError::Configuration(ConfigurationError::MissingResolver {
            path: "unknown".into()
        })),
        engine.execute(query).await
    );

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(link.performed().is_empty());
    assert_eq!(0, engine.in_flight_count());
}
