use client_engine::{ExecuteOptions, ExecutionError, FetchPolicy};
use indoc::indoc;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::{config, engine, engine_with_config, mock::MockLink, query};

fn with_policy(fetch_policy: FetchPolicy) -> ExecuteOptions {
    ExecuteOptions::default().with_fetch_policy(fetch_policy)
}

#[tokio::test(start_paused = true)]
async fn network_only_refreshes_the_cache() {
    let link = MockLink::new().with_data("A", json!({"a": 1}));
    let engine = engine(&link);

    engine.execute(query("query A { a }")).await.unwrap();
    engine
        .execute_with(query("query A { a }"), with_policy(FetchPolicy::NetworkOnly))
        .await
        .unwrap();
    assert_eq!(vec!["A", "A"], link.performed());

    engine.execute(query("query A { a }")).await.unwrap();
    assert_eq!(vec!["A", "A"], link.performed());
}

#[tokio::test(start_paused = true)]
async fn network_only_still_joins_operations_in_flight() {
    let link = MockLink::new().with_data("A", json!({"a": 1}));
    let engine = engine(&link);

    let first = engine.execute(query("query A { a }"));
    let second = engine.execute_with(query("query A { a }"), with_policy(FetchPolicy::NetworkOnly));
    assert_eq!(first.await.unwrap(), second.await.unwrap());

    assert_eq!(vec!["A"], link.performed());
}

#[tokio::test(start_paused = true)]
async fn cache_only_never_dispatches() {
    let link = MockLink::new().with_data("A", json!({"a": 1}));
    let engine = engine(&link);

    assert_eq!(
        Err(ExecutionError::CacheMiss),
        engine
            .execute_with(query("query A { a }"), with_policy(FetchPolicy::CacheOnly))
            .await
    );
    assert!(link.performed().is_empty());

    engine.execute(query("query A { a }")).await.unwrap();
    let cached = engine
        .execute_with(query("query A { a c @client }"), with_policy(FetchPolicy::CacheOnly))
        .await
        .unwrap();

    assert_eq!(Some(&json!(1)), cached.get("a"));
    assert_eq!(Some(&json!(9)), cached.get("c"));
    assert_eq!(vec!["A"], link.performed());
}

#[tokio::test(start_paused = true)]
async fn no_cache_leaves_the_cache_untouched() {
    let link = MockLink::new().with_data("A", json!({"a": 1}));
    let engine = engine(&link);

    engine
        .execute_with(query("query A { a }"), with_policy(FetchPolicy::NoCache))
        .await
        .unwrap();
    engine.execute(query("query A { a }")).await.unwrap();

    assert_eq!(vec!["A", "A"], link.performed());
}

#[tokio::test(start_paused = true)]
async fn default_policy_comes_from_configuration() {
    let link = MockLink::new().with_data("A", json!({"a": 1}));
    let engine = engine_with_config(
        &link,
        config(indoc! {r#"
            [cache]
            default_fetch_policy = "network-only"
        "#}),
    );

    engine.execute(query("query A { a }")).await.unwrap();
    engine.execute(query("query A { a }")).await.unwrap();
    assert_eq!(vec!["A", "A"], link.performed());

    engine
        .execute_with(query("query A { a }"), with_policy(FetchPolicy::CacheFirst))
        .await
        .unwrap();
    assert_eq!(vec!["A", "A"], link.performed());
}

#[tokio::test(start_paused = true)]
async fn invalidation() {
    let link = MockLink::new()
        .with_data("A", json!({"a": 1}))
        .with_data("B", json!({"b": 2}));
    let engine = engine(&link);

    engine.execute(query("query A { a }")).await.unwrap();
    engine.execute(query("query B { b }")).await.unwrap();

    assert!(engine.invalidate(&query("query Renamed { a }")));
    engine.execute(query("query A { a }")).await.unwrap();
    engine.execute(query("query B { b }")).await.unwrap();
    assert_eq!(vec!["A", "B", "A"], link.performed());

    engine.reset_cache();
    engine.execute(query("query A { a }")).await.unwrap();
    engine.execute(query("query B { b }")).await.unwrap();
    assert_eq!(vec!["A", "B", "A", "A", "B"], link.performed());
}

#[tokio::test(start_paused = true)]
async fn client_only_queries_skip_the_network() {
    let link = MockLink::new();
    let engine = engine(&link);

    let response = engine.execute(query("query Local { c @client d @client }")).await.unwrap();

    assert_eq!(Some(&json!(9)), response.get("c"));
    assert_eq!(Some(&json!("local")), response.get("d"));
    assert!(link.performed().is_empty());
    assert_eq!(0, engine.in_flight_count());
}
