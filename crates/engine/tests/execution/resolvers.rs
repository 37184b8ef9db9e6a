use client_engine::{ClientResolvers, Config, Engine, QueryDescriptor, QueryDocument, Variables};
use client_runtime_local::TokioRuntime;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::{engine, mock::MockLink, query};

fn link() -> MockLink {
    MockLink::new().with_data(
        "User",
        json!({"user": {"name": "Ada Lovelace", "friends": [{"name": "Charles Babbage"}, {"name": "Mary Somerville"}]}}),
    )
}

#[tokio::test(start_paused = true)]
async fn nested_client_fields_see_their_parent() {
    let link = link();
    let engine = engine(&link);

    let response = engine
        .execute(query(
            r#"
            query User {
                user {
                    initials @client
                    name
                    friends {
                        name
                    }
                }
            }
            "#,
        ))
        .await
        .unwrap();

    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "user": {
          "initials": "AL",
          "name": "Ada Lovelace",
          "friends": [
            {
              "name": "Charles Babbage"
            },
            {
              "name": "Mary Somerville"
            }
          ]
        }
      }
    }
    "###);

    let operations = link.operations();
    insta::assert_snapshot!(operations[0].query, @r###"
    query {
      user {
        name
        friends {
          name
        }
      }
    }
    "###);
}

#[tokio::test(start_paused = true)]
async fn resolvers_read_the_cache() {
    let link = link();
    let engine = engine(&link);

    let before = engine.execute(query("query Greeting { greeting @client }")).await.unwrap();
    assert_eq!(Some(&json!(null)), before.get("greeting"));
    assert_eq!("user is not cached", before.errors[0].message);

    engine.execute(query("query User { user { name } }")).await.unwrap();

    let after = engine.execute(query("query Greeting { greeting @client }")).await.unwrap();
    assert_eq!(Some(&json!("Hello Ada Lovelace")), after.get("greeting"));
    assert!(after.is_ok());
    assert_eq!(vec!["User"], link.performed());
}

#[tokio::test(start_paused = true)]
async fn client_objects_are_projected_on_their_selection() {
    let resolvers = ClientResolvers::builder()
        .field("preferences", |ctx| {
            let theme = ctx.variables().get("theme").cloned().unwrap_or(json!("light"));
            Ok(json!({"theme": theme, "language": "en", "internal": true}))
        })
        .build();
    let engine = Engine::builder(TokioRuntime::new(MockLink::new()))
        .config(Config::default())
        .resolvers(resolvers)
        .build();

    let document = QueryDocument::parse("query Prefs($theme: String) { preferences @client { language theme } }").unwrap();
    let response = engine
        .execute(
            QueryDescriptor::new(document).with_variables(Variables::new().with("theme", "dark")),
        )
        .await
        .unwrap();

    assert_eq!(
        Some(&json!({"language": "en", "theme": "dark"})),
        response.get("preferences")
    );
}

#[tokio::test(start_paused = true)]
async fn fields_without_network_leaves_are_built_locally() {
    let link = MockLink::new().with_data("Mixed", json!({"a": 1}));
    let engine = engine(&link);

    let response = engine
        .execute(query("query Mixed { a settings { c @client d @client } }"))
        .await
        .unwrap();

    assert_eq!(Some(&json!(1)), response.get("a"));
    assert_eq!(Some(&json!({"c": 9, "d": "local"})), response.get("settings"));
    assert_eq!("query {\n  a\n}\n", link.operations()[0].query);
}
