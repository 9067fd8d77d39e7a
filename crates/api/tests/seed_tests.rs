mod common;

use api::seed::{seed_sample_player, self_check};
use common::*;
use infra::repos::PlayerRepo;
use serde_json::json;

#[tokio::test]
async fn test_seeded_player_is_queryable() {
    let app_state = setup_test_state().await;
    let repo = PlayerRepo::new(app_state.store.clone());

    let player = seed_sample_player(&repo).await.expect("Failed to seed");
    self_check(app_state.executor(), &player.id)
        .await
        .expect("Self-check should pass");

    let query = format!(
        r#"{{ player(id: "{}") {{ number age email statistics {{ goals assists }} }} }}"#,
        player.id
    );
    let response = execute_query(&app_state, &query, None).await;

    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data,
        json!({
            "player": {
                "number": "28",
                "age": 20,
                "email": "sample.player@example.com",
                "statistics": { "goals": 1, "assists": 10 }
            }
        })
    );
}

#[tokio::test]
async fn test_self_check_fails_on_query_errors() {
    let app_state = setup_test_state().await;

    let result = self_check(app_state.executor(), r#"bad"id"#).await;

    assert!(result.is_err());
}
