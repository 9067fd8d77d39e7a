use api::gql::{QueryRequest, QueryResponse};
use api::AppState;
use infra::models::{Player, Statistics, Team};
use infra::repos::PlayerRepo;
use infra::DocumentStore;
use serde_json::Value;

pub async fn setup_test_state() -> AppState {
    let store = DocumentStore::in_memory();
    PlayerRepo::new(store.clone())
        .prepare()
        .await
        .expect("Failed to prepare players collection");
    AppState::new(store)
}

/// Helper function to execute queries, optionally with variables
pub async fn execute_query(
    state: &AppState,
    query: &str,
    variables: Option<Value>,
) -> QueryResponse {
    let mut request = QueryRequest::new(query);

    if let Some(Value::Object(vars)) = variables {
        request = request.variables(vars);
    }

    state.executor().execute(request).await
}

/// Create a player with team and statistics and return it
#[allow(dead_code)]
pub async fn create_test_player(state: &AppState, email: &str) -> Player {
    let player = Player::new(email, 24, "11")
        .with_team(Team {
            name: "Hawks".to_string(),
            wins: 7,
            loses: 3,
        })
        .with_stats(Statistics {
            goals: 12,
            assists: 5,
        });

    PlayerRepo::new(state.store.clone())
        .add(&player)
        .await
        .expect("Failed to create test player");

    player
}

/// Create a player with neither team nor statistics
#[allow(dead_code)]
pub async fn create_bare_player(state: &AppState, email: &str) -> Player {
    let player = Player::new(email, 19, "3");

    PlayerRepo::new(state.store.clone())
        .add(&player)
        .await
        .expect("Failed to create test player");

    player
}
