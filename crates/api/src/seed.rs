use infra::models::{Player, Statistics};
use infra::repos::PlayerRepo;
use infra::StoreError;

use crate::gql::{QueryExecutor, QueryRequest};

/// Insert one sample player so a fresh store has something to query.
pub async fn seed_sample_player(repo: &PlayerRepo) -> Result<Player, StoreError> {
    let player = Player::new("sample.player@example.com", 20, "28").with_stats(Statistics {
        goals: 1,
        assists: 10,
    });
    repo.add(&player).await?;
    tracing::info!(player_id = %player.id, "Seeded sample player");
    Ok(player)
}

/// Query the seeded player back through the executor and log the response.
pub async fn self_check(executor: &QueryExecutor, player_id: &str) -> anyhow::Result<()> {
    let query = format!(r#"{{ player(id: "{player_id}") {{ id number }} }}"#);
    let response = executor.execute(QueryRequest::new(query)).await;

    if !response.is_ok() {
        let messages: Vec<String> = response.errors.iter().map(ToString::to_string).collect();
        anyhow::bail!("self-check query failed: {}", messages.join("; "));
    }

    tracing::info!("Self-check result: {}", serde_json::to_string(&response)?);
    Ok(())
}
