use serde_json::Value;

use infra::repos::PlayerRepo;
use infra::DocumentStore;

use super::bindings::{ResolveParams, ResolverBindings};
use super::error::ResolverError;
use super::schema::QUERY_TYPE;

/// Bindings for the lacrosse schema. Fields not bound here read the
/// same-named member of their parent document.
pub fn build_bindings(store: DocumentStore) -> ResolverBindings {
    let players = PlayerRepo::new(store);
    let mut bindings = ResolverBindings::new();

    {
        let players = players.clone();
        bindings.bind(QUERY_TYPE, "player", move |params: ResolveParams| {
            let players = players.clone();
            async move {
                let id = params.arguments.require_str("id")?.to_string();
                Ok::<_, ResolverError>(players.get_by_id(&id).await?.unwrap_or(Value::Null))
            }
        });
    }

    bindings.bind(QUERY_TYPE, "list", move |_params: ResolveParams| {
        let players = players.clone();
        async move { Ok::<_, ResolverError>(Value::Array(players.list().await?)) }
    });

    // Stored documents keep statistics under `stats`.
    bindings.bind("Player", "statistics", |params: ResolveParams| async move {
        Ok::<_, ResolverError>(params.parent.get("stats").cloned().unwrap_or(Value::Null))
    });

    bindings
}
