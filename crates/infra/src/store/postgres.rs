use async_stream::try_stream;
use futures_util::TryStreamExt;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder};
use std::time::Duration;

use super::config::StoreConfig;
use super::error::{StoreError, StoreResult};
use super::query::PredicateQuery;
use super::{Document, DocumentStream, IndexStatus};

/// Documents kept as JSONB rows, one table per collection.
pub struct PostgresBackend {
    pool: PgPool,
}

impl PostgresBackend {
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.pass)
            .database(&config.database);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .acquire_timeout(Duration::from_secs(3))
            .idle_timeout(Some(Duration::from_secs(600)))
            .max_lifetime(Some(Duration::from_secs(1800)))
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(Self { pool })
    }

    pub async fn open_collection(&self, name: &str) -> StoreResult<()> {
        let ddl = format!(r#"CREATE TABLE IF NOT EXISTS "{name}" (key TEXT PRIMARY KEY, doc JSONB NOT NULL)"#);
        sqlx::query(&ddl)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::collection(name, e))?;
        Ok(())
    }

    pub async fn ensure_index(&self, name: &str) -> StoreResult<IndexStatus> {
        let index = format!("{name}_doc_idx");
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM pg_indexes WHERE schemaname = current_schema() AND indexname = $1)",
        )
        .bind(&index)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::query)?;

        if exists {
            return Ok(IndexStatus::AlreadyPresent);
        }

        let ddl = format!(r#"CREATE INDEX IF NOT EXISTS "{index}" ON "{name}" USING GIN (doc)"#);
        sqlx::query(&ddl)
            .execute(&self.pool)
            .await
            .map_err(StoreError::query)?;
        Ok(IndexStatus::Created)
    }

    pub async fn upsert(&self, name: &str, key: &str, doc: Document) -> StoreResult<()> {
        let sql = format!(
            r#"
            INSERT INTO "{name}" (key, doc)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET doc = EXCLUDED.doc
            "#
        );
        sqlx::query(&sql)
            .bind(key)
            .bind(Json(doc))
            .execute(&self.pool)
            .await
            .map_err(StoreError::write)?;
        Ok(())
    }

    pub async fn get(&self, name: &str, key: &str) -> StoreResult<Document> {
        let sql = format!(r#"SELECT doc FROM "{name}" WHERE key = $1"#);
        let row: Option<Json<Document>> = sqlx::query_scalar(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::read)?;

        row.map(|Json(doc)| doc)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    pub async fn remove(&self, name: &str, key: &str) -> StoreResult<bool> {
        let sql = format!(r#"DELETE FROM "{name}" WHERE key = $1"#);
        let result = sqlx::query(&sql)
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(StoreError::write)?;
        Ok(result.rows_affected() > 0)
    }

    /// Nothing is sent to the server until the stream is first polled.
    pub fn query(&self, name: &str, query: PredicateQuery) -> DocumentStream {
        let pool = self.pool.clone();
        let table = name.to_string();

        Box::pin(try_stream! {
            let mut builder =
                QueryBuilder::<Postgres>::new(format!(r#"SELECT doc FROM "{table}" WHERE TRUE"#));

            if let Some(prefix) = query.key_prefix {
                builder.push(" AND starts_with(key, ");
                builder.push_bind(prefix);
                builder.push(")");
            }

            for predicate in query.predicates {
                builder.push(" AND (doc #> ");
                builder.push_bind(predicate.path);
                builder.push(") ");
                builder.push(predicate.op.sql_operator());
                builder.push(" ");
                builder.push_bind(Json(predicate.value));
            }

            builder.push(" ORDER BY key");

            if let Some(limit) = query.limit {
                builder.push(" LIMIT ");
                builder.push_bind(limit);
            }

            let mut rows = builder
                .build_query_scalar::<Json<Document>>()
                .fetch(&pool);

            while let Some(Json(doc)) = rows.try_next().await.map_err(StoreError::query)? {
                yield doc;
            }
        })
    }

    pub async fn ping(&self) -> StoreResult<()> {
        let _one: i32 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::read)?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
