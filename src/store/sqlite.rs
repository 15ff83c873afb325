use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{FromRow, Pool, QueryBuilder, Sqlite, Transaction};

use crate::error::AppError;
use crate::store::models::{Attribute, Entity, EntityQuery, EntityReceipt, NewEntity, Payload};
use crate::store::{expiry, now, random_hash, EntityStore};

#[derive(Debug, FromRow)]
struct EntityRow {
    entity_key: String,
    owner: String,
    content_type: String,
    payload: Vec<u8>,
    created_at: i64,
    expires_at: i64,
    tx_hash: String,
}

#[derive(Debug, FromRow)]
struct AttributeRow {
    entity_key: String,
    name: String,
    value: String,
}

/// Entity store persisted in SQLite, for local development.
#[derive(Clone)]
pub struct SqliteEntityStore {
    pool: Pool<Sqlite>,
}

impl SqliteEntityStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, AppError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(30))
            .connect(url)
            .await?;

        Self::from_pool(pool).await
    }

    /// Wraps an existing pool and runs pending migrations.
    pub async fn from_pool(pool: Pool<Sqlite>) -> Result<Self, AppError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::debug!("entity store migrations applied");
        Ok(Self { pool })
    }

    async fn insert_attributes(
        tx: &mut Transaction<'_, Sqlite>,
        key: &str,
        attributes: &[Attribute],
    ) -> Result<(), AppError> {
        for (position, attr) in attributes.iter().enumerate() {
            sqlx::query(
                "INSERT INTO entity_attributes (entity_key, position, name, value) VALUES (?, ?, ?, ?)",
            )
            .bind(key)
            .bind(position as i64)
            .bind(&attr.key)
            .bind(&attr.value)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }

    /// Attributes of every key in `keys`, grouped by entity and kept in write order.
    async fn attributes_for(&self, keys: &[&str]) -> Result<HashMap<String, Vec<Attribute>>, AppError> {
        let mut grouped: HashMap<String, Vec<Attribute>> = HashMap::new();
        if keys.is_empty() {
            return Ok(grouped);
        }

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT entity_key, name, value FROM entity_attributes WHERE entity_key IN (",
        );
        let mut separated = builder.separated(", ");
        for key in keys {
            separated.push_bind(key.to_string());
        }
        separated.push_unseparated(") ORDER BY entity_key, position");

        let rows = builder
            .build_query_as::<AttributeRow>()
            .fetch_all(&self.pool)
            .await?;

        for row in rows {
            grouped
                .entry(row.entity_key)
                .or_default()
                .push(Attribute::new(row.name, row.value));
        }

        Ok(grouped)
    }
}

#[async_trait]
impl EntityStore for SqliteEntityStore {
    async fn create_entity(&self, entity: NewEntity) -> Result<EntityReceipt, AppError> {
        let created_at = now();
        let receipt = EntityReceipt {
            entity_key: random_hash(),
            tx_hash: random_hash(),
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
INSERT INTO entities (entity_key, owner, content_type, payload, created_at, expires_at, tx_hash)
VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&receipt.entity_key)
        .bind(&entity.owner)
        .bind(&entity.content_type)
        .bind(&entity.payload)
        .bind(created_at)
        .bind(expiry(created_at, entity.expires_in))
        .bind(&receipt.tx_hash)
        .execute(&mut *tx)
        .await?;

        Self::insert_attributes(&mut tx, &receipt.entity_key, &entity.attributes).await?;
        tx.commit().await?;

        Ok(receipt)
    }

    async fn update_entity(&self, key: &str, entity: NewEntity) -> Result<EntityReceipt, AppError> {
        let now = now();
        let tx_hash = random_hash();

        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
UPDATE entities
SET owner = ?, content_type = ?, payload = ?, expires_at = ?, tx_hash = ?
WHERE entity_key = ? AND expires_at > ?
            "#,
        )
        .bind(&entity.owner)
        .bind(&entity.content_type)
        .bind(&entity.payload)
        .bind(expiry(now, entity.expires_in))
        .bind(&tx_hash)
        .bind(key)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Entity {} not found", key)));
        }

        sqlx::query("DELETE FROM entity_attributes WHERE entity_key = ?")
            .bind(key)
            .execute(&mut *tx)
            .await?;
        Self::insert_attributes(&mut tx, key, &entity.attributes).await?;
        tx.commit().await?;

        Ok(EntityReceipt {
            entity_key: key.to_string(),
            tx_hash,
        })
    }

    async fn query(&self, query: &EntityQuery) -> Result<Vec<Entity>, AppError> {
        let mut builder = QueryBuilder::<Sqlite>::new(
            r#"
SELECT e.entity_key, e.owner, e.content_type, e.payload, e.created_at, e.expires_at, e.tx_hash
FROM entities e
WHERE e.expires_at > "#,
        );
        builder.push_bind(now());

        for predicate in &query.predicates {
            builder.push(
                " AND EXISTS (SELECT 1 FROM entity_attributes a WHERE a.entity_key = e.entity_key AND a.name = ",
            );
            builder.push_bind(predicate.key.clone());
            builder.push(" AND a.value = ");
            builder.push_bind(predicate.value.clone());
            builder.push(")");
        }

        builder.push(if query.newest_first {
            " ORDER BY e.seq DESC LIMIT "
        } else {
            " ORDER BY e.seq ASC LIMIT "
        });
        builder.push_bind(i64::try_from(query.limit).unwrap_or(i64::MAX));

        let rows: Vec<EntityRow> = builder.build_query_as::<EntityRow>().fetch_all(&self.pool).await?;

        let mut attributes = if query.with_attributes {
            let keys: Vec<&str> = rows.iter().map(|row| row.entity_key.as_str()).collect();
            self.attributes_for(&keys).await?
        } else {
            HashMap::new()
        };

        let entities = rows
            .into_iter()
            .map(|row| Entity {
                attributes: attributes.remove(&row.entity_key).unwrap_or_default(),
                key: row.entity_key,
                owner: row.owner,
                content_type: row.content_type,
                payload: query.with_payload.then_some(Payload::Bytes(row.payload)),
                created_at: row.created_at,
                expires_at: row.expires_at,
                tx_hash: row.tx_hash,
            })
            .collect::<Vec<_>>();

        Ok(entities)
    }

    async fn purge_expired(&self) -> Result<u64, AppError> {
        let now = now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM entity_attributes WHERE entity_key IN (SELECT entity_key FROM entities WHERE expires_at <= ?)",
        )
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let removed = sqlx::query("DELETE FROM entities WHERE expires_at <= ?")
            .bind(now)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        Ok(removed)
    }
}
