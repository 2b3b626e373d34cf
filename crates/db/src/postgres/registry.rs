use async_trait::async_trait;
use dsu_core::data::{Data, MetaData};
use dsu_core::paging::Page;
use dsu_core::schema::SchemaRecord;
use dsu_core::types::Timestamp;
use serde_json::Value;
use sqlx::types::Json;

use super::{classify_insert_error, PgStore};
use crate::bins::{DataBin, SchemaBin};
use crate::error::{at_most_one, require_key, require_schema_shape, DbResult};
use crate::query::{DataQuery, SchemaQuery};

const SCHEMA_COLUMNS: &str =
    "id, version, chunk_size, time_authoritative, time_zone_authoritative, definition";

#[derive(sqlx::FromRow)]
struct SchemaRow {
    id: String,
    version: i64,
    chunk_size: i64,
    time_authoritative: bool,
    time_zone_authoritative: bool,
    definition: Json<Value>,
}

impl From<SchemaRow> for SchemaRecord {
    fn from(row: SchemaRow) -> Self {
        Self {
            id: row.id,
            version: row.version,
            chunk_size: row.chunk_size,
            time_authoritative: row.time_authoritative,
            time_zone_authoritative: row.time_zone_authoritative,
            definition: row.definition.0,
        }
    }
}

#[derive(sqlx::FromRow)]
struct DataRow {
    owner: String,
    schema_id: String,
    schema_version: i64,
    meta_id: Option<String>,
    meta_timestamp: Option<Timestamp>,
    data: Json<Value>,
}

impl From<DataRow> for Data {
    fn from(row: DataRow) -> Self {
        let meta = MetaData {
            id: row.meta_id,
            timestamp: row.meta_timestamp,
        };
        Self {
            owner: row.owner,
            schema_id: row.schema_id,
            schema_version: row.schema_version,
            meta_data: Some(meta).filter(|m| !m.is_empty()),
            data: row.data.0,
        }
    }
}

#[async_trait]
impl SchemaBin for PgStore {
    async fn store(&self, schema: &SchemaRecord) -> DbResult<()> {
        require_schema_shape(schema)?;
        let query = format!("INSERT INTO schemas ({SCHEMA_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)");
        sqlx::query(&query)
            .bind(&schema.id)
            .bind(schema.version)
            .bind(schema.chunk_size)
            .bind(schema.time_authoritative)
            .bind(schema.time_zone_authoritative)
            .bind(Json(&schema.definition))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                classify_insert_error(e, "schema", &format!("{}/{}", schema.id, schema.version))
            })?;
        Ok(())
    }

    async fn find(&self, id: &str, version: i64) -> DbResult<Option<SchemaRecord>> {
        let query =
            format!("SELECT {SCHEMA_COLUMNS} FROM schemas WHERE id = $1 AND version = $2 LIMIT 2");
        let rows = sqlx::query_as::<_, SchemaRow>(&query)
            .bind(id)
            .bind(version)
            .fetch_all(&self.pool)
            .await?;
        at_most_one(
            "schema",
            &format!("{id}/{version}"),
            rows.into_iter().map(Into::into).collect(),
        )
    }

    async fn list(&self, query: &SchemaQuery) -> DbResult<Page<SchemaRecord>> {
        const FILTER: &str =
            "($1::text IS NULL OR id = $1) AND ($2::bigint IS NULL OR version = $2)";

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM schemas WHERE {FILTER}"))
            .bind(&query.id)
            .bind(query.version)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {SCHEMA_COLUMNS} FROM schemas WHERE {FILTER}
             ORDER BY id, version OFFSET $3 LIMIT $4"
        );
        let rows = sqlx::query_as::<_, SchemaRow>(&sql)
            .bind(&query.id)
            .bind(query.version)
            .bind(query.page.skip)
            .bind(query.page.limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            items: rows.into_iter().map(Into::into).collect(),
            total: total.max(0) as u64,
        })
    }
}

#[async_trait]
impl DataBin for PgStore {
    async fn store_all(&self, data: &[Data]) -> DbResult<()> {
        for item in data {
            require_key("data", &item.owner)?;
        }
        let mut tx = self.pool.begin().await?;
        for item in data {
            let meta = item.meta_data.clone().unwrap_or_default();
            sqlx::query(
                "INSERT INTO data_points
                     (owner, schema_id, schema_version, meta_id, meta_timestamp, data)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(&item.owner)
            .bind(&item.schema_id)
            .bind(item.schema_version)
            .bind(meta.id)
            .bind(meta.timestamp)
            .bind(Json(&item.data))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        tracing::debug!(count = data.len(), "Stored data points");
        Ok(())
    }

    async fn query(&self, query: &DataQuery) -> DbResult<Page<Data>> {
        const FILTER: &str = "owner = $1 AND schema_id = $2 AND schema_version = $3";

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM data_points WHERE {FILTER}"))
                .bind(&query.owner)
                .bind(&query.schema_id)
                .bind(query.schema_version)
                .fetch_one(&self.pool)
                .await?;

        let sql = format!(
            "SELECT owner, schema_id, schema_version, meta_id, meta_timestamp, data
             FROM data_points WHERE {FILTER}
             ORDER BY meta_timestamp DESC NULLS LAST, seq DESC
             OFFSET $4 LIMIT $5"
        );
        let rows = sqlx::query_as::<_, DataRow>(&sql)
            .bind(&query.owner)
            .bind(&query.schema_id)
            .bind(query.schema_version)
            .bind(query.page.skip)
            .bind(query.page.limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            items: rows.into_iter().map(Into::into).collect(),
            total: total.max(0) as u64,
        })
    }
}
