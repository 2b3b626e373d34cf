use async_trait::async_trait;
use dsu_core::data::Data;
use dsu_core::paging::Page;
use dsu_core::schema::SchemaRecord;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::FindOptions;

use super::documents::{DataDoc, SchemaDoc};
use super::{find_at_most_one, insert, MongoStore, DATA, SCHEMAS};
use crate::bins::{DataBin, SchemaBin};
use crate::error::{require_key, require_schema_shape, DbResult};
use crate::query::{DataQuery, SchemaQuery};

fn page_options(sort: Document, skip: i64, limit: i64) -> FindOptions {
    let mut options = FindOptions::default();
    options.sort = Some(sort);
    options.skip = Some(skip.max(0) as u64);
    options.limit = Some(limit);
    options
}

#[async_trait]
impl SchemaBin for MongoStore {
    async fn store(&self, schema: &SchemaRecord) -> DbResult<()> {
        require_schema_shape(schema)?;
        let collection = self.collection::<SchemaDoc>(SCHEMAS);
        let key = format!("{}/{}", schema.id, schema.version);
        insert(&collection, &SchemaDoc::try_from(schema)?, "schema", &key).await
    }

    async fn find(&self, id: &str, version: i64) -> DbResult<Option<SchemaRecord>> {
        let collection = self.collection::<SchemaDoc>(SCHEMAS);
        let key = format!("{id}/{version}");
        find_at_most_one(&collection, doc! { "id": id, "version": version }, "schema", &key)
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn list(&self, query: &SchemaQuery) -> DbResult<Page<SchemaRecord>> {
        let collection = self.collection::<SchemaDoc>(SCHEMAS);
        let mut filter = Document::new();
        if let Some(id) = &query.id {
            filter.insert("id", id.as_str());
        }
        if let Some(version) = query.version {
            filter.insert("version", version);
        }

        let total = collection.count_documents(filter.clone()).await?;
        let docs: Vec<SchemaDoc> = collection
            .find(filter)
            .with_options(page_options(
                doc! { "id": 1, "version": 1 },
                query.page.skip,
                query.page.limit,
            ))
            .await?
            .try_collect()
            .await?;

        Ok(Page {
            items: docs
                .into_iter()
                .map(TryInto::try_into)
                .collect::<DbResult<_>>()?,
            total,
        })
    }
}

#[async_trait]
impl DataBin for MongoStore {
    async fn store_all(&self, data: &[Data]) -> DbResult<()> {
        if data.is_empty() {
            return Ok(());
        }
        for item in data {
            require_key("data", &item.owner)?;
        }
        let docs: Vec<DataDoc> = data.iter().map(DataDoc::from).collect();
        self.collection::<DataDoc>(DATA).insert_many(docs).await?;
        tracing::debug!(count = data.len(), "Stored data points");
        Ok(())
    }

    async fn query(&self, query: &DataQuery) -> DbResult<Page<Data>> {
        let collection = self.collection::<DataDoc>(DATA);
        let filter = doc! {
            "owner": query.owner.as_str(),
            "schema_id": query.schema_id.as_str(),
            "schema_version": query.schema_version,
        };

        let total = collection.count_documents(filter.clone()).await?;
        // Nulls sort lowest, so descending puts undated records last; `_id`
        // grows with insertion.
        let docs: Vec<DataDoc> = collection
            .find(filter)
            .with_options(page_options(
                doc! { "meta_timestamp": -1, "_id": -1 },
                query.page.skip,
                query.page.limit,
            ))
            .await?
            .try_collect()
            .await?;

        Ok(Page {
            items: docs
                .into_iter()
                .map(TryInto::try_into)
                .collect::<DbResult<_>>()?,
            total,
        })
    }
}
