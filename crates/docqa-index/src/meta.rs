//! Key/value meta table holding the active table pointer per partition.
//! Rebuilds write a fresh versioned chunk table and flip the pointer
//! only on success, so a failed rebuild leaves the prior table active.

use arrow_array::{RecordBatch, RecordBatchIterator, StringArray, TimestampMillisecondArray};
use arrow_schema::{DataType, Field, Schema, TimeUnit};
use chrono::Utc;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection};
use std::sync::Arc;

use docqa_core::error::{Error, Result};

pub const META_TABLE: &str = "partitions_meta";

pub async fn open_db(uri: &str) -> Result<Connection> {
    connect(uri)
        .execute()
        .await
        .map_err(|e| Error::Storage(format!("failed to open index db: {e}")))
}

fn build_meta_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("key", DataType::Utf8, false),
        Field::new("value", DataType::Utf8, false),
        Field::new("updated_at", DataType::Timestamp(TimeUnit::Millisecond, None), false),
    ]))
}

pub async fn ensure_meta_table(conn: &Connection) -> Result<()> {
    let names = conn
        .table_names()
        .execute()
        .await
        .map_err(|e| Error::Storage(format!("failed to list tables: {e}")))?;
    if names.contains(&META_TABLE.to_string()) {
        return Ok(());
    }
    let iter = RecordBatchIterator::new(vec![].into_iter(), build_meta_schema());
    conn.create_table(META_TABLE, Box::new(iter))
        .execute()
        .await
        .map_err(|e| Error::Storage(format!("failed to create meta table: {e}")))?;
    Ok(())
}

/// Upsert a meta entry; `key` is unique via merge_insert.
pub async fn set_meta(conn: &Connection, key: &str, value: &str) -> Result<()> {
    ensure_meta_table(conn).await?;
    let table = conn
        .open_table(META_TABLE)
        .execute()
        .await
        .map_err(|e| Error::Storage(format!("failed to open meta table: {e}")))?;
    let batch = RecordBatch::try_new(
        build_meta_schema(),
        vec![
            Arc::new(StringArray::from(vec![key.to_string()])),
            Arc::new(StringArray::from(vec![value.to_string()])),
            Arc::new(TimestampMillisecondArray::from(vec![Utc::now().timestamp_millis()])),
        ],
    )
    .map_err(|e| Error::Storage(format!("failed to build meta batch: {e}")))?;
    let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), build_meta_schema()));
    let mut mi = table.merge_insert(&["key"]);
    mi.when_matched_update_all(None).when_not_matched_insert_all();
    mi.execute(reader)
        .await
        .map_err(|e| Error::Storage(format!("failed to write meta entry: {e}")))?;
    Ok(())
}

pub async fn get_meta(conn: &Connection, key: &str) -> Result<Option<String>> {
    let names = conn
        .table_names()
        .execute()
        .await
        .map_err(|e| Error::Storage(format!("failed to list tables: {e}")))?;
    if !names.contains(&META_TABLE.to_string()) {
        return Ok(None);
    }
    let table = conn
        .open_table(META_TABLE)
        .execute()
        .await
        .map_err(|e| Error::Storage(format!("failed to open meta table: {e}")))?;
    let mut stream = table
        .query()
        .only_if(format!("key = '{}'", escape_literal(key)))
        .execute()
        .await
        .map_err(|e| Error::Storage(format!("failed to query meta table: {e}")))?;
    while let Some(batch) = stream
        .try_next()
        .await
        .map_err(|e| Error::Storage(format!("failed to read meta table: {e}")))?
    {
        if batch.num_rows() == 0 {
            continue;
        }
        let values = batch
            .column_by_name("value")
            .and_then(|c| c.as_any().downcast_ref::<StringArray>().cloned())
            .ok_or_else(|| Error::Storage("meta table missing 'value' column".to_string()))?;
        return Ok(Some(values.value(0).to_string()));
    }
    Ok(None)
}

/// Escape a string for use inside a single-quoted SQL literal.
pub fn escape_literal(raw: &str) -> String {
    raw.replace('\'', "''")
}
