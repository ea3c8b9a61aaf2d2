use sqlx::PgConnection;

use crate::{directories, RequestContext, Result, StorageError};
use models::{CatalogObject, HashDigest, ObjectType, RawValue};

/// The persisted form of ObjectType. Kept separate so the database enum can
/// evolve without touching the model type.
#[derive(Debug, Copy, Clone, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "catalog_object_type")]
#[sqlx(rename_all = "snake_case")]
pub enum StoredObjectType {
    ParameterSchema,
    CollectionSchema,
    CatalogCollection,
}

impl From<ObjectType> for StoredObjectType {
    fn from(t: ObjectType) -> Self {
        match t {
            ObjectType::ParameterSchema => StoredObjectType::ParameterSchema,
            ObjectType::CollectionSchema => StoredObjectType::CollectionSchema,
            ObjectType::CatalogCollection => StoredObjectType::CatalogCollection,
        }
    }
}

impl From<StoredObjectType> for ObjectType {
    fn from(t: StoredObjectType) -> Self {
        match t {
            StoredObjectType::ParameterSchema => ObjectType::ParameterSchema,
            StoredObjectType::CollectionSchema => ObjectType::CollectionSchema,
            StoredObjectType::CatalogCollection => ObjectType::CatalogCollection,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ObjectRow {
    #[sqlx(rename = "type")]
    object_type: StoredObjectType,
    version: String,
    compressed: bool,
    data: Vec<u8>,
}

/// Store a content-addressed object. Insertion is idempotent on
/// (hash, tenant): a pre-existing row reports AlreadyExists and the stored
/// bytes are never touched. `compress` is the process-wide policy flag;
/// the row remembers which form it holds, so reads are transparent under
/// either setting.
#[tracing::instrument(err, level = "debug", skip(ctx, ex, object), fields(hash = %object.hash))]
pub async fn put(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    object: &CatalogObject,
    compress: bool,
) -> Result<()> {
    let tenant_id = ctx.tenant_id()?;
    let raw = object.data.canonical_bytes();
    if raw.is_empty() || object.data.is_null() {
        return Err(StorageError::InvalidInput(
            "catalog object has no data".to_string(),
        ));
    }
    if object.version.is_empty() {
        return Err(StorageError::InvalidInput(
            "catalog object has no version".to_string(),
        ));
    }

    let data = if compress {
        snap::raw::Encoder::new()
            .compress_vec(raw)
            .map_err(|err| StorageError::integrity(format!("compressing object: {err}")))?
    } else {
        raw.to_vec()
    };

    let result = sqlx::query(
        r#"insert into catalog_objects (tenant_id, hash, type, version, compressed, data)
            values ($1, $2, $3, $4, $5, $6)
            on conflict (tenant_id, hash) do nothing"#,
    )
    .bind(tenant_id)
    .bind(&object.hash)
    .bind(StoredObjectType::from(object.object_type))
    .bind(&object.version)
    .bind(compress)
    .bind(data)
    .execute(ex)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::already_exists(format!(
            "catalog object {}",
            object.hash
        )));
    }
    Ok(())
}

/// Fetch an object by hash, transparently decompressing.
pub async fn get(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    hash: &HashDigest,
) -> Result<CatalogObject> {
    let tenant_id = ctx.tenant_id()?;
    let row: Option<ObjectRow> = sqlx::query_as(
        r#"select type, version, compressed, data
            from catalog_objects
            where tenant_id = $1 and hash = $2"#,
    )
    .bind(tenant_id)
    .bind(hash)
    .fetch_optional(ex)
    .await?;

    let row = row.ok_or_else(|| StorageError::not_found(format!("catalog object {hash}")))?;

    let raw = if row.compressed {
        snap::raw::Decoder::new()
            .decompress_vec(&row.data)
            .map_err(|err| {
                StorageError::integrity(format!("decompressing object {hash}: {err}"))
            })?
    } else {
        row.data
    };
    let text = String::from_utf8(raw)
        .map_err(|err| StorageError::integrity(format!("object {hash} is not utf-8: {err}")))?;
    let data = RawValue::from_string(text)
        .map_err(|err| StorageError::integrity(format!("object {hash} is not JSON: {err}")))?;

    Ok(CatalogObject {
        hash: hash.clone(),
        object_type: row.object_type.into(),
        version: row.version,
        data,
    })
}

/// Garbage-collect an object: delete it only when no directory of any kind
/// still points at its hash. Returns whether a row was removed. Used by the
/// commit engine after it retires directory entries.
pub async fn delete_if_unreferenced(
    ctx: &RequestContext,
    conn: &mut PgConnection,
    hash: &HashDigest,
) -> Result<bool> {
    if directories::any_reference_to_hash(ctx, &mut *conn, hash).await? {
        return Ok(false);
    }
    match delete(ctx, conn, hash).await {
        Ok(()) => Ok(true),
        Err(err) if err.is_not_found() => Ok(false),
        Err(err) => Err(err),
    }
}

#[tracing::instrument(err, level = "debug", skip(ctx, ex))]
pub async fn delete(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    hash: &HashDigest,
) -> Result<()> {
    let tenant_id = ctx.tenant_id()?;
    let result = sqlx::query("delete from catalog_objects where tenant_id = $1 and hash = $2")
        .bind(tenant_id)
        .bind(hash)
        .execute(ex)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::not_found(format!("catalog object {hash}")));
    }
    Ok(())
}
