use sqlx::types::Json;
use sqlx::PgConnection;

use crate::{RequestContext, Result, StorageError};
use models::{
    CatalogId, Directory, DirectoryId, HashDigest, Name, ObjectRef, ObjectType, Reference,
    VariantId, WorkspaceId,
};

/// Which row owns a directory. Exactly one owner holds at any time; commit
/// re-parents a workspace's directories onto the version it materializes.
#[derive(Copy, Clone, Debug)]
pub enum DirectoryOwner {
    Version(i32),
    Workspace(WorkspaceId),
}

// Each object kind persists in its own table of identical shape. The enum
// dispatch is exhaustive, so an unknown kind is unrepresentable.
fn table(object_type: ObjectType) -> &'static str {
    match object_type {
        ObjectType::ParameterSchema => "parameter_schema_directories",
        ObjectType::CollectionSchema => "collection_schema_directories",
        ObjectType::CatalogCollection => "catalog_collection_directories",
    }
}

const ALL_TYPES: [ObjectType; 3] = [
    ObjectType::ParameterSchema,
    ObjectType::CollectionSchema,
    ObjectType::CatalogCollection,
];

/// Create an empty directory for the given owner.
pub async fn create(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    object_type: ObjectType,
    variant_id: VariantId,
    catalog_id: CatalogId,
    owner: DirectoryOwner,
) -> Result<DirectoryId> {
    let tenant_id = ctx.tenant_id()?;
    let directory_id = DirectoryId::generate();
    let (version_num, workspace_id) = match owner {
        DirectoryOwner::Version(num) => (Some(num), None),
        DirectoryOwner::Workspace(id) => (None, Some(id)),
    };

    sqlx::query(&format!(
        r#"insert into {} (tenant_id, directory_id, variant_id, catalog_id, version_num, workspace_id)
            values ($1, $2, $3, $4, $5, $6)"#,
        table(object_type),
    ))
    .bind(tenant_id)
    .bind(directory_id)
    .bind(variant_id)
    .bind(catalog_id)
    .bind(version_num)
    .bind(workspace_id)
    .execute(ex)
    .await?;
    Ok(directory_id)
}

/// Atomically replace the whole directory document.
pub async fn set_directory(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    object_type: ObjectType,
    directory_id: DirectoryId,
    directory: &Directory,
) -> Result<()> {
    let tenant_id = ctx.tenant_id()?;
    let result = sqlx::query(&format!(
        "update {} set directory = $3 where tenant_id = $1 and directory_id = $2",
        table(object_type),
    ))
    .bind(tenant_id)
    .bind(directory_id)
    .bind(Json(directory))
    .execute(ex)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::not_found(format!(
            "{object_type} directory {directory_id}"
        )));
    }
    Ok(())
}

pub async fn get_directory(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    object_type: ObjectType,
    directory_id: DirectoryId,
) -> Result<Directory> {
    let tenant_id = ctx.tenant_id()?;
    let directory: Option<Json<Directory>> = sqlx::query_scalar(&format!(
        "select directory from {} where tenant_id = $1 and directory_id = $2",
        table(object_type),
    ))
    .bind(tenant_id)
    .bind(directory_id)
    .fetch_optional(ex)
    .await?;

    directory.map(|d| d.0).ok_or_else(|| {
        StorageError::not_found(format!("{object_type} directory {directory_id}"))
    })
}

/// The directory document exactly as stored, for callers which pass the
/// JSON through without interpreting it.
pub async fn get_directory_raw(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    object_type: ObjectType,
    directory_id: DirectoryId,
) -> Result<String> {
    let tenant_id = ctx.tenant_id()?;
    let directory: Option<String> = sqlx::query_scalar(&format!(
        "select directory::text from {} where tenant_id = $1 and directory_id = $2",
        table(object_type),
    ))
    .bind(tenant_id)
    .bind(directory_id)
    .fetch_optional(ex)
    .await?;

    directory.ok_or_else(|| {
        StorageError::not_found(format!("{object_type} directory {directory_id}"))
    })
}

/// The ObjectRef at exactly this key; NotFound if the directory or the key
/// is absent.
pub async fn get_object_by_path(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    object_type: ObjectType,
    directory_id: DirectoryId,
    path: &str,
) -> Result<ObjectRef> {
    let tenant_id = ctx.tenant_id()?;
    let value: Option<Option<Json<serde_json::Value>>> = sqlx::query_scalar(&format!(
        "select directory -> $3 from {} where tenant_id = $1 and directory_id = $2",
        table(object_type),
    ))
    .bind(tenant_id)
    .bind(directory_id)
    .bind(path)
    .fetch_optional(ex)
    .await?;

    let value = match value {
        None => {
            return Err(StorageError::not_found(format!(
                "{object_type} directory {directory_id}"
            )))
        }
        Some(None) => return Err(StorageError::not_found(format!("path {path}"))),
        Some(Some(Json(value))) if value.is_null() => {
            return Err(StorageError::not_found(format!("path {path}")))
        }
        Some(Some(Json(value))) => value,
    };
    serde_json::from_value(value).map_err(|err| {
        StorageError::integrity(format!(
            "directory {directory_id} holds a malformed entry at {path}: {err}"
        ))
    })
}

/// Set directory[path] = object. A prior entry at the path is replaced, but
/// its references list is preserved unless the caller supplies a new one.
/// The written hash is read back; a round-trip mismatch is a fatal
/// integrity fault.
#[tracing::instrument(err, level = "debug", skip(ctx, conn, object))]
pub async fn add_or_update_object_by_path(
    ctx: &RequestContext,
    conn: &mut PgConnection,
    object_type: ObjectType,
    directory_id: DirectoryId,
    path: &str,
    mut object: ObjectRef,
) -> Result<()> {
    if object.references.is_none() {
        match get_object_by_path(ctx, &mut *conn, object_type, directory_id, path).await {
            Ok(prior) => object.references = prior.references,
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(err),
        }
    }

    let tenant_id = ctx.tenant_id()?;
    let result = sqlx::query(&format!(
        r#"update {} set directory = jsonb_set(directory, array[$3]::text[], $4)
            where tenant_id = $1 and directory_id = $2"#,
        table(object_type),
    ))
    .bind(tenant_id)
    .bind(directory_id)
    .bind(path)
    .bind(Json(&object))
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::not_found(format!(
            "{object_type} directory {directory_id}"
        )));
    }

    let written = get_object_by_path(ctx, conn, object_type, directory_id, path)
        .await
        .map_err(|err| err.with_msg("re-reading a just-written directory entry"))?;
    if written.hash != object.hash {
        return Err(StorageError::integrity(format!(
            "directory {directory_id} entry {path} failed to round-trip: wrote {}, read {}",
            object.hash, written.hash,
        )));
    }
    Ok(())
}

/// Remove the key if present, returning the evicted hash for GC
/// bookkeeping. An absent key is not an error: Ok(None).
#[tracing::instrument(err, level = "debug", skip(ctx, conn))]
pub async fn delete_object_by_path(
    ctx: &RequestContext,
    conn: &mut PgConnection,
    object_type: ObjectType,
    directory_id: DirectoryId,
    path: &str,
) -> Result<Option<HashDigest>> {
    let evicted = match get_object_by_path(ctx, &mut *conn, object_type, directory_id, path).await
    {
        Ok(object) => object.hash,
        Err(err) if err.is_not_found() => return Ok(None),
        Err(err) => return Err(err),
    };

    let tenant_id = ctx.tenant_id()?;
    sqlx::query(&format!(
        "update {} set directory = directory - $3 where tenant_id = $1 and directory_id = $2",
        table(object_type),
    ))
    .bind(tenant_id)
    .bind(directory_id)
    .bind(path)
    .execute(conn)
    .await?;
    Ok(Some(evicted))
}

pub async fn path_exists(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    object_type: ObjectType,
    directory_id: DirectoryId,
    path: &str,
) -> Result<bool> {
    let tenant_id = ctx.tenant_id()?;
    let exists: Option<bool> = sqlx::query_scalar(&format!(
        r#"select jsonb_exists(directory, $3) from {}
            where tenant_id = $1 and directory_id = $2"#,
        table(object_type),
    ))
    .bind(tenant_id)
    .bind(directory_id)
    .bind(path)
    .fetch_optional(ex)
    .await?;
    Ok(exists.unwrap_or(false))
}

// LIKE treats '_' (a legal name character) as a wildcard.
fn like_escape(s: &str) -> String {
    s.replace('\\', r"\\").replace('%', r"\%").replace('_', r"\_")
}

/// The entry whose key ends in `/<target_name>` and whose parent is the
/// deepest prefix of `start_path`. Candidates are scanned longest-first;
/// no match is Ok(None), not an error.
pub async fn find_closest_object(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    object_type: ObjectType,
    directory_id: DirectoryId,
    target_name: &Name,
    start_path: &str,
) -> Result<Option<(String, ObjectRef)>> {
    let tenant_id = ctx.tenant_id()?;
    let pattern = format!("%/{}", like_escape(target_name.as_str()));

    let candidates: Vec<(String, Json<ObjectRef>)> = sqlx::query_as(&format!(
        r#"select entries.key, entries.value
            from {} d, jsonb_each(d.directory) as entries(key, value)
            where d.tenant_id = $1 and d.directory_id = $2 and entries.key like $3
            order by length(entries.key) desc"#,
        table(object_type),
    ))
    .bind(tenant_id)
    .bind(directory_id)
    .bind(pattern)
    .fetch_all(ex)
    .await?;

    Ok(closest_match(
        candidates.into_iter().map(|(key, value)| (key, value.0)),
        target_name.as_str(),
        start_path,
    ))
}

/// Walk candidates (ordered by descending key length) and pick the first
/// whose parent directory is `start_path` itself or an ancestor of it.
fn closest_match(
    candidates: impl IntoIterator<Item = (String, ObjectRef)>,
    target_name: &str,
    start_path: &str,
) -> Option<(String, ObjectRef)> {
    let suffix = format!("/{target_name}");
    for (key, object) in candidates {
        let parent = match key.strip_suffix(&suffix) {
            Some(parent) => parent,
            None => continue,
        };
        if start_path == parent || start_path.starts_with(&format!("{parent}/")) {
            return Some((key, object));
        }
    }
    None
}

/// The references list of the entry at `path`; empty when none is recorded.
pub async fn get_all_references(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    object_type: ObjectType,
    directory_id: DirectoryId,
    path: &str,
) -> Result<Vec<Reference>> {
    let object = get_object_by_path(ctx, ex, object_type, directory_id, path).await?;
    Ok(object.references.unwrap_or_default())
}

/// Whether any entry of the directory declares `schema` as its base schema.
pub async fn has_references_to_schema(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    object_type: ObjectType,
    directory_id: DirectoryId,
    schema: &Name,
) -> Result<bool> {
    let tenant_id = ctx.tenant_id()?;
    let referenced: bool = sqlx::query_scalar(&format!(
        r#"select exists(
            select 1 from {} d, jsonb_each(d.directory) as entries(key, value)
            where d.tenant_id = $1 and d.directory_id = $2
                and entries.value ->> 'base_schema' = $3)"#,
        table(object_type),
    ))
    .bind(tenant_id)
    .bind(directory_id)
    .bind(schema)
    .fetch_one(ex)
    .await?;
    Ok(referenced)
}

/// Whether any directory of any kind still points at the hash. Used by the
/// commit engine before garbage-collecting a catalog object.
pub async fn any_reference_to_hash(
    ctx: &RequestContext,
    conn: &mut PgConnection,
    hash: &HashDigest,
) -> Result<bool> {
    let tenant_id = ctx.tenant_id()?.clone();
    for object_type in ALL_TYPES {
        let referenced: bool = sqlx::query_scalar(&format!(
            r#"select exists(
                select 1 from {} d, jsonb_each(d.directory) as entries(key, value)
                where d.tenant_id = $1 and entries.value ->> 'hash' = $2)"#,
            table(object_type),
        ))
        .bind(&tenant_id)
        .bind(hash)
        .fetch_one(&mut *conn)
        .await?;
        if referenced {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Hand a directory over to a version, clearing its workspace parentage so
/// the workspace cascade cannot reach it.
pub async fn reparent_to_version(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    object_type: ObjectType,
    directory_id: DirectoryId,
    version_num: i32,
) -> Result<()> {
    let tenant_id = ctx.tenant_id()?;
    let result = sqlx::query(&format!(
        r#"update {} set workspace_id = null, version_num = $3
            where tenant_id = $1 and directory_id = $2"#,
        table(object_type),
    ))
    .bind(tenant_id)
    .bind(directory_id)
    .bind(version_num)
    .execute(ex)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::not_found(format!(
            "{object_type} directory {directory_id}"
        )));
    }
    Ok(())
}
