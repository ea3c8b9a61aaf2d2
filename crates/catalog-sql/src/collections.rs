use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{Info, RequestContext, Result, StorageError};
use models::{
    CollectionId, HashDigest, Name, RawValue, RepoId, ResourcePath, TenantId, VariantId,
};

/// The reserved namespace literal marking a workspace-local tombstone. It
/// deliberately fails the namespace format constraint's name production, so
/// no caller-supplied namespace can collide with it.
pub const TOMBSTONE_NAMESPACE: &str = "--deleted--";

#[derive(Debug, sqlx::FromRow)]
pub struct Collection {
    pub tenant_id: TenantId,
    pub collection_id: CollectionId,
    pub path: ResourcePath,
    pub hash: HashDigest,
    pub description: String,
    pub namespace: String,
    pub collection_schema: Name,
    pub info: Option<Info>,
    pub repo_id: RepoId,
    pub variant_id: VariantId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct UpsertCollection {
    pub path: ResourcePath,
    pub hash: HashDigest,
    pub description: String,
    pub namespace: String,
    pub collection_schema: Name,
    pub info: Option<RawValue>,
    pub repo_id: RepoId,
    pub variant_id: VariantId,
}

/// Insert or update the row at (path, repo, variant, tenant). A conflict on
/// that key updates the mutable columns in place. A collision on the
/// generated primary key retries once with a fresh id; a second collision
/// surfaces as AlreadyExists.
#[tracing::instrument(err, level = "debug", skip(ctx, conn, row), fields(path = %row.path))]
pub async fn upsert(
    ctx: &RequestContext,
    conn: &mut PgConnection,
    row: &UpsertCollection,
) -> Result<CollectionId> {
    let tenant_id = ctx.tenant_id()?.clone();

    for attempt in 0..2 {
        let collection_id = CollectionId::generate();
        let result = sqlx::query_scalar::<_, CollectionId>(
            r#"insert into collections
                (tenant_id, collection_id, path, hash, description, namespace,
                 collection_schema, info, repo_id, variant_id)
                values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                on conflict (tenant_id, variant_id, repo_id, path) do update set
                    hash = excluded.hash,
                    description = excluded.description,
                    namespace = excluded.namespace,
                    collection_schema = excluded.collection_schema,
                    info = excluded.info
                returning collection_id"#,
        )
        .bind(&tenant_id)
        .bind(collection_id)
        .bind(row.path.key())
        .bind(&row.hash)
        .bind(&row.description)
        .bind(&row.namespace)
        .bind(&row.collection_schema)
        .bind(row.info.clone().map(Info))
        .bind(row.repo_id)
        .bind(row.variant_id)
        .fetch_one(&mut *conn)
        .await;

        match result {
            Ok(id) => return Ok(id),
            Err(sqlx::Error::Database(db))
                if attempt == 0 && db.constraint() == Some("collections_pkey") =>
            {
                tracing::warn!(%collection_id, "generated collection id collided, retrying");
                continue;
            }
            Err(err) => return Err(err.into()),
        }
    }
    Err(StorageError::already_exists(format!(
        "collection at {}",
        row.path
    )))
}

/// Read the row at `path`, preferring the caller's repo. A tombstone in the
/// caller's repo hides the path entirely. Only when the repo holds no row
/// at all does the lookup fall back to the variant head.
pub async fn get(
    ctx: &RequestContext,
    conn: &mut PgConnection,
    repo_id: RepoId,
    variant_id: VariantId,
    path: &ResourcePath,
) -> Result<Collection> {
    let tenant_id = ctx.tenant_id()?.clone();

    let row = fetch_in_repo(&tenant_id, &mut *conn, repo_id, variant_id, path).await?;
    match row {
        Some(row) if row.namespace == TOMBSTONE_NAMESPACE => {
            Err(StorageError::not_found(format!("collection at {path}")))
        }
        Some(row) => Ok(row),
        None if repo_id.as_uuid() != variant_id.as_uuid() => {
            let head =
                fetch_in_repo(&tenant_id, conn, RepoId::from(variant_id), variant_id, path)
                    .await?;
            head.filter(|row| row.namespace != TOMBSTONE_NAMESPACE)
                .ok_or_else(|| StorageError::not_found(format!("collection at {path}")))
        }
        None => Err(StorageError::not_found(format!("collection at {path}"))),
    }
}

async fn fetch_in_repo(
    tenant_id: &TenantId,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    repo_id: RepoId,
    variant_id: VariantId,
    path: &ResourcePath,
) -> Result<Option<Collection>> {
    let row = sqlx::query_as::<_, Collection>(
        r#"select tenant_id, collection_id, path, hash, description, namespace,
                collection_schema, info, repo_id, variant_id, created_at
            from collections
            where tenant_id = $1 and variant_id = $2 and repo_id = $3 and path = $4"#,
    )
    .bind(tenant_id)
    .bind(variant_id)
    .bind(repo_id)
    .bind(path.key())
    .fetch_optional(ex)
    .await?;
    Ok(row)
}

/// Delete the collection at `path`. In a workspace (repo ≠ variant) the row
/// is soft-deleted: its namespace is rewritten to the tombstone so commit
/// can recognize the deletion, and no hash is returned. At the variant head
/// the row is removed outright and the evicted hash returned.
#[tracing::instrument(err, level = "debug", skip(ctx, conn))]
pub async fn delete(
    ctx: &RequestContext,
    conn: &mut PgConnection,
    repo_id: RepoId,
    variant_id: VariantId,
    path: &ResourcePath,
) -> Result<Option<HashDigest>> {
    let tenant_id = ctx.tenant_id()?;

    if repo_id.as_uuid() != variant_id.as_uuid() {
        let result = sqlx::query(
            r#"update collections set namespace = $5
                where tenant_id = $1 and variant_id = $2 and repo_id = $3 and path = $4"#,
        )
        .bind(tenant_id)
        .bind(variant_id)
        .bind(repo_id)
        .bind(path.key())
        .bind(TOMBSTONE_NAMESPACE)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found(format!("collection at {path}")));
        }
        return Ok(None);
    }

    let hash: Option<HashDigest> = sqlx::query_scalar(
        r#"delete from collections
            where tenant_id = $1 and variant_id = $2 and repo_id = $3 and path = $4
            returning hash"#,
    )
    .bind(tenant_id)
    .bind(variant_id)
    .bind(repo_id)
    .bind(path.key())
    .fetch_optional(conn)
    .await?;

    hash.map(Some)
        .ok_or_else(|| StorageError::not_found(format!("collection at {path}")))
}

/// Whether any live collection of the repo still uses the schema,
/// optionally narrowed to one namespace.
pub async fn has_references_to_collection_schema(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    schema: &Name,
    namespace: Option<&str>,
    repo_id: RepoId,
    variant_id: VariantId,
) -> Result<bool> {
    let tenant_id = ctx.tenant_id()?;
    let referenced: bool = sqlx::query_scalar(
        r#"select exists(
            select 1 from collections
            where tenant_id = $1 and variant_id = $2 and repo_id = $3
                and collection_schema = $4
                and namespace <> $5
                and ($6::text is null or namespace = $6))"#,
    )
    .bind(tenant_id)
    .bind(variant_id)
    .bind(repo_id)
    .bind(schema)
    .bind(TOMBSTONE_NAMESPACE)
    .bind(namespace)
    .fetch_one(ex)
    .await?;
    Ok(referenced)
}

/// The live collections of a repo within one namespace.
pub async fn list_in_namespace(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    repo_id: RepoId,
    variant_id: VariantId,
    namespace: &str,
) -> Result<Vec<Collection>> {
    let tenant_id = ctx.tenant_id()?;
    let rows = sqlx::query_as::<_, Collection>(
        r#"select tenant_id, collection_id, path, hash, description, namespace,
                collection_schema, info, repo_id, variant_id, created_at
            from collections
            where tenant_id = $1 and variant_id = $2 and repo_id = $3 and namespace = $4
                and namespace <> $5
            order by path"#,
    )
    .bind(tenant_id)
    .bind(variant_id)
    .bind(repo_id)
    .bind(namespace)
    .bind(TOMBSTONE_NAMESPACE)
    .fetch_all(ex)
    .await?;
    Ok(rows)
}

/// The tombstoned rows of a workspace repo, consumed by commit
/// reconciliation.
pub async fn tombstones_in_repo(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    repo_id: RepoId,
    variant_id: VariantId,
) -> Result<Vec<Collection>> {
    let tenant_id = ctx.tenant_id()?;
    let rows = sqlx::query_as::<_, Collection>(
        r#"select tenant_id, collection_id, path, hash, description, namespace,
                collection_schema, info, repo_id, variant_id, created_at
            from collections
            where tenant_id = $1 and variant_id = $2 and repo_id = $3 and namespace = $4"#,
    )
    .bind(tenant_id)
    .bind(variant_id)
    .bind(repo_id)
    .bind(TOMBSTONE_NAMESPACE)
    .fetch_all(ex)
    .await?;
    Ok(rows)
}

/// Remove the rows at `path` from both the workspace repo and the variant
/// head. Used when commit reconciles a tombstone.
pub async fn purge_path(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    workspace_repo: RepoId,
    variant_id: VariantId,
    path: &ResourcePath,
) -> Result<()> {
    let tenant_id = ctx.tenant_id()?;
    let repos: Vec<Uuid> = vec![workspace_repo.as_uuid(), variant_id.as_uuid()];
    sqlx::query(
        r#"delete from collections
            where tenant_id = $1 and variant_id = $2 and path = $3 and repo_id = any($4)"#,
    )
    .bind(tenant_id)
    .bind(variant_id)
    .bind(path.key())
    .bind(repos)
    .execute(ex)
    .await?;
    Ok(())
}

/// Promote a workspace repo's live rows onto the variant head: head rows
/// shadowed by the workspace are dropped, then the workspace rows are
/// re-keyed to the head. Runs on the commit transaction.
pub async fn promote_repo(
    ctx: &RequestContext,
    conn: &mut PgConnection,
    workspace_repo: RepoId,
    variant_id: VariantId,
) -> Result<()> {
    let tenant_id = ctx.tenant_id()?.clone();

    sqlx::query(
        r#"delete from collections h
            where h.tenant_id = $1 and h.variant_id = $2 and h.repo_id = $3
                and exists (
                    select 1 from collections w
                    where w.tenant_id = $1 and w.variant_id = $2 and w.repo_id = $4
                        and w.path = h.path)"#,
    )
    .bind(&tenant_id)
    .bind(variant_id)
    .bind(variant_id.as_uuid())
    .bind(workspace_repo)
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        r#"update collections set repo_id = $3
            where tenant_id = $1 and variant_id = $2 and repo_id = $4"#,
    )
    .bind(&tenant_id)
    .bind(variant_id)
    .bind(variant_id.as_uuid())
    .bind(workspace_repo)
    .execute(conn)
    .await?;
    Ok(())
}
