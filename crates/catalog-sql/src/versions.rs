use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};

use crate::{directories, variants, DirectoryOwner, Info, RequestContext, Result, ScopedPool, StorageError};
use models::{CatalogId, DirectoryId, Label, ObjectType, RawValue, TenantId, VariantId};

#[derive(Debug, sqlx::FromRow)]
pub struct Version {
    pub tenant_id: TenantId,
    pub variant_id: VariantId,
    pub catalog_id: CatalogId,
    pub version_num: i32,
    pub label: Option<Label>,
    pub description: String,
    pub info: Option<Info>,
    pub parameters_directory: Option<DirectoryId>,
    pub collections_directory: Option<DirectoryId>,
    pub values_directory: Option<DirectoryId>,
    pub created_at: DateTime<Utc>,
}

impl Version {
    /// The version's directory of the given kind. Only a row observed
    /// mid-creation could lack one, and creation is transactional.
    pub fn directory(&self, object_type: ObjectType) -> Result<DirectoryId> {
        let id = match object_type {
            ObjectType::ParameterSchema => self.parameters_directory,
            ObjectType::CollectionSchema => self.collections_directory,
            ObjectType::CatalogCollection => self.values_directory,
        };
        id.ok_or_else(|| {
            StorageError::integrity(format!(
                "version {} of variant {} has no {} directory",
                self.version_num, self.variant_id, object_type,
            ))
        })
    }
}

/// A version with a non-null label, as streamed by `get_named_versions`.
#[derive(Debug, sqlx::FromRow)]
pub struct NamedVersion {
    pub version_num: i32,
    pub label: Label,
    pub description: String,
}

#[derive(Debug)]
pub struct NewVersion {
    pub catalog_id: CatalogId,
    pub variant_id: VariantId,
    pub label: Option<Label>,
    pub description: String,
    pub info: Option<RawValue>,
}

/// Create a version in its own transaction.
pub async fn create(ctx: &RequestContext, db: &ScopedPool, new: NewVersion) -> Result<Version> {
    let mut txn = db.begin(ctx).await?;
    let version = create_in_txn(ctx, &mut txn, &new).await?;
    txn.commit().await?;
    Ok(version)
}

/// The version-create lifecycle, on the caller's transaction:
/// (1) claim a version number and insert the row, (2) create the three
/// empty schema directories, (3) point the row at them. Any failure aborts
/// the whole set with the transaction.
#[tracing::instrument(err, level = "debug", skip(txn, new), fields(variant = %new.variant_id))]
pub async fn create_in_txn(
    ctx: &RequestContext,
    txn: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    new: &NewVersion,
) -> Result<Version> {
    let tenant_id = ctx.tenant_id()?.clone();
    let version_num =
        variants::next_version_num(ctx, &mut **txn, new.catalog_id, new.variant_id).await?;

    sqlx::query(
        r#"insert into versions (tenant_id, variant_id, catalog_id, version_num, label, description, info)
            values ($1, $2, $3, $4, $5, $6, $7)"#,
    )
    .bind(&tenant_id)
    .bind(new.variant_id)
    .bind(new.catalog_id)
    .bind(version_num)
    .bind(new.label.as_ref())
    .bind(&new.description)
    .bind(new.info.clone().map(Info))
    .execute(&mut **txn)
    .await?;

    let owner = DirectoryOwner::Version(version_num);
    let parameters = directories::create(
        ctx, &mut **txn, ObjectType::ParameterSchema, new.variant_id, new.catalog_id, owner,
    )
    .await?;
    let collections = directories::create(
        ctx, &mut **txn, ObjectType::CollectionSchema, new.variant_id, new.catalog_id, owner,
    )
    .await?;
    let values = directories::create(
        ctx, &mut **txn, ObjectType::CatalogCollection, new.variant_id, new.catalog_id, owner,
    )
    .await?;

    adopt_directories(ctx, &mut **txn, new.variant_id, version_num, [parameters, collections, values]).await?;
    get(ctx, &mut **txn, new.variant_id, version_num).await
}

/// Create a version which takes over existing directories instead of
/// getting empty ones. This is the materialization half of workspace
/// commit: the row is inserted first so the ownership FK holds, then each
/// directory is re-parented onto it.
#[tracing::instrument(err, level = "debug", skip(txn, new), fields(variant = %new.variant_id))]
pub async fn create_adopting_in_txn(
    ctx: &RequestContext,
    txn: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    new: &NewVersion,
    [parameters, collections, values]: [DirectoryId; 3],
) -> Result<Version> {
    let tenant_id = ctx.tenant_id()?.clone();
    let version_num =
        variants::next_version_num(ctx, &mut **txn, new.catalog_id, new.variant_id).await?;

    sqlx::query(
        r#"insert into versions (tenant_id, variant_id, catalog_id, version_num, label, description, info)
            values ($1, $2, $3, $4, $5, $6, $7)"#,
    )
    .bind(&tenant_id)
    .bind(new.variant_id)
    .bind(new.catalog_id)
    .bind(version_num)
    .bind(new.label.as_ref())
    .bind(&new.description)
    .bind(new.info.clone().map(Info))
    .execute(&mut **txn)
    .await?;

    for (object_type, directory_id) in [
        (ObjectType::ParameterSchema, parameters),
        (ObjectType::CollectionSchema, collections),
        (ObjectType::CatalogCollection, values),
    ] {
        directories::reparent_to_version(ctx, &mut **txn, object_type, directory_id, version_num)
            .await?;
    }

    adopt_directories(ctx, &mut **txn, new.variant_id, version_num, [parameters, collections, values]).await?;
    get(ctx, &mut **txn, new.variant_id, version_num).await
}

/// Point a version row at its three directories.
pub(crate) async fn adopt_directories(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    variant_id: VariantId,
    version_num: i32,
    [parameters, collections, values]: [DirectoryId; 3],
) -> Result<()> {
    let tenant_id = ctx.tenant_id()?;
    let result = sqlx::query(
        r#"update versions
            set parameters_directory = $4, collections_directory = $5, values_directory = $6
            where tenant_id = $1 and variant_id = $2 and version_num = $3"#,
    )
    .bind(tenant_id)
    .bind(variant_id)
    .bind(version_num)
    .bind(parameters)
    .bind(collections)
    .bind(values)
    .execute(ex)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::not_found(format!("version {version_num}")));
    }
    Ok(())
}

pub async fn get(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    variant_id: VariantId,
    version_num: i32,
) -> Result<Version> {
    let tenant_id = ctx.tenant_id()?;
    sqlx::query_as::<_, Version>(
        r#"select tenant_id, variant_id, catalog_id, version_num, label, description, info,
                parameters_directory, collections_directory, values_directory, created_at
            from versions
            where tenant_id = $1 and variant_id = $2 and version_num = $3"#,
    )
    .bind(tenant_id)
    .bind(variant_id)
    .bind(version_num)
    .fetch_optional(ex)
    .await?
    .ok_or_else(|| StorageError::not_found(format!("version {version_num}")))
}

pub async fn get_by_label(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    variant_id: VariantId,
    label: &Label,
) -> Result<Version> {
    let tenant_id = ctx.tenant_id()?;
    sqlx::query_as::<_, Version>(
        r#"select tenant_id, variant_id, catalog_id, version_num, label, description, info,
                parameters_directory, collections_directory, values_directory, created_at
            from versions
            where tenant_id = $1 and variant_id = $2 and label = $3"#,
    )
    .bind(tenant_id)
    .bind(variant_id)
    .bind(label)
    .fetch_optional(ex)
    .await?
    .ok_or_else(|| StorageError::not_found(format!("version labeled {label}")))
}

/// Set or clear a version's label. Committed versions are otherwise
/// immutable; label and description are the only mutable fields.
#[tracing::instrument(err, level = "debug", skip(ex))]
pub async fn set_label(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    variant_id: VariantId,
    version_num: i32,
    label: Option<&Label>,
) -> Result<()> {
    let tenant_id = ctx.tenant_id()?;
    let result = sqlx::query(
        r#"update versions set label = $4
            where tenant_id = $1 and variant_id = $2 and version_num = $3"#,
    )
    .bind(tenant_id)
    .bind(variant_id)
    .bind(version_num)
    .bind(label)
    .execute(ex)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::not_found(format!("version {version_num}")));
    }
    Ok(())
}

pub async fn update_description(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    variant_id: VariantId,
    version_num: i32,
    description: &str,
) -> Result<()> {
    let tenant_id = ctx.tenant_id()?;
    let result = sqlx::query(
        r#"update versions set description = $4
            where tenant_id = $1 and variant_id = $2 and version_num = $3"#,
    )
    .bind(tenant_id)
    .bind(variant_id)
    .bind(version_num)
    .bind(description)
    .execute(ex)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::not_found(format!("version {version_num}")));
    }
    Ok(())
}

pub async fn count_in_catalog_and_variant(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    catalog_id: CatalogId,
    variant_id: VariantId,
) -> Result<i64> {
    let tenant_id = ctx.tenant_id()?;
    let count: i64 = sqlx::query_scalar(
        r#"select count(*) from versions
            where tenant_id = $1 and catalog_id = $2 and variant_id = $3"#,
    )
    .bind(tenant_id)
    .bind(catalog_id)
    .bind(variant_id)
    .fetch_one(ex)
    .await?;
    Ok(count)
}

/// Stream the labeled versions of a variant, oldest first. The caller must
/// drain or cancel; a cancelled request drops the stream and aborts the
/// round-trip.
pub fn get_named_versions<'e, E>(
    ctx: &RequestContext,
    ex: E,
    variant_id: VariantId,
) -> Result<BoxStream<'e, Result<NamedVersion>>>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres> + 'e,
{
    let tenant_id = ctx.tenant_id()?.clone();
    let stream = sqlx::query_as::<_, NamedVersion>(
        r#"select version_num, label, description
            from versions
            where tenant_id = $1 and variant_id = $2 and label is not null
            order by version_num"#,
    )
    .bind(tenant_id)
    .bind(variant_id)
    .fetch(ex)
    .map_err(StorageError::from)
    .boxed();
    Ok(stream)
}

/// Delete a version. Refused while any workspace is based on it, which the
/// FK reports; that surfaces as InvalidInput rather than a missing-parent
/// fault.
#[tracing::instrument(err, level = "debug", skip(ex))]
pub async fn delete(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    variant_id: VariantId,
    version_num: i32,
) -> Result<()> {
    let tenant_id = ctx.tenant_id()?;
    let result = sqlx::query(
        r#"delete from versions
            where tenant_id = $1 and variant_id = $2 and version_num = $3"#,
    )
    .bind(tenant_id)
    .bind(variant_id)
    .bind(version_num)
    .execute(ex)
    .await
    .map_err(|err| match StorageError::from(err) {
        StorageError::InvalidCatalog(m) => StorageError::InvalidInput(m),
        other => other,
    })?;

    if result.rows_affected() == 0 {
        return Err(StorageError::not_found(format!("version {version_num}")));
    }
    Ok(())
}
