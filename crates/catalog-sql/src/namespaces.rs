use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};

use crate::{Info, RequestContext, Result, StorageError};
use models::{CatalogId, Namespace as NamespaceName, RawValue, TenantId, VariantId, DEFAULT_NAMESPACE};

#[derive(Debug, sqlx::FromRow)]
pub struct Namespace {
    pub tenant_id: TenantId,
    pub name: NamespaceName,
    pub variant_id: VariantId,
    pub catalog_id: CatalogId,
    pub description: String,
    pub info: Option<Info>,
    pub created_at: DateTime<Utc>,
}

#[tracing::instrument(err, level = "debug", skip(ex, info))]
pub async fn create(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    variant_id: VariantId,
    catalog_id: CatalogId,
    name: &NamespaceName,
    description: &str,
    info: Option<RawValue>,
) -> Result<()> {
    let tenant_id = ctx.tenant_id()?;
    let result = sqlx::query(
        r#"insert into namespaces (tenant_id, name, variant_id, catalog_id, description, info)
            values ($1, $2, $3, $4, $5, $6)
            on conflict (tenant_id, variant_id, name) do nothing"#,
    )
    .bind(tenant_id)
    .bind(name)
    .bind(variant_id)
    .bind(catalog_id)
    .bind(description)
    .bind(info.map(Info))
    .execute(ex)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::already_exists(format!("namespace {name}")));
    }
    Ok(())
}

/// Fetch a namespace. The `default` namespace exists implicitly: when no
/// row was ever written for it, a synthesized entity is returned.
pub async fn get(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    variant_id: VariantId,
    catalog_id: CatalogId,
    name: &NamespaceName,
) -> Result<Namespace> {
    let tenant_id = ctx.tenant_id()?;
    let row = sqlx::query_as::<_, Namespace>(
        r#"select tenant_id, name, variant_id, catalog_id, description, info, created_at
            from namespaces
            where tenant_id = $1 and variant_id = $2 and name = $3"#,
    )
    .bind(tenant_id)
    .bind(variant_id)
    .bind(name)
    .fetch_optional(ex)
    .await?;

    match row {
        Some(row) => Ok(row),
        None if name.as_str() == DEFAULT_NAMESPACE => Ok(Namespace {
            tenant_id: tenant_id.clone(),
            name: name.clone(),
            variant_id,
            catalog_id,
            description: String::new(),
            info: None,
            created_at: Utc::now(),
        }),
        None => Err(StorageError::not_found(format!("namespace {name}"))),
    }
}

#[tracing::instrument(err, level = "debug", skip(ex, info))]
pub async fn update(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    variant_id: VariantId,
    name: &NamespaceName,
    description: &str,
    info: Option<RawValue>,
) -> Result<()> {
    let tenant_id = ctx.tenant_id()?;
    let result = sqlx::query(
        r#"update namespaces set description = $4, info = $5
            where tenant_id = $1 and variant_id = $2 and name = $3"#,
    )
    .bind(tenant_id)
    .bind(variant_id)
    .bind(name)
    .bind(description)
    .bind(info.map(Info))
    .execute(ex)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::not_found(format!("namespace {name}")));
    }
    Ok(())
}

#[tracing::instrument(err, level = "debug", skip(ex))]
pub async fn delete(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    variant_id: VariantId,
    name: &NamespaceName,
) -> Result<()> {
    let tenant_id = ctx.tenant_id()?;
    let result = sqlx::query(
        "delete from namespaces where tenant_id = $1 and variant_id = $2 and name = $3",
    )
    .bind(tenant_id)
    .bind(variant_id)
    .bind(name)
    .execute(ex)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::not_found(format!("namespace {name}")));
    }
    Ok(())
}

/// Stream the namespaces of a variant. The caller must drain or cancel.
pub fn list<'e, E>(
    ctx: &RequestContext,
    ex: E,
    variant_id: VariantId,
) -> Result<BoxStream<'e, Result<Namespace>>>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres> + 'e,
{
    let tenant_id = ctx.tenant_id()?.clone();
    let stream = sqlx::query_as::<_, Namespace>(
        r#"select tenant_id, name, variant_id, catalog_id, description, info, created_at
            from namespaces
            where tenant_id = $1 and variant_id = $2
            order by name"#,
    )
    .bind(tenant_id)
    .bind(variant_id)
    .fetch(ex)
    .map_err(StorageError::from)
    .boxed();
    Ok(stream)
}
