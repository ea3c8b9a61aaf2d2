use chrono::{DateTime, Utc};

use crate::{Info, RequestContext, Result, StorageError};
use models::{CatalogId, Name, RawValue, TenantId, VariantId};

#[derive(Debug, sqlx::FromRow)]
pub struct Variant {
    pub tenant_id: TenantId,
    pub variant_id: VariantId,
    pub catalog_id: CatalogId,
    pub name: Name,
    pub description: String,
    pub info: Option<Info>,
    pub created_at: DateTime<Utc>,
}

/// Create a variant with a generated id. The insert skips on a
/// (name, catalog) conflict; no row coming back means it already existed.
#[tracing::instrument(err, level = "debug", skip(txn, info))]
pub async fn create(
    ctx: &RequestContext,
    txn: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    catalog_id: CatalogId,
    name: &Name,
    description: &str,
    info: Option<RawValue>,
) -> Result<Variant> {
    let tenant_id = ctx.tenant_id()?;
    let variant_id = VariantId::generate();

    sqlx::query_as::<_, Variant>(
        r#"insert into variants (tenant_id, variant_id, catalog_id, name, description, info)
            values ($1, $2, $3, $4, $5, $6)
            on conflict (tenant_id, catalog_id, name) do nothing
            returning tenant_id, variant_id, catalog_id, name, description, info, created_at"#,
    )
    .bind(tenant_id)
    .bind(variant_id)
    .bind(catalog_id)
    .bind(name)
    .bind(description)
    .bind(info.map(Info))
    .fetch_optional(&mut **txn)
    .await?
    .ok_or_else(|| StorageError::already_exists(format!("variant {name}")))
}

pub async fn get(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    variant_id: VariantId,
) -> Result<Variant> {
    let tenant_id = ctx.tenant_id()?;
    sqlx::query_as::<_, Variant>(
        r#"select tenant_id, variant_id, catalog_id, name, description, info, created_at
            from variants
            where tenant_id = $1 and variant_id = $2"#,
    )
    .bind(tenant_id)
    .bind(variant_id)
    .fetch_optional(ex)
    .await?
    .ok_or_else(|| StorageError::not_found(format!("variant {variant_id}")))
}

pub async fn get_by_name(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    catalog_id: CatalogId,
    name: &Name,
) -> Result<Variant> {
    let tenant_id = ctx.tenant_id()?;
    sqlx::query_as::<_, Variant>(
        r#"select tenant_id, variant_id, catalog_id, name, description, info, created_at
            from variants
            where tenant_id = $1 and catalog_id = $2 and name = $3"#,
    )
    .bind(tenant_id)
    .bind(catalog_id)
    .bind(name)
    .fetch_optional(ex)
    .await?
    .ok_or_else(|| StorageError::not_found(format!("variant {name}")))
}

#[tracing::instrument(err, level = "debug", skip(ex, info))]
pub async fn update(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    variant_id: VariantId,
    description: &str,
    info: Option<RawValue>,
) -> Result<()> {
    let tenant_id = ctx.tenant_id()?;
    let result = sqlx::query(
        r#"update variants set description = $3, info = $4
            where tenant_id = $1 and variant_id = $2"#,
    )
    .bind(tenant_id)
    .bind(variant_id)
    .bind(description)
    .bind(info.map(Info))
    .execute(ex)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::not_found(format!("variant {variant_id}")));
    }
    Ok(())
}

#[tracing::instrument(err, level = "debug", skip(ex))]
pub async fn delete(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    variant_id: VariantId,
) -> Result<()> {
    let tenant_id = ctx.tenant_id()?;
    let result = sqlx::query("delete from variants where tenant_id = $1 and variant_id = $2")
        .bind(tenant_id)
        .bind(variant_id)
        .execute(ex)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::not_found(format!("variant {variant_id}")));
    }
    Ok(())
}

pub async fn list(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    catalog_id: CatalogId,
) -> Result<Vec<Variant>> {
    let tenant_id = ctx.tenant_id()?;
    let rows = sqlx::query_as::<_, Variant>(
        r#"select tenant_id, variant_id, catalog_id, name, description, info, created_at
            from variants
            where tenant_id = $1 and catalog_id = $2
            order by name"#,
    )
    .bind(tenant_id)
    .bind(catalog_id)
    .fetch_all(ex)
    .await?;
    Ok(rows)
}

/// Claim the next version number of a variant. The row lock taken by the
/// update serializes concurrent version creates within the variant.
pub(crate) async fn next_version_num(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    catalog_id: CatalogId,
    variant_id: VariantId,
) -> Result<i32> {
    let tenant_id = ctx.tenant_id()?;
    let version_num: Option<i32> = sqlx::query_scalar(
        r#"update variants set next_version_num = next_version_num + 1
            where tenant_id = $1 and catalog_id = $2 and variant_id = $3
            returning next_version_num - 1"#,
    )
    .bind(tenant_id)
    .bind(catalog_id)
    .bind(variant_id)
    .fetch_optional(ex)
    .await?;

    version_num.ok_or_else(|| {
        StorageError::InvalidCatalog(format!(
            "variant {variant_id} does not exist in catalog {catalog_id}"
        ))
    })
}
