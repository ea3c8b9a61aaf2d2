use chrono::{DateTime, Utc};

use crate::{variants, Info, RequestContext, Result, StorageError};
use models::{CatalogId, Name, ProjectId, RawValue, TenantId, DEFAULT_VARIANT};

#[derive(Debug, sqlx::FromRow)]
pub struct Catalog {
    pub tenant_id: TenantId,
    pub catalog_id: CatalogId,
    pub project_id: ProjectId,
    pub name: Name,
    pub description: String,
    pub info: Option<Info>,
    pub created_at: DateTime<Utc>,
}

/// Create a catalog and its companion `default` variant. Runs on the
/// caller's transaction so the pair is atomic. Refuses a duplicate
/// (name, project, tenant) with AlreadyExists.
#[tracing::instrument(err, level = "debug", skip(txn, info))]
pub async fn create(
    ctx: &RequestContext,
    txn: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    name: &Name,
    description: &str,
    info: Option<RawValue>,
) -> Result<Catalog> {
    let tenant_id = ctx.tenant_id()?;
    let project_id = ctx.project_id()?;
    let catalog_id = CatalogId::generate();

    let catalog = sqlx::query_as::<_, Catalog>(
        r#"insert into catalogs (tenant_id, catalog_id, project_id, name, description, info)
            values ($1, $2, $3, $4, $5, $6)
            on conflict (tenant_id, project_id, name) do nothing
            returning tenant_id, catalog_id, project_id, name, description, info, created_at"#,
    )
    .bind(tenant_id)
    .bind(catalog_id)
    .bind(project_id)
    .bind(name)
    .bind(description)
    .bind(info.map(Info))
    .fetch_optional(&mut **txn)
    .await?
    .ok_or_else(|| StorageError::already_exists(format!("catalog {name}")))?;

    variants::create(ctx, txn, catalog.catalog_id, &Name::new(DEFAULT_VARIANT), "", None).await?;
    Ok(catalog)
}

pub async fn get(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    catalog_id: CatalogId,
) -> Result<Catalog> {
    let tenant_id = ctx.tenant_id()?;
    sqlx::query_as::<_, Catalog>(
        r#"select tenant_id, catalog_id, project_id, name, description, info, created_at
            from catalogs
            where tenant_id = $1 and catalog_id = $2"#,
    )
    .bind(tenant_id)
    .bind(catalog_id)
    .fetch_optional(ex)
    .await?
    .ok_or_else(|| StorageError::not_found(format!("catalog {catalog_id}")))
}

pub async fn get_by_name(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    name: &Name,
) -> Result<Catalog> {
    let tenant_id = ctx.tenant_id()?;
    let project_id = ctx.project_id()?;
    sqlx::query_as::<_, Catalog>(
        r#"select tenant_id, catalog_id, project_id, name, description, info, created_at
            from catalogs
            where tenant_id = $1 and project_id = $2 and name = $3"#,
    )
    .bind(tenant_id)
    .bind(project_id)
    .bind(name)
    .fetch_optional(ex)
    .await?
    .ok_or_else(|| StorageError::not_found(format!("catalog {name}")))
}

/// Only description and info are mutable; id and name never change.
#[tracing::instrument(err, level = "debug", skip(ex, info))]
pub async fn update(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    catalog_id: CatalogId,
    description: &str,
    info: Option<RawValue>,
) -> Result<()> {
    let tenant_id = ctx.tenant_id()?;
    let result = sqlx::query(
        r#"update catalogs set description = $3, info = $4
            where tenant_id = $1 and catalog_id = $2"#,
    )
    .bind(tenant_id)
    .bind(catalog_id)
    .bind(description)
    .bind(info.map(Info))
    .execute(ex)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::not_found(format!("catalog {catalog_id}")));
    }
    Ok(())
}

#[tracing::instrument(err, level = "debug", skip(ex))]
pub async fn delete(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    catalog_id: CatalogId,
) -> Result<()> {
    let tenant_id = ctx.tenant_id()?;
    let result = sqlx::query("delete from catalogs where tenant_id = $1 and catalog_id = $2")
        .bind(tenant_id)
        .bind(catalog_id)
        .execute(ex)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::not_found(format!("catalog {catalog_id}")));
    }
    Ok(())
}

pub async fn list(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
) -> Result<Vec<Catalog>> {
    let tenant_id = ctx.tenant_id()?;
    let project_id = ctx.project_id()?;
    let rows = sqlx::query_as::<_, Catalog>(
        r#"select tenant_id, catalog_id, project_id, name, description, info, created_at
            from catalogs
            where tenant_id = $1 and project_id = $2
            order by name"#,
    )
    .bind(tenant_id)
    .bind(project_id)
    .fetch_all(ex)
    .await?;
    Ok(rows)
}
