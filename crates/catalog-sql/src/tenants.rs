use chrono::{DateTime, Utc};

use crate::{Info, RequestContext, Result, StorageError};
use models::{RawValue, TenantId};

#[derive(Debug, sqlx::FromRow)]
pub struct Tenant {
    pub tenant_id: TenantId,
    pub info: Option<Info>,
    pub created_at: DateTime<Utc>,
}

/// Onboard a tenant. Creation is idempotent at the storage layer: a second
/// create of the same id reports AlreadyExists without touching the row.
#[tracing::instrument(err, level = "debug", skip(ex, info))]
pub async fn create(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    info: Option<RawValue>,
) -> Result<()> {
    let tenant_id = ctx.tenant_id()?;
    let result = sqlx::query(
        r#"insert into tenants (tenant_id, info)
            values ($1, $2)
            on conflict (tenant_id) do nothing"#,
    )
    .bind(tenant_id)
    .bind(info.map(Info))
    .execute(ex)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::already_exists(format!("tenant {tenant_id}")));
    }
    Ok(())
}

pub async fn get(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
) -> Result<Tenant> {
    let tenant_id = ctx.tenant_id()?;
    sqlx::query_as::<_, Tenant>(
        r#"select tenant_id, info, created_at
            from tenants
            where tenant_id = $1"#,
    )
    .bind(tenant_id)
    .fetch_optional(ex)
    .await?
    .ok_or_else(|| StorageError::not_found(format!("tenant {tenant_id}")))
}

#[tracing::instrument(err, level = "debug", skip(ex, info))]
pub async fn update(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    info: Option<RawValue>,
) -> Result<()> {
    let tenant_id = ctx.tenant_id()?;
    let result = sqlx::query("update tenants set info = $2 where tenant_id = $1")
        .bind(tenant_id)
        .bind(info.map(Info))
        .execute(ex)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::not_found(format!("tenant {tenant_id}")));
    }
    Ok(())
}

/// Remove a tenant and, through the FK chain, everything it owns.
/// Deleting an absent tenant is not an error.
#[tracing::instrument(err, level = "debug", skip(ex))]
pub async fn delete(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
) -> Result<()> {
    let tenant_id = ctx.tenant_id()?;
    sqlx::query("delete from tenants where tenant_id = $1")
        .bind(tenant_id)
        .execute(ex)
        .await?;
    Ok(())
}
