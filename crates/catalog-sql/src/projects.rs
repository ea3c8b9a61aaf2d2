use chrono::{DateTime, Utc};

use crate::{Info, RequestContext, Result, StorageError};
use models::{ProjectId, RawValue, TenantId};

#[derive(Debug, sqlx::FromRow)]
pub struct Project {
    pub tenant_id: TenantId,
    pub project_id: ProjectId,
    pub description: String,
    pub info: Option<Info>,
    pub created_at: DateTime<Utc>,
}

#[tracing::instrument(err, level = "debug", skip(ex, info))]
pub async fn create(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    description: &str,
    info: Option<RawValue>,
) -> Result<()> {
    let tenant_id = ctx.tenant_id()?;
    let project_id = ctx.project_id()?;
    let result = sqlx::query(
        r#"insert into projects (tenant_id, project_id, description, info)
            values ($1, $2, $3, $4)
            on conflict (tenant_id, project_id) do nothing"#,
    )
    .bind(tenant_id)
    .bind(project_id)
    .bind(description)
    .bind(info.map(Info))
    .execute(ex)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::already_exists(format!(
            "project {project_id}"
        )));
    }
    Ok(())
}

pub async fn get(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
) -> Result<Project> {
    let tenant_id = ctx.tenant_id()?;
    let project_id = ctx.project_id()?;
    sqlx::query_as::<_, Project>(
        r#"select tenant_id, project_id, description, info, created_at
            from projects
            where tenant_id = $1 and project_id = $2"#,
    )
    .bind(tenant_id)
    .bind(project_id)
    .fetch_optional(ex)
    .await?
    .ok_or_else(|| StorageError::not_found(format!("project {project_id}")))
}

#[tracing::instrument(err, level = "debug", skip(ex, info))]
pub async fn update(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    description: &str,
    info: Option<RawValue>,
) -> Result<()> {
    let tenant_id = ctx.tenant_id()?;
    let project_id = ctx.project_id()?;
    let result = sqlx::query(
        r#"update projects set description = $3, info = $4
            where tenant_id = $1 and project_id = $2"#,
    )
    .bind(tenant_id)
    .bind(project_id)
    .bind(description)
    .bind(info.map(Info))
    .execute(ex)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::not_found(format!("project {project_id}")));
    }
    Ok(())
}

/// Deleting an absent project is not an error; the FK chain removes all
/// catalogs the project owns.
#[tracing::instrument(err, level = "debug", skip(ex))]
pub async fn delete(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
) -> Result<()> {
    let tenant_id = ctx.tenant_id()?;
    let project_id = ctx.project_id()?;
    sqlx::query("delete from projects where tenant_id = $1 and project_id = $2")
        .bind(tenant_id)
        .bind(project_id)
        .execute(ex)
        .await?;
    Ok(())
}
