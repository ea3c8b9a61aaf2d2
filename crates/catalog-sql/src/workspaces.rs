use chrono::{DateTime, Utc};

use crate::{directories, DirectoryOwner, Info, RequestContext, Result, ScopedPool, StorageError};
use models::{CatalogId, DirectoryId, Label, ObjectType, RawValue, TenantId, VariantId, WorkspaceId};

#[derive(Debug, sqlx::FromRow)]
pub struct Workspace {
    pub tenant_id: TenantId,
    pub workspace_id: WorkspaceId,
    pub variant_id: VariantId,
    pub catalog_id: CatalogId,
    pub base_version: i32,
    pub label: Option<Label>,
    pub description: String,
    pub info: Option<Info>,
    pub parameters_directory: Option<DirectoryId>,
    pub collections_directory: Option<DirectoryId>,
    pub values_directory: Option<DirectoryId>,
    pub created_at: DateTime<Utc>,
}

impl Workspace {
    pub fn directory(&self, object_type: ObjectType) -> Result<DirectoryId> {
        let id = match object_type {
            ObjectType::ParameterSchema => self.parameters_directory,
            ObjectType::CollectionSchema => self.collections_directory,
            ObjectType::CatalogCollection => self.values_directory,
        };
        id.ok_or_else(|| {
            StorageError::integrity(format!(
                "workspace {} has no {} directory",
                self.workspace_id, object_type,
            ))
        })
    }
}

#[derive(Debug)]
pub struct NewWorkspace {
    pub catalog_id: CatalogId,
    pub variant_id: VariantId,
    pub base_version: i32,
    pub label: Option<Label>,
    pub description: String,
    pub info: Option<RawValue>,
}

/// Create a workspace in its own transaction.
pub async fn create(ctx: &RequestContext, db: &ScopedPool, new: NewWorkspace) -> Result<Workspace> {
    let mut txn = db.begin(ctx).await?;
    let workspace = create_in_txn(ctx, &mut txn, &new).await?;
    txn.commit().await?;
    Ok(workspace)
}

/// Mirror of the version-create lifecycle. The base_version FK rejects a
/// branch point that does not exist in the same (variant, catalog, tenant).
#[tracing::instrument(err, level = "debug", skip(txn, new), fields(variant = %new.variant_id))]
pub async fn create_in_txn(
    ctx: &RequestContext,
    txn: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    new: &NewWorkspace,
) -> Result<Workspace> {
    let tenant_id = ctx.tenant_id()?.clone();
    let workspace_id = WorkspaceId::generate();

    sqlx::query(
        r#"insert into workspaces
            (tenant_id, workspace_id, variant_id, catalog_id, base_version, label, description, info)
            values ($1, $2, $3, $4, $5, $6, $7, $8)"#,
    )
    .bind(&tenant_id)
    .bind(workspace_id)
    .bind(new.variant_id)
    .bind(new.catalog_id)
    .bind(new.base_version)
    .bind(new.label.as_ref())
    .bind(&new.description)
    .bind(new.info.clone().map(Info))
    .execute(&mut **txn)
    .await?;

    let owner = DirectoryOwner::Workspace(workspace_id);
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

    let result = sqlx::query(
        r#"update workspaces
            set parameters_directory = $3, collections_directory = $4, values_directory = $5
            where tenant_id = $1 and workspace_id = $2"#,
    )
    .bind(&tenant_id)
    .bind(workspace_id)
    .bind(parameters)
    .bind(collections)
    .bind(values)
    .execute(&mut **txn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(StorageError::not_found(format!("workspace {workspace_id}")));
    }

    get(ctx, &mut **txn, workspace_id).await
}

pub async fn get(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    workspace_id: WorkspaceId,
) -> Result<Workspace> {
    let tenant_id = ctx.tenant_id()?;
    sqlx::query_as::<_, Workspace>(
        r#"select tenant_id, workspace_id, variant_id, catalog_id, base_version, label,
                description, info, parameters_directory, collections_directory, values_directory,
                created_at
            from workspaces
            where tenant_id = $1 and workspace_id = $2"#,
    )
    .bind(tenant_id)
    .bind(workspace_id)
    .fetch_optional(ex)
    .await?
    .ok_or_else(|| StorageError::not_found(format!("workspace {workspace_id}")))
}

pub async fn get_by_label(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    variant_id: VariantId,
    label: &Label,
) -> Result<Workspace> {
    let tenant_id = ctx.tenant_id()?;
    sqlx::query_as::<_, Workspace>(
        r#"select tenant_id, workspace_id, variant_id, catalog_id, base_version, label,
                description, info, parameters_directory, collections_directory, values_directory,
                created_at
            from workspaces
            where tenant_id = $1 and variant_id = $2 and label = $3"#,
    )
    .bind(tenant_id)
    .bind(variant_id)
    .bind(label)
    .fetch_optional(ex)
    .await?
    .ok_or_else(|| StorageError::not_found(format!("workspace labeled {label}")))
}

#[tracing::instrument(err, level = "debug", skip(ex))]
pub async fn update(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    workspace_id: WorkspaceId,
    label: Option<&Label>,
    description: &str,
) -> Result<()> {
    let tenant_id = ctx.tenant_id()?;
    let result = sqlx::query(
        r#"update workspaces set label = $3, description = $4
            where tenant_id = $1 and workspace_id = $2"#,
    )
    .bind(tenant_id)
    .bind(workspace_id)
    .bind(label)
    .bind(description)
    .execute(ex)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::not_found(format!("workspace {workspace_id}")));
    }
    Ok(())
}

/// Abandon a workspace. Idempotent: deleting an absent workspace affects
/// zero rows and reports success. The cascade removes the workspace's own
/// directories (commit re-parents promoted ones first, see the commit
/// engine).
#[tracing::instrument(err, level = "debug", skip(ex))]
pub async fn delete(
    ctx: &RequestContext,
    ex: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    workspace_id: WorkspaceId,
) -> Result<()> {
    let tenant_id = ctx.tenant_id()?;
    sqlx::query("delete from workspaces where tenant_id = $1 and workspace_id = $2")
        .bind(tenant_id)
        .bind(workspace_id)
        .execute(ex)
        .await?;
    Ok(())
}
