use sqlx::pool::PoolConnection;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

use crate::{Result, StorageError};
use models::{ProjectId, TenantId};

/// The (tenant, project) pair riding on a request. Helpers that need the
/// tenant and find it missing fail fast with MissingTenantID, before any
/// backend round-trip.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    tenant_id: Option<TenantId>,
    project_id: Option<ProjectId>,
}

impl RequestContext {
    /// An empty context, carrying no scope at all.
    pub fn unscoped() -> Self {
        Self::default()
    }

    pub fn for_tenant(tenant_id: TenantId) -> Self {
        Self {
            tenant_id: Some(tenant_id),
            project_id: None,
        }
    }

    pub fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn tenant_id(&self) -> Result<&TenantId> {
        self.tenant_id.as_ref().ok_or(StorageError::MissingTenantID)
    }

    pub fn project_id(&self) -> Result<&ProjectId> {
        self.project_id
            .as_ref()
            .ok_or(StorageError::MissingProjectID)
    }
}

/// Process-wide storage configuration, established once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    /// Whether catalog-object payloads are Snappy-compressed at rest.
    /// Immutable for a given deployment.
    pub compress_objects: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let max_connections = match std::env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(v) => v.parse()?,
            Err(_) => 10,
        };
        let compress_objects = matches!(
            std::env::var("CATALOG_COMPRESS_OBJECTS").as_deref(),
            Ok("1") | Ok("true")
        );
        Ok(Self {
            database_url,
            max_connections,
            compress_objects,
        })
    }

    pub async fn connect(&self) -> sqlx::Result<PgPool> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .connect(&self.database_url)
            .await
    }
}

/// ScopedPool hands out sessions with the request scope installed. Scope
/// variables are session-local, so they are re-applied on every acquisition:
/// a connection recycled from the pool may carry another request's values.
#[derive(Clone)]
pub struct ScopedPool {
    pool: PgPool,
}

impl ScopedPool {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check out a session and bind it to the context's scope. Pool
    /// exhaustion or connect failure is surfaced as-is; there is no retry.
    pub async fn acquire(&self, ctx: &RequestContext) -> Result<PoolConnection<Postgres>> {
        ctx.tenant_id()?;
        let mut conn = self.pool.acquire().await.map_err(StorageError::from)?;
        apply_scope(&mut conn, ctx).await?;
        Ok(conn)
    }

    /// Begin a transaction on a scoped session. Dropping the returned
    /// transaction without committing rolls it back, which is what a
    /// cancelled request does.
    pub async fn begin(&self, ctx: &RequestContext) -> Result<Transaction<'static, Postgres>> {
        ctx.tenant_id()?;
        let mut txn = self.pool.begin().await.map_err(StorageError::from)?;
        apply_scope(&mut txn, ctx).await?;
        Ok(txn)
    }
}

/// Install (or clear) the session-local scope variables on a connection.
pub async fn apply_scope(conn: &mut PgConnection, ctx: &RequestContext) -> Result<()> {
    let tenant = ctx.tenant_id()?;
    sqlx::query("select set_config('catalogd.curr_tenantid', $1, false)")
        .bind(tenant.as_str())
        .execute(&mut *conn)
        .await?;

    let project = ctx
        .project_id
        .as_ref()
        .map(|p| p.as_str())
        .unwrap_or_default();
    sqlx::query("select set_config('catalogd.curr_projectid', $1, false)")
        .bind(project)
        .execute(conn)
        .await?;
    Ok(())
}
