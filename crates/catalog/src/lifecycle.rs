use catalog_sql::{catalogs, RequestContext, Result, ScopedPool};
use models::{Name, RawValue};

/// Create a catalog together with its companion `default` variant, as one
/// transaction.
pub async fn create_catalog(
    ctx: &RequestContext,
    db: &ScopedPool,
    name: &Name,
    description: &str,
    info: Option<RawValue>,
) -> Result<catalogs::Catalog> {
    let mut txn = db.begin(ctx).await?;
    let catalog = catalogs::create(ctx, &mut txn, name, description, info).await?;
    txn.commit().await?;
    Ok(catalog)
}
