use std::collections::BTreeSet;

use catalog_sql::{
    collections, directories, objects, versions, workspaces, RequestContext, Result, ScopedPool,
};
use models::{HashDigest, ObjectType, RepoId, WorkspaceId};

/// Promote a workspace into a new version of its variant. One transaction:
///
/// 1. Load the workspace and the three directories it owns.
/// 2. Materialize the successor version, re-owning those directories
///    (re-parented before the workspace row goes away, so the workspace
///    cascade cannot reach them).
/// 3. Reconcile tombstoned collection rows: drop the rows on both the
///    workspace repo and the variant head, drop the retired directory
///    entries, and garbage-collect hashes nothing references anymore.
/// 4. Re-key the workspace's live collection rows onto the variant head.
/// 5. Delete the workspace row.
///
/// Afterwards the old workspace id reads as NotFound and the new version
/// exposes the promoted directories. Committing an empty workspace is
/// legal.
#[tracing::instrument(err, skip(ctx, db))]
pub async fn commit_workspace(
    ctx: &RequestContext,
    db: &ScopedPool,
    workspace_id: WorkspaceId,
) -> Result<versions::Version> {
    let mut txn = db.begin(ctx).await?;

    let workspace = workspaces::get(ctx, &mut *txn, workspace_id).await?;
    let parameters = workspace.directory(ObjectType::ParameterSchema)?;
    let schemas = workspace.directory(ObjectType::CollectionSchema)?;
    let values = workspace.directory(ObjectType::CatalogCollection)?;
    let workspace_repo = RepoId::from(workspace_id);

    let version = versions::create_adopting_in_txn(
        ctx,
        &mut txn,
        &versions::NewVersion {
            catalog_id: workspace.catalog_id,
            variant_id: workspace.variant_id,
            label: None,
            description: workspace.description.clone(),
            info: None,
        },
        [parameters, schemas, values],
    )
    .await?;

    // Tombstones record deletions made in the workspace: retire the paths
    // from the head and from the promoted values directory, then collect
    // hashes that no directory points at anymore.
    let tombstones =
        collections::tombstones_in_repo(ctx, &mut *txn, workspace_repo, workspace.variant_id)
            .await?;
    let mut dropped: BTreeSet<HashDigest> = BTreeSet::new();
    for tombstone in tombstones {
        dropped.insert(tombstone.hash.clone());
        collections::purge_path(
            ctx,
            &mut *txn,
            workspace_repo,
            workspace.variant_id,
            &tombstone.path,
        )
        .await?;
        if let Some(evicted) = directories::delete_object_by_path(
            ctx,
            &mut *txn,
            ObjectType::CatalogCollection,
            values,
            tombstone.path.key(),
        )
        .await?
        {
            dropped.insert(evicted);
        }
    }

    collections::promote_repo(ctx, &mut *txn, workspace_repo, workspace.variant_id).await?;
    workspaces::delete(ctx, &mut *txn, workspace_id).await?;

    for hash in dropped {
        if objects::delete_if_unreferenced(ctx, &mut *txn, &hash).await? {
            tracing::debug!(%hash, "garbage-collected catalog object");
        }
    }

    txn.commit().await?;
    Ok(version)
}
