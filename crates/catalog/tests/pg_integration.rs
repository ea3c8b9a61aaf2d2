// End-to-end storage tests against a live Postgres. Each test resets the
// `public` schema of the database named by DATABASE_URL and replays the
// migration, so point it at a scratch database and run serially:
//
//   DATABASE_URL=postgres://... cargo test -p catalog -- --ignored --test-threads=1

use catalog::{commit_workspace, create_catalog, new_resource};
use catalog_sql::{
    collections, directories, namespaces, objects, tenants, variants, versions, workspaces,
    RequestContext, ScopedPool, StorageError,
};
use futures::TryStreamExt;
use models::{
    CatalogObject, HashDigest, Label, Name, ObjectRef, ObjectType, ProjectId, RawValue, RepoId,
    ResourcePath, TenantId, DEFAULT_VARIANT,
};
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use sqlx::Executor;

const MIGRATION: &str = include_str!("../../../migrations/20240301000000_init.sql");

async fn scratch_pool() -> anyhow::Result<ScopedPool> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let url = std::env::var("DATABASE_URL")?;
    let pool = PgPoolOptions::new().max_connections(4).connect(&url).await?;

    let mut conn = pool.acquire().await?;
    conn.execute("drop schema public cascade; create schema public;")
        .await?;
    conn.execute(MIGRATION).await?;
    Ok(ScopedPool::new(pool))
}

fn ctx(tenant: &str) -> RequestContext {
    RequestContext::for_tenant(TenantId::new(tenant)).with_project(ProjectId::new("proj1"))
}

struct Fixture {
    db: ScopedPool,
    ctx: RequestContext,
    catalog: catalog_sql::catalogs::Catalog,
    variant: catalog_sql::variants::Variant,
}

/// Tenant, project, catalog, and the auto-created default variant.
async fn fixture(tenant: &str) -> anyhow::Result<Fixture> {
    let db = scratch_pool().await?;
    let ctx = ctx(tenant);

    let mut conn = db.acquire(&ctx).await?;
    tenants::create(&ctx, &mut *conn, None).await?;
    catalog_sql::projects::create(&ctx, &mut *conn, "", None).await?;
    drop(conn);

    let catalog = create_catalog(&ctx, &db, &Name::new("example-catalog"), "", None).await?;
    let mut conn = db.acquire(&ctx).await?;
    let variant = variants::get_by_name(
        &ctx,
        &mut *conn,
        catalog.catalog_id,
        &Name::new(DEFAULT_VARIANT),
    )
    .await?;

    Ok(Fixture {
        db,
        ctx,
        catalog,
        variant,
    })
}

fn new_version(fx: &Fixture) -> versions::NewVersion {
    versions::NewVersion {
        catalog_id: fx.catalog.catalog_id,
        variant_id: fx.variant.variant_id,
        label: None,
        description: String::new(),
        info: None,
    }
}

fn object_fixture(body: serde_json::Value) -> CatalogObject {
    CatalogObject::new(
        ObjectType::ParameterSchema,
        "v1",
        RawValue::from_value(&body),
    )
}

#[tokio::test]
#[ignore] // Requires a scratch Postgres: set DATABASE_URL.
async fn test_tenant_create_is_idempotent_on_conflict() -> anyhow::Result<()> {
    let db = scratch_pool().await?;
    let ctx = ctx("TABCDE");

    let mut conn = db.acquire(&ctx).await?;
    tenants::create(&ctx, &mut *conn, None).await?;
    let err = tenants::create(&ctx, &mut *conn, None).await.unwrap_err();
    assert!(err.is_already_exists());

    let tenant = tenants::get(&ctx, &mut *conn).await?;
    assert_eq!(tenant.tenant_id.as_str(), "TABCDE");
    Ok(())
}

#[tokio::test]
#[ignore] // Requires a scratch Postgres: set DATABASE_URL.
async fn test_missing_tenant_fails_before_touching_the_pool() -> anyhow::Result<()> {
    let db = scratch_pool().await?;
    let err = db.acquire(&RequestContext::unscoped()).await.unwrap_err();
    assert!(matches!(err, StorageError::MissingTenantID));
    Ok(())
}

#[tokio::test]
#[ignore] // Requires a scratch Postgres: set DATABASE_URL.
async fn test_version_create_builds_directory_triad() -> anyhow::Result<()> {
    let fx = fixture("T1").await?;

    let version = versions::create(&fx.ctx, &fx.db, new_version(&fx)).await?;
    assert_eq!(version.version_num, 1);

    let mut conn = fx.db.acquire(&fx.ctx).await?;
    for object_type in [
        ObjectType::ParameterSchema,
        ObjectType::CollectionSchema,
        ObjectType::CatalogCollection,
    ] {
        let directory_id = version.directory(object_type)?;
        let directory =
            directories::get_directory(&fx.ctx, &mut *conn, object_type, directory_id).await?;
        assert!(directory.is_empty());
    }

    let second = versions::create(&fx.ctx, &fx.db, new_version(&fx)).await?;
    assert_eq!(second.version_num, 2);

    let count = versions::count_in_catalog_and_variant(
        &fx.ctx,
        &mut *conn,
        fx.catalog.catalog_id,
        fx.variant.variant_id,
    )
    .await?;
    assert_eq!(count, 2);
    Ok(())
}

#[tokio::test]
#[ignore] // Requires a scratch Postgres: set DATABASE_URL.
async fn test_version_labels() -> anyhow::Result<()> {
    let fx = fixture("T2").await?;

    let mut labeled = new_version(&fx);
    labeled.label = Some(Label::new("golden"));
    let version = versions::create(&fx.ctx, &fx.db, labeled).await?;

    // A duplicate label within the variant is refused.
    let mut duplicate = new_version(&fx);
    duplicate.label = Some(Label::new("golden"));
    let err = versions::create(&fx.ctx, &fx.db, duplicate).await.unwrap_err();
    assert!(err.is_already_exists());

    // A malformed label is an input error, not a database fault.
    let mut malformed = new_version(&fx);
    malformed.label = Some(Label::new("not-a-label!"));
    let err = versions::create(&fx.ctx, &fx.db, malformed).await.unwrap_err();
    assert!(matches!(err.root(), StorageError::InvalidInput(_)));

    let mut conn = fx.db.acquire(&fx.ctx).await?;
    let by_label = versions::get_by_label(
        &fx.ctx,
        &mut *conn,
        fx.variant.variant_id,
        &Label::new("golden"),
    )
    .await?;
    assert_eq!(by_label.version_num, version.version_num);

    let named: Vec<_> =
        versions::get_named_versions(&fx.ctx, &mut *conn, fx.variant.variant_id)?
            .try_collect()
            .await?;
    assert_eq!(named.len(), 1);
    assert_eq!(named[0].label.as_str(), "golden");
    Ok(())
}

#[tokio::test]
#[ignore] // Requires a scratch Postgres: set DATABASE_URL.
async fn test_workspace_requires_existing_base_version() -> anyhow::Result<()> {
    let fx = fixture("T3").await?;

    let err = workspaces::create(
        &fx.ctx,
        &fx.db,
        workspaces::NewWorkspace {
            catalog_id: fx.catalog.catalog_id,
            variant_id: fx.variant.variant_id,
            base_version: 42,
            label: None,
            description: String::new(),
            info: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err.root(), StorageError::InvalidCatalog(_)));
    Ok(())
}

#[tokio::test]
#[ignore] // Requires a scratch Postgres: set DATABASE_URL.
async fn test_version_delete_is_guarded_by_workspaces() -> anyhow::Result<()> {
    let fx = fixture("TC").await?;
    versions::create(&fx.ctx, &fx.db, new_version(&fx)).await?;
    let workspace = workspaces::create(
        &fx.ctx,
        &fx.db,
        workspaces::NewWorkspace {
            catalog_id: fx.catalog.catalog_id,
            variant_id: fx.variant.variant_id,
            base_version: 1,
            label: None,
            description: String::new(),
            info: None,
        },
    )
    .await?;

    let mut conn = fx.db.acquire(&fx.ctx).await?;
    let err = versions::delete(&fx.ctx, &mut *conn, fx.variant.variant_id, 1)
        .await
        .unwrap_err();
    assert!(matches!(err.root(), StorageError::InvalidInput(_)));

    // Workspace delete is idempotent; with it gone the version is free.
    workspaces::delete(&fx.ctx, &mut *conn, workspace.workspace_id).await?;
    workspaces::delete(&fx.ctx, &mut *conn, workspace.workspace_id).await?;
    versions::delete(&fx.ctx, &mut *conn, fx.variant.variant_id, 1).await?;

    let err = versions::delete(&fx.ctx, &mut *conn, fx.variant.variant_id, 1)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    Ok(())
}

#[tokio::test]
#[ignore] // Requires a scratch Postgres: set DATABASE_URL.
async fn test_entity_updates() -> anyhow::Result<()> {
    let fx = fixture("TD").await?;
    let mut conn = fx.db.acquire(&fx.ctx).await?;

    catalog_sql::catalogs::update(
        &fx.ctx,
        &mut *conn,
        fx.catalog.catalog_id,
        "updated catalog",
        None,
    )
    .await?;
    let catalog = catalog_sql::catalogs::get(&fx.ctx, &mut *conn, fx.catalog.catalog_id).await?;
    assert_eq!(catalog.description, "updated catalog");
    assert_eq!(catalog.name, fx.catalog.name);

    variants::update(&fx.ctx, &mut *conn, fx.variant.variant_id, "updated variant", None)
        .await?;
    let variant = variants::get(&fx.ctx, &mut *conn, fx.variant.variant_id).await?;
    assert_eq!(variant.description, "updated variant");

    drop(conn);
    let version = versions::create(&fx.ctx, &fx.db, new_version(&fx)).await?;
    let mut conn = fx.db.acquire(&fx.ctx).await?;

    versions::set_label(
        &fx.ctx,
        &mut *conn,
        fx.variant.variant_id,
        version.version_num,
        Some(&Label::new("stable")),
    )
    .await?;
    versions::update_description(
        &fx.ctx,
        &mut *conn,
        fx.variant.variant_id,
        version.version_num,
        "first cut",
    )
    .await?;
    let relabeled = versions::get_by_label(
        &fx.ctx,
        &mut *conn,
        fx.variant.variant_id,
        &Label::new("stable"),
    )
    .await?;
    assert_eq!(relabeled.version_num, version.version_num);
    assert_eq!(relabeled.description, "first cut");
    Ok(())
}

#[tokio::test]
#[ignore] // Requires a scratch Postgres: set DATABASE_URL.
async fn test_object_store_under_both_compression_settings() -> anyhow::Result<()> {
    let fx = fixture("T4").await?;
    let mut conn = fx.db.acquire(&fx.ctx).await?;

    let body = json!({"dataType": "String", "validation": {"maxLength": 64}});
    let compressed = object_fixture(body.clone());
    objects::put(&fx.ctx, &mut *conn, &compressed, true).await?;

    // Idempotent on (hash, tenant), regardless of the compression flag.
    let err = objects::put(&fx.ctx, &mut *conn, &compressed, false)
        .await
        .unwrap_err();
    assert!(err.is_already_exists());

    let fetched = objects::get(&fx.ctx, &mut *conn, &compressed.hash).await?;
    assert_eq!(fetched, compressed);

    // A second object stored uncompressed reads back identically too.
    let plain = object_fixture(json!({"dataType": "Boolean"}));
    objects::put(&fx.ctx, &mut *conn, &plain, false).await?;
    let fetched = objects::get(&fx.ctx, &mut *conn, &plain.hash).await?;
    assert_eq!(fetched, plain);

    objects::delete(&fx.ctx, &mut *conn, &plain.hash).await?;
    let err = objects::get(&fx.ctx, &mut *conn, &plain.hash).await.unwrap_err();
    assert!(err.is_not_found());
    Ok(())
}

#[tokio::test]
#[ignore] // Requires a scratch Postgres: set DATABASE_URL.
async fn test_directory_add_get_delete_round_trip() -> anyhow::Result<()> {
    let fx = fixture("T5").await?;
    let version = versions::create(&fx.ctx, &fx.db, new_version(&fx)).await?;
    let directory_id = version.directory(ObjectType::ParameterSchema)?;
    let mut conn = fx.db.acquire(&fx.ctx).await?;

    let object = ObjectRef::new(HashDigest::of(b"first"));
    directories::add_or_update_object_by_path(
        &fx.ctx,
        &mut *conn,
        ObjectType::ParameterSchema,
        directory_id,
        "/svc/timeout",
        object.clone(),
    )
    .await?;

    let fetched = directories::get_object_by_path(
        &fx.ctx,
        &mut *conn,
        ObjectType::ParameterSchema,
        directory_id,
        "/svc/timeout",
    )
    .await?;
    assert_eq!(fetched, object);
    assert!(
        directories::path_exists(
            &fx.ctx,
            &mut *conn,
            ObjectType::ParameterSchema,
            directory_id,
            "/svc/timeout"
        )
        .await?
    );

    // Replacing the entry without naming references keeps the prior list.
    let mut with_refs = object.clone();
    with_refs.references = Some(vec![models::Reference {
        name: ResourcePath::new("/svc/retries"),
    }]);
    directories::add_or_update_object_by_path(
        &fx.ctx,
        &mut *conn,
        ObjectType::ParameterSchema,
        directory_id,
        "/svc/timeout",
        with_refs.clone(),
    )
    .await?;

    let replacement = ObjectRef::new(HashDigest::of(b"second"));
    directories::add_or_update_object_by_path(
        &fx.ctx,
        &mut *conn,
        ObjectType::ParameterSchema,
        directory_id,
        "/svc/timeout",
        replacement.clone(),
    )
    .await?;
    let fetched = directories::get_object_by_path(
        &fx.ctx,
        &mut *conn,
        ObjectType::ParameterSchema,
        directory_id,
        "/svc/timeout",
    )
    .await?;
    assert_eq!(fetched.hash, replacement.hash);
    assert_eq!(fetched.references, with_refs.references);

    let evicted = directories::delete_object_by_path(
        &fx.ctx,
        &mut *conn,
        ObjectType::ParameterSchema,
        directory_id,
        "/svc/timeout",
    )
    .await?;
    assert_eq!(evicted, Some(replacement.hash));

    // Removing an absent key is not an error.
    let evicted = directories::delete_object_by_path(
        &fx.ctx,
        &mut *conn,
        ObjectType::ParameterSchema,
        directory_id,
        "/svc/timeout",
    )
    .await?;
    assert_eq!(evicted, None);
    Ok(())
}

#[tokio::test]
#[ignore] // Requires a scratch Postgres: set DATABASE_URL.
async fn test_find_closest_object() -> anyhow::Result<()> {
    let fx = fixture("T6").await?;
    let version = versions::create(&fx.ctx, &fx.db, new_version(&fx)).await?;
    let directory_id = version.directory(ObjectType::ParameterSchema)?;
    let mut conn = fx.db.acquire(&fx.ctx).await?;

    for path in ["/a/b/c/d", "/a/d"] {
        directories::add_or_update_object_by_path(
            &fx.ctx,
            &mut *conn,
            ObjectType::ParameterSchema,
            directory_id,
            path,
            ObjectRef::new(HashDigest::of(path.as_bytes())),
        )
        .await?;
    }

    let target = Name::new("d");
    let found = directories::find_closest_object(
        &fx.ctx,
        &mut *conn,
        ObjectType::ParameterSchema,
        directory_id,
        &target,
        "/a/b/c",
    )
    .await?;
    assert_eq!(found.unwrap().0, "/a/b/c/d");

    let found = directories::find_closest_object(
        &fx.ctx,
        &mut *conn,
        ObjectType::ParameterSchema,
        directory_id,
        &target,
        "/a/b",
    )
    .await?;
    assert_eq!(found.unwrap().0, "/a/d");

    let found = directories::find_closest_object(
        &fx.ctx,
        &mut *conn,
        ObjectType::ParameterSchema,
        directory_id,
        &target,
        "/x",
    )
    .await?;
    assert!(found.is_none());
    Ok(())
}

#[tokio::test]
#[ignore] // Requires a scratch Postgres: set DATABASE_URL.
async fn test_collection_soft_delete_in_workspace_hard_delete_at_head() -> anyhow::Result<()> {
    let fx = fixture("T7").await?;
    versions::create(&fx.ctx, &fx.db, new_version(&fx)).await?;
    let workspace = workspaces::create(
        &fx.ctx,
        &fx.db,
        workspaces::NewWorkspace {
            catalog_id: fx.catalog.catalog_id,
            variant_id: fx.variant.variant_id,
            base_version: 1,
            label: None,
            description: String::new(),
            info: None,
        },
    )
    .await?;
    let mut conn = fx.db.acquire(&fx.ctx).await?;

    let upsert = |repo: RepoId| collections::UpsertCollection {
        path: ResourcePath::new("/prod/regions"),
        hash: HashDigest::of(b"collection-body"),
        description: String::new(),
        namespace: "default".to_string(),
        collection_schema: Name::new("region_schema"),
        info: None,
        repo_id: repo,
        variant_id: fx.variant.variant_id,
    };

    // Workspace: delete is a tombstone and returns no hash.
    let workspace_repo = RepoId::from(workspace.workspace_id);
    collections::upsert(&fx.ctx, &mut *conn, &upsert(workspace_repo)).await?;
    let evicted = collections::delete(
        &fx.ctx,
        &mut *conn,
        workspace_repo,
        fx.variant.variant_id,
        &ResourcePath::new("/prod/regions"),
    )
    .await?;
    assert_eq!(evicted, None);

    let err = collections::get(
        &fx.ctx,
        &mut *conn,
        workspace_repo,
        fx.variant.variant_id,
        &ResourcePath::new("/prod/regions"),
    )
    .await
    .unwrap_err();
    assert!(err.is_not_found());

    // Variant head: delete removes the row and returns the hash.
    let head_repo = RepoId::from(fx.variant.variant_id);
    collections::upsert(&fx.ctx, &mut *conn, &upsert(head_repo)).await?;
    let evicted = collections::delete(
        &fx.ctx,
        &mut *conn,
        head_repo,
        fx.variant.variant_id,
        &ResourcePath::new("/prod/regions"),
    )
    .await?;
    assert_eq!(evicted, Some(HashDigest::of(b"collection-body")));
    Ok(())
}

#[tokio::test]
#[ignore] // Requires a scratch Postgres: set DATABASE_URL.
async fn test_workspace_commit_round_trip() -> anyhow::Result<()> {
    let fx = fixture("T8").await?;
    versions::create(&fx.ctx, &fx.db, new_version(&fx)).await?;
    let workspace = workspaces::create(
        &fx.ctx,
        &fx.db,
        workspaces::NewWorkspace {
            catalog_id: fx.catalog.catalog_id,
            variant_id: fx.variant.variant_id,
            base_version: 1,
            label: None,
            description: "pending change".to_string(),
            info: None,
        },
    )
    .await?;

    let parameter_paths: Vec<String> =
        (0..5).map(|i| format!("/params/p{i}")).collect();
    let collection_paths: Vec<String> =
        (0..5).map(|i| format!("/colls/c{i}")).collect();

    let params_dir = workspace.directory(ObjectType::ParameterSchema)?;
    let values_dir = workspace.directory(ObjectType::CatalogCollection)?;
    let workspace_repo = RepoId::from(workspace.workspace_id);

    let mut conn = fx.db.acquire(&fx.ctx).await?;
    for path in &parameter_paths {
        directories::add_or_update_object_by_path(
            &fx.ctx,
            &mut *conn,
            ObjectType::ParameterSchema,
            params_dir,
            path,
            ObjectRef::new(HashDigest::of(path.as_bytes())),
        )
        .await?;
    }
    for path in &collection_paths {
        directories::add_or_update_object_by_path(
            &fx.ctx,
            &mut *conn,
            ObjectType::CatalogCollection,
            values_dir,
            path,
            ObjectRef::new(HashDigest::of(path.as_bytes())),
        )
        .await?;
        collections::upsert(
            &fx.ctx,
            &mut *conn,
            &collections::UpsertCollection {
                path: ResourcePath::new(path.as_str()),
                hash: HashDigest::of(path.as_bytes()),
                description: String::new(),
                namespace: "default".to_string(),
                collection_schema: Name::new("schema_a"),
                info: None,
                repo_id: workspace_repo,
                variant_id: fx.variant.variant_id,
            },
        )
        .await?;
    }
    drop(conn);

    let version = commit_workspace(&fx.ctx, &fx.db, workspace.workspace_id).await?;
    assert_eq!(version.version_num, 2);

    let mut conn = fx.db.acquire(&fx.ctx).await?;
    let err = workspaces::get(&fx.ctx, &mut *conn, workspace.workspace_id)
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let promoted = directories::get_directory(
        &fx.ctx,
        &mut *conn,
        ObjectType::ParameterSchema,
        version.directory(ObjectType::ParameterSchema)?,
    )
    .await?;
    let keys: Vec<&str> = promoted.keys().map(String::as_str).collect();
    assert_eq!(keys, parameter_paths.iter().map(String::as_str).collect::<Vec<_>>());

    // Promoted collection rows now live at the variant head.
    let head_repo = RepoId::from(fx.variant.variant_id);
    for path in &collection_paths {
        let row = collections::get(
            &fx.ctx,
            &mut *conn,
            head_repo,
            fx.variant.variant_id,
            &ResourcePath::new(path.as_str()),
        )
        .await?;
        assert_eq!(row.hash, HashDigest::of(path.as_bytes()));
    }
    Ok(())
}

#[tokio::test]
#[ignore] // Requires a scratch Postgres: set DATABASE_URL.
async fn test_commit_reconciles_tombstones_and_collects_garbage() -> anyhow::Result<()> {
    let fx = fixture("T9").await?;
    versions::create(&fx.ctx, &fx.db, new_version(&fx)).await?;
    let workspace = workspaces::create(
        &fx.ctx,
        &fx.db,
        workspaces::NewWorkspace {
            catalog_id: fx.catalog.catalog_id,
            variant_id: fx.variant.variant_id,
            base_version: 1,
            label: None,
            description: String::new(),
            info: None,
        },
    )
    .await?;
    let workspace_repo = RepoId::from(workspace.workspace_id);
    let values_dir = workspace.directory(ObjectType::CatalogCollection)?;
    let path = ResourcePath::new("/doomed/one");

    let object = CatalogObject::new(
        ObjectType::CatalogCollection,
        "v1",
        RawValue::from_value(&json!({"schema": "s", "values": {}})),
    );

    let mut conn = fx.db.acquire(&fx.ctx).await?;
    objects::put(&fx.ctx, &mut *conn, &object, false).await?;
    directories::add_or_update_object_by_path(
        &fx.ctx,
        &mut *conn,
        ObjectType::CatalogCollection,
        values_dir,
        path.key(),
        ObjectRef::new(object.hash.clone()),
    )
    .await?;
    collections::upsert(
        &fx.ctx,
        &mut *conn,
        &collections::UpsertCollection {
            path: path.clone(),
            hash: object.hash.clone(),
            description: String::new(),
            namespace: "default".to_string(),
            collection_schema: Name::new("s"),
            info: None,
            repo_id: workspace_repo,
            variant_id: fx.variant.variant_id,
        },
    )
    .await?;
    collections::delete(&fx.ctx, &mut *conn, workspace_repo, fx.variant.variant_id, &path)
        .await?;
    drop(conn);

    let version = commit_workspace(&fx.ctx, &fx.db, workspace.workspace_id).await?;

    let mut conn = fx.db.acquire(&fx.ctx).await?;
    // The tombstoned path is gone from the promoted directory and the
    // unreferenced object was collected.
    let promoted = directories::get_directory(
        &fx.ctx,
        &mut *conn,
        ObjectType::CatalogCollection,
        version.directory(ObjectType::CatalogCollection)?,
    )
    .await?;
    assert!(promoted.is_empty());

    let err = objects::get(&fx.ctx, &mut *conn, &object.hash).await.unwrap_err();
    assert!(err.is_not_found());
    Ok(())
}

#[tokio::test]
#[ignore] // Requires a scratch Postgres: set DATABASE_URL.
async fn test_namespaces_have_an_implicit_default() -> anyhow::Result<()> {
    let fx = fixture("TA").await?;
    let mut conn = fx.db.acquire(&fx.ctx).await?;

    let default = namespaces::get(
        &fx.ctx,
        &mut *conn,
        fx.variant.variant_id,
        fx.catalog.catalog_id,
        &models::Namespace::new("default"),
    )
    .await?;
    assert_eq!(default.name.as_str(), "default");

    namespaces::create(
        &fx.ctx,
        &mut *conn,
        fx.variant.variant_id,
        fx.catalog.catalog_id,
        &models::Namespace::new("edge"),
        "edge fleet",
        None,
    )
    .await?;

    let listed: Vec<_> = namespaces::list(&fx.ctx, &mut *conn, fx.variant.variant_id)?
        .try_collect()
        .await?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name.as_str(), "edge");
    Ok(())
}

#[tokio::test]
#[ignore] // Requires a scratch Postgres: set DATABASE_URL.
async fn test_admitted_resource_persists_end_to_end() -> anyhow::Result<()> {
    let fx = fixture("TB").await?;
    let version = versions::create(&fx.ctx, &fx.db, new_version(&fx)).await?;
    let directory_id = version.directory(ObjectType::ParameterSchema)?;

    let manager = new_resource(
        &json!({
            "version": "v1",
            "kind": "Parameter",
            "metadata": {"name": "timeout", "catalog": "example-catalog", "path": "/svc/timeout"},
            "spec": {"dataType": "Integer", "validation": {"minValue": 1}, "default": 30},
        })
        .to_string(),
    )
    .unwrap();
    let parameter = manager.parameter_manager().unwrap();
    let representation = parameter.storage_representation();
    let hash = representation.hash();

    let mut conn = fx.db.acquire(&fx.ctx).await?;
    objects::put(
        &fx.ctx,
        &mut *conn,
        &representation.clone().into_catalog_object(),
        true,
    )
    .await?;
    directories::add_or_update_object_by_path(
        &fx.ctx,
        &mut *conn,
        ObjectType::ParameterSchema,
        directory_id,
        parameter.path().key(),
        ObjectRef::new(hash.clone()),
    )
    .await?;

    let stored = objects::get(&fx.ctx, &mut *conn, &hash).await?;
    assert_eq!(stored.data, representation.schema);
    Ok(())
}
