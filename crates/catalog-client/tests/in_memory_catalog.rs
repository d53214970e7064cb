use tagsync_catalog_client::{
    list_all_containers, list_all_labels, CatalogClient, CatalogError, CatalogOperation,
    InMemoryCatalog,
};

#[tokio::test]
async fn listings_are_drained_across_pages() {
    let catalog = InMemoryCatalog::new().with_page_size(2);
    for idx in 0..5 {
        catalog.add_container(format!("port-{idx}"));
        catalog.seed_label("env", &format!("v{idx}"));
    }

    let first = catalog.list_containers(None).await.unwrap();
    assert_eq!(first.items.len(), 2);
    assert_eq!(first.next.as_deref(), Some("2"));

    let containers = list_all_containers(&catalog).await.unwrap();
    assert_eq!(containers.len(), 5);
    let labels = list_all_labels(&catalog, false).await.unwrap();
    assert_eq!(labels.len(), 5);
}

#[tokio::test]
async fn active_filter_hides_inactive_labels() {
    let catalog = InMemoryCatalog::new();
    let prod = catalog.seed_label("env", "prod");
    catalog.seed_label("env", "stage");
    catalog.set_active(&prod, false);

    let active = list_all_labels(&catalog, true).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].value, "stage");
    assert_eq!(list_all_labels(&catalog, false).await.unwrap().len(), 2);
}

#[tokio::test]
async fn duplicate_create_and_association_are_reported() {
    let catalog = InMemoryCatalog::new();
    let port = catalog.add_container("port-1");
    let id = catalog.create_label("env", "prod").await.unwrap();

    let err = catalog.create_label("env", "prod").await.unwrap_err();
    assert!(err.is_duplicate());

    catalog.associate(&id, &port).await.unwrap();
    assert!(catalog.associate(&id, &port).await.unwrap_err().is_duplicate());
    catalog.disassociate(&id, &port).await.unwrap();
    assert!(catalog
        .disassociate(&id, &port)
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn delete_refuses_label_with_associations() {
    let catalog = InMemoryCatalog::new();
    let port = catalog.add_container("port-1");
    let id = catalog.seed_label("team", "infra");
    catalog.seed_association(&id, &port);

    let err = catalog.delete_label(&id).await.unwrap_err();
    assert!(matches!(err, CatalogError::ResourceInUse(_)));

    catalog.disassociate(&id, &port).await.unwrap();
    catalog.delete_label(&id).await.unwrap();
    assert!(catalog.labels().is_empty());
}

#[tokio::test]
async fn injected_faults_target_single_resources() {
    let catalog = InMemoryCatalog::new();
    let ok = catalog.add_container("port-ok");
    let bad = catalog.add_container("port-bad");
    let id = catalog.seed_label("env", "prod");
    catalog.fail_on(CatalogOperation::Associate, "port-bad");

    catalog.associate(&id, &ok).await.unwrap();
    assert!(catalog.associate(&id, &bad).await.is_err());

    let log = catalog.call_log();
    assert_eq!(log.len(), 2);
    assert!(log
        .iter()
        .all(|call| call.operation == CatalogOperation::Associate));
}

#[tokio::test]
async fn out_of_range_page_token_yields_empty_last_page() {
    let catalog = InMemoryCatalog::new().with_page_size(2);
    catalog.add_container("port-1");

    let page = catalog
        .list_containers(Some(usize::MAX.to_string()))
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert!(page.next.is_none());
}

#[tokio::test]
async fn call_log_keeps_only_mutations() {
    let catalog = InMemoryCatalog::new();
    let port = catalog.add_container("port-1");
    list_all_labels(&catalog, false).await.unwrap();
    let label = catalog.create_label("env", "prod").await.unwrap();
    catalog.associate(&label, &port).await.unwrap();
    list_all_containers(&catalog).await.unwrap();

    let operations: Vec<CatalogOperation> = catalog
        .call_log()
        .into_iter()
        .map(|call| call.operation)
        .collect();
    assert_eq!(
        operations,
        vec![CatalogOperation::CreateLabel, CatalogOperation::Associate]
    );
    assert!(operations.iter().all(|operation| operation.is_mutation()));
}
