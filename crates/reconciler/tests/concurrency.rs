use std::sync::Arc;

use tagsync_catalog_client::{CatalogOperation, InMemoryCatalog};
use tagsync_core_types::{ChangeAction, ChangeNotification};
use tagsync_reconciler::{SyncHandler, SyncOptions};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn passes_for_one_key_are_serialized() {
    let catalog = InMemoryCatalog::new();
    for idx in 0..10 {
        catalog.add_container(format!("port-{idx}"));
    }
    let handler = Arc::new(SyncHandler::new(
        Arc::new(catalog.clone()),
        SyncOptions { concurrency: 4 },
    ));

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let handler = Arc::clone(&handler);
        tasks.push(tokio::spawn(async move {
            handler
                .handle(&ChangeNotification::new("env", "prod", ChangeAction::Insert))
                .await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let creates = catalog
        .call_log()
        .iter()
        .filter(|call| call.operation == CatalogOperation::CreateLabel)
        .count();
    assert_eq!(creates, 1);
    let label = catalog.find_label("env", "prod").unwrap();
    assert_eq!(catalog.associations_of(&label.id).len(), 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn different_keys_proceed_independently() {
    let catalog = InMemoryCatalog::new();
    catalog.add_container("port-1");
    let handler = Arc::new(SyncHandler::new(
        Arc::new(catalog.clone()),
        SyncOptions::default(),
    ));

    let keys = ["env", "team", "cost-center", "owner"];
    let mut tasks = Vec::new();
    for key in keys {
        let handler = Arc::clone(&handler);
        tasks.push(tokio::spawn(async move {
            handler
                .handle(&ChangeNotification::new(key, "x", ChangeAction::Insert))
                .await
        }));
    }
    for task in tasks {
        assert!(task.await.unwrap().unwrap().failures.is_empty());
    }
    assert_eq!(catalog.labels().len(), keys.len());
}
