use std::future::Future;

use tagsync_core_types::{Container, ContainerId, Label, LabelId};

use crate::api::{CatalogClient, Page};
use crate::errors::CatalogError;

/// Follows page tokens until the listing is exhausted.
///
/// A page that hands back the token it was requested with is reported as a
/// pagination error instead of looping forever.
pub async fn drain<T, F, Fut>(mut fetch: F) -> Result<Vec<T>, CatalogError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, CatalogError>>,
{
    let mut items = Vec::new();
    let mut token: Option<String> = None;
    loop {
        let page = fetch(token.clone()).await?;
        items.extend(page.items);
        match page.next {
            Some(next) if !next.is_empty() => {
                if token.as_deref() == Some(next.as_str()) {
                    return Err(CatalogError::Pagination(format!(
                        "page token {next} repeated"
                    )));
                }
                token = Some(next);
            }
            _ => return Ok(items),
        }
    }
}

pub async fn list_all_labels(
    client: &dyn CatalogClient,
    active_only: bool,
) -> Result<Vec<Label>, CatalogError> {
    drain(|token| client.list_labels(active_only, token)).await
}

pub async fn list_all_containers(client: &dyn CatalogClient) -> Result<Vec<Container>, CatalogError> {
    drain(|token| client.list_containers(token)).await
}

pub async fn list_all_resources_for_label(
    client: &dyn CatalogClient,
    label: &LabelId,
) -> Result<Vec<ContainerId>, CatalogError> {
    drain(|token| client.list_resources_for_label(label, token)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn drain_follows_tokens_in_order() {
        let pages = vec![
            Page {
                items: vec![1, 2],
                next: Some("a".to_string()),
            },
            Page {
                items: vec![3],
                next: Some("b".to_string()),
            },
            Page::last(vec![4]),
        ];
        let mut iter = pages.into_iter();
        let items = drain(|_token| {
            let page = iter.next().expect("page");
            async move { Ok::<_, CatalogError>(page) }
        })
        .await
        .unwrap();
        assert_eq!(items, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn drain_rejects_repeated_token() {
        let err = drain(|_token| async {
            Ok::<_, CatalogError>(Page {
                items: vec![0u8],
                next: Some("same".to_string()),
            })
        })
        .await
        .unwrap_err();
        assert!(matches!(err, CatalogError::Pagination(_)));
    }

    #[tokio::test]
    async fn drain_surfaces_error_from_later_page() {
        let mut calls = 0;
        let err = drain(|_token| {
            calls += 1;
            let attempt = calls;
            async move {
                if attempt == 1 {
                    Ok(Page {
                        items: vec![1],
                        next: Some("p2".to_string()),
                    })
                } else {
                    Err(CatalogError::Transport("reset".into()))
                }
            }
        })
        .await
        .unwrap_err();
        assert_eq!(err, CatalogError::Transport("reset".into()));
    }
}
