use crate::graph::GraphError;
use async_trait::async_trait;
use futures::future::join_all;

/// One page of a forward-paginated listing. Absence of `next_cursor` is the
/// only end-of-collection signal; item counts carry no meaning.
#[derive(Debug, Clone)]
pub struct Batch<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

/// A forward-paginated remote listing whose items each need one extra
/// derived field fetched through a secondary per-item lookup.
#[async_trait]
pub trait PagedSource: Sync {
    type Raw: Clone + Send + Sync;
    type Item: Send;

    /// Fetch one page. `None` requests the first page; otherwise the cursor
    /// is the opaque token the previous page handed back.
    async fn list(&self, cursor: Option<&str>) -> Result<Batch<Self::Raw>, GraphError>;

    /// The secondary lookup producing a fully decorated item.
    async fn decorate(&self, raw: Self::Raw) -> Result<Self::Item, GraphError>;

    /// Decorated item with the derived field set to its explicit empty
    /// value; used when the secondary lookup fails.
    fn fallback(&self, raw: Self::Raw) -> Self::Item;
}

/// Drains a paginated listing to exhaustion, preserving page order and
/// within-page item order. Decoration of one page's items runs in parallel
/// and is joined before the next page is requested; pages themselves never
/// overlap. A failed per-item decoration degrades that one item to its
/// fallback; a failed page fetch aborts with no partial accumulation.
pub async fn collect_all<S: PagedSource>(source: &S) -> Result<Vec<S::Item>, GraphError> {
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let batch = source.list(cursor.as_deref()).await?;
        let decorated = join_all(batch.items.into_iter().map(|raw| async move {
            match source.decorate(raw.clone()).await {
                Ok(item) => item,
                Err(_) => source.fallback(raw),
            }
        }))
        .await;
        items.extend(decorated);

        match batch.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeSource {
        batches: Mutex<Vec<Batch<u32>>>,
        cursors_seen: Mutex<Vec<Option<String>>>,
        list_calls: AtomicUsize,
        fail_decorate_on: Option<u32>,
    }

    impl FakeSource {
        fn new(batches: Vec<Batch<u32>>) -> Self {
            Self {
                batches: Mutex::new(batches),
                cursors_seen: Mutex::new(Vec::new()),
                list_calls: AtomicUsize::new(0),
                fail_decorate_on: None,
            }
        }
    }

    #[async_trait]
    impl PagedSource for FakeSource {
        type Raw = u32;
        type Item = (u32, String);

        async fn list(&self, cursor: Option<&str>) -> Result<Batch<u32>, GraphError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            self.cursors_seen
                .lock()
                .unwrap()
                .push(cursor.map(str::to_owned));
            let mut batches = self.batches.lock().unwrap();
            if batches.is_empty() {
                return Err(GraphError::InvalidResponse(
                    "page listing without a data array".to_string(),
                ));
            }
            Ok(batches.remove(0))
        }

        async fn decorate(&self, raw: u32) -> Result<(u32, String), GraphError> {
            if self.fail_decorate_on == Some(raw) {
                return Err(GraphError::Rejected {
                    code: 100,
                    message: "lookup failed".to_string(),
                });
            }
            Ok((raw, format!("pic-{}", raw)))
        }

        fn fallback(&self, raw: u32) -> (u32, String) {
            (raw, String::new())
        }
    }

    fn batch(items: Vec<u32>, next: Option<&str>) -> Batch<u32> {
        Batch {
            items,
            next_cursor: next.map(str::to_owned),
        }
    }

    #[tokio::test]
    async fn concatenates_all_pages_in_cursor_order() {
        let source = FakeSource::new(vec![
            batch(vec![1, 2], Some("c1")),
            batch(vec![3, 4], Some("c2")),
            batch(vec![5], None),
        ]);

        let items = collect_all(&source).await.unwrap();

        let ids: Vec<u32> = items.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(source.list_calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            *source.cursors_seen.lock().unwrap(),
            vec![None, Some("c1".to_string()), Some("c2".to_string())]
        );
    }

    #[tokio::test]
    async fn empty_first_page_is_a_valid_result() {
        let source = FakeSource::new(vec![batch(vec![], None)]);

        let items = collect_all(&source).await.unwrap();

        assert!(items.is_empty());
        assert_eq!(source.list_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_decoration_degrades_only_that_item() {
        let mut source = FakeSource::new(vec![batch(vec![1, 2, 3], None)]);
        source.fail_decorate_on = Some(2);

        let items = collect_all(&source).await.unwrap();

        assert_eq!(
            items,
            vec![
                (1, "pic-1".to_string()),
                (2, String::new()),
                (3, "pic-3".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn failed_page_fetch_returns_no_partial_result() {
        // First page succeeds with a cursor, the follow-up fetch is
        // malformed; nothing accumulated so far may leak out.
        let source = FakeSource::new(vec![batch(vec![1, 2], Some("c1"))]);

        let err = collect_all(&source).await.unwrap_err();

        assert!(matches!(err, GraphError::InvalidResponse(_)));
        assert_eq!(source.list_calls.load(Ordering::SeqCst), 2);
    }
}
