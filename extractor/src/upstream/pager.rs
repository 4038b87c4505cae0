//! Page enumeration where the page count is only learned from responses.

use futures::stream::{self, TryStreamExt};
use std::future::Future;

/// One fetched page: its items and the page count reported with it.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_count: u32,
}

/// Fetch pages `1, 2, ...` while the page number is within the latest
/// reported page count, and fold all items into one Vec.
///
/// The first page is always requested. Each page is visited once, in order,
/// and the next request is only issued after the previous one completed.
pub async fn collect_pages<T, E, F, Fut>(mut fetch_page: F) -> Result<Vec<T>, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    // state: (next page, last known page count)
    let pages = stream::try_unfold((1u32, 1u32), move |(next, count)| {
        let pending = (next <= count).then(|| fetch_page(next));
        async move {
            match pending {
                None => Ok(None),
                Some(request) => request
                    .await
                    .map(|page| Some((page.items, (next + 1, page.page_count)))),
            }
        }
    });

    pages
        .try_fold(Vec::new(), |mut all, items| async move {
            all.extend(items);
            Ok::<_, E>(all)
        })
        .await
}
