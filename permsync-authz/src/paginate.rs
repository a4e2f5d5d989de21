// SPDX-License-Identifier: MIT OR Apache-2.0

use std::future::Future;

use permsync_directory::{DirectoryError, Page};
use tracing::trace;

/// Requests pages starting at 1 until the directory reports no further page, handing every
/// page's items to `on_page` as they arrive.
///
/// Items of pages before a failure have already been handed over when the error is returned.
pub(crate) async fn for_each_page<T, F, Fut>(
    mut fetch: F,
    mut on_page: impl FnMut(Vec<T>),
) -> Result<(), DirectoryError>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Page<T>, DirectoryError>>,
{
    let mut page = 1;
    loop {
        let Page {
            items,
            has_next_page,
        } = fetch(page).await?;
        trace!(page, items = items.len(), has_next_page, "received page");
        on_page(items);

        if !has_next_page {
            return Ok(());
        }
        page += 1;
    }
}
