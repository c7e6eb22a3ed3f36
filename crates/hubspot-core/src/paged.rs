//! Lazy iteration over server-paginated listings.
//!
//! A [`PagedCollection`] drives a fetch function one page at a time. The
//! offset handed to each call is exactly the `next_offset` the server returned
//! for the previous page; nothing is recomputed locally. Pages are fetched
//! only when the consumer asks for an item past the buffered page, so stopping
//! early (e.g. `take`, `find`) stops the requests too.

use std::fmt;

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::Result;
use crate::endpoint::QueryParams;
use crate::error::Error;

/// Page size used when an endpoint does not declare its own maximum.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// One page as normalized by a resource client.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T, O> {
    /// Items in this page, in server order.
    pub items: Vec<T>,
    /// Offset to pass when fetching the next page.
    pub next_offset: Option<O>,
    /// Whether the server reports further pages.
    pub has_more: bool,
}

impl<T, O> Page<T, O> {
    pub fn new(items: Vec<T>, next_offset: Option<O>, has_more: bool) -> Self {
        Self {
            items,
            next_offset,
            has_more,
        }
    }
}

/// Caller configuration for a paged listing.
///
/// `params` are passed unchanged to every fetch; resource clients merge them
/// into the query string or request options of the endpoint.
#[derive(Debug, Clone)]
pub struct PageConfig<O> {
    pub offset: Option<O>,
    pub limit: Option<u32>,
    pub max_pages: Option<usize>,
    pub params: QueryParams,
}

impl<O> Default for PageConfig<O> {
    fn default() -> Self {
        Self {
            offset: None,
            limit: None,
            max_pages: None,
            params: QueryParams::new(),
        }
    }
}

impl<O> PageConfig<O> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a known offset instead of the first page.
    pub fn offset(mut self, offset: O) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Requested page size.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Fail instead of fetching more than `max_pages` pages.
    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// Add a pass-through parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.append(key, value);
        self
    }
}

/// Fetch function: `(options, offset, limit) -> page`.
pub type FetchFn<'a, T, O> =
    Box<dyn FnMut(&QueryParams, Option<&O>, u32) -> Result<Page<T, O>> + 'a>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// No page fetched yet.
    Start,
    /// The last page reported more results.
    More,
    /// The server reported the end, or a fetch failed.
    Done,
}

/// A lazily fetched, single-pass sequence over a paginated endpoint.
///
/// Iterating yields `Result<T>`. A failed fetch is yielded once as `Err`, after
/// which the iterator is exhausted; items yielded before it stay valid. The
/// collection is not restartable and is meant to be owned by one consumer.
///
/// ```
/// use hubspot_core::paged::{Page, PageConfig, PagedCollection};
///
/// let pages = vec![
///     Page::new(vec!["a", "b"], Some(2), true),
///     Page::new(vec!["c"], Some(3), false),
/// ];
/// let mut pages = pages.into_iter();
/// let collection = PagedCollection::new(PageConfig::new().limit(2), 100, move |_, _, _| {
///     Ok(pages.next().unwrap())
/// });
/// assert_eq!(collection.all().unwrap(), vec!["a", "b", "c"]);
/// ```
pub struct PagedCollection<'a, T, O> {
    options: QueryParams,
    offset: Option<O>,
    limit: u32,
    max_pages: Option<usize>,
    pages_fetched: usize,
    state: State,
    buffer: std::vec::IntoIter<T>,
    fetch: FetchFn<'a, T, O>,
}

impl<'a, T, O> PagedCollection<'a, T, O>
where
    O: Clone + PartialEq + fmt::Debug,
{
    /// Create a collection over `fetch`.
    ///
    /// The page size is `config.limit` clamped to `1..=max_limit`, or
    /// `max_limit` when unset.
    pub fn new<F>(config: PageConfig<O>, max_limit: u32, fetch: F) -> Self
    where
        F: FnMut(&QueryParams, Option<&O>, u32) -> Result<Page<T, O>> + 'a,
    {
        let max_limit = max_limit.max(1);
        let limit = config.limit.unwrap_or(max_limit).clamp(1, max_limit);

        Self {
            options: config.params,
            offset: config.offset,
            limit,
            max_pages: config.max_pages,
            pages_fetched: 0,
            state: State::Start,
            buffer: Vec::new().into_iter(),
            fetch: Box::new(fetch),
        }
    }

    /// Page size requested on every fetch.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of fetch calls issued so far.
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Whether another fetch may still happen.
    pub fn has_more(&self) -> bool {
        self.state != State::Done
    }

    /// The offset the next fetch will receive.
    pub fn next_offset(&self) -> Option<&O> {
        self.offset.as_ref()
    }

    /// Return the rest of the buffered page, or fetch the next one.
    ///
    /// Returns `Ok(None)` once the server has reported the end.
    pub fn next_page(&mut self) -> Result<Option<Vec<T>>> {
        let buffered: Vec<T> = self.buffer.by_ref().collect();
        if !buffered.is_empty() {
            return Ok(Some(buffered));
        }

        if self.state == State::Done {
            return Ok(None);
        }

        match self.fetch_page() {
            Ok(items) => Ok(Some(items)),
            Err(e) => {
                self.state = State::Done;
                Err(e)
            }
        }
    }

    /// Drive the collection to the end and concatenate the pages.
    pub fn all(self) -> Result<Vec<T>> {
        self.collect()
    }

    fn fetch_page(&mut self) -> Result<Vec<T>> {
        if let Some(max_pages) = self.max_pages
            && self.pages_fetched >= max_pages
        {
            warn!(max_pages, "page limit reached with more results pending");
            return Err(Error::PageLimitExceeded { max_pages });
        }

        debug!(
            offset = ?self.offset,
            limit = self.limit,
            page = self.pages_fetched + 1,
            "fetching page"
        );

        let page = (self.fetch)(&self.options, self.offset.as_ref(), self.limit)?;
        self.pages_fetched += 1;

        trace!(
            items = page.items.len(),
            next_offset = ?page.next_offset,
            has_more = page.has_more,
            "page fetched"
        );

        if page.has_more && page.next_offset == self.offset {
            warn!(offset = ?self.offset, "server reported more pages without advancing the offset");
        }

        self.offset = page.next_offset;
        self.state = if page.has_more { State::More } else { State::Done };

        Ok(page.items)
    }
}

impl<T, O> Iterator for PagedCollection<'_, T, O>
where
    O: Clone + PartialEq + fmt::Debug,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.buffer.next() {
                return Some(Ok(item));
            }

            if self.state == State::Done {
                return None;
            }

            match self.fetch_page() {
                Ok(items) => self.buffer = items.into_iter(),
                Err(e) => {
                    self.state = State::Done;
                    return Some(Err(e));
                }
            }
        }
    }
}

impl<T, O: fmt::Debug> fmt::Debug for PagedCollection<'_, T, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagedCollection")
            .field("options", &self.options)
            .field("offset", &self.offset)
            .field("limit", &self.limit)
            .field("max_pages", &self.max_pages)
            .field("pages_fetched", &self.pages_fetched)
            .field("state", &self.state)
            .field("buffered", &self.buffer.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    type Call = (Option<u64>, u32);

    /// Replays scripted pages and records the `(offset, limit)` of every call.
    fn scripted<'a>(
        pages: Vec<Result<Page<u32, u64>>>,
        calls: &'a RefCell<Vec<Call>>,
    ) -> impl FnMut(&QueryParams, Option<&u64>, u32) -> Result<Page<u32, u64>> + 'a {
        let mut pages: VecDeque<_> = pages.into();
        move |_, offset, limit| {
            calls.borrow_mut().push((offset.copied(), limit));
            pages.pop_front().expect("fetched past the scripted pages")
        }
    }

    fn failure() -> Error {
        Error::Transport(TransportError::Connection {
            message: "connection reset".to_string(),
        })
    }

    #[test]
    fn all_concatenates_pages_in_order_and_stops() {
        let calls = RefCell::new(Vec::new());
        let collection = PagedCollection::new(
            PageConfig::new().limit(3),
            100,
            scripted(
                vec![
                    Ok(Page::new(vec![1, 2, 3], Some(3), true)),
                    Ok(Page::new(vec![4, 5, 6], Some(6), true)),
                    Ok(Page::new(vec![7], Some(7), false)),
                ],
                &calls,
            ),
        );

        assert_eq!(collection.all().unwrap(), vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(calls.borrow().len(), 3);
    }

    #[test]
    fn offsets_are_exactly_the_server_returned_values() {
        let calls = RefCell::new(Vec::new());
        let collection = PagedCollection::new(
            PageConfig::new().limit(2),
            100,
            scripted(
                vec![
                    Ok(Page::new(vec![1, 2], Some(9001), true)),
                    Ok(Page::new(vec![3, 4], Some(17), true)),
                    Ok(Page::new(vec![5], None, false)),
                ],
                &calls,
            ),
        );

        collection.all().unwrap();
        assert_eq!(
            *calls.borrow(),
            vec![(None, 2), (Some(9001), 2), (Some(17), 2)]
        );
    }

    #[test]
    fn starting_offset_is_passed_to_first_fetch() {
        let calls = RefCell::new(Vec::new());
        let collection = PagedCollection::new(
            PageConfig::new().offset(40),
            100,
            scripted(vec![Ok(Page::new(vec![1], Some(41), false))], &calls),
        );

        collection.all().unwrap();
        assert_eq!(*calls.borrow(), vec![(Some(40), 100)]);
    }

    #[test]
    fn empty_first_page_yields_nothing() {
        let calls = RefCell::new(Vec::new());
        let mut collection = PagedCollection::new(
            PageConfig::new(),
            100,
            scripted(vec![Ok(Page::new(vec![], None, false))], &calls),
        );

        assert!(collection.next().is_none());
        assert!(collection.next().is_none());
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn failure_after_first_page_keeps_yielded_items() {
        let calls = RefCell::new(Vec::new());
        let collection = PagedCollection::new(
            PageConfig::new(),
            100,
            scripted(
                vec![Ok(Page::new(vec![1, 2], Some(2), true)), Err(failure())],
                &calls,
            ),
        );

        let results: Vec<_> = collection.collect();
        assert_eq!(results.len(), 3);
        assert_eq!(*results[0].as_ref().unwrap(), 1);
        assert_eq!(*results[1].as_ref().unwrap(), 2);
        assert!(matches!(results[2], Err(Error::Transport(_))));
        assert_eq!(calls.borrow().len(), 2);
    }

    #[test]
    fn all_surfaces_the_failure() {
        let calls = RefCell::new(Vec::new());
        let collection = PagedCollection::new(
            PageConfig::new(),
            100,
            scripted(
                vec![Ok(Page::new(vec![1], Some(1), true)), Err(failure())],
                &calls,
            ),
        );

        assert!(matches!(collection.all(), Err(Error::Transport(_))));
    }

    #[test]
    fn early_termination_stops_fetching() {
        let calls = RefCell::new(Vec::new());
        let collection = PagedCollection::new(
            PageConfig::new(),
            100,
            scripted(
                vec![
                    Ok(Page::new(vec![1, 2, 3], Some(3), true)),
                    Ok(Page::new(vec![4, 5, 6], Some(6), true)),
                ],
                &calls,
            ),
        );

        let first_even = collection.map(|r| r.unwrap()).find(|n| n % 2 == 0);
        assert_eq!(first_even, Some(2));
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn unchanged_offset_still_advances_on_has_more() {
        let calls = RefCell::new(Vec::new());
        let collection = PagedCollection::new(
            PageConfig::new(),
            100,
            scripted(
                vec![
                    Ok(Page::new(vec![1], Some(5), true)),
                    Ok(Page::new(vec![2], Some(5), true)),
                    Ok(Page::new(vec![3], Some(5), false)),
                ],
                &calls,
            ),
        );

        assert_eq!(collection.all().unwrap(), vec![1, 2, 3]);
        assert_eq!(calls.borrow().len(), 3);
    }

    #[test]
    fn max_pages_stops_a_server_that_never_finishes() {
        let calls = RefCell::new(Vec::new());
        let collection = PagedCollection::new(
            PageConfig::new().max_pages(2),
            100,
            scripted(
                vec![
                    Ok(Page::new(vec![1], Some(1), true)),
                    Ok(Page::new(vec![2], Some(1), true)),
                    Ok(Page::new(vec![3], Some(1), true)),
                ],
                &calls,
            ),
        );

        let results: Vec<_> = collection.collect();
        assert_eq!(results.len(), 3);
        assert!(matches!(
            results[2],
            Err(Error::PageLimitExceeded { max_pages: 2 })
        ));
        assert_eq!(calls.borrow().len(), 2);
    }

    #[test]
    fn max_pages_is_not_an_error_when_the_server_finishes() {
        let calls = RefCell::new(Vec::new());
        let collection = PagedCollection::new(
            PageConfig::new().max_pages(1),
            100,
            scripted(vec![Ok(Page::new(vec![1], None, false))], &calls),
        );

        assert_eq!(collection.all().unwrap(), vec![1]);
    }

    #[test]
    fn limit_is_clamped_to_endpoint_maximum() {
        let calls = RefCell::new(Vec::new());
        let collection = PagedCollection::new(
            PageConfig::new().limit(500),
            250,
            scripted(vec![Ok(Page::new(vec![], None, false))], &calls),
        );
        assert_eq!(collection.limit(), 250);

        let zero = PagedCollection::new(
            PageConfig::new().limit(0),
            250,
            scripted(vec![], &calls),
        );
        assert_eq!(zero.limit(), 1);

        let unset = PagedCollection::new(PageConfig::new(), 250, scripted(vec![], &calls));
        assert_eq!(unset.limit(), 250);

        collection.all().unwrap();
        assert_eq!(*calls.borrow(), vec![(None, 250)]);
    }

    #[test]
    fn next_page_returns_pages_then_none() {
        let calls = RefCell::new(Vec::new());
        let mut collection = PagedCollection::new(
            PageConfig::new(),
            100,
            scripted(
                vec![
                    Ok(Page::new(vec![1, 2], Some(2), true)),
                    Ok(Page::new(vec![3], Some(3), false)),
                ],
                &calls,
            ),
        );

        assert_eq!(collection.next().unwrap().unwrap(), 1);
        assert_eq!(collection.next_page().unwrap(), Some(vec![2]));
        assert!(collection.has_more());
        assert_eq!(collection.next_offset(), Some(&2));
        assert_eq!(collection.next_page().unwrap(), Some(vec![3]));
        assert!(!collection.has_more());
        assert_eq!(collection.next_page().unwrap(), None);
        assert_eq!(collection.pages_fetched(), 2);
    }

    #[test]
    fn options_are_passed_through_unchanged() {
        let seen = RefCell::new(Vec::new());
        let mut remaining = 2;
        let collection = PagedCollection::new(
            PageConfig::<u64>::new().param("property", "email"),
            100,
            |options: &QueryParams, _: Option<&u64>, _| {
                seen.borrow_mut().push(options.clone());
                remaining -= 1;
                Ok(Page::new(vec![remaining], Some(1), remaining > 0))
            },
        );

        collection.all().unwrap();
        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert!(
            seen.iter()
                .all(|o| o.get("property") == Some(&Value::from("email")) && o.len() == 1)
        );
    }
}
