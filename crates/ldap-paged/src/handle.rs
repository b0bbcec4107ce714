//! Result handles and the release primitive
//!
//! A directory client hands out one handle per result page. The handle
//! stands for whatever state backs the page (client-library memory, a
//! server-side paging cookie) and must be given back through
//! [`ResultRelease::free_result`] exactly once.

use crate::entry::Entry;
use crate::error::PagingResult;

/// An opaque token for the resources behind one result page.
pub trait ResultHandle {
    /// Whether this is a valid, still-open result handle.
    ///
    /// Handles that fail this check are skipped when results are closed.
    fn is_result_handle(&self) -> bool;

    /// Called once the page's continuation cookie has been spent on the
    /// request for the next page.
    fn continued(&self) {}
}

/// Releases result handles.
pub trait ResultRelease {
    /// The handle type this releaser understands.
    type Handle: ResultHandle;

    /// Release the resources behind a handle.
    ///
    /// `Ok(false)` means the release was attempted and refused; `Err` means it
    /// could not be attempted. Callers closing many handles treat both as a
    /// failed release and carry on.
    fn free_result(&self, handle: &Self::Handle) -> PagingResult<bool>;
}

impl<R: ResultRelease + ?Sized> ResultRelease for &R {
    type Handle = R::Handle;

    fn free_result(&self, handle: &Self::Handle) -> PagingResult<bool> {
        (**self).free_result(handle)
    }
}

/// One page of search results.
#[derive(Debug, Clone)]
pub struct ResultBatch<H> {
    /// Entries in server order.
    pub entries: Vec<Entry>,
    /// Resources backing the page, if the client kept any.
    pub handle: Option<H>,
    /// Continuation cookie for the next page.
    pub next_cookie: Option<Vec<u8>>,
}

impl<H> ResultBatch<H> {
    /// Create a batch with no continuation.
    pub fn new(entries: Vec<Entry>, handle: Option<H>) -> Self {
        Self {
            entries,
            handle,
            next_cookie: None,
        }
    }

    /// Set the continuation cookie. Empty cookies mean "no more pages".
    pub fn with_next_cookie(mut self, cookie: impl Into<Vec<u8>>) -> Self {
        let cookie = cookie.into();
        self.next_cookie = (!cookie.is_empty()).then_some(cookie);
        self
    }

    /// Whether the server has more pages.
    pub fn has_more(&self) -> bool {
        self.next_cookie.is_some()
    }

    /// Number of entries in this page.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if this page is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
