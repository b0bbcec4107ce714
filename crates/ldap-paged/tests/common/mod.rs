//! Integration test helpers for ldap-paged.
//!
//! Provides an in-memory directory that pages its entries with opaque
//! cookies and records every handle release.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Once;

use ldap_paged::{
    Entry, PagedSearch, PagingError, PagingResult, ResultBatch, ResultHandle, ResultRelease,
    SearchRequest,
};

static INIT: Once = Once::new();

/// Initialize logging for tests (once).
pub fn init_test_logging() {
    INIT.call_once(|| {
        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::fmt()
                .with_test_writer()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .try_init()
                .ok();
        }
    });
}

/// Handle for one page served by [`FakeDirectory`].
#[derive(Debug, Clone)]
pub struct FakeHandle {
    pub page: usize,
    /// Cookie the server still holds state for.
    pending_cookie: Rc<RefCell<Option<Vec<u8>>>>,
    released: Rc<Cell<bool>>,
}

impl FakeHandle {
    pub fn has_pending_cookie(&self) -> bool {
        self.pending_cookie.borrow().is_some()
    }
}

impl ResultHandle for FakeHandle {
    fn is_result_handle(&self) -> bool {
        !self.released.get()
    }

    fn continued(&self) {
        self.pending_cookie.borrow_mut().take();
    }
}

/// What a release did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Release {
    /// Nothing left on the server; the handle was simply marked released.
    Local(usize),
    /// The server-side cookie for this page was abandoned.
    Abandoned(usize),
}

/// A directory that serves a fixed set of entries in pages.
#[derive(Debug, Default)]
pub struct FakeDirectory {
    entries: Vec<Entry>,
    /// Page number (1-based) whose fetch fails.
    fail_on_page: Option<usize>,
    pub requests: RefCell<Vec<Option<Vec<u8>>>>,
    pub releases: RefCell<Vec<Release>>,
    pub handles: RefCell<Vec<FakeHandle>>,
}

impl FakeDirectory {
    pub fn with_people(count: usize) -> Self {
        let entries = (1..=count)
            .map(|i| {
                Entry::new(format!("uid=user{i},ou=people,dc=example,dc=com"))
                    .with("uid", [format!("user{i}")])
                    .with("cn", [format!("User {i}")])
            })
            .collect();
        Self {
            entries,
            ..Default::default()
        }
    }

    pub fn failing_on_page(mut self, page: usize) -> Self {
        self.fail_on_page = Some(page);
        self
    }

    fn cookie_for(offset: usize) -> Vec<u8> {
        format!("offset:{offset}").into_bytes()
    }

    fn offset_from(cookie: &[u8]) -> PagingResult<usize> {
        std::str::from_utf8(cookie)
            .ok()
            .and_then(|s| s.strip_prefix("offset:"))
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| PagingError::InvalidData {
                message: "unrecognized cookie".to_string(),
            })
    }
}

impl ResultRelease for FakeDirectory {
    type Handle = FakeHandle;

    fn free_result(&self, handle: &FakeHandle) -> PagingResult<bool> {
        handle.released.set(true);
        let release = match handle.pending_cookie.borrow_mut().take() {
            Some(_) => Release::Abandoned(handle.page),
            None => Release::Local(handle.page),
        };
        self.releases.borrow_mut().push(release);
        Ok(true)
    }
}

impl PagedSearch for FakeDirectory {
    fn search_page(
        &self,
        request: &SearchRequest,
        cookie: Option<&[u8]>,
    ) -> PagingResult<ResultBatch<FakeHandle>> {
        self.requests.borrow_mut().push(cookie.map(<[u8]>::to_vec));
        let page = self.requests.borrow().len();

        if self.fail_on_page == Some(page) {
            return Err(PagingError::search_failed(format!("page {page} unavailable")));
        }

        let offset = cookie.map(Self::offset_from).transpose()?.unwrap_or(0);
        let end = (offset + request.page_size as usize).min(self.entries.len());
        let next_cookie = (end < self.entries.len()).then(|| Self::cookie_for(end));

        let handle = FakeHandle {
            page,
            pending_cookie: Rc::new(RefCell::new(next_cookie.clone())),
            released: Rc::new(Cell::new(false)),
        };
        self.handles.borrow_mut().push(handle.clone());

        let batch = ResultBatch::new(self.entries[offset..end].to_vec(), Some(handle));
        Ok(match next_cookie {
            Some(cookie) => batch.with_next_cookie(cookie),
            None => batch,
        })
    }
}
