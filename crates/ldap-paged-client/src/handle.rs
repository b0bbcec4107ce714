//! Per-page result handles

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use ldap_paged::{ResultHandle, SearchScope};

/// Handle for one page of a paged search run by
/// [`LdapDirectory`](crate::LdapDirectory).
///
/// Holds the cookie the server returned with this page for as long as it has
/// not been used to fetch the next page. Releasing the handle while the
/// cookie is still pending abandons the search on the server.
#[derive(Debug, Clone)]
pub struct PageHandle {
    id: Uuid,
    base_dn: String,
    scope: SearchScope,
    filter: String,
    pending_cookie: Arc<Mutex<Option<Vec<u8>>>>,
    released: Arc<AtomicBool>,
}

impl PageHandle {
    pub(crate) fn new(
        base_dn: impl Into<String>,
        scope: SearchScope,
        filter: impl Into<String>,
        next_cookie: Option<Vec<u8>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            base_dn: base_dn.into(),
            scope,
            filter: filter.into(),
            pending_cookie: Arc::new(Mutex::new(next_cookie)),
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn base_dn(&self) -> &str {
        &self.base_dn
    }

    pub fn scope(&self) -> SearchScope {
        self.scope
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Whether the server still holds search state for this page's cookie.
    pub fn has_pending_cookie(&self) -> bool {
        self.pending_cookie.lock().is_some()
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Mark the handle released and hand back any cookie still pending.
    ///
    /// Returns `None` for the cookie on every call after the first.
    pub(crate) fn release(&self) -> (bool, Option<Vec<u8>>) {
        let first = !self.released.swap(true, Ordering::AcqRel);
        let cookie = if first {
            self.pending_cookie.lock().take()
        } else {
            None
        };
        (first, cookie)
    }
}

impl ResultHandle for PageHandle {
    fn is_result_handle(&self) -> bool {
        !self.is_released()
    }

    fn continued(&self) {
        self.pending_cookie.lock().take();
    }
}
