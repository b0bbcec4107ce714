//! Directory client built on `ldap3`
//!
//! [`LdapDirectory`] runs paged searches over one shared synchronous
//! connection and releases page handles by abandoning any search whose
//! cookie was never spent.

use ldap3::{LdapConn, LdapConnSettings, Scope, SearchEntry};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use ldap_paged::{
    search_paginated, Entry, PagedSearch, PaginatedResultIterator, PagingError, PagingResult,
    ResultBatch, ResultRelease, SearchRequest, SearchScope,
};

use crate::config::LdapConfig;
use crate::controls::{next_cookie, paged_control};
use crate::handle::PageHandle;

/// Paged search client for one directory server.
///
/// Clones share the same connection. The connection is opened on first use
/// and stays open until [`unbind`](Self::unbind).
#[derive(Clone)]
pub struct LdapDirectory {
    config: Arc<LdapConfig>,
    conn: Arc<Mutex<Option<LdapConn>>>,
}

impl fmt::Debug for LdapDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LdapDirectory")
            .field("config", &self.config)
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl LdapDirectory {
    /// Create a client. Does not connect.
    pub fn new(config: LdapConfig) -> PagingResult<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            conn: Arc::new(Mutex::new(None)),
        })
    }

    pub fn config(&self) -> &LdapConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.conn.lock().is_some()
    }

    /// Open and bind the connection if it is not open yet.
    pub fn connect(&self) -> PagingResult<()> {
        let mut guard = self.conn.lock();
        if guard.is_none() {
            *guard = Some(self.open()?);
        }
        Ok(())
    }

    fn open(&self) -> PagingResult<LdapConn> {
        let url = self.config.url();
        debug!(url = %url, "Connecting to LDAP server");

        let settings = LdapConnSettings::new()
            .set_conn_timeout(self.config.connection.connection_timeout())
            .set_starttls(self.config.use_starttls)
            .set_no_tls_verify(!self.config.tls.verify_certificate);

        let mut ldap = LdapConn::with_settings(settings, &url).map_err(|e| {
            PagingError::connection_failed_with_source(
                format!("Failed to connect to LDAP server at {url}"),
                e,
            )
        })?;

        if let Some(bind_dn) = &self.config.bind_dn {
            let bind_password = self.config.bind_password.as_deref().unwrap_or("");
            debug!(bind_dn = %bind_dn, "Performing LDAP bind");

            let result = ldap.simple_bind(bind_dn, bind_password).map_err(|e| {
                PagingError::connection_failed_with_source(
                    format!("LDAP bind failed for {bind_dn}"),
                    e,
                )
            })?;

            if result.rc == 49 {
                return Err(PagingError::AuthenticationFailed);
            }
            if result.rc != 0 {
                return Err(PagingError::connection_failed(format!(
                    "LDAP bind failed with code {}: {}",
                    result.rc, result.text
                )));
            }
        }

        info!(host = %self.config.host, "LDAP connection established");
        Ok(ldap)
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&mut LdapConn) -> PagingResult<T>,
    ) -> PagingResult<T> {
        let mut guard = self.conn.lock();
        if guard.is_none() {
            *guard = Some(self.open()?);
        }
        match guard.as_mut() {
            Some(ldap) => f(ldap),
            None => Err(PagingError::connection_failed("LDAP connection unavailable")),
        }
    }

    /// Search below the configured base DN with the configured paging
    /// defaults.
    pub fn search(&self, filter: &str) -> PagingResult<PaginatedResultIterator<LdapDirectory>> {
        self.search_with(&self.config.search_request(filter))
    }

    /// Run `request` to completion and collect every page.
    pub fn search_with(
        &self,
        request: &SearchRequest,
    ) -> PagingResult<PaginatedResultIterator<LdapDirectory>> {
        search_paginated(self.clone(), request)
    }

    /// Close the connection.
    ///
    /// Searches still holding server-side state end with it, so releasing
    /// their handles afterwards has nothing to abandon.
    pub fn unbind(&self) -> PagingResult<()> {
        if let Some(mut ldap) = self.conn.lock().take() {
            if let Err(e) = ldap.unbind() {
                warn!(error = %e, "Error during LDAP unbind");
            }
            info!(host = %self.config.host, "LDAP connection closed");
        }
        Ok(())
    }
}

fn to_scope(scope: SearchScope) -> Scope {
    match scope {
        SearchScope::Base => Scope::Base,
        SearchScope::OneLevel => Scope::OneLevel,
        SearchScope::Subtree => Scope::Subtree,
    }
}

fn to_entry(entry: SearchEntry) -> Entry {
    let mut converted = Entry::new(entry.dn);
    for (name, values) in entry.attrs {
        converted.push_values(name, values);
    }
    for (name, values) in entry.bin_attrs {
        converted.push_values(name, values);
    }
    converted
}

impl ResultRelease for LdapDirectory {
    type Handle = PageHandle;

    #[instrument(skip(self, handle), fields(handle_id = %handle.id()))]
    fn free_result(&self, handle: &PageHandle) -> PagingResult<bool> {
        let (first, cookie) = handle.release();
        if !first {
            return Ok(false);
        }
        let Some(cookie) = cookie else {
            return Ok(true);
        };

        let mut guard = self.conn.lock();
        let Some(ldap) = guard.as_mut() else {
            debug!("Connection already closed, nothing to abandon");
            return Ok(true);
        };

        debug!(base_dn = %handle.base_dn(), "Abandoning unfinished paged search");
        ldap.with_timeout(self.config.connection.operation_timeout())
            .with_controls(vec![paged_control(0, Some(&cookie))])
            .search(
                handle.base_dn(),
                to_scope(handle.scope()),
                handle.filter(),
                vec!["1.1"],
            )
            .and_then(|result| result.success())
            .map(|_| true)
            .map_err(|e| {
                PagingError::release_failed_with_source(
                    format!("Failed to abandon paged search below {}", handle.base_dn()),
                    e,
                )
            })
    }
}

impl PagedSearch for LdapDirectory {
    fn search_page(
        &self,
        request: &SearchRequest,
        cookie: Option<&[u8]>,
    ) -> PagingResult<ResultBatch<PageHandle>> {
        let attributes: Vec<&str> = if request.attributes.is_empty() {
            vec!["*"]
        } else {
            request.attributes.iter().map(String::as_str).collect()
        };
        let timeout = self.config.connection.operation_timeout();

        let (results, result) = self.with_conn(|ldap| {
            ldap.with_timeout(timeout)
                .with_controls(vec![paged_control(request.page_size, cookie)])
                .search(
                    &request.base_dn,
                    to_scope(request.scope),
                    &request.filter,
                    attributes,
                )
                .and_then(|result| result.success())
                .map_err(|e| {
                    PagingError::search_failed_with_source(
                        format!("LDAP search failed below {}", request.base_dn),
                        e,
                    )
                })
        })?;

        let entries: Vec<Entry> = results
            .into_iter()
            .map(|entry| to_entry(SearchEntry::construct(entry)))
            .collect();
        let next = next_cookie(&result.ctrls);

        let handle = PageHandle::new(
            request.base_dn.as_str(),
            request.scope,
            request.filter.as_str(),
            next.clone(),
        );
        let batch = ResultBatch::new(entries, Some(handle));
        Ok(match next {
            Some(cookie) => batch.with_next_cookie(cookie),
            None => batch,
        })
    }
}
