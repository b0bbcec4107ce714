//! Paged search requests and the page-collecting driver
//!
//! [`PagedSearch`] is the seam to the directory client: it runs one paged
//! search request and hands back a [`ResultBatch`]. [`search_paginated`]
//! keeps asking for pages until the server stops returning a cookie and
//! wraps everything in a [`PaginatedResultIterator`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};

use crate::error::{PagingError, PagingResult};
use crate::handle::{ResultBatch, ResultHandle, ResultRelease};
use crate::iterator::PaginatedResultIterator;

/// Search scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    /// Only the base object.
    Base,
    /// Immediate children of the base object.
    OneLevel,
    /// The base object and its whole subtree.
    #[default]
    Subtree,
}

impl FromStr for SearchScope {
    type Err = PagingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "base" => Ok(SearchScope::Base),
            "one" | "onelevel" | "one_level" => Ok(SearchScope::OneLevel),
            "sub" | "subtree" => Ok(SearchScope::Subtree),
            other => Err(PagingError::invalid_input(format!(
                "unknown search scope '{other}'"
            ))),
        }
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SearchScope::Base => "base",
            SearchScope::OneLevel => "onelevel",
            SearchScope::Subtree => "subtree",
        };
        f.write_str(s)
    }
}

fn default_filter() -> String {
    "(objectClass=*)".to_string()
}

fn default_page_size() -> u32 {
    1000
}

/// A paged search request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Base DN of the search.
    pub base_dn: String,

    /// LDAP filter string.
    #[serde(default = "default_filter")]
    pub filter: String,

    /// Search scope.
    #[serde(default)]
    pub scope: SearchScope,

    /// Attributes to return; empty means all user attributes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<String>,

    /// Entries per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Stop after this many pages even if the server has more.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<u32>,
}

impl SearchRequest {
    /// Create a subtree search for all objects below `base_dn`.
    pub fn new(base_dn: impl Into<String>) -> Self {
        Self {
            base_dn: base_dn.into(),
            filter: default_filter(),
            scope: SearchScope::default(),
            attributes: Vec::new(),
            page_size: default_page_size(),
            max_pages: None,
        }
    }

    /// Set the filter.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Set the scope.
    #[must_use]
    pub fn with_scope(mut self, scope: SearchScope) -> Self {
        self.scope = scope;
        self
    }

    /// Set the attributes to return.
    #[must_use]
    pub fn with_attributes<S: Into<String>>(
        mut self,
        attributes: impl IntoIterator<Item = S>,
    ) -> Self {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    /// Set the page size.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Limit the number of pages fetched.
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// Validate the request.
    pub fn validate(&self) -> PagingResult<()> {
        if self.page_size == 0 {
            return Err(PagingError::invalid_input("page_size must be greater than 0"));
        }
        if self.max_pages == Some(0) {
            return Err(PagingError::invalid_input("max_pages must be greater than 0"));
        }
        if self.filter.trim().is_empty() {
            return Err(PagingError::invalid_input("filter is required"));
        }
        Ok(())
    }
}

/// A directory client that can run one page of a paged search.
pub trait PagedSearch: ResultRelease {
    /// Fetch one page.
    ///
    /// `cookie` is `None` for the first page and the previous page's
    /// `next_cookie` afterwards.
    fn search_page(
        &self,
        request: &SearchRequest,
        cookie: Option<&[u8]>,
    ) -> PagingResult<ResultBatch<Self::Handle>>;
}

impl<P: PagedSearch + ?Sized> PagedSearch for &P {
    fn search_page(
        &self,
        request: &SearchRequest,
        cookie: Option<&[u8]>,
    ) -> PagingResult<ResultBatch<Self::Handle>> {
        (**self).search_page(request, cookie)
    }
}

/// Run a paged search to completion and collect every page.
///
/// Pages are fetched until the server returns no cookie or
/// `request.max_pages` is reached. If a page fails, the handles of the pages
/// already fetched are released before the error is returned.
#[instrument(skip(client, request), fields(base_dn = %request.base_dn, filter = %request.filter))]
pub fn search_paginated<C>(
    client: C,
    request: &SearchRequest,
) -> PagingResult<PaginatedResultIterator<C>>
where
    C: PagedSearch,
{
    request.validate()?;

    let mut entries = Vec::new();
    let mut handles: Vec<Option<C::Handle>> = Vec::new();
    let mut cookie: Option<Vec<u8>> = None;
    let mut pages = 0u32;

    loop {
        let batch = match client.search_page(request, cookie.as_deref()) {
            Ok(batch) => batch,
            Err(e) => {
                warn!(error = %e, pages, "Paged search failed, releasing fetched pages");
                // The last handle's cookie went out with the failed request, so
                // the server may refuse to abandon it.
                let mut partial = PaginatedResultIterator::new(Some(Vec::new()), handles, client)?;
                partial.close();
                return Err(e);
            }
        };
        pages += 1;

        // The previous page's cookie was just spent.
        if cookie.is_some() {
            if let Some(Some(previous)) = handles.last() {
                previous.continued();
            }
        }

        debug!(page = pages, entries = batch.len(), has_more = batch.has_more(), "Fetched page");

        entries.extend(batch.entries);
        handles.push(batch.handle);
        cookie = batch.next_cookie;

        if cookie.is_none() {
            break;
        }
        if request.max_pages.is_some_and(|max| pages >= max) {
            debug!(pages, "Reached page limit with results remaining");
            break;
        }
    }

    info!(pages, total = entries.len(), "Paged search completed");

    PaginatedResultIterator::new(Some(entries), handles, client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_parsing() {
        assert_eq!("base".parse::<SearchScope>().unwrap(), SearchScope::Base);
        assert_eq!("ONE".parse::<SearchScope>().unwrap(), SearchScope::OneLevel);
        assert_eq!("subtree".parse::<SearchScope>().unwrap(), SearchScope::Subtree);
        assert!("children".parse::<SearchScope>().is_err());
        assert_eq!(SearchScope::OneLevel.to_string(), "onelevel");
    }

    #[test]
    fn test_request_builder() {
        let request = SearchRequest::new("ou=people,dc=example,dc=com")
            .with_filter("(objectClass=inetOrgPerson)")
            .with_scope(SearchScope::OneLevel)
            .with_attributes(["cn", "mail"])
            .with_page_size(50)
            .with_max_pages(3);

        assert_eq!(request.attributes, vec!["cn", "mail"]);
        assert_eq!(request.page_size, 50);
        assert_eq!(request.max_pages, Some(3));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_request_validation() {
        let base = SearchRequest::new("dc=example,dc=com");
        assert!(base.clone().with_page_size(0).validate().is_err());
        assert!(base.clone().with_max_pages(0).validate().is_err());
        assert!(base.with_filter("  ").validate().is_err());
    }

    #[test]
    fn test_request_deserialization_defaults() {
        let request: SearchRequest =
            serde_json::from_str(r#"{"base_dn": "dc=example,dc=com"}"#).unwrap();
        assert_eq!(request.filter, "(objectClass=*)");
        assert_eq!(request.scope, SearchScope::Subtree);
        assert_eq!(request.page_size, 1000);
        assert_eq!(request.max_pages, None);
    }
}
