//! # Paged LDAP Search Results
//!
//! Presents the pages of a paged LDAP search as a single collection of
//! directory entries, and owns the per-page result handles until they are
//! released.
//!
//! The LDAP protocol itself (connections, binds, the paging control) is the
//! business of a directory client implementing [`PagedSearch`]; see the
//! `ldap-paged-client` crate for one built on `ldap3`.
//!
//! ## Example
//!
//! ```ignore
//! use ldap_paged::prelude::*;
//!
//! let request = SearchRequest::new("ou=people,dc=example,dc=com")
//!     .with_filter("(objectClass=inetOrgPerson)")
//!     .with_page_size(500);
//!
//! let mut results = search_paginated(&client, &request)?;
//! println!("{} entries", results.count());
//!
//! for entry in results.sorted_by("cn") {
//!     println!("{}", entry.dn());
//! }
//!
//! results.close();
//! ```
//!
//! ## Crate Organization
//!
//! - [`entry`] - Directory entries and attribute values
//! - [`natural`] - Natural-order string comparison
//! - [`handle`] - Result handles, the release primitive and result pages
//! - [`iterator`] - The merged, sortable result collection
//! - [`search`] - Search requests and the page-collecting driver
//! - [`error`] - Error types

pub mod entry;
pub mod error;
pub mod handle;
pub mod iterator;
pub mod natural;
pub mod search;

pub use entry::{Attribute, AttributeNameTreatment, AttributeValue, Entry};
pub use error::{PagingError, PagingResult};
pub use handle::{ResultBatch, ResultHandle, ResultRelease};
pub use iterator::{Entries, PaginatedResultIterator, SortFunction};
pub use natural::{natural_case_cmp, natural_cmp};
pub use search::{search_paginated, PagedSearch, SearchRequest, SearchScope};

/// Prelude module for convenient imports.
///
/// ```
/// use ldap_paged::prelude::*;
/// ```
pub mod prelude {
    pub use crate::entry::{AttributeNameTreatment, AttributeValue, Entry};
    pub use crate::error::{PagingError, PagingResult};
    pub use crate::handle::{ResultBatch, ResultHandle, ResultRelease};
    pub use crate::iterator::PaginatedResultIterator;
    pub use crate::search::{search_paginated, PagedSearch, SearchRequest, SearchScope};
}
