//! # ldap3 Paged Search Client
//!
//! Runs RFC 2696 paged searches with `ldap3` and hands the pages to
//! [`ldap_paged::PaginatedResultIterator`].
//!
//! ## Example
//!
//! ```ignore
//! use ldap_paged_client::{LdapConfig, LdapDirectory};
//!
//! let config = LdapConfig::new("ldap.example.com", "ou=people,dc=example,dc=com")
//!     .with_credentials("cn=reader,dc=example,dc=com", "secret")
//!     .with_page_size(500);
//!
//! let directory = LdapDirectory::new(config)?;
//! let mut people = directory.search("(objectClass=inetOrgPerson)")?;
//! for entry in people.sorted_by("sn") {
//!     println!("{}", entry.dn());
//! }
//! people.close();
//! directory.unbind()?;
//! ```

pub mod config;
pub mod controls;
pub mod directory;
pub mod handle;

pub use config::{ConnectionSettings, LdapConfig, TlsSettings};
pub use directory::LdapDirectory;
pub use handle::PageHandle;
