//! Integration tests for collecting paged search results.
//!
//! These run the page-collecting driver against an in-memory directory,
//! covering cookie hand-off, page limits, partial failures and handle
//! release.

mod common;

use common::{init_test_logging, FakeDirectory, Release};
use ldap_paged::prelude::*;
use ldap_paged::natural_case_cmp;

fn request(page_size: u32) -> SearchRequest {
    SearchRequest::new("ou=people,dc=example,dc=com")
        .with_filter("(objectClass=inetOrgPerson)")
        .with_page_size(page_size)
}

// =============================================================================
// Collecting pages
// =============================================================================

#[test]
fn test_collects_all_pages_in_order() {
    init_test_logging();
    let directory = FakeDirectory::with_people(7);

    let results = search_paginated(&directory, &request(3)).unwrap();

    assert_eq!(results.count(), 7);
    assert_eq!(results.open_handles(), 3);
    let uids: Vec<&str> = results.iter().filter_map(|e| e.first_text("uid")).collect();
    assert_eq!(
        uids,
        vec!["user1", "user2", "user3", "user4", "user5", "user6", "user7"]
    );

    let requests = directory.requests.borrow();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0], None);
    assert_eq!(requests[1].as_deref(), Some(b"offset:3".as_slice()));
    assert_eq!(requests[2].as_deref(), Some(b"offset:6".as_slice()));
}

#[test]
fn test_single_page_result() {
    init_test_logging();
    let directory = FakeDirectory::with_people(2);

    let results = search_paginated(&directory, &request(10)).unwrap();

    assert_eq!(results.count(), 2);
    assert_eq!(directory.requests.borrow().len(), 1);
}

#[test]
fn test_empty_directory_yields_empty_results() {
    init_test_logging();
    let directory = FakeDirectory::with_people(0);

    let mut results = search_paginated(&directory, &request(10)).unwrap();

    assert_eq!(results.count(), 0);
    assert!(results.iter().next().is_none());
    assert!(results.close());
    assert_eq!(*directory.releases.borrow(), vec![Release::Local(1)]);
}

#[test]
fn test_zero_page_size_is_rejected() {
    init_test_logging();
    let directory = FakeDirectory::with_people(3);

    let err = search_paginated(&directory, &request(0)).unwrap_err();

    assert_eq!(err.error_code(), "INVALID_INPUT");
    assert!(directory.requests.borrow().is_empty());
}

// =============================================================================
// Releasing handles
// =============================================================================

#[test]
fn test_spent_cookies_are_not_abandoned() {
    init_test_logging();
    let directory = FakeDirectory::with_people(5);

    let mut results = search_paginated(&directory, &request(2)).unwrap();
    assert!(directory
        .handles
        .borrow()
        .iter()
        .all(|h| !h.has_pending_cookie()));

    assert!(results.close());
    assert_eq!(
        *directory.releases.borrow(),
        vec![Release::Local(1), Release::Local(2), Release::Local(3)]
    );
}

#[test]
fn test_page_limit_abandons_outstanding_cookie() {
    init_test_logging();
    let directory = FakeDirectory::with_people(10);

    let mut results = search_paginated(&directory, &request(3).with_max_pages(2)).unwrap();

    assert_eq!(results.count(), 6);
    assert!(results.close());
    assert_eq!(
        *directory.releases.borrow(),
        vec![Release::Local(1), Release::Abandoned(2)]
    );
}

#[test]
fn test_failed_page_releases_fetched_pages() {
    init_test_logging();
    let directory = FakeDirectory::with_people(10).failing_on_page(3);

    let err = search_paginated(&directory, &request(3)).unwrap_err();

    assert!(err.is_transient());
    assert_eq!(
        *directory.releases.borrow(),
        vec![Release::Local(1), Release::Abandoned(2)]
    );
}

#[test]
fn test_drop_releases_every_page() {
    init_test_logging();
    let directory = FakeDirectory::with_people(4);

    {
        let results = search_paginated(&directory, &request(2)).unwrap();
        assert_eq!(results.count(), 4);
    }

    assert_eq!(directory.releases.borrow().len(), 2);
}

#[test]
fn test_close_is_idempotent_across_pages() {
    init_test_logging();
    let directory = FakeDirectory::with_people(4);

    let mut results = search_paginated(&directory, &request(2)).unwrap();

    assert!(results.close());
    assert!(!results.close());
    drop(results);
    assert_eq!(directory.releases.borrow().len(), 2);
}

// =============================================================================
// Reading results
// =============================================================================

#[test]
fn test_sorting_spans_pages() {
    init_test_logging();
    let directory = FakeDirectory::with_people(12);

    let results = search_paginated(&directory, &request(5)).unwrap();

    let sorted: Vec<&str> = results
        .sorted_by("uid")
        .filter_map(|e| e.first_text("uid"))
        .collect();
    assert_eq!(sorted.first(), Some(&"user1"));
    assert_eq!(sorted.get(8), Some(&"user9"));
    assert_eq!(sorted.get(9), Some(&"user10"));
    assert_eq!(sorted.last(), Some(&"user12"));
}

#[test]
fn test_custom_sort_function() {
    init_test_logging();
    let directory = FakeDirectory::with_people(3);

    let mut results = search_paginated(&directory, &request(2)).unwrap();
    results.set_sort_function(|a, b| natural_case_cmp(a, b).reverse());
    results.sort("uid");

    assert_eq!(results.first().and_then(|e| e.first_text("uid")), Some("user3"));
    assert_eq!(results.key(), Some("uid=user3,ou=people,dc=example,dc=com"));
    assert_eq!(results.count(), 3);
}

#[test]
fn test_cursor_walk_after_close() {
    init_test_logging();
    let directory = FakeDirectory::with_people(3);

    let mut results = search_paginated(&directory, &request(2)).unwrap();
    results.close();
    assert!(!results.valid());

    results.rewind();
    let mut seen = 0;
    while results.valid() {
        seen += 1;
        results.next_entry();
    }
    assert_eq!(seen, 3);
}
