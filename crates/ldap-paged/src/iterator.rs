//! Paginated search results
//!
//! [`PaginatedResultIterator`] presents every page of a paged search as one
//! in-memory sequence of entries while owning the handles of all pages.
//! Walking the entries never touches the handles; they are released by
//! [`close`](PaginatedResultIterator::close) or, at the latest, on drop.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, warn};

use crate::entry::{AttributeNameTreatment, AttributeValue, Entry};
use crate::error::{PagingError, PagingResult};
use crate::handle::{ResultBatch, ResultHandle, ResultRelease};
use crate::natural::natural_case_cmp;

/// Comparator applied to sort keys.
pub type SortFunction = Box<dyn Fn(&str, &str) -> Ordering + Send + Sync>;

/// The merged results of a paged search.
///
/// The entry count is fixed at construction. Handles are released at most
/// once: `close` drains them, so closing again (or dropping afterwards) does
/// nothing.
pub struct PaginatedResultIterator<R: ResultRelease> {
    entries: Vec<Entry>,
    handles: Vec<Option<R::Handle>>,
    releaser: R,
    item_count: usize,
    sort_function: SortFunction,
    attribute_name_treatment: AttributeNameTreatment,
    position: usize,
    current: Option<usize>,
    closed: bool,
}

impl<R: ResultRelease> PaginatedResultIterator<R> {
    /// Create an iterator over already fetched entries.
    ///
    /// `entries` of `None` is a caller bug and fails with
    /// [`PagingError::InvalidInput`]; an empty vector is a search that matched
    /// nothing. `handles` may contain `None` for pages whose resources were
    /// already freed by the client.
    pub fn new(
        entries: Option<Vec<Entry>>,
        handles: Vec<Option<R::Handle>>,
        releaser: R,
    ) -> PagingResult<Self> {
        let entries = entries.ok_or_else(|| PagingError::invalid_input("No entries given"))?;
        let item_count = entries.len();

        debug!(
            item_count,
            handle_count = handles.len(),
            "Created paginated result iterator"
        );

        Ok(Self {
            entries,
            handles,
            releaser,
            item_count,
            sort_function: Box::new(natural_case_cmp),
            attribute_name_treatment: AttributeNameTreatment::default(),
            position: 0,
            current: (item_count > 0).then_some(0),
            closed: false,
        })
    }

    /// Create an iterator from result pages, in arrival order.
    pub fn from_batches(batches: Vec<ResultBatch<R::Handle>>, releaser: R) -> PagingResult<Self> {
        let mut entries = Vec::with_capacity(batches.iter().map(ResultBatch::len).sum());
        let mut handles = Vec::with_capacity(batches.len());

        for batch in batches {
            entries.extend(batch.entries);
            handles.push(batch.handle);
        }

        Self::new(Some(entries), handles, releaser)
    }

    /// Number of entries across all pages.
    pub fn count(&self) -> usize {
        self.item_count
    }

    /// Check if the search matched nothing.
    pub fn is_empty(&self) -> bool {
        self.item_count == 0
    }

    /// Whether [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of handles still waiting to be released (including null slots).
    pub fn open_handles(&self) -> usize {
        self.handles.len()
    }

    /// All entries in their current order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// The first entry, if any.
    pub fn first(&self) -> Option<&Entry> {
        self.entries.first()
    }

    /// Replace the comparator used by [`sorted`](Self::sorted),
    /// [`sorted_by`](Self::sorted_by) and [`sort`](Self::sort).
    pub fn set_sort_function<F>(&mut self, sort_function: F)
    where
        F: Fn(&str, &str) -> Ordering + Send + Sync + 'static,
    {
        self.sort_function = Box::new(sort_function);
    }

    /// How attribute names are presented by [`current_attributes`](Self::current_attributes).
    pub fn attribute_name_treatment(&self) -> AttributeNameTreatment {
        self.attribute_name_treatment
    }

    /// Set how attribute names are presented.
    pub fn set_attribute_name_treatment(&mut self, treatment: AttributeNameTreatment) {
        self.attribute_name_treatment = treatment;
    }

    /// Iterate over entries in their current order.
    pub fn iter(&self) -> Entries<'_> {
        Entries::new(&self.entries, None)
    }

    /// Iterate over entries ordered by DN.
    pub fn sorted(&self) -> Entries<'_> {
        self.sorted_by("dn")
    }

    /// Iterate over entries ordered by the first value of `attribute`.
    ///
    /// The sort is stable. The stored order is left untouched.
    pub fn sorted_by(&self, attribute: &str) -> Entries<'_> {
        let keys: Vec<_> = self.entries.iter().map(|e| e.sort_key(attribute)).collect();
        let mut order: Vec<usize> = (0..self.entries.len()).collect();
        order.sort_by(|&a, &b| (self.sort_function)(keys[a].as_ref(), keys[b].as_ref()));

        Entries::new(&self.entries, Some(order))
    }

    /// Reorder the stored entries by the first value of `attribute` and rewind.
    pub fn sort(&mut self, attribute: &str) {
        let compare = &self.sort_function;
        let mut keyed: Vec<(String, Entry)> = std::mem::take(&mut self.entries)
            .into_iter()
            .map(|e| (e.sort_key(attribute).into_owned(), e))
            .collect();
        keyed.sort_by(|a, b| compare(a.0.as_str(), b.0.as_str()));

        self.entries = keyed.into_iter().map(|(_, e)| e).collect();
        self.rewind();
    }

    /// Move the cursor back to the first entry. Handles are not affected.
    pub fn rewind(&mut self) {
        self.position = 0;
        self.current = (self.position < self.entries.len()).then_some(self.position);
    }

    /// Whether the cursor points at an entry.
    pub fn valid(&self) -> bool {
        self.current.is_some()
    }

    /// The entry under the cursor.
    pub fn current(&self) -> Option<&Entry> {
        self.current.and_then(|i| self.entries.get(i))
    }

    /// The DN of the entry under the cursor.
    pub fn key(&self) -> Option<&str> {
        self.current().map(Entry::dn)
    }

    /// Advance the cursor and return the new current entry.
    pub fn next_entry(&mut self) -> Option<&Entry> {
        if self.position < self.entries.len() {
            self.position += 1;
        }
        self.current = (self.position < self.entries.len()).then_some(self.position);
        self.current()
    }

    /// The entry under the cursor as a map, using the configured name treatment.
    pub fn current_attributes(&self) -> Option<BTreeMap<String, Vec<AttributeValue>>> {
        self.current().map(|e| e.to_map(self.attribute_name_treatment))
    }

    /// Release every open result handle.
    ///
    /// Handles that are null or no longer valid are skipped. A failed release
    /// is logged and does not stop the remaining ones. The return value is the
    /// outcome of the last release attempted; `false` when there was nothing
    /// to release. Afterwards no handles remain and there is no current entry.
    pub fn close(&mut self) -> bool {
        let mut is_closed = false;
        let mut attempted = 0usize;
        let mut skipped = 0usize;

        for handle in std::mem::take(&mut self.handles) {
            let Some(handle) = handle else {
                skipped += 1;
                continue;
            };
            if !handle.is_result_handle() {
                debug!("Skipping handle that is not an open result handle");
                skipped += 1;
                continue;
            }

            attempted += 1;
            is_closed = match self.releaser.free_result(&handle) {
                Ok(true) => true,
                Ok(false) => {
                    warn!("Result handle release was refused");
                    false
                }
                Err(e) => {
                    warn!(error = %e, code = e.error_code(), "Failed to release result handle");
                    false
                }
            };
        }

        self.position = self.entries.len();
        self.current = None;
        self.closed = true;

        debug!(attempted, skipped, is_closed, "Closed paginated results");
        is_closed
    }

    /// Close and return the entries.
    pub fn into_entries(mut self) -> Vec<Entry> {
        self.close();
        std::mem::take(&mut self.entries)
    }
}

impl<R: ResultRelease> Drop for PaginatedResultIterator<R> {
    fn drop(&mut self) {
        if !self.handles.is_empty() {
            self.close();
        }
    }
}

impl<R: ResultRelease> fmt::Debug for PaginatedResultIterator<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaginatedResultIterator")
            .field("item_count", &self.item_count)
            .field("open_handles", &self.handles.len())
            .field("closed", &self.closed)
            .field("position", &self.position)
            .field("attribute_name_treatment", &self.attribute_name_treatment)
            .finish()
    }
}

impl<'a, R: ResultRelease> IntoIterator for &'a PaginatedResultIterator<R> {
    type Item = &'a Entry;
    type IntoIter = Entries<'a>;

    fn into_iter(self) -> Entries<'a> {
        self.iter()
    }
}

/// Lazy traversal over the entries of a [`PaginatedResultIterator`].
#[derive(Debug, Clone)]
pub struct Entries<'a> {
    entries: &'a [Entry],
    order: Option<Vec<usize>>,
    next: usize,
}

impl<'a> Entries<'a> {
    fn new(entries: &'a [Entry], order: Option<Vec<usize>>) -> Self {
        Self {
            entries,
            order,
            next: 0,
        }
    }
}

impl<'a> Iterator for Entries<'a> {
    type Item = &'a Entry;

    fn next(&mut self) -> Option<&'a Entry> {
        let index = match &self.order {
            Some(order) => *order.get(self.next)?,
            None => self.next,
        };
        let entry = self.entries.get(index)?;
        self.next += 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.entries.len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Entries<'_> {}
