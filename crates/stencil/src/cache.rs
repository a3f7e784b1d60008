//! Compilation cache.
//!
//! [`CompileCache`] keeps the most recently compiled templates, keyed by the
//! exact `(template, default_value)` pair. With the default capacity of one,
//! compiling the same template twice in a row returns the same shared
//! [`CompiledTemplate`], while any other template in between replaces it.
//!
//! Entries are immutable once installed; only the identifier list may be
//! attached later, through a write-once cell. The entry list sits behind a
//! mutex, so a cache can be shared between threads.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::compiler::{compile, CompiledTemplate};
use crate::error::TemplateError;

/// Number of entries a cache holds unless configured otherwise.
pub const DEFAULT_CAPACITY: usize = 1;

/// Most-recently-used cache of compiled templates.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use stencil::CompileCache;
///
/// let cache = CompileCache::default();
/// let first = cache.get_or_compile("hello, {name}", "", false).unwrap();
/// let second = cache.get_or_compile("hello, {name}", "", true).unwrap();
///
/// assert!(Arc::ptr_eq(&first, &second));
/// assert_eq!(first.identifiers(), Some(&["name".to_string()][..]));
/// ```
#[derive(Debug)]
pub struct CompileCache {
    capacity: usize,
    entries: Mutex<VecDeque<Arc<CompiledTemplate>>>,
}

impl CompileCache {
    /// Creates an empty cache holding at most `capacity` entries.
    ///
    /// A capacity of zero disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Returns the cached compilation of `(template, default_value)`, or
    /// compiles and installs it.
    ///
    /// On a hit with `extract_identifiers` set, identifiers missing from the
    /// entry are extracted and attached. A failed compilation leaves the
    /// cache untouched. The empty template is compiled fresh and never
    /// installed.
    pub fn get_or_compile(
        &self,
        template: &str,
        default_value: &str,
        extract_identifiers: bool,
    ) -> Result<Arc<CompiledTemplate>, TemplateError> {
        if template.is_empty() || self.capacity == 0 {
            return compile(template, default_value, extract_identifiers).map(Arc::new);
        }

        let mut entries = self.lock();

        let hit = entries
            .iter()
            .position(|entry| entry.template() == template && entry.default_value() == default_value);
        if let Some(entry) = hit.and_then(|index| entries.remove(index)) {
            if extract_identifiers {
                entry.ensure_identifiers();
            }
            entries.push_front(Arc::clone(&entry));
            tracing::trace!(template, "compile cache hit");
            return Ok(entry);
        }

        tracing::debug!(template, "compile cache miss");
        let compiled = Arc::new(compile(template, default_value, extract_identifiers)?);
        entries.push_front(Arc::clone(&compiled));
        while entries.len() > self.capacity {
            if let Some(evicted) = entries.pop_back() {
                tracing::trace!(template = evicted.template(), "compile cache evicted");
            }
        }
        Ok(compiled)
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Arc<CompiledTemplate>>> {
        // entries are never left half-written, so a poisoned lock is still usable
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for CompileCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
