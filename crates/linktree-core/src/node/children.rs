//! Ordered child record storage
//!
//! Records live in a slab arena and are chained through `prev`/`next` keys,
//! so unlinking is O(1) and insertion order is preserved. A name index is
//! built the first time the list grows past [`INDEX_THRESHOLD`] and kept up
//! to date from then on.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use slab::Slab;

use super::Info;

/// Child count past which lookups go through a hash index
pub const INDEX_THRESHOLD: usize = 7;

struct Entry {
    info: Info,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Default)]
pub(crate) struct ChildList {
    entries: Slab<Entry>,
    first: Option<usize>,
    last: Option<usize>,
    index: Option<FxHashMap<Arc<str>, usize>>,
}

impl ChildList {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        if let Some(index) = &self.index {
            return index.get(name).copied();
        }
        self.keys().find(|&key| self.entries[key].info.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Info> {
        self.find(name).map(|key| &self.entries[key].info)
    }

    /// Append a record, returning its key
    ///
    /// The caller guarantees the name is not already present.
    pub fn push_back(&mut self, info: Info) -> usize {
        let name = info.name_arc();
        let key = self.entries.insert(Entry {
            info,
            prev: self.last,
            next: None,
        });
        match self.last {
            Some(last) => self.entries[last].next = Some(key),
            None => self.first = Some(key),
        }
        self.last = Some(key);

        match &mut self.index {
            Some(index) => {
                index.insert(name, key);
            }
            None if self.entries.len() > INDEX_THRESHOLD => self.build_index(),
            None => {}
        }
        key
    }

    /// Remove the record at `key`, relinking its neighbours
    pub fn unlink(&mut self, key: usize) -> Option<Info> {
        let entry = self.entries.try_remove(key)?;
        match entry.prev {
            Some(prev) => self.entries[prev].next = entry.next,
            None => self.first = entry.next,
        }
        match entry.next {
            Some(next) => self.entries[next].prev = entry.prev,
            None => self.last = entry.prev,
        }
        if let Some(index) = &mut self.index {
            index.remove(entry.info.name());
        }
        Some(entry.info)
    }

    fn build_index(&mut self) {
        let index = self
            .keys()
            .map(|key| (self.entries[key].info.name_arc(), key))
            .collect();
        self.index = Some(index);
    }

    pub fn keys(&self) -> Keys<'_> {
        Keys {
            list: self,
            next: self.first,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Info> + '_ {
        self.keys().map(move |key| &self.entries[key].info)
    }

    /// Owned copy of the records in order, for iteration without the lock
    pub fn snapshot(&self) -> Vec<Info> {
        self.iter().cloned().collect()
    }
}

pub(crate) struct Keys<'a> {
    list: &'a ChildList,
    next: Option<usize>,
}

impl Iterator for Keys<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let key = self.next?;
        self.next = self.list.entries[key].next;
        Some(key)
    }
}
