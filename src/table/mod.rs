// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Open-addressed hash table keyed by interned strings.
//!
//! Used two ways by the VM: as the global-variable environment
//! (`name -> Value`) and as the string-intern set (`name -> Nil`, only
//! membership matters). Both share this implementation.
//!
//! Linear probing with tombstones. An entry is in one of three states:
//! *empty* (`key: None, value: Nil`), *tombstone* (`key: None,
//! value: Bool(true)`), or *occupied* (`key: Some(_)`). `count` tracks
//! occupied-plus-tombstone slots so a table full of tombstones still
//! triggers a resize instead of probing forever.

#[cfg(test)]
mod table_test;

use std::rc::Rc;

use crate::value::{Object, Value};

/// Grow when `count + 1` would exceed this fraction of capacity.
const MAX_LOAD_FACTOR: f64 = 0.75;

/// Minimum table capacity; also the first capacity a table grows into.
const MIN_CAPACITY: usize = 8;

#[derive(Clone)]
struct Entry {
    key: Option<Rc<Object>>,
    value: Value,
}

impl Entry {
    const fn empty() -> Self {
        Self {
            key: None,
            value: Value::Nil,
        }
    }

    fn is_tombstone(&self) -> bool {
        self.key.is_none() && matches!(self.value, Value::Bool(true))
    }
}

/// The hash attached to an interned-string key, read out of the object.
fn key_hash(key: &Rc<Object>) -> u32 {
    key.as_str().hash()
}

/// An open-addressed `interned string -> Value` map.
#[derive(Default)]
pub struct Table {
    entries: Vec<Entry>,
    /// Occupied slots plus tombstones; used for the load-factor check so
    /// tombstone-only tables still resize instead of probing forever.
    count: usize,
}

impl Table {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Insert or overwrite `key`. Returns `true` iff no prior occupied
    /// slot existed for this key (a genuinely new entry).
    pub fn set(&mut self, key: &Rc<Object>, value: Value) -> bool {
        if (self.count + 1) as f64 > self.capacity() as f64 * MAX_LOAD_FACTOR {
            self.grow();
        }

        let index = Self::find_entry(&self.entries, key);
        let entry = &mut self.entries[index];
        let is_new_key = entry.key.is_none();
        // Only a brand-new empty slot (not a recycled tombstone) grows `count`.
        if is_new_key && !entry.is_tombstone() {
            self.count += 1;
        }

        entry.key = Some(Rc::clone(key));
        entry.value = value;
        is_new_key
    }

    #[must_use]
    pub fn get(&self, key: &Rc<Object>) -> Option<&Value> {
        if self.entries.is_empty() {
            return None;
        }
        let index = Self::find_entry(&self.entries, key);
        self.entries[index].key.as_ref().map(|_| &self.entries[index].value)
    }

    /// Remove `key`, leaving a tombstone in its slot. Returns `false` if
    /// the key was not present.
    pub fn delete(&mut self, key: &Rc<Object>) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        let index = Self::find_entry(&self.entries, key);
        let entry = &mut self.entries[index];
        if entry.key.is_none() {
            return false;
        }
        entry.key = None;
        entry.value = Value::Bool(true);
        true
    }

    /// Copy every occupied entry of `self` into `dst`.
    pub fn add_all(&self, dst: &mut Self) {
        for entry in &self.entries {
            if let Some(key) = &entry.key {
                dst.set(key, entry.value.clone());
            }
        }
    }

    /// Content-based lookup used only by the string interner: find an
    /// existing string object whose bytes equal `chars`, without first
    /// having an `Rc<Object>` handle to compare against.
    #[must_use]
    pub fn find_string(&self, chars: &str, hash: u32) -> Option<Rc<Object>> {
        if self.entries.is_empty() {
            return None;
        }

        let capacity = self.entries.len();
        let mut index = (hash as usize) % capacity;
        loop {
            let entry = &self.entries[index];
            match &entry.key {
                None if !entry.is_tombstone() => return None,
                Some(key) => {
                    let s = key.as_str();
                    if s.hash() == hash && s.as_str() == chars {
                        return Some(Rc::clone(key));
                    }
                }
                None => {}
            }
            index = (index + 1) % capacity;
        }
    }

    fn capacity(&self) -> usize {
        self.entries.len()
    }

    fn grow(&mut self) {
        let old_capacity = self.entries.len();
        let new_capacity = if self.entries.is_empty() { MIN_CAPACITY } else { old_capacity * 2 };
        tracing::debug!(old_capacity, new_capacity, "table resized");

        let mut new_entries: Vec<Entry> = (0..new_capacity).map(|_| Entry::empty()).collect();
        let mut new_count = 0;
        for entry in &self.entries {
            if let Some(key) = &entry.key {
                let index = Self::find_entry(&new_entries, key);
                new_entries[index] = Entry {
                    key: Some(Rc::clone(key)),
                    value: entry.value.clone(),
                };
                new_count += 1;
            }
        }

        self.entries = new_entries;
        self.count = new_count;
    }

    /// Find the slot `key` occupies, or the slot it should be inserted
    /// into: the first tombstone seen, or else the terminating empty
    /// slot. `entries` must be non-empty.
    fn find_entry(entries: &[Entry], key: &Rc<Object>) -> usize {
        let capacity = entries.len();
        let hash = key_hash(key);
        let mut index = (hash as usize) % capacity;
        let mut tombstone: Option<usize> = None;

        loop {
            let entry = &entries[index];
            match &entry.key {
                Some(k) if Rc::ptr_eq(k, key) => return index,
                Some(_) => {}
                None if entry.is_tombstone() => {
                    if tombstone.is_none() {
                        tombstone = Some(index);
                    }
                }
                None => return tombstone.unwrap_or(index),
            }
            index = (index + 1) % capacity;
        }
    }
}
