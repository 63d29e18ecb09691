//! Tag interning.
//!
//! Tag strings are interned once while packages are resolved. Everything
//! downstream compares [`TagId`] handles instead of strings.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Interned handle for a tag string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TagId(u32);

impl TagId {
    /// Raw index into the owning [`TagTable`].
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Errors raised when a tag string is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TagError {
    /// Tag was empty or only whitespace.
    #[error("tag must not be empty or whitespace")]
    Blank,
}

/// Owns every tag string seen in a run.
#[derive(Debug, Clone, Default)]
pub struct TagTable {
    names: Vec<String>,
    ids: HashMap<String, TagId>,
}

impl TagTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a tag, returning the existing handle if already known.
    ///
    /// Surrounding whitespace is not significant.
    ///
    /// # Errors
    ///
    /// Returns [`TagError::Blank`] for empty or whitespace-only tags.
    pub fn intern(&mut self, raw: &str) -> Result<TagId, TagError> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(TagError::Blank);
        }
        if let Some(id) = self.ids.get(name) {
            return Ok(*id);
        }
        let id = TagId(u32::try_from(self.names.len()).unwrap_or(u32::MAX));
        self.names.push(name.to_string());
        self.ids.insert(name.to_string(), id);
        Ok(id)
    }

    /// Looks up an already-interned tag.
    #[must_use]
    pub fn get(&self, raw: &str) -> Option<TagId> {
        self.ids.get(raw.trim()).copied()
    }

    /// Returns the string for a handle.
    ///
    /// Handles from another table yield `"?"`.
    #[must_use]
    pub fn name(&self, id: TagId) -> &str {
        self.names.get(id.index()).map_or("?", String::as_str)
    }

    /// Number of distinct tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if no tag has been interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Renders a set as `[a, b]` with names in alphabetical order.
    #[must_use]
    pub fn display(&self, set: &TagSet) -> String {
        let mut names: Vec<&str> = set.iter().map(|id| self.name(id)).collect();
        names.sort_unstable();
        format!("[{}]", names.join(", "))
    }
}

/// A sorted, deduplicated set of tag handles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct TagSet(Vec<TagId>);

impl TagSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tag.
    pub fn insert(&mut self, id: TagId) {
        if let Err(pos) = self.0.binary_search(&id) {
            self.0.insert(pos, id);
        }
    }

    /// Returns true if the tag is present.
    #[must_use]
    pub fn contains(&self, id: TagId) -> bool {
        self.0.binary_search(&id).is_ok()
    }

    /// Returns true if both sets share at least one tag.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        let (mut i, mut j) = (0, 0);
        while i < self.0.len() && j < other.0.len() {
            match self.0[i].cmp(&other.0[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => return true,
            }
        }
        false
    }

    /// Adds every tag of `other`.
    pub fn extend_from(&mut self, other: &Self) {
        for id in other.iter() {
            self.insert(id);
        }
    }

    /// Iterates handles in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = TagId> + '_ {
        self.0.iter().copied()
    }

    /// Number of tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<TagId> for TagSet {
    fn from_iter<I: IntoIterator<Item = TagId>>(iter: I) -> Self {
        let mut ids: Vec<TagId> = iter.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        Self(ids)
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_stable() {
        let mut table = TagTable::new();
        let a = table.intern("core").unwrap();
        let b = table.intern(" core ").unwrap();
        assert_eq!(a, b);
        assert_eq!(table.len(), 1);
        assert_eq!(table.name(a), "core");
    }

    #[test]
    fn blank_tags_are_rejected() {
        let mut table = TagTable::new();
        assert_eq!(table.intern(""), Err(TagError::Blank));
        assert_eq!(table.intern("   "), Err(TagError::Blank));
    }

    #[test]
    fn set_is_sorted_and_deduplicated() {
        let mut table = TagTable::new();
        let a = table.intern("a").unwrap();
        let b = table.intern("b").unwrap();
        let set: TagSet = [b, a, b].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![a, b]);
    }

    #[test]
    fn intersection() {
        let mut table = TagTable::new();
        let ids: Vec<TagId> = ["a", "b", "c", "d"]
            .iter()
            .map(|t| table.intern(t).unwrap())
            .collect();
        let left: TagSet = [ids[0], ids[2]].into_iter().collect();
        let right: TagSet = [ids[1], ids[2]].into_iter().collect();
        let other: TagSet = [ids[3]].into_iter().collect();
        assert!(left.intersects(&right));
        assert!(!left.intersects(&other));
        assert!(!left.intersects(&TagSet::new()));
    }

    #[test]
    fn display_sorts_by_name() {
        let mut table = TagTable::new();
        let z = table.intern("zeta").unwrap();
        let a = table.intern("alpha").unwrap();
        let set: TagSet = [z, a].into_iter().collect();
        assert_eq!(table.display(&set), "[alpha, zeta]");
    }
}
