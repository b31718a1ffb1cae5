//! Identifier generation for subscriptions and timer handles.
//!
//! This module provides an [`IdGenerator`] trait so that opaque identifiers
//! can be deterministic in tests while staying collision-free in production.

use std::cell::Cell;

/// Source of opaque, collision-free identifiers.
///
/// Identifiers are only ever compared for equality; callers must not
/// parse or order them.
///
/// # Example
///
/// ```
/// use navwatch::id::{IdGenerator, UuidGenerator};
///
/// let ids = UuidGenerator;
/// assert_ne!(ids.new_id(), ids.new_id());
/// ```
pub trait IdGenerator {
    /// Returns a fresh identifier never returned before by this generator.
    fn new_id(&self) -> String;
}

/// Production generator backed by random (v4) UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn new_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Deterministic generator producing `"{prefix}-{n}"` with `n` counting from 1.
#[derive(Debug)]
pub struct SequentialIds {
    prefix: &'static str,
    next: Cell<u64>,
}

impl SequentialIds {
    /// Creates a generator with the given prefix.
    #[must_use]
    pub const fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            next: Cell::new(1),
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new("id")
    }
}

impl IdGenerator for SequentialIds {
    fn new_id(&self) -> String {
        let n = self.next.get();
        self.next.set(n + 1);
        format!("{}-{n}", self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn uuid_generator_yields_distinct_ids() {
        let ids = UuidGenerator;
        let generated: HashSet<String> = (0..100).map(|_| ids.new_id()).collect();

        assert_eq!(generated.len(), 100);
    }

    #[test]
    fn uuid_generator_yields_hyphenated_uuid() {
        let id = UuidGenerator.new_id();

        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn sequential_ids_count_from_one() {
        let ids = SequentialIds::new("sub");

        assert_eq!(ids.new_id(), "sub-1");
        assert_eq!(ids.new_id(), "sub-2");
        assert_eq!(ids.new_id(), "sub-3");
    }

    #[test]
    fn sequential_ids_default_prefix() {
        let ids = SequentialIds::default();
        assert_eq!(ids.new_id(), "id-1");
    }
}
