//! Unique display names.
//!
//! Names are grouped by base name, the name with any trailing `" <n>"`
//! groups stripped. Each base tracks how many live nodes use it and the next
//! numeric suffix to hand out. Suffixes only grow: once `"Box 2"` has been
//! issued, no later node is given `"Box 2"` (or plain `"Box"`) again, even
//! after every `"Box"` node is gone, so names held by history entries never
//! collide with fresh ones.

use std::collections::{HashMap, HashSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct BaseEntry {
    live_count: u32,
    next_suffix: u64,
}

/// Registry of the display names in use.
#[derive(Clone, Debug, Default)]
pub struct NameRegistry {
    bases: HashMap<String, BaseEntry>,
    /// `next_suffix` of bases whose last live name was released
    retired: HashMap<String, u64>,
    live: HashSet<String>,
}

/// Strip every trailing `" <integer>"` group.
///
/// ```
/// use atelier_editor::scene::base_name;
///
/// assert_eq!(base_name("Box 12"), "Box");
/// assert_eq!(base_name("Box 1 2"), "Box");
/// assert_eq!(base_name("Box2"), "Box2");
/// ```
pub fn base_name(name: &str) -> &str {
    let mut base = name;
    while let Some((stem, _)) = split_suffix(base) {
        base = stem;
    }
    base
}

/// Largest number treated as a suffix. Anything above is part of the base
/// name, so suffix counters always have room to grow.
const MAX_SUFFIX: u64 = u32::MAX as u64;

/// Split `"Box 3"` into `("Box", 3)`
fn split_suffix(name: &str) -> Option<(&str, u64)> {
    let (stem, digits) = name.rsplit_once(' ')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let suffix = digits.parse().ok().filter(|n| *n <= MAX_SUFFIX)?;
    Some((stem, suffix))
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh unique name derived from `requested`
    pub fn assign(&mut self, requested: &str) -> String {
        let base = base_name(requested);
        let retired = self.retired.remove(base);
        let first_use = retired.is_none() && !self.bases.contains_key(base);

        let entry = self.bases.entry(base.to_string()).or_insert(BaseEntry {
            live_count: 0,
            next_suffix: retired.unwrap_or(1),
        });
        entry.live_count += 1;

        let mut name = base.to_string();
        if !first_use || self.live.contains(&name) {
            loop {
                let suffix = entry.next_suffix;
                entry.next_suffix = suffix.saturating_add(1);
                name = format!("{base} {suffix}");
                if !self.live.contains(&name) {
                    break;
                }
            }
        }

        self.live.insert(name.clone());
        name
    }

    /// Take `name` back exactly if nobody holds it, otherwise assign.
    ///
    /// Used when undo/redo puts a node back: it gets the name it had.
    pub fn restore(&mut self, name: &str) -> String {
        if self.live.contains(name) {
            return self.assign(name);
        }

        let base = base_name(name);
        let floor = split_suffix(name).map_or(1, |(_, n)| n + 1);
        let retired = self.retired.remove(base);

        let entry = self.bases.entry(base.to_string()).or_insert(BaseEntry {
            live_count: 0,
            next_suffix: retired.unwrap_or(1),
        });
        entry.live_count += 1;
        entry.next_suffix = entry.next_suffix.max(floor);

        self.live.insert(name.to_string());
        name.to_string()
    }

    /// Give up `name`. Returns false if it was not live.
    pub fn release(&mut self, name: &str) -> bool {
        if !self.live.remove(name) {
            log::warn!("Releasing unregistered name '{}'", name);
            return false;
        }

        let base = base_name(name);
        if let Some(entry) = self.bases.get_mut(base) {
            entry.live_count = entry.live_count.saturating_sub(1);
            if entry.live_count == 0 {
                let next_suffix = entry.next_suffix;
                self.bases.remove(base);
                self.retired.insert(base.to_string(), next_suffix);
            }
        }
        true
    }

    /// Check if a node currently holds `name`
    pub fn is_live(&self, name: &str) -> bool {
        self.live.contains(name)
    }

    /// Live names sharing `base`
    pub fn live_count(&self, base: &str) -> u32 {
        self.bases.get(base).map_or(0, |e| e.live_count)
    }

    /// Suffix the next `assign` for `base` would use, if the base has been seen
    pub fn next_suffix(&self, base: &str) -> Option<u64> {
        self.bases
            .get(base)
            .map(|e| e.next_suffix)
            .or_else(|| self.retired.get(base).copied())
    }

    /// Number of live names
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn clear(&mut self) {
        self.bases.clear();
        self.retired.clear();
        self.live.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("Box"), "Box");
        assert_eq!(base_name("Box 3"), "Box");
        assert_eq!(base_name("Point Light 2"), "Point Light");
        assert_eq!(base_name("Box -1"), "Box -1");
        assert_eq!(base_name("Box "), "Box ");
    }

    #[test]
    fn test_assign_suffixes() {
        let mut names = NameRegistry::new();
        assert_eq!(names.assign("Box"), "Box");
        assert_eq!(names.assign("Box"), "Box 1");
        assert_eq!(names.assign("Box 1"), "Box 2");
        assert_eq!(names.live_count("Box"), 3);
        assert_eq!(names.next_suffix("Box"), Some(3));
    }

    #[test]
    fn test_freed_names_are_not_reissued() {
        let mut names = NameRegistry::new();
        let first = names.assign("Box");
        names.release(&first);
        assert_eq!(names.live_count("Box"), 0);

        let second = names.assign("Box");
        assert_eq!(second, "Box 1");

        let third = names.assign("Box");
        assert_eq!(third, "Box 2");
    }

    #[test]
    fn test_restore_reclaims_free_name() {
        let mut names = NameRegistry::new();
        let a = names.assign("Box");
        let b = names.assign("Box");
        names.release(&a);
        names.release(&b);

        assert_eq!(names.restore("Box 1"), "Box 1");
        // The suffix counter never falls behind a restored name.
        assert_eq!(names.assign("Box"), "Box 2");
        assert_eq!(names.restore("Box"), "Box");
        assert_eq!(names.live_count("Box"), 3);
    }

    #[test]
    fn test_restore_taken_name_assigns() {
        let mut names = NameRegistry::new();
        names.assign("Lamp");
        assert_eq!(names.restore("Lamp"), "Lamp 1");
    }

    #[test]
    fn test_oversized_suffix_is_part_of_base() {
        let huge = "Box 18446744073709551615";
        assert_eq!(base_name(huge), huge);
        assert_eq!(base_name("Box 99999999999999999999999"), "Box 99999999999999999999999");
        assert_eq!(base_name("Box 4294967295"), "Box");

        let mut names = NameRegistry::new();
        assert_eq!(names.restore(huge), huge);
        assert_eq!(names.assign(huge), format!("{huge} 1"));
        assert_eq!(names.assign("Box"), "Box");
        assert_eq!(names.live_count(huge), 2);
    }

    #[test]
    fn test_restore_at_largest_suffix() {
        let mut names = NameRegistry::new();
        assert_eq!(names.restore("Box 4294967295"), "Box 4294967295");
        let next = names.assign("Box");
        assert_eq!(next, "Box 4294967296");
        // Past the cap the issued name counts as its own base; it still
        // never collides.
        assert_eq!(names.assign(&next), "Box 4294967296 1");
    }

    #[test]
    fn test_release_unknown() {
        let mut names = NameRegistry::new();
        assert!(!names.release("Ghost"));
        assert!(names.is_empty());
    }
}
