//! Group ancestry resolution.
//!
//! Groups form a forest via `parent_group_id`. The solver needs, for every
//! group, the chain of ancestors up to its root: an activity attached to a
//! series collides with activities of its subgroups and vice versa, because
//! they share students. The map is built once per job from plain id lookups
//! rather than a pointer graph.

use std::collections::{HashMap, HashSet};

use crate::data::models::Group;
use crate::solver::error::SolveError;

/// Ancestor ids per group, ordered parent-first up to the root.
#[derive(Debug, Default)]
pub struct AncestryMap {
    ancestors: HashMap<String, Vec<String>>,
}

impl AncestryMap {
    /// Walks `parent_group_id` chains for every group, memoising resolved
    /// prefixes. A chain that reaches its own starting node, or a parent id
    /// with no group record, is a data-integrity failure.
    pub fn build(groups: &[Group]) -> Result<Self, SolveError> {
        let parent_of: HashMap<&str, Option<&str>> = groups
            .iter()
            .map(|g| (g.id.as_str(), g.parent_group_id.as_deref()))
            .collect();

        let mut ancestors: HashMap<String, Vec<String>> = HashMap::with_capacity(groups.len());
        for group in groups {
            if ancestors.contains_key(&group.id) {
                continue;
            }
            let mut chain: Vec<String> = Vec::new();
            let mut seen: HashSet<&str> = HashSet::from([group.id.as_str()]);
            let mut current = group.parent_group_id.as_deref();
            while let Some(parent_id) = current {
                if !seen.insert(parent_id) {
                    return Err(SolveError::InvalidGraph {
                        group_id: group.id.clone(),
                    });
                }
                chain.push(parent_id.to_string());
                // A memoised suffix finishes the walk without re-visiting.
                if let Some(resolved) = ancestors.get(parent_id) {
                    chain.extend(resolved.iter().cloned());
                    break;
                }
                current = *parent_of.get(parent_id).ok_or_else(|| {
                    SolveError::InvalidInput(format!(
                        "group {} references unknown parent {parent_id}",
                        group.id
                    ))
                })?;
            }
            ancestors.insert(group.id.clone(), chain);
        }
        Ok(Self { ancestors })
    }

    /// Ancestors of `group_id`, parent-first. Empty for roots and unknown ids.
    pub fn ancestors_of(&self, group_id: &str) -> &[String] {
        self.ancestors
            .get(group_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether `ancestor_id` appears in the ancestor chain of `group_id`.
    pub fn is_ancestor(&self, ancestor_id: &str, group_id: &str) -> bool {
        self.ancestors_of(group_id).iter().any(|a| a == ancestor_id)
    }

    /// Whether two groups share students: equal, or one is an ancestor of
    /// the other.
    pub fn conflicts(&self, a: &str, b: &str) -> bool {
        a == b || self.is_ancestor(a, b) || self.is_ancestor(b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(id: &str, parent: Option<&str>) -> Group {
        Group {
            id: id.to_string(),
            institution_id: "inst".to_string(),
            name: id.to_string(),
            parent_group_id: parent.map(str::to_string),
        }
    }

    #[test]
    fn resolves_series_group_subgroup_chain() {
        let groups = vec![
            group("series", None),
            group("g1", Some("series")),
            group("g1a", Some("g1")),
            group("g2", Some("series")),
        ];
        let map = AncestryMap::build(&groups).unwrap();
        assert_eq!(map.ancestors_of("series"), &[] as &[String]);
        assert_eq!(map.ancestors_of("g1"), &["series".to_string()]);
        assert_eq!(
            map.ancestors_of("g1a"),
            &["g1".to_string(), "series".to_string()]
        );
    }

    #[test]
    fn conflict_is_symmetric_and_excludes_siblings() {
        let groups = vec![
            group("series", None),
            group("g1", Some("series")),
            group("g2", Some("series")),
        ];
        let map = AncestryMap::build(&groups).unwrap();
        assert!(map.conflicts("series", "g1"));
        assert!(map.conflicts("g1", "series"));
        assert!(map.conflicts("g1", "g1"));
        assert!(!map.conflicts("g1", "g2"));
    }

    #[test]
    fn detects_cycles() {
        let groups = vec![group("a", Some("b")), group("b", Some("a"))];
        assert!(matches!(
            AncestryMap::build(&groups),
            Err(SolveError::InvalidGraph { .. })
        ));
    }

    #[test]
    fn rejects_unknown_parent() {
        let groups = vec![group("a", Some("missing"))];
        assert!(matches!(
            AncestryMap::build(&groups),
            Err(SolveError::InvalidInput(_))
        ));
    }
}
