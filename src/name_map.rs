// Copyright 2025 Cowboy AI, LLC.

//! Name maps: provenance tracking through composition
//!
//! Merging documents renames elements to keep top-level names unique, so
//! a caller that knows an element as `joint` in its own file needs a way
//! to find that element in the merged result. A [`ComposedNameMap`]
//! records, for every contributing document, the mapping from each
//! element's original name to its current name, together with a reverse
//! index from current names back to their origin.
//!
//! Contributors are tracked by [`DocumentId`], never by content. A
//! composed document attached as a contributor keeps a handle to its own
//! map, which is how [`ComposedNameMap::collapse`] can flatten nested
//! compositions down to a chosen set of leaf documents.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

use crate::document::{DocumentId, UrdfSource};
use crate::errors::CollapseError;

/// Where a current name came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameOrigin {
    /// The contributing document.
    pub document: DocumentId,
    /// The element's name inside that document.
    pub original: String,
}

/// One contributor's slice of a [`ComposedNameMap`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceTable {
    label: String,
    #[serde(skip)]
    nested: Option<Arc<ComposedNameMap>>,
    names: IndexMap<String, String>,
}

impl SourceTable {
    /// Diagnostic label of the contributor.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the contributor was itself a composed document.
    pub fn is_composed(&self) -> bool {
        self.nested.is_some()
    }

    /// Iterate `(original, current)` name pairs in document order.
    pub fn names(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(og, cur)| (og.as_str(), cur.as_str()))
    }
}

/// Per-contributor name tables plus a reverse index over current names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComposedNameMap {
    tables: IndexMap<DocumentId, SourceTable>,
    current: IndexMap<String, NameOrigin>,
}

impl ComposedNameMap {
    /// Build the identity map for a single source: every top-level named
    /// element maps to itself.
    ///
    /// When the source is itself a composed document, its own map is
    /// retained so a later collapse can see through this layer.
    pub fn construct<S: UrdfSource + ?Sized>(source: &S) -> Self {
        let mut names = IndexMap::new();
        let mut current = IndexMap::new();
        for element in source.root().children() {
            if let Some(name) = element.name() {
                names.insert(name.to_string(), name.to_string());
                current.insert(
                    name.to_string(),
                    NameOrigin {
                        document: source.document_id(),
                        original: name.to_string(),
                    },
                );
            }
        }
        let table = SourceTable {
            label: source.label().to_string(),
            nested: source.composed_map().map(|map| Arc::new(map.clone())),
            names,
        };
        let mut tables = IndexMap::new();
        tables.insert(source.document_id(), table);
        Self { tables, current }
    }

    /// Identities of all contributors, in attachment order.
    pub fn documents(&self) -> impl Iterator<Item = DocumentId> + '_ {
        self.tables.keys().copied()
    }

    /// A contributor's name table.
    pub fn source(&self, document: DocumentId) -> Option<&SourceTable> {
        self.tables.get(&document)
    }

    /// Current names of all tracked elements, in attachment order.
    pub fn current_names(&self) -> impl Iterator<Item = &str> {
        self.current.keys().map(String::as_str)
    }

    /// Which contributor a current name belongs to, and what that
    /// contributor originally called it.
    pub fn origin_of(&self, current: &str) -> Option<&NameOrigin> {
        self.current.get(current)
    }

    /// Current name of `original` as contributed by `document`, or `None`
    /// if the document never contributed it or it was since erased.
    pub fn lookup<S: UrdfSource + ?Sized>(&self, document: &S, original: &str) -> Option<&str> {
        self.lookup_by_id(document.document_id(), original)
    }

    /// [`ComposedNameMap::lookup`] by raw identity.
    pub fn lookup_by_id(&self, document: DocumentId, original: &str) -> Option<&str> {
        self.tables
            .get(&document)
            .and_then(|table| table.names.get(original))
            .map(String::as_str)
    }

    /// Merge another map's contributors into this one.
    ///
    /// # Panics
    ///
    /// Panics if the two maps share a contributor or a current name. The
    /// engine renames collisions away before merging, so an overlap here
    /// is a bug in the caller.
    pub fn incorporate(&mut self, other: ComposedNameMap) {
        let repeated: Vec<&DocumentId> = other
            .tables
            .keys()
            .filter(|id| self.tables.contains_key(*id))
            .collect();
        assert!(
            repeated.is_empty(),
            "merged maps must not share contributors: {repeated:?}"
        );
        let colliding: Vec<&String> = other
            .current
            .keys()
            .filter(|name| self.current.contains_key(*name))
            .collect();
        assert!(
            colliding.is_empty(),
            "merged maps must not share current names: {colliding:?}"
        );
        self.tables.extend(other.tables);
        self.current.extend(other.current);
    }

    /// Record that the element currently named `old` is now named `new`.
    ///
    /// Renaming a name to itself is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if `old` is not a live name in this map.
    pub fn rename(&mut self, old: &str, new: &str) {
        if old == new {
            return;
        }
        let origin = self
            .current
            .shift_remove(old)
            .unwrap_or_else(|| panic!("renamed name `{old}` is not live in this composition"));
        let table = self
            .tables
            .get_mut(&origin.document)
            .unwrap_or_else(|| panic!("no table for contributor of `{old}`"));
        let current = table
            .names
            .get_mut(&origin.original)
            .unwrap_or_else(|| panic!("contributor lost track of `{}`", origin.original));
        *current = new.to_string();
        self.current.insert(new.to_string(), origin);
    }

    /// Erase the element currently named `name` from tracking, forward
    /// and reverse. Later lookups of its original name return `None`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is not a live name in this map.
    pub fn remove(&mut self, name: &str) {
        let origin = self
            .current
            .shift_remove(name)
            .unwrap_or_else(|| panic!("removed name `{name}` is not live in this composition"));
        if let Some(table) = self.tables.get_mut(&origin.document) {
            table.names.shift_remove(&origin.original);
        }
    }

    /// Rewrite this map through a rename table mapping our current names
    /// to an outer composition's current names. Names absent from the
    /// table were erased at the outer level and are dropped.
    fn transform(&self, table: &IndexMap<String, String>) -> ComposedNameMap {
        let mut tables = IndexMap::new();
        for (id, source) in &self.tables {
            let mut names = IndexMap::new();
            for (original, current) in &source.names {
                if let Some(outer) = table.get(current) {
                    names.insert(original.clone(), outer.clone());
                }
            }
            tables.insert(
                *id,
                SourceTable {
                    label: source.label.clone(),
                    nested: source.nested.clone(),
                    names,
                },
            );
        }
        let mut current = IndexMap::new();
        for (name, origin) in &self.current {
            if let Some(outer) = table.get(name) {
                current.insert(outer.clone(), origin.clone());
            }
        }
        ComposedNameMap { tables, current }
    }

    /// Flatten nested composition down to the given target documents.
    ///
    /// The result maps each target's original names directly to their
    /// names in this composition, no matter how deeply the target was
    /// nested. Contributors that are not targets are seen through when
    /// composed, and silently dropped when they are leaves.
    ///
    /// Fails with [`CollapseError::RepeatedDocument`] if any target is
    /// reachable more than once.
    pub fn collapse<'a, S>(
        &self,
        targets: impl IntoIterator<Item = &'a S>,
    ) -> Result<ComposedNameMap, CollapseError>
    where
        S: UrdfSource + ?Sized + 'a,
    {
        let ids: HashSet<DocumentId> = targets.into_iter().map(|s| s.document_id()).collect();
        self.collapse_inner(&ids, false)
    }

    /// [`ComposedNameMap::collapse`], additionally failing with
    /// [`CollapseError::UnaccountedDocument`] if any leaf contributor is
    /// not in the target set.
    pub fn collapse_strict<'a, S>(
        &self,
        targets: impl IntoIterator<Item = &'a S>,
    ) -> Result<ComposedNameMap, CollapseError>
    where
        S: UrdfSource + ?Sized + 'a,
    {
        let ids: HashSet<DocumentId> = targets.into_iter().map(|s| s.document_id()).collect();
        self.collapse_inner(&ids, true)
    }

    fn collapse_inner(
        &self,
        targets: &HashSet<DocumentId>,
        strict: bool,
    ) -> Result<ComposedNameMap, CollapseError> {
        let mut tables: IndexMap<DocumentId, SourceTable> = IndexMap::new();
        let mut merge = |id: DocumentId, table: SourceTable| -> Result<(), CollapseError> {
            if tables.contains_key(&id) {
                return Err(CollapseError::RepeatedDocument {
                    document: id,
                    label: table.label,
                });
            }
            tables.insert(id, table);
            Ok(())
        };

        for (id, table) in &self.tables {
            if targets.contains(id) {
                merge(*id, table.clone())?;
            } else if let Some(nested) = &table.nested {
                let seen_through = nested.collapse_inner(targets, strict)?.transform(&table.names);
                for (sub_id, sub_table) in seen_through.tables {
                    merge(sub_id, sub_table)?;
                }
            } else if strict {
                return Err(CollapseError::UnaccountedDocument {
                    document: *id,
                    label: table.label.clone(),
                });
            }
        }

        let mut current = IndexMap::new();
        for (id, table) in &tables {
            for (original, name) in &table.names {
                current.insert(
                    name.clone(),
                    NameOrigin {
                        document: *id,
                        original: original.clone(),
                    },
                );
            }
        }
        Ok(ComposedNameMap { tables, current })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::UrdfDocument;
    use pretty_assertions::assert_eq;

    fn pair_doc(label: &str) -> UrdfDocument {
        UrdfDocument::parse(
            label,
            r#"<robot name="pair">
  <link name="a" />
  <link name="b" />
  <joint name="j" type="fixed">
    <parent link="a" />
    <child link="b" />
  </joint>
  <visual />
</robot>"#,
        )
        .unwrap()
    }

    /// Test construction tracks exactly the named top-level elements
    #[test]
    fn test_construct_identity() {
        let doc = pair_doc("pair");
        let map = ComposedNameMap::construct(&doc);

        assert_eq!(map.documents().collect::<Vec<_>>(), vec![doc.id()]);
        let names: Vec<&str> = map.current_names().collect();
        assert_eq!(names, vec!["a", "b", "j"]);
        assert_eq!(map.lookup(&doc, "a"), Some("a"));
        assert_eq!(map.lookup(&doc, "visual"), None);
        assert!(!map.source(doc.id()).unwrap().is_composed());
    }

    /// Test renaming updates the forward table and the reverse index
    #[test]
    fn test_rename() {
        let doc = pair_doc("pair");
        let mut map = ComposedNameMap::construct(&doc);
        map.rename("j", "j(1)");

        assert_eq!(map.lookup(&doc, "j"), Some("j(1)"));
        assert_eq!(map.origin_of("j"), None);
        let origin = map.origin_of("j(1)").unwrap();
        assert_eq!(origin.document, doc.id());
        assert_eq!(origin.original, "j");
    }

    /// Test renaming a name to itself leaves the map intact
    #[test]
    fn test_rename_to_same_name() {
        let doc = pair_doc("pair");
        let mut map = ComposedNameMap::construct(&doc);
        map.rename("j", "j");

        assert_eq!(map.lookup(&doc, "j"), Some("j"));
        assert!(map.origin_of("j").is_some());
    }

    /// Test renaming an unknown name is a caller bug
    #[test]
    #[should_panic(expected = "not live in this composition")]
    fn test_rename_unknown_panics() {
        let doc = pair_doc("pair");
        let mut map = ComposedNameMap::construct(&doc);
        map.rename("ghost", "ghost(1)");
    }

    /// Test removal erases the name in both directions
    #[test]
    fn test_remove() {
        let doc = pair_doc("pair");
        let mut map = ComposedNameMap::construct(&doc);
        map.rename("b", "b(2)");
        map.remove("b(2)");

        assert_eq!(map.lookup(&doc, "b"), None);
        assert_eq!(map.origin_of("b(2)"), None);
        assert_eq!(map.current_names().count(), 2);
    }

    /// Test disjoint maps merge, keeping both contributors
    #[test]
    fn test_incorporate() {
        let left = pair_doc("left");
        let right = UrdfDocument::parse("right", r#"<robot name="r"><link name="c" /></robot>"#)
            .unwrap();
        let mut map = ComposedNameMap::construct(&left);
        map.incorporate(ComposedNameMap::construct(&right));

        assert_eq!(map.documents().count(), 2);
        assert_eq!(map.lookup(&left, "a"), Some("a"));
        assert_eq!(map.lookup(&right, "c"), Some("c"));
    }

    /// Test merging maps with a shared current name is a caller bug
    #[test]
    #[should_panic(expected = "must not share current names")]
    fn test_incorporate_collision_panics() {
        let left = pair_doc("left");
        let right = pair_doc("right");
        let mut map = ComposedNameMap::construct(&left);
        map.incorporate(ComposedNameMap::construct(&right));
    }

    /// Test transforming through an outer rename table drops erased names
    #[test]
    fn test_transform() {
        let doc = pair_doc("pair");
        let map = ComposedNameMap::construct(&doc);

        let mut outer = IndexMap::new();
        outer.insert("a".to_string(), "a(1)".to_string());
        outer.insert("j".to_string(), "j".to_string());
        // "b" is absent: erased at the outer level.
        let transformed = map.transform(&outer);

        assert_eq!(transformed.lookup(&doc, "a"), Some("a(1)"));
        assert_eq!(transformed.lookup(&doc, "j"), Some("j"));
        assert_eq!(transformed.lookup(&doc, "b"), None);
        assert_eq!(transformed.origin_of("a(1)").unwrap().original, "a");
        assert_eq!(transformed.origin_of("b"), None);
    }

    /// Test a single-layer strict collapse is the identity
    #[test]
    fn test_collapse_single_layer() {
        let doc = pair_doc("pair");
        let map = ComposedNameMap::construct(&doc);
        let collapsed = map.collapse_strict([&doc]).unwrap();
        assert_eq!(collapsed, map);
    }

    /// Test strict collapse rejects contributors outside the target set
    #[test]
    fn test_collapse_strict_unaccounted() {
        let left = pair_doc("left");
        let right = UrdfDocument::parse("right", r#"<robot name="r"><link name="c" /></robot>"#)
            .unwrap();
        let mut map = ComposedNameMap::construct(&left);
        map.incorporate(ComposedNameMap::construct(&right));

        let err = map.collapse_strict([&left]).unwrap_err();
        assert_eq!(
            err,
            CollapseError::UnaccountedDocument {
                document: right.id(),
                label: "right".to_string(),
            }
        );
    }

    /// Test non-strict collapse silently drops non-target leaves
    #[test]
    fn test_collapse_drops_leaves() {
        let left = pair_doc("left");
        let right = UrdfDocument::parse("right", r#"<robot name="r"><link name="c" /></robot>"#)
            .unwrap();
        let mut map = ComposedNameMap::construct(&left);
        map.incorporate(ComposedNameMap::construct(&right));

        let collapsed = map.collapse([&right]).unwrap();
        assert_eq!(collapsed.documents().collect::<Vec<_>>(), vec![right.id()]);
        assert_eq!(collapsed.lookup(&left, "a"), None);
        assert_eq!(collapsed.origin_of("a"), None);
        assert_eq!(collapsed.lookup(&right, "c"), Some("c"));
    }

    /// Test maps serialize for diagnostics
    #[test]
    fn test_serializes_to_json() {
        let doc = pair_doc("pair");
        let map = ComposedNameMap::construct(&doc);
        let json = serde_json::to_string(&map).unwrap();
        assert!(json.contains("\"pair\""));
        assert!(json.contains(&doc.id().to_string()));
    }
}
