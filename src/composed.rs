// Copyright 2025 Cowboy AI, LLC.

//! Composed documents
//!
//! A [`ComposedUrdf`] owns a merged element tree together with the
//! [`ComposedNameMap`] recording where every tracked name came from.
//! Merging renames colliding names using a first-available scheme:
//! `name`, then `name(1)`, `name(2)` and so on. Renames rewrite both the
//! tree (element names and link references) and the map, so the two
//! never drift apart.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::document::{DocumentId, UrdfSource};
use crate::element::UrdfElement;
use crate::name_map::ComposedNameMap;

/// A merged document and its provenance map.
///
/// Composed documents have their own identity, distinct from every
/// contributor: wrapping the same source twice yields two independent
/// contributors, which is what makes attaching one document at several
/// places of a composition legal.
#[derive(Debug, Clone, Serialize)]
pub struct ComposedUrdf {
    id: DocumentId,
    label: String,
    root: UrdfElement,
    name_map: ComposedNameMap,
}

impl ComposedUrdf {
    /// Wrap a source as a fresh single-contributor composition.
    ///
    /// The tree is copied and the name map starts as the identity over
    /// the source's top-level named elements. Wrapping a composed
    /// document keeps a handle to its map, so collapsing can later see
    /// through this layer.
    pub fn construct<S: UrdfSource + ?Sized>(source: &S) -> Self {
        Self {
            id: DocumentId::new(),
            label: source.label().to_string(),
            root: source.root().clone(),
            name_map: ComposedNameMap::construct(source),
        }
    }

    /// The composition's own identity.
    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// The name map accumulated so far.
    pub fn name_map(&self) -> &ComposedNameMap {
        &self.name_map
    }

    /// Apply a rename table to the tree and the name map together.
    pub(crate) fn rename_elements(&mut self, table: &IndexMap<String, String>) {
        for (old, new) in table {
            self.name_map.rename(old, new);
        }
        self.root.rename_references(table);
    }

    /// Drop top-level materials that an identical copy of already exists
    /// in `base`, erasing them from the name map as well.
    ///
    /// Materials are shared palette entries, so a structurally identical
    /// duplicate is redundant rather than a collision. Same-named
    /// materials that differ structurally are kept and renamed later.
    pub(crate) fn remove_duplicate_materials(&mut self, base: &ComposedUrdf) {
        let base_materials: Vec<&UrdfElement> = base
            .root
            .children()
            .iter()
            .filter(|el| el.tag() == "material")
            .collect();
        if base_materials.is_empty() {
            return;
        }
        let mut removed = Vec::new();
        self.root.children_mut().retain(|el| {
            let duplicate =
                el.tag() == "material" && base_materials.iter().any(|b| b.structurally_equal(el));
            if duplicate {
                if let Some(name) = el.name() {
                    removed.push(name.to_string());
                }
            }
            !duplicate
        });
        for name in &removed {
            self.name_map.remove(name);
        }
        if !removed.is_empty() {
            debug!(count = removed.len(), "dropped duplicate materials");
        }
    }

    /// Append another composition's elements after ours, renaming
    /// collisions away and merging the name maps.
    ///
    /// # Panics
    ///
    /// Panics if the two compositions share a contributor. Wrap a source
    /// freshly with [`ComposedUrdf::construct`] to attach it twice.
    pub fn concatenate(&mut self, mut other: ComposedUrdf) {
        let renames = self.collision_renames(&other);
        if !renames.is_empty() {
            debug!(count = renames.len(), "renaming colliding extender elements");
        }
        other.rename_elements(&renames);
        let ComposedUrdf { root, name_map, .. } = other;
        self.name_map.incorporate(name_map);
        self.root.children_mut().extend(root.into_children());
    }

    /// First-available renames for every element of `other` that would
    /// collide with a name already used here. Chosen names become taken
    /// immediately, so elements of `other` cannot collide pairwise
    /// either.
    fn collision_renames(&self, other: &ComposedUrdf) -> IndexMap<String, String> {
        let mut taken = self.top_level_names();
        let own = other.top_level_names();
        let mut renames = IndexMap::new();
        for element in other.root.children() {
            let Some(name) = element.name() else { continue };
            let fresh = first_available(&taken, &own, name);
            taken.insert(fresh.clone());
            if fresh != name {
                renames.insert(name.to_string(), fresh);
            }
        }
        renames
    }

    pub(crate) fn insert_element(&mut self, index: usize, element: UrdfElement) {
        self.root.children_mut().insert(index, element);
    }
}

impl UrdfSource for ComposedUrdf {
    fn document_id(&self) -> DocumentId {
        self.id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn root(&self) -> &UrdfElement {
        &self.root
    }

    fn composed_map(&self) -> Option<&ComposedNameMap> {
        Some(&self.name_map)
    }
}

/// Smallest-suffix name available against `taken`.
///
/// The bare `name` only needs to avoid `taken`; suffixed candidates must
/// also avoid `own`, the renamed document's current names, so an element
/// is never renamed onto one of its own siblings.
pub(crate) fn first_available(
    taken: &HashSet<String>,
    own: &HashSet<String>,
    name: &str,
) -> String {
    let mut to_add = 0usize;
    loop {
        let candidate = if to_add == 0 {
            name.to_string()
        } else {
            format!("{name}({to_add})")
        };
        if !taken.contains(&candidate) && (to_add == 0 || !own.contains(&candidate)) {
            return candidate;
        }
        to_add += 1;
    }
}

/// First-available name against a single source's top-level names.
pub(crate) fn first_available_in<S: UrdfSource + ?Sized>(source: &S, name: &str) -> String {
    first_available(&source.top_level_names(), &HashSet::new(), name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::UrdfDocument;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn taken(names: &[&str]) -> HashSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn arm_doc(label: &str) -> UrdfDocument {
        UrdfDocument::parse(
            label,
            r#"<robot name="arm">
  <material name="gray">
    <color rgba="0.5 0.5 0.5 1" />
  </material>
  <link name="base" />
  <link name="tip" />
  <joint name="stem" type="fixed">
    <parent link="base" />
    <child link="tip" />
  </joint>
</robot>"#,
        )
        .unwrap()
    }

    /// Test wrapping copies the tree under a fresh identity
    #[test]
    fn test_construct_is_fresh() {
        let doc = arm_doc("arm");
        let a = ComposedUrdf::construct(&doc);
        let b = ComposedUrdf::construct(&doc);

        assert_ne!(a.id(), b.id());
        assert_ne!(a.id(), doc.id());
        assert!(a.root().structurally_equal(doc.root()));
        assert_eq!(a.name_map().lookup(&doc, "stem"), Some("stem"));
        assert!(a.name_map().source(doc.id()).is_some());
    }

    /// Test wrapping a composition retains its map for later collapse
    #[test]
    fn test_construct_nests_composed_maps() {
        let doc = arm_doc("arm");
        let inner = ComposedUrdf::construct(&doc);
        let outer = ComposedUrdf::construct(&inner);

        let table = outer.name_map().source(inner.id()).unwrap();
        assert!(table.is_composed());
        let collapsed = outer.name_map().collapse_strict([&doc]).unwrap();
        assert_eq!(collapsed.lookup(&doc, "base"), Some("base"));
    }

    /// Test the first-available scheme picks the smallest free suffix
    #[test]
    fn test_first_available() {
        let none = HashSet::new();
        assert_eq!(first_available(&none, &none, "j"), "j");
        assert_eq!(first_available(&taken(&["j"]), &none, "j"), "j(1)");
        assert_eq!(first_available(&taken(&["j", "j(1)"]), &none, "j"), "j(2)");
        // A taken bare name does not shadow its suffixed forms.
        assert_eq!(first_available(&taken(&["j(1)"]), &none, "j"), "j");
    }

    /// Test sibling names only block suffixed candidates
    #[test]
    fn test_first_available_own_names() {
        let own = taken(&["j", "j(1)"]);
        // Bare candidate ignores own names: the element keeps its name.
        assert_eq!(first_available(&HashSet::new(), &own, "j"), "j");
        // Suffixed candidates must not land on a sibling.
        assert_eq!(first_available(&taken(&["j"]), &own, "j"), "j(2)");
    }

    proptest! {
        /// Test the chosen name is free and minimal for any blocked sets
        #[test]
        fn prop_first_available_minimal(
            taken_set in prop::collection::hash_set(
                prop::sample::select(vec![
                    "x".to_string(), "x(1)".to_string(), "x(2)".to_string(),
                    "x(3)".to_string(), "x(4)".to_string(), "x(5)".to_string(),
                ]),
                0..6,
            ),
            own_set in prop::collection::hash_set(
                prop::sample::select(vec![
                    "x".to_string(), "x(1)".to_string(), "x(2)".to_string(),
                    "x(3)".to_string(), "x(4)".to_string(), "x(5)".to_string(),
                ]),
                0..6,
            ),
        ) {
            let got = first_available(&taken_set, &own_set, "x");
            let suffix: usize = if got == "x" {
                0
            } else {
                got.strip_prefix("x(")
                    .and_then(|rest| rest.strip_suffix(')'))
                    .and_then(|digits| digits.parse().ok())
                    .expect("candidates follow the name(i) shape")
            };
            prop_assert!(!taken_set.contains(&got));
            if suffix > 0 {
                prop_assert!(!own_set.contains(&got));
            }
            for smaller in 0..suffix {
                let candidate = if smaller == 0 {
                    "x".to_string()
                } else {
                    format!("x({smaller})")
                };
                let blocked = taken_set.contains(&candidate)
                    || (smaller > 0 && own_set.contains(&candidate));
                prop_assert!(blocked, "skipped a free candidate {candidate}");
            }
        }
    }

    /// Test concatenation renames collisions and keeps both maps exact
    #[test]
    fn test_concatenate() {
        let left = arm_doc("left");
        let right = arm_doc("right");
        let mut base = ComposedUrdf::construct(&left);
        let extender = ComposedUrdf::construct(&right);
        base.concatenate(extender);

        assert_eq!(base.name_map().lookup(&left, "stem"), Some("stem"));
        assert_eq!(base.name_map().lookup(&right, "stem"), Some("stem(1)"));
        assert_eq!(base.name_map().lookup(&right, "base"), Some("base(1)"));

        // The appended joint's link references follow the renames.
        let renamed_joint = base.find_top_level(Some("joint"), "stem(1)").unwrap();
        assert_eq!(
            renamed_joint.find_child("parent").unwrap().attribute("link"),
            Some("base(1)")
        );

        // Every top-level name is unique after the merge.
        let names: Vec<&str> = base.root().children().iter().filter_map(|el| el.name()).collect();
        let unique: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(names.len(), unique.len());
    }

    /// Test attaching the same contributor twice is a caller bug
    #[test]
    #[should_panic(expected = "must not share contributors")]
    fn test_concatenate_shared_contributor_panics() {
        let doc = arm_doc("arm");
        let mut base = ComposedUrdf::construct(&doc);
        let again = ComposedUrdf::construct(&doc);
        base.concatenate(again);
    }

    /// Test identical materials are dropped, different ones renamed
    #[test]
    fn test_remove_duplicate_materials() {
        let left = arm_doc("left");
        let base = ComposedUrdf::construct(&left);

        let right = UrdfDocument::parse(
            "right",
            r#"<robot name="r">
  <material name="gray">
    <color rgba="0.5 0.5 0.5 1" />
  </material>
  <material name="red">
    <color rgba="1 0 0 1" />
  </material>
</robot>"#,
        )
        .unwrap();
        let mut extender = ComposedUrdf::construct(&right);
        extender.remove_duplicate_materials(&base);

        assert_eq!(extender.name_map().lookup(&right, "gray"), None);
        assert_eq!(extender.name_map().lookup(&right, "red"), Some("red"));
        assert!(extender.find_top_level(None, "gray").is_none());
    }

    /// Test a same-named but different material survives deduplication
    #[test]
    fn test_conflicting_material_kept() {
        let left = arm_doc("left");
        let base = ComposedUrdf::construct(&left);

        let right = UrdfDocument::parse(
            "right",
            r#"<robot name="r">
  <material name="gray">
    <color rgba="0.2 0.2 0.2 1" />
  </material>
</robot>"#,
        )
        .unwrap();
        let mut extender = ComposedUrdf::construct(&right);
        extender.remove_duplicate_materials(&base);
        assert_eq!(extender.name_map().lookup(&right, "gray"), Some("gray"));

        let mut merged = base;
        merged.concatenate(extender);
        assert_eq!(merged.name_map().lookup(&right, "gray"), Some("gray(1)"));
        assert!(merged.find_top_level(None, "gray(1)").is_some());
    }
}
