// Copyright 2025 Cowboy AI, LLC.

//! Documents and document identity
//!
//! A [`UrdfDocument`] is a parsed robot description tree plus an opaque
//! [`DocumentId`]. Composition tracks contributors by identity, never by
//! content: two documents parsed from the same bytes are distinct
//! contributors, and the same document attached twice is a repeat.
//!
//! [`UrdfSource`] is the read surface composition works against. Both
//! leaf documents and composed documents implement it.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::checker::{self, CheckerConfig};
use crate::element::UrdfElement;
use crate::errors::DocumentError;
use crate::name_map::ComposedNameMap;
use crate::xml;

/// Unique identity of a loaded or composed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Mint a fresh identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Read surface for anything composition can attach: a parsed document
/// or an already-composed one.
pub trait UrdfSource {
    /// Identity under which this source is tracked in name maps.
    fn document_id(&self) -> DocumentId;

    /// Human-readable label for diagnostics.
    fn label(&self) -> &str;

    /// Root element of the document tree.
    fn root(&self) -> &UrdfElement;

    /// The source's own name map, when it is a composed document.
    fn composed_map(&self) -> Option<&ComposedNameMap> {
        None
    }

    /// Names of all top-level named elements.
    fn top_level_names(&self) -> HashSet<String> {
        self.root()
            .children()
            .iter()
            .filter_map(|el| el.name().map(str::to_string))
            .collect()
    }

    /// Find a top-level element by name, optionally restricted to a tag.
    fn find_top_level(&self, tag: Option<&str>, name: &str) -> Option<&UrdfElement> {
        self.root()
            .children()
            .iter()
            .find(|el| tag.map_or(true, |t| el.tag() == t) && el.name() == Some(name))
    }

    /// Serialize the tree back to XML text.
    fn to_xml_string(&self) -> String {
        xml::serialize(self.root())
    }
}

/// A leaf robot description document.
///
/// Cloning preserves identity; parse the text again to obtain an
/// independent contributor.
#[derive(Debug, Clone, Serialize)]
pub struct UrdfDocument {
    id: DocumentId,
    label: String,
    root: UrdfElement,
}

impl UrdfDocument {
    /// Parse a document from XML text under the given diagnostic label.
    pub fn parse(label: impl Into<String>, xml_text: &str) -> Result<Self, DocumentError> {
        let label = label.into();
        let root = xml::parse(xml_text).map_err(|source| DocumentError::Xml {
            label: label.clone(),
            source,
        })?;
        Ok(Self {
            id: DocumentId::new(),
            label,
            root,
        })
    }

    /// Build a document around an already-constructed tree.
    pub fn from_root(label: impl Into<String>, root: UrdfElement) -> Self {
        Self {
            id: DocumentId::new(),
            label: label.into(),
            root,
        }
    }

    /// Load a document from disk, validating with the default checker
    /// configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        Self::from_file_with(path, &CheckerConfig::default())
    }

    /// Load a document from disk.
    ///
    /// The label is taken from the root element's `name` attribute,
    /// falling back to the file stem. The file is passed to the external
    /// checker when the configured policy calls for it.
    pub fn from_file_with(
        path: impl AsRef<Path>,
        config: &CheckerConfig,
    ) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let root = xml::parse(&text).map_err(|source| DocumentError::Xml {
            label: stem.clone(),
            source,
        })?;
        let label = root.name().map(str::to_string).unwrap_or(stem);
        if config.policy.should_check() {
            checker::check_urdf(path, config)?;
        }
        debug!(label = %label, path = %path.display(), "loaded document");
        Ok(Self {
            id: DocumentId::new(),
            label,
            root,
        })
    }

    /// The document's identity.
    pub fn id(&self) -> DocumentId {
        self.id
    }
}

impl UrdfSource for UrdfDocument {
    fn document_id(&self) -> DocumentId {
        self.id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn root(&self) -> &UrdfElement {
        &self.root
    }
}
