// Copyright 2025 Cowboy AI, LLC.

//! Error types for loading, composing and collapsing documents
//!
//! Composition failures are values: [`ComposeError`] carries snapshots of
//! both operands so a failed step deep inside a larger composition can be
//! inspected, or written to disk, after the fact.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::checker::CheckUrdfError;
use crate::document::{DocumentId, UrdfSource};
use crate::element::UrdfElement;
use crate::resolve::LinkRole;
use crate::xml::{self, XmlError};

/// Result type for composition operations.
pub type ComposeResult<T> = Result<T, ComposeError>;

/// A failed connection or resolution step.
///
/// The error captures deep copies of both operands at the moment of
/// failure. [`ComposeError::save_to`] writes them out for inspection with
/// external tooling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} (base `{base}`, extender `{extender}`)")]
pub struct ComposeError {
    kind: ComposeErrorKind,
    base: DocumentSnapshot,
    extender: DocumentSnapshot,
}

impl ComposeError {
    pub(crate) fn new<B, E>(kind: ComposeErrorKind, base: &B, extender: &E) -> Self
    where
        B: UrdfSource + ?Sized,
        E: UrdfSource + ?Sized,
    {
        Self {
            kind,
            base: DocumentSnapshot::capture(base),
            extender: DocumentSnapshot::capture(extender),
        }
    }

    /// What went wrong.
    pub fn kind(&self) -> &ComposeErrorKind {
        &self.kind
    }

    /// Snapshot of the base operand at the moment of failure.
    pub fn base(&self) -> &DocumentSnapshot {
        &self.base
    }

    /// Snapshot of the extender operand at the moment of failure.
    pub fn extender(&self) -> &DocumentSnapshot {
        &self.extender
    }

    /// Write both operand snapshots into a directory as
    /// `base_error.urdf` and `extender_error.urdf`, creating the
    /// directory if needed. Returns the written paths.
    pub fn save_to(&self, dir: impl AsRef<Path>) -> io::Result<(PathBuf, PathBuf)> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let base_path = dir.join("base_error.urdf");
        let extender_path = dir.join("extender_error.urdf");
        std::fs::write(&base_path, self.base.to_xml_string())?;
        std::fs::write(&extender_path, self.extender.to_xml_string())?;
        info!(dir = %dir.display(), "saved failing composition operands");
        Ok((base_path, extender_path))
    }
}

/// The specific failure behind a [`ComposeError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeErrorKind {
    /// No default-convention link was found during resolution.
    #[error("No default {role} link: no top-level link name starts with `{}-`", .role.default_prefix())]
    NoDefaultLink {
        /// Which side of the connection was being resolved.
        role: LinkRole,
    },

    /// An explicitly requested link was not found during resolution.
    #[error("Could not find {role} link `{}-{name}` or `{}-{name}`", .role.regular_prefix(), .role.default_prefix())]
    LinkNotFound {
        /// Which side of the connection was being resolved.
        role: LinkRole,
        /// The requested name, without its convention prefix.
        name: String,
    },

    /// More than one link matched the default convention.
    #[error("Multiple candidate default {role} links: {}", .matches.join(", "))]
    MultipleDefaultLinks {
        /// Which side of the connection was being resolved.
        role: LinkRole,
        /// Every matching link name, in document order.
        matches: Vec<String>,
    },

    /// More than one link matched an explicitly requested name.
    #[error("Multiple matches for {role} link `{name}`: {}", .matches.join(", "))]
    MultipleLinkMatches {
        /// Which side of the connection was being resolved.
        role: LinkRole,
        /// The requested name, without its convention prefix.
        name: String,
        /// Every matching link name, in document order.
        matches: Vec<String>,
    },

    /// The resolved base link is not a top-level link of the base.
    #[error("Unknown base link `{link}`; base document links: {}", .available.join(", "))]
    UnknownBaseLink {
        /// The link that was requested.
        link: String,
        /// Links the base actually has, in document order.
        available: Vec<String>,
    },

    /// The base link has child elements and cannot host a connection.
    #[error("Output link `{link}` is not empty")]
    NonEmptyOutputLink {
        /// The offending link.
        link: String,
    },

    /// The resolved extender link is not a top-level link of the extender.
    #[error("Unknown extender link `{link}`")]
    UnknownExtenderLink {
        /// The link that was requested.
        link: String,
    },

    /// The base link is already the parent of some joint.
    #[error("Output link `{link}` is already the parent of joint `{joint}`")]
    OutputLinkInUse {
        /// The offending link.
        link: String,
        /// The joint already attached to it.
        joint: String,
    },

    /// The extender link is already the child of some joint.
    #[error("Input link `{link}` is already the child of joint `{joint}`")]
    InputLinkInUse {
        /// The offending link.
        link: String,
        /// The joint already attached to it.
        joint: String,
    },
}

impl ComposeErrorKind {
    /// Check if this failure came from connection resolution.
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            ComposeErrorKind::NoDefaultLink { .. }
                | ComposeErrorKind::LinkNotFound { .. }
                | ComposeErrorKind::MultipleDefaultLinks { .. }
                | ComposeErrorKind::MultipleLinkMatches { .. }
        )
    }

    /// Check if this failure came from a connection precondition.
    pub fn is_precondition_failure(&self) -> bool {
        !self.is_resolution_failure()
    }
}

/// A deep copy of one composition operand, captured when a step failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSnapshot {
    /// Diagnostic label of the operand.
    pub label: String,
    /// The operand's element tree at the moment of failure.
    pub root: UrdfElement,
}

impl DocumentSnapshot {
    fn capture<S: UrdfSource + ?Sized>(source: &S) -> Self {
        Self {
            label: source.label().to_string(),
            root: source.root().clone(),
        }
    }

    /// Serialize the captured tree to XML text.
    pub fn to_xml_string(&self) -> String {
        xml::serialize(&self.root)
    }
}

impl fmt::Display for DocumentSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// A collapse over a target set that does not match the composition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollapseError {
    /// A target document is reachable more than once.
    #[error("Document `{label}` ({document}) contributes more than once to the composition")]
    RepeatedDocument {
        /// Identity of the repeated document.
        document: DocumentId,
        /// Its diagnostic label.
        label: String,
    },

    /// A strict collapse found a contributor outside the target set.
    #[error("Document `{label}` ({document}) contributes to the composition but is not a collapse target")]
    UnaccountedDocument {
        /// Identity of the unaccounted document.
        document: DocumentId,
        /// Its diagnostic label.
        label: String,
    },
}

impl CollapseError {
    /// Identity of the document the collapse stumbled over.
    pub fn document(&self) -> DocumentId {
        match self {
            CollapseError::RepeatedDocument { document, .. }
            | CollapseError::UnaccountedDocument { document, .. } => *document,
        }
    }
}

/// Failures while loading, writing or validating documents on disk.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Reading or writing the file failed.
    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        /// The file involved.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The file is not well-formed XML.
    #[error("Failed to parse `{label}`: {source}")]
    Xml {
        /// Diagnostic label of the document.
        label: String,
        /// Position and cause of the parse failure.
        #[source]
        source: XmlError,
    },

    /// The external checker rejected the document.
    #[error(transparent)]
    Check(#[from] CheckUrdfError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::UrdfDocument;

    fn leaf(label: &str) -> UrdfDocument {
        UrdfDocument::parse(label, "<robot name=\"r\"><link name=\"a\" /></robot>").unwrap()
    }

    /// Test the error message names both operands
    #[test]
    fn test_compose_error_display() {
        let err = ComposeError::new(
            ComposeErrorKind::UnknownExtenderLink {
                link: "plug".to_string(),
            },
            &leaf("base_doc"),
            &leaf("ext_doc"),
        );
        let text = err.to_string();
        assert!(text.contains("Unknown extender link `plug`"));
        assert!(text.contains("base `base_doc`"));
        assert!(text.contains("extender `ext_doc`"));
    }

    /// Test resolution messages spell out both accepted prefixes
    #[test]
    fn test_resolution_messages() {
        let err = ComposeErrorKind::LinkNotFound {
            role: LinkRole::Output,
            name: "socket".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Could not find output link `output-socket` or `OUTPUT-socket`"
        );

        let err = ComposeErrorKind::NoDefaultLink {
            role: LinkRole::Input,
        };
        assert_eq!(
            err.to_string(),
            "No default input link: no top-level link name starts with `INPUT-`"
        );
    }

    /// Test failure classification predicates
    #[test]
    fn test_kind_classification() {
        let resolution = ComposeErrorKind::MultipleDefaultLinks {
            role: LinkRole::Output,
            matches: vec!["OUTPUT-a".to_string(), "OUTPUT-b".to_string()],
        };
        assert!(resolution.is_resolution_failure());
        assert!(!resolution.is_precondition_failure());

        let precondition = ComposeErrorKind::NonEmptyOutputLink {
            link: "a".to_string(),
        };
        assert!(precondition.is_precondition_failure());
        assert!(!precondition.is_resolution_failure());
    }

    /// Test snapshots are written out for inspection
    #[test]
    fn test_save_to() {
        let err = ComposeError::new(
            ComposeErrorKind::UnknownBaseLink {
                link: "nope".to_string(),
                available: vec!["a".to_string()],
            },
            &leaf("base_doc"),
            &leaf("ext_doc"),
        );
        let dir = tempfile::tempdir().unwrap();
        let (base_path, extender_path) = err.save_to(dir.path().join("errors")).unwrap();
        let base_text = std::fs::read_to_string(&base_path).unwrap();
        assert!(base_text.contains("<link name=\"a\" />"));
        assert!(extender_path.ends_with("extender_error.urdf"));
    }

    /// Test collapse errors expose the offending identity
    #[test]
    fn test_collapse_error_document() {
        let id = DocumentId::new();
        let err = CollapseError::RepeatedDocument {
            document: id,
            label: "rod".to_string(),
        };
        assert_eq!(err.document(), id);
        assert!(err.to_string().contains("`rod`"));
    }
}
