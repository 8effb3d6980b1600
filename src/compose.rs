// Copyright 2025 Cowboy AI, LLC.

//! Tree-shaped composition
//!
//! [`branch`] attaches any number of extenders onto one base;
//! [`sequence`] chains documents end to end. Both accept leaf documents,
//! composed documents, or the result of an earlier step, so a failure
//! deep inside a larger composition flows through and surfaces once at
//! the end.

use std::path::Path;

use tracing::{debug, info};

use crate::checker::{self, CheckerConfig};
use crate::composed::ComposedUrdf;
use crate::connect::connect;
use crate::document::{UrdfDocument, UrdfSource};
use crate::element::UrdfElement;
use crate::errors::{ComposeError, ComposeResult, DocumentError};
use crate::resolve::{resolve_connection, Connection, ResolvedConnection};
use crate::xml;

/// One composition operand: a leaf document, a composed document, or the
/// outcome of an earlier step.
#[derive(Debug)]
pub enum ComposeInput<'a> {
    /// A borrowed leaf document.
    Leaf(&'a UrdfDocument),
    /// A composed document, attached as a single contributor.
    Composed(ComposedUrdf),
    /// A failed earlier step, propagated unchanged.
    Failed(ComposeError),
}

impl<'a> ComposeInput<'a> {
    /// Wrap the operand as a fresh composition, or propagate its error.
    fn into_composed(self) -> ComposeResult<ComposedUrdf> {
        Ok(match self.split()? {
            ReadyInput::Leaf(doc) => ComposedUrdf::construct(doc),
            ReadyInput::Composed(composed) => ComposedUrdf::construct(&composed),
        })
    }

    fn split(self) -> ComposeResult<ReadyInput<'a>> {
        match self {
            ComposeInput::Leaf(doc) => Ok(ReadyInput::Leaf(doc)),
            ComposeInput::Composed(composed) => Ok(ReadyInput::Composed(composed)),
            ComposeInput::Failed(error) => Err(error),
        }
    }
}

/// A non-failed operand, borrowable as a source.
enum ReadyInput<'a> {
    Leaf(&'a UrdfDocument),
    Composed(ComposedUrdf),
}

impl ReadyInput<'_> {
    fn as_source(&self) -> &dyn UrdfSource {
        match self {
            ReadyInput::Leaf(doc) => *doc,
            ReadyInput::Composed(composed) => composed,
        }
    }
}

impl<'a> From<&'a UrdfDocument> for ComposeInput<'a> {
    fn from(doc: &'a UrdfDocument) -> Self {
        ComposeInput::Leaf(doc)
    }
}

impl From<ComposedUrdf> for ComposeInput<'_> {
    fn from(composed: ComposedUrdf) -> Self {
        ComposeInput::Composed(composed)
    }
}

impl From<&ComposedUrdf> for ComposeInput<'_> {
    fn from(composed: &ComposedUrdf) -> Self {
        // Composition never mutates its operands; borrowing a composed
        // document costs one copy here.
        ComposeInput::Composed(composed.clone())
    }
}

impl From<ComposeResult<ComposedUrdf>> for ComposeInput<'_> {
    fn from(result: ComposeResult<ComposedUrdf>) -> Self {
        match result {
            Ok(composed) => ComposeInput::Composed(composed),
            Err(error) => ComposeInput::Failed(error),
        }
    }
}

/// An extender to attach: the operand plus the requested connection.
#[derive(Debug)]
pub struct ChildSpec<'a> {
    /// Document or earlier result to attach.
    pub input: ComposeInput<'a>,
    /// Requested connection; [`Connection::default`] selects the
    /// `OUTPUT-`/`INPUT-` default links on both sides.
    pub connection: Connection,
}

impl<'a> ChildSpec<'a> {
    /// Attach an operand over an explicit connection.
    pub fn new(input: impl Into<ComposeInput<'a>>, connection: Connection) -> Self {
        Self {
            input: input.into(),
            connection,
        }
    }
}

impl<'a> From<ComposeInput<'a>> for ChildSpec<'a> {
    fn from(input: ComposeInput<'a>) -> Self {
        Self {
            input,
            connection: Connection::default(),
        }
    }
}

impl<'a> From<&'a UrdfDocument> for ChildSpec<'a> {
    fn from(doc: &'a UrdfDocument) -> Self {
        ComposeInput::from(doc).into()
    }
}

impl From<ComposedUrdf> for ChildSpec<'_> {
    fn from(composed: ComposedUrdf) -> Self {
        ComposeInput::from(composed).into()
    }
}

impl<'a> From<&'a ComposedUrdf> for ChildSpec<'a> {
    fn from(composed: &'a ComposedUrdf) -> Self {
        ComposeInput::from(composed).into()
    }
}

impl From<ComposeResult<ComposedUrdf>> for ChildSpec<'_> {
    fn from(result: ComposeResult<ComposedUrdf>) -> Self {
        ComposeInput::from(result).into()
    }
}

impl<'a> From<(&'a UrdfDocument, Connection)> for ChildSpec<'a> {
    fn from((doc, connection): (&'a UrdfDocument, Connection)) -> Self {
        ChildSpec::new(doc, connection)
    }
}

impl From<(ComposedUrdf, Connection)> for ChildSpec<'_> {
    fn from((composed, connection): (ComposedUrdf, Connection)) -> Self {
        ChildSpec::new(composed, connection)
    }
}

impl<'a> From<(&'a ComposedUrdf, Connection)> for ChildSpec<'a> {
    fn from((composed, connection): (&'a ComposedUrdf, Connection)) -> Self {
        ChildSpec::new(composed, connection)
    }
}

impl From<(ComposeResult<ComposedUrdf>, Connection)> for ChildSpec<'_> {
    fn from((result, connection): (ComposeResult<ComposedUrdf>, Connection)) -> Self {
        ChildSpec::new(result, connection)
    }
}

/// Attach each child onto `base`, in order.
///
/// All connections are resolved against the original base before any
/// child is attached, so several children can consume different output
/// links of the same base. The base and every child are wrapped as
/// fresh contributors, which is what makes attaching the same document
/// at several places legal. The first failed operand, failed
/// resolution or failed connection fails the whole call.
pub fn branch<'a, C>(
    base: impl Into<ComposeInput<'a>>,
    children: impl IntoIterator<Item = C>,
) -> ComposeResult<ComposedUrdf>
where
    C: Into<ChildSpec<'a>>,
{
    let base = base.into().split()?;
    let mut prepared: Vec<(ComposedUrdf, ResolvedConnection)> = Vec::new();
    for child in children {
        let child = child.into();
        let wrapped = child.input.into_composed()?;
        let resolved = resolve_connection(base.as_source(), &wrapped, &child.connection)?;
        prepared.push((wrapped, resolved));
    }
    debug!(
        base = base.as_source().label(),
        children = prepared.len(),
        "attaching children onto base"
    );
    let mut result = ComposedUrdf::construct(base.as_source());
    for (child, conn) in &prepared {
        result = connect(&result, child, conn)?;
    }
    Ok(result)
}

/// Chain documents end to end: the first child attaches onto the base,
/// the second onto that result, and so on.
///
/// Each child's connection joins the output link of everything composed
/// so far to that child's input link. Built as nested [`branch`] steps,
/// so every intermediate result becomes one composed contributor of the
/// next and a collapse can see through the whole chain.
pub fn sequence<'a, C>(
    base: impl Into<ComposeInput<'a>>,
    children: impl IntoIterator<Item = C>,
) -> ComposeResult<ComposedUrdf>
where
    C: Into<ChildSpec<'a>>,
{
    let mut rest: Vec<ChildSpec<'a>> = children.into_iter().map(Into::into).collect();
    if rest.is_empty() {
        return base.into().into_composed();
    }
    let first = rest.remove(0);
    let tail = sequence(first.input, rest);
    branch(base, [ChildSpec::new(tail, first.connection)])
}

/// Write a document to disk, filling in missing inertials, and validate
/// the file with the external checker when the policy calls for it.
///
/// URDF consumers reject links without an `<inertial>`, so every link
/// except one named `world` gets a zero mass and inertia stub in the
/// written file. The in-memory document is not modified.
pub fn write_and_check_urdf<S>(
    source: &S,
    dest: impl AsRef<Path>,
    config: &CheckerConfig,
) -> Result<(), DocumentError>
where
    S: UrdfSource + ?Sized,
{
    let dest = dest.as_ref();
    let mut root = source.root().clone();
    ensure_inertials(&mut root);
    std::fs::write(dest, xml::serialize(&root)).map_err(|error| DocumentError::Io {
        path: dest.to_path_buf(),
        source: error,
    })?;
    info!(path = %dest.display(), label = source.label(), "wrote document");
    if config.policy.should_check() {
        checker::check_urdf(dest, config)?;
    }
    Ok(())
}

/// Give every link except `world` an inertial, defaulting to zero mass.
fn ensure_inertials(root: &mut UrdfElement) {
    for element in root.children_mut() {
        if element.tag() != "link" || element.name() == Some("world") {
            continue;
        }
        if element.find_child("inertial").is_some() {
            continue;
        }
        element.children_mut().push(
            UrdfElement::new("inertial")
                .with_child(
                    UrdfElement::new("origin")
                        .with_attribute("xyz", "0 0 0")
                        .with_attribute("rpy", "0 0 0"),
                )
                .with_child(UrdfElement::new("mass").with_attribute("value", "0"))
                .with_child(
                    UrdfElement::new("inertia")
                        .with_attribute("ixx", "0")
                        .with_attribute("ixy", "0")
                        .with_attribute("ixz", "0")
                        .with_attribute("iyy", "0")
                        .with_attribute("iyz", "0")
                        .with_attribute("izz", "0"),
                ),
        );
    }
}
