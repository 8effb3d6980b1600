// Copyright 2025 Cowboy AI, LLC.

//! Connection resolution
//!
//! A [`Connection`] names the two links a composition step should join,
//! without their convention prefixes; resolution finds the actual links.
//! An explicitly requested link matches `output-<name>` or
//! `OUTPUT-<name>` on the base side (`input-`/`INPUT-` on the extender
//! side). When no name is given, the side must have exactly one link
//! carrying the upper-case default prefix. Anything other than exactly
//! one match is an error.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::UrdfSource;
use crate::errors::{ComposeError, ComposeErrorKind, ComposeResult};

/// Which side of a connection a link belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkRole {
    /// The base side: the link the extender is mounted onto.
    Output,
    /// The extender side: the link mounted onto the base.
    Input,
}

impl LinkRole {
    /// Prefix for explicitly requested links, e.g. `output-socket`.
    pub fn regular_prefix(self) -> &'static str {
        match self {
            LinkRole::Output => "output",
            LinkRole::Input => "input",
        }
    }

    /// Prefix that marks a link as the side's default, e.g.
    /// `OUTPUT-socket`.
    pub fn default_prefix(self) -> &'static str {
        match self {
            LinkRole::Output => "OUTPUT",
            LinkRole::Input => "INPUT",
        }
    }
}

impl fmt::Display for LinkRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.regular_prefix())
    }
}

/// The requested links of one composition step, without their
/// convention prefixes. `None` on either side selects that side's single
/// default-prefixed link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Output link of the base, without prefix.
    pub base_link: Option<String>,
    /// Input link of the extender, without prefix.
    pub extender_link: Option<String>,
}

impl Connection {
    /// Request both links explicitly.
    pub fn between(base_link: impl Into<String>, extender_link: impl Into<String>) -> Self {
        Self {
            base_link: Some(base_link.into()),
            extender_link: Some(extender_link.into()),
        }
    }

    /// Request the base's output link explicitly, keeping the extender
    /// input on the default convention.
    pub fn from_output(base_link: impl Into<String>) -> Self {
        Self {
            base_link: Some(base_link.into()),
            extender_link: None,
        }
    }

    /// Request the extender's input link explicitly, keeping the base
    /// output on the default convention.
    pub fn into_input(extender_link: impl Into<String>) -> Self {
        Self {
            base_link: None,
            extender_link: Some(extender_link.into()),
        }
    }
}

/// A fully resolved connection: actual top-level link names on both
/// sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedConnection {
    /// Actual output link name in the base.
    pub base_link: String,
    /// Actual input link name in the extender.
    pub extender_link: String,
}

impl ResolvedConnection {
    /// Pair two already-known link names.
    pub fn new(base_link: impl Into<String>, extender_link: impl Into<String>) -> Self {
        Self {
            base_link: base_link.into(),
            extender_link: extender_link.into(),
        }
    }
}

/// Resolve a connection against a base and an extender document.
pub fn resolve_connection<B, E>(
    base: &B,
    extender: &E,
    conn: &Connection,
) -> ComposeResult<ResolvedConnection>
where
    B: UrdfSource + ?Sized,
    E: UrdfSource + ?Sized,
{
    let base_link = resolve_link(base, LinkRole::Output, conn.base_link.as_deref())
        .map_err(|kind| ComposeError::new(kind, base, extender))?;
    let extender_link = resolve_link(extender, LinkRole::Input, conn.extender_link.as_deref())
        .map_err(|kind| ComposeError::new(kind, base, extender))?;
    debug!(base_link = %base_link, extender_link = %extender_link, "resolved connection");
    Ok(ResolvedConnection {
        base_link,
        extender_link,
    })
}

fn resolve_link<S: UrdfSource + ?Sized>(
    doc: &S,
    role: LinkRole,
    requested: Option<&str>,
) -> Result<String, ComposeErrorKind> {
    let default_prefix = format!("{}-", role.default_prefix());
    let wanted = requested.map(|name| {
        (
            format!("{}-{name}", role.regular_prefix()),
            format!("{}-{name}", role.default_prefix()),
        )
    });
    let mut matches = Vec::new();
    for element in doc.root().children() {
        if element.tag() != "link" {
            continue;
        }
        let Some(name) = element.name() else { continue };
        let hit = match &wanted {
            Some((regular, default)) => name == regular || name == default,
            None => name.starts_with(&default_prefix),
        };
        if hit {
            matches.push(name.to_string());
        }
    }
    match (matches.len(), requested) {
        (1, _) => Ok(matches.swap_remove(0)),
        (0, Some(name)) => Err(ComposeErrorKind::LinkNotFound {
            role,
            name: name.to_string(),
        }),
        (0, None) => Err(ComposeErrorKind::NoDefaultLink { role }),
        (_, Some(name)) => Err(ComposeErrorKind::MultipleLinkMatches {
            role,
            name: name.to_string(),
            matches,
        }),
        (_, None) => Err(ComposeErrorKind::MultipleDefaultLinks { role, matches }),
    }
}
