//! # URDF Compose
//!
//! Composition of URDF robot descriptions from reusable parts.
//!
//! This crate joins URDF documents into larger robots while tracking what
//! every element ends up being called:
//! - **Documents**: Parsed URDF trees with a stable identity per load
//! - **Connections**: `OUTPUT-`/`INPUT-` link conventions resolved to a
//!   concrete pair of links
//! - **Composition**: [`branch`] and [`sequence`] joining documents with
//!   synthesized fixed joints
//! - **Name Maps**: Per-contributor tables from original names to the
//!   names in the composed tree
//! - **Collapse**: Flattening nested compositions down to a chosen set of
//!   leaf documents
//!
//! ## Composition Model
//!
//! 1. **Identity over content**: Contributors are tracked by document id,
//!    so the same file loaded twice composes as two distinct parts
//! 2. **Inputs untouched**: Every operation copies its operands; a failed
//!    step never corrupts the documents that fed it
//! 3. **Deterministic naming**: Clashes resolve to `name(1)`, `name(2)`,
//!    taking the first free suffix
//! 4. **Errors carry both sides**: A failed composition keeps full copies
//!    of base and extender for inspection
//!
//! ## Example
//!
//! ```
//! use urdf_compose::{sequence, UrdfDocument};
//!
//! let rod = r#"<robot name="rod">
//!   <link name="INPUT-plug" />
//!   <link name="OUTPUT-socket" />
//!   <joint name="joint" type="fixed">
//!     <parent link="INPUT-plug" />
//!     <child link="OUTPUT-socket" />
//!   </joint>
//! </robot>"#;
//! let first = UrdfDocument::parse("first", rod)?;
//! let second = UrdfDocument::parse("second", rod)?;
//!
//! let composed = sequence(&first, [&second])?;
//! let map = composed.name_map().collapse_strict([&first, &second])?;
//! assert_eq!(map.lookup(&first, "joint"), Some("joint"));
//! assert_eq!(map.lookup(&second, "joint"), Some("joint(1)"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]

mod checker;
mod compose;
mod composed;
mod connect;
mod document;
mod element;
mod errors;
mod name_map;
mod resolve;
mod xml;

// Re-export core types
pub use composed::ComposedUrdf;
pub use document::{DocumentId, UrdfDocument, UrdfSource};
pub use element::UrdfElement;
pub use name_map::{ComposedNameMap, NameOrigin, SourceTable};

// Composition operations
pub use compose::{branch, sequence, write_and_check_urdf, ChildSpec, ComposeInput};
pub use connect::{connect, CONNECTED_PREFIX, GENERATED_JOINT_NAME};
pub use resolve::{resolve_connection, Connection, LinkRole, ResolvedConnection};

// Errors and validation
pub use checker::{check_urdf, CheckUrdfError, CheckerConfig, ValidationPolicy};
pub use errors::{
    CollapseError, ComposeError, ComposeErrorKind, ComposeResult, DocumentError, DocumentSnapshot,
};
pub use xml::XmlError;
