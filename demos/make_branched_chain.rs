//! Branched Assembly - URDF Compose
//!
//! Attaches two rods onto a forked segment: one at the default output
//! link, one at the explicitly named sideways output.
//!
//! Key concepts demonstrated:
//! - Selecting non-default links with an explicit Connection
//! - Attaching several extenders onto one base with branch
//! - Inspecting renames through the composed name map

use std::path::Path;

use urdf_compose::{
    branch, write_and_check_urdf, CheckerConfig, ChildSpec, Connection, UrdfDocument, UrdfSource,
};

fn main() -> anyhow::Result<()> {
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos");
    let config = CheckerConfig::disabled();

    let trunk = UrdfDocument::from_file_with(fixtures.join("v_rod.urdf"), &config)?;
    let straight = UrdfDocument::from_file_with(fixtures.join("rod.urdf"), &config)?;
    let sideways = UrdfDocument::from_file_with(fixtures.join("rod.urdf"), &config)?;

    println!("=== Branching ===");
    let tree = branch(
        &trunk,
        [
            ChildSpec::from(&straight),
            ChildSpec::new(&sideways, Connection::from_output("sideways")),
        ],
    )?;
    println!(
        "✓ Attached two rods, {} top-level elements",
        tree.root().children().len()
    );

    let map = tree
        .name_map()
        .collapse_strict([&trunk, &straight, &sideways])?;
    for (label, doc) in [
        ("trunk", &trunk),
        ("straight rod", &straight),
        ("sideways rod", &sideways),
    ] {
        let plug = map.lookup(doc, "INPUT-plug").unwrap_or("<dropped>");
        println!("  {label}: INPUT-plug is now `{plug}`");
    }

    let out = std::env::temp_dir().join("urdf-compose-branched.urdf");
    write_and_check_urdf(&tree, &out, &config)?;
    println!("\n✅ Wrote {}", out.display());
    Ok(())
}
