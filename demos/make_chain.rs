//! Chain Assembly - URDF Compose
//!
//! Loads the rod segment three times and chains the copies end to end,
//! then writes the combined robot into the system temp directory.
//!
//! Key concepts demonstrated:
//! - Loading URDF files with external validation disabled
//! - Chaining documents through the default OUTPUT-/INPUT- links
//! - Collapsing the name map to see what every part is called now

use std::path::Path;

use urdf_compose::{sequence, write_and_check_urdf, CheckerConfig, UrdfDocument, UrdfSource};

fn main() -> anyhow::Result<()> {
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos");
    let config = CheckerConfig::disabled();

    let first = UrdfDocument::from_file_with(fixtures.join("rod.urdf"), &config)?;
    let second = UrdfDocument::from_file_with(fixtures.join("rod.urdf"), &config)?;
    let third = UrdfDocument::from_file_with(fixtures.join("rod.urdf"), &config)?;
    println!("Loaded three copies of `{}`", first.label());

    println!("\n=== Chaining ===");
    let chain = sequence(&first, [&second, &third])?;
    println!(
        "✓ Composed {} top-level elements",
        chain.root().children().len()
    );

    let map = chain.name_map().collapse_strict([&first, &second, &third])?;
    for doc in [&first, &second, &third] {
        let joint = map.lookup(doc, "joint").unwrap_or("<dropped>");
        println!("  joint of {} is now `{joint}`", doc.id());
    }

    let out = std::env::temp_dir().join("urdf-compose-chain.urdf");
    write_and_check_urdf(&chain, &out, &config)?;
    println!("\n✅ Wrote {}", out.display());
    Ok(())
}
