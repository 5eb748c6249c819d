use std::env;
use std::path::PathBuf;

use anyhow::Result;
use fs_extra::copy_items;
use fs_extra::dir::CopyOptions;

// Stage the artifact files next to the compiled binary so native runs find
// them under ./assets/ without any serving setup.
fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=assets/*");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let assets_src = manifest_dir.join("assets");
    if !assets_src.exists() {
        // Nothing to stage; the viewer will report missing assets at load time.
        return Ok(());
    }

    let out_dir = env::var("OUT_DIR")?;
    let mut copy_options = CopyOptions::new();
    copy_options.overwrite = true;
    copy_items(&["assets/"], out_dir, &copy_options)?;

    Ok(())
}
