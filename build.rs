use anyhow::*;
use fs_extra::copy_items;
use fs_extra::dir::CopyOptions;
use std::env;
use std::path::Path;

// Copies the `assets` folder (the .glb models) next to the build output
// so native runs can read them. The web build fetches them over HTTP instead.
fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=assets/*");

    if !Path::new("assets").is_dir() {
        return Ok(());
    }

    let out_dir = env::var("OUT_DIR")?;
    let mut copy_options = CopyOptions::new();
    copy_options.overwrite = true;
    let paths_to_copy = vec!["assets/"];
    copy_items(&paths_to_copy, out_dir, &copy_options)?;

    Ok(())
}
