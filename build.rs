// Simple build script that copies static assets to `dist/`. The wasm bundle
// itself is produced separately with `wasm-pack build --target web --out-dir dist/pkg`.
use std::{env, fs, path::Path};

use fs_extra::dir::{copy, CopyOptions};

fn main() {
    println!("cargo:rerun-if-changed=static");

    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let root = Path::new(&manifest_dir);
    let static_dir = root.join("static");
    let out_dir = root.join("dist");

    if !static_dir.exists() {
        println!("cargo:warning=no static/ directory – skipping site copy");
        return;
    }

    // Keep a previously built `dist/pkg` so the page still loads after an
    // asset-only change.
    if let Err(err) = fs::create_dir_all(&out_dir) {
        println!("cargo:warning=cannot create dist/: {err}");
        return;
    }

    let options = CopyOptions::new().overwrite(true).content_only(true);
    if let Err(err) = copy(&static_dir, &out_dir, &options) {
        println!("cargo:warning=copying static/ to dist/ failed: {err}");
    }
}
