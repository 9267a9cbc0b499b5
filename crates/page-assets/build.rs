// build.rs — page-assets
//
// Walks the `assets/` directory and generates a Rust source file in OUT_DIR
// that embeds every file with `include_bytes!`, keyed by its path relative
// to `assets/` using forward slashes (e.g. `css/markdown.css`).

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

fn main() {
    let manifest_dir =
        PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set"));
    let assets_dir = manifest_dir.join("assets");

    // Rerun when any packaged file is added, removed or edited.
    println!("cargo:rerun-if-changed={}", assets_dir.display());

    let mut files = Vec::new();
    collect_files(&assets_dir, &mut files);
    files.sort();

    let mut source = String::from("pub(crate) static BUNDLED: &[(&str, &[u8])] = &[\n");
    for path in &files {
        let relative = path
            .strip_prefix(&assets_dir)
            .expect("asset path outside assets dir")
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        println!("cargo:rerun-if-changed={}", path.display());
        writeln!(
            source,
            "    ({:?}, include_bytes!({:?})),",
            relative,
            path.to_string_lossy()
        )
        .expect("write to String");
    }
    source.push_str("];\n");

    let out_dir = PathBuf::from(std::env::var("OUT_DIR").expect("OUT_DIR not set"));
    std::fs::write(out_dir.join("bundled_assets.rs"), source).unwrap_or_else(|e| {
        panic!("page-assets: failed to write bundled_assets.rs: {e}");
    });
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let entries = std::fs::read_dir(dir)
        .unwrap_or_else(|e| panic!("page-assets: cannot read {}: {e}", dir.display()));
    for entry in entries {
        let path = entry
            .unwrap_or_else(|e| panic!("page-assets: bad entry in {}: {e}", dir.display()))
            .path();
        if path.is_dir() {
            collect_files(&path, out);
        } else {
            out.push(path);
        }
    }
}
