//! Regenerates `include/altgpu.h` from the `extern "C"` surface.

use std::env;
use std::fs;
use std::path::Path;

const HEADER: &str = "altgpu.h";

fn main() {
    println!("cargo:rerun-if-changed=cbindgen.toml");
    println!("cargo:rerun-if-changed=src");

    let manifest_dir = env::var("CARGO_MANIFEST_DIR").expect("cargo sets CARGO_MANIFEST_DIR");
    let root = Path::new(&manifest_dir);

    let config = cbindgen::Config::from_file(root.join("cbindgen.toml"))
        .unwrap_or_else(|e| panic!("reading cbindgen.toml: {e}"));
    let bindings = match cbindgen::generate_with_config(root, config) {
        Ok(bindings) => bindings,
        Err(e) => panic!("generating {HEADER}: {e}"),
    };

    let include = root.join("include");
    fs::create_dir_all(&include).unwrap_or_else(|e| panic!("creating {}: {e}", include.display()));
    bindings.write_to_file(include.join(HEADER));
}
