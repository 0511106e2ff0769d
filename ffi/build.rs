use std::env;
use std::path::PathBuf;

/// Regenerate `include/http_response.h` from the `extern "C"` surface.
fn main() {
    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=src/types.rs");

    let Ok(crate_dir) = env::var("CARGO_MANIFEST_DIR") else {
        println!("cargo:warning=CARGO_MANIFEST_DIR not set, skipping header generation");
        return;
    };
    let include_dir = PathBuf::from(&crate_dir).join("include");
    if let Err(err) = std::fs::create_dir_all(&include_dir) {
        println!("cargo:warning=cannot create {}: {err}", include_dir.display());
        return;
    }
    let header = include_dir.join("http_response.h");

    let generated = cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("HTTP_RESPONSE_H")
        .with_documentation(true)
        .generate();
    match generated {
        Ok(bindings) => {
            bindings.write_to_file(header);
        }
        // a stale or missing header must not break the Rust build
        Err(err) => println!("cargo:warning=cbindgen failed: {err}"),
    }
}
