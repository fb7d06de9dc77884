use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=src/types.rs");

    let crate_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR unavailable, skipping header: {e}");
            return;
        }
    };
    let header = crate_dir.join("include").join("snapreq.h");

    let generated = cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("SNAPREQ_H")
        .with_cpp_compat(true)
        .with_documentation(true)
        .generate();

    match generated {
        Ok(bindings) => {
            if let Some(dir) = header.parent() {
                if let Err(e) = std::fs::create_dir_all(dir) {
                    println!("cargo:warning=could not create {}: {e}", dir.display());
                    return;
                }
            }
            bindings.write_to_file(&header);
        }
        Err(e) => println!("cargo:warning=header generation failed: {e}"),
    }
}
