use std::env;
use std::path::PathBuf;

/// Directory for `findify.h` when the host wants it outside `OUT_DIR`.
const HEADER_DIR_VAR: &str = "FINDIFY_FFI_HEADER_DIR";

fn main() {
    println!("cargo:rerun-if-changed=src");
    println!("cargo:rerun-if-env-changed={HEADER_DIR_VAR}");

    let crate_dir = env::var("CARGO_MANIFEST_DIR").map(PathBuf::from).unwrap_or_default();
    let Some(out_dir) = env::var_os(HEADER_DIR_VAR)
        .or_else(|| env::var_os("OUT_DIR"))
        .map(PathBuf::from)
    else {
        println!("cargo:warning=no output directory for findify.h");
        return;
    };

    match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("FINDIFY_H")
        .generate()
    {
        Ok(bindings) => {
            let header = out_dir.join("findify.h");
            if let Err(e) = std::fs::create_dir_all(&out_dir) {
                println!("cargo:warning=cannot create {}: {e}", out_dir.display());
                return;
            }
            bindings.write_to_file(&header);
            println!("cargo:rustc-env=FINDIFY_HEADER={}", header.display());
        }
        // Header generation is best-effort.
        Err(e) => println!("cargo:warning=cbindgen skipped header generation: {e}"),
    }
}
