use std::env;
use std::path::Path;

fn main() {
    println!("cargo:rerun-if-changed=linker.ld");

    // Host builds of the workspace produce a stub binary; only the bare
    // metal image gets the kernel layout.
    if env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("none") {
        return;
    }
    let script = Path::new(env!("CARGO_MANIFEST_DIR")).join("linker.ld");
    println!("cargo:rustc-link-arg-bins=-T{}", script.display());
}
