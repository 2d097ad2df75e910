use std::env;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // libgit2 reads the Windows registry and ACLs through advapi32.
    if env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("windows") {
        println!("cargo:rustc-link-lib=advapi32");
    }
}
