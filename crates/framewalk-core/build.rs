//! Build script for framewalk-core
//!
//! Checks the toolchain and warns when building for a platform without a
//! debug backend.
//!
//! ## Requirements
//!
//! - **Rust**: 1.74.0 or newer (workspace lints, let-else)
//! - **Linux** on x86-64 or AArch64 for the ptrace backend

fn main()
{
    println!("cargo:rerun-if-changed=build.rs");

    match rustc_version::version() {
        Ok(found) => {
            let required = rustc_version::Version::new(1, 74, 0);
            if found < required {
                panic!("framewalk-core requires Rust {required} or newer, found {found}");
            }
        }
        Err(_) => println!("cargo:warning=could not verify Rust version"),
    }

    // Cargo exposes the target, not the host, through these variables.
    let os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let arch = std::env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();
    if os != "linux" || !matches!(arch.as_str(), "x86_64" | "aarch64") {
        println!("cargo:warning=no debug backend for {os}/{arch}; framewalk will report Unsupported at runtime");
    }
}
