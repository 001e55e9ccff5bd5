//! # Platform-Specific Implementations
//!
//! Each platform implements [`DebugBackend`](crate::backend::DebugBackend)
//! with its native debugging API:
//!
//! - **Linux** (x86-64, AArch64): `ptrace` and `/proc`
//!   - See: [ptrace(2) man page](https://man7.org/linux/man-pages/man2/ptrace.2.html)
//!
//! Other platforms get `Unsupported` from
//! [`create_backend`](crate::backend::create_backend).

#[cfg(all(target_os = "linux", any(target_arch = "x86_64", target_arch = "aarch64")))]
pub mod linux;
