//! # framewalk-core
//!
//! Attach to a single thread, walk its frame-pointer chain and name each
//! frame.
//!
//! This crate provides:
//! - A [`DebugBackend`] trait over the OS debugging API, and a ptrace backend
//! - [`DebugSession`]: scoped attach/detach with exactly-once cleanup
//! - [`FrameWalker`]: the bounded frame chain walk
//! - [`Resolver`]: symbol, then memory region, lookup for return addresses
//! - [`Tracer`]: one complete run, printing a frame per line
//!
//! ## Platform Support
//!
//! - **Linux** (x86-64, AArch64): `ptrace` plus `/proc`
//! - Elsewhere [`create_backend`] returns `Unsupported`
//!
//! ## Why unsafe code is needed
//!
//! `ptrace` and `waitpid` are raw system calls. They are wrapped in safe
//! functions in `platform::linux`; nothing else in the crate uses `unsafe`.

#![allow(unsafe_code)] // ptrace/waitpid in platform::linux

pub mod backend;
pub mod error;
pub mod platform;
pub mod report;
pub mod session;
pub mod settle;
pub mod symbols;
pub mod tracer;
pub mod types;
pub mod walker;

pub use backend::{create_backend, DebugBackend};
pub use error::{FramewalkError, FramewalkResult};
pub use report::FrameFormatter;
pub use session::DebugSession;
pub use settle::SettlePolicy;
pub use symbols::{Resolver, SymbolIndex};
pub use tracer::{TraceOptions, TraceOutcome, TraceSummary, Tracer};
pub use types::{Address, StackFrame, ThreadId};
pub use walker::{FrameWalker, MAX_FRAMES};
