//! # Types
//!
//! Platform-agnostic types used throughout framewalk.
//!
//! These keep backend details (ptrace, mock backends in tests) out of the
//! walker and the resolver: both only deal in addresses, frames and matches.

pub mod address;
pub mod process;
pub mod stack;
pub mod symbols;

// Re-export all public types
pub use address::Address;
pub use process::{Architecture, MemoryRegion, ProcessId, ThreadId};
pub use stack::{FrameLink, StackFrame, WalkEnd};
pub use symbols::{SymbolLanguage, SymbolMatch, SymbolName};
