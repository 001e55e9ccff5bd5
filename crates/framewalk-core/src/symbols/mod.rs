//! # Symbols
//!
//! Address to symbol resolution for frame lines.
//!
//! - [`LoadedImage`] / [`RawSymbol`]: what a backend reports about the target's images
//! - [`SymbolIndex`]: the lookup context built from them once per session
//! - [`Resolver`]: exact symbol, nearest symbol, containing region, or nothing
//! - [`Demangle`]: the injectable name demangling capability

mod demangle;
mod image;
mod index;
mod resolver;

pub use demangle::{Demangle, ItaniumDemangler, NativeDemangler, NoDemangle, RustcDemangler};
pub use image::{LoadedImage, RawSymbol};
pub use index::SymbolIndex;
pub use resolver::Resolver;
