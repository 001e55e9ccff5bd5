//! Symbol demangling.
//!
//! Compilers mangle symbol names to encode namespaces and types. How to undo
//! that depends on the toolchain, so demangling is a capability handed to the
//! [`SymbolIndex`](super::SymbolIndex) rather than something it hardcodes:
//!
//! - [`NativeDemangler`]: Rust first, then Itanium C++ (the default)
//! - [`RustcDemangler`]: Rust legacy and v0 mangling via `rustc_demangle`
//! - [`ItaniumDemangler`]: C++ names via `cpp_demangle`
//! - [`NoDemangle`]: keep raw names
//! - any `Fn(&str) -> Option<String>` closure
//!
//! ## Language Detection
//!
//! - Rust symbols: start with `_R`, contain `::`, or are `_ZN` names that demangle as Rust
//! - C++ symbols: start with `_Z`
//! - C symbols: everything else that looks like a plain identifier

use cpp_demangle::{DemangleOptions, ParseOptions};
use rustc_demangle::try_demangle;

use crate::types::{SymbolLanguage, SymbolName};

/// Maps a raw linkage name to a display name.
pub trait Demangle
{
    /// Demangled form of `raw`, or `None` to keep it as is.
    fn demangle(&self, raw: &str) -> Option<String>;
}

impl<F> Demangle for F
where
    F: Fn(&str) -> Option<String>,
{
    fn demangle(&self, raw: &str) -> Option<String>
    {
        self(raw)
    }
}

/// Rust demangler backed by `rustc_demangle`, without the trailing hash.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustcDemangler;

impl Demangle for RustcDemangler
{
    fn demangle(&self, raw: &str) -> Option<String>
    {
        try_demangle(raw).ok().map(|d| format!("{d:#}"))
    }
}

/// Itanium ABI (g++, clang++) demangler backed by `cpp_demangle`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItaniumDemangler;

/// Deeply nested templates can otherwise exhaust the stack.
const CPP_RECURSION_LIMIT: u32 = 1000;

impl Demangle for ItaniumDemangler
{
    fn demangle(&self, raw: &str) -> Option<String>
    {
        if !raw.starts_with("_Z") {
            return None;
        }
        let symbol = cpp_demangle::BorrowedSymbol::new_with_options(
            raw.as_bytes(),
            &ParseOptions::default().recursion_limit(CPP_RECURSION_LIMIT),
        )
        .ok()?;
        symbol
            .demangle(&DemangleOptions::default().recursion_limit(CPP_RECURSION_LIMIT))
            .ok()
    }
}

/// Rust names via [`RustcDemangler`], anything else via [`ItaniumDemangler`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeDemangler;

impl Demangle for NativeDemangler
{
    fn demangle(&self, raw: &str) -> Option<String>
    {
        RustcDemangler
            .demangle(raw)
            .or_else(|| ItaniumDemangler.demangle(raw))
    }
}

/// Keeps every name as emitted by the compiler.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDemangle;

impl Demangle for NoDemangle
{
    fn demangle(&self, _raw: &str) -> Option<String>
    {
        None
    }
}

/// Build a [`SymbolName`] from a raw linkage name.
pub(crate) fn make_symbol_name(raw: String, demangler: &dyn Demangle) -> SymbolName
{
    let demangled = demangler.demangle(&raw).filter(|d| *d != raw);
    let language = detect_language(&raw);
    SymbolName::new(raw, demangled, language)
}

fn detect_language(raw: &str) -> SymbolLanguage
{
    if raw.starts_with("_R") || raw.contains("::") || (raw.starts_with("_ZN") && try_demangle(raw).is_ok()) {
        SymbolLanguage::Rust
    } else if raw.starts_with("_Z") {
        SymbolLanguage::Cpp
    } else if raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.') {
        SymbolLanguage::C
    } else {
        SymbolLanguage::Unknown
    }
}
