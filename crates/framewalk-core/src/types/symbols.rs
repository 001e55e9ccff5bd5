//! Symbol names and address resolutions.

use std::fmt;

/// Programming language associated with a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolLanguage
{
    /// Rust symbol (detected via mangling or namespace patterns).
    Rust,
    /// C++ symbol (Itanium mangling without Rust extensions).
    Cpp,
    /// C symbol or unmangled global.
    C,
    /// Unknown or mixed language.
    Unknown,
}

impl fmt::Display for SymbolLanguage
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let label = match self {
            SymbolLanguage::Rust => "rust",
            SymbolLanguage::Cpp => "c++",
            SymbolLanguage::C => "c",
            SymbolLanguage::Unknown => "unknown",
        };
        write!(f, "{label}")
    }
}

/// A function name with demangling metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolName
{
    raw: String,
    demangled: Option<String>,
    language: SymbolLanguage,
}

impl SymbolName
{
    /// Construct from a raw linkage name.
    pub fn new(raw: String, demangled: Option<String>, language: SymbolLanguage) -> Self
    {
        Self {
            raw,
            demangled,
            language,
        }
    }

    /// Raw (mangled) name emitted in the object file.
    pub fn raw(&self) -> &str
    {
        &self.raw
    }

    /// Demangled human-friendly name if available.
    pub fn demangled(&self) -> Option<&str>
    {
        self.demangled.as_deref()
    }

    /// Preferred presentation (demangled fallback to raw).
    pub fn display_name(&self) -> &str
    {
        self.demangled.as_deref().unwrap_or(&self.raw)
    }

    /// Language classification for the symbol.
    pub fn language(&self) -> SymbolLanguage
    {
        self.language
    }
}

impl fmt::Display for SymbolName
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.display_name())
    }
}

/// Best-effort location of an address in the target.
///
/// Produced by [`Resolver::resolve`](crate::symbols::Resolver::resolve), one
/// per printed frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolMatch
{
    /// The address lies inside the symbol's extent.
    Exact
    {
        /// Short name of the image that defines the symbol.
        image: String,
        symbol: SymbolName,
        offset: u64,
    },
    /// No symbol covers the address; this is the closest one below it.
    Nearest
    {
        image: String,
        symbol: SymbolName,
        offset: u64,
    },
    /// No symbol information at all; the mapped region containing the address.
    Region
    {
        name: String,
        offset: u64,
    },
    /// Nothing known about the address.
    Unresolved,
}

impl SymbolMatch
{
    /// Returns `true` if anything beyond the raw address is known.
    pub const fn is_resolved(&self) -> bool
    {
        !matches!(self, SymbolMatch::Unresolved)
    }

    /// Symbol behind an exact or nearest match.
    pub fn symbol(&self) -> Option<&SymbolName>
    {
        match self {
            SymbolMatch::Exact { symbol, .. } | SymbolMatch::Nearest { symbol, .. } => Some(symbol),
            SymbolMatch::Region { .. } | SymbolMatch::Unresolved => None,
        }
    }
}

impl fmt::Display for SymbolMatch
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            SymbolMatch::Exact { image, symbol, offset } => write!(f, "{image}: {symbol} + 0x{offset:x}"),
            SymbolMatch::Nearest { image, symbol, offset } => {
                write!(f, "{image}: {symbol} + 0x{offset:x} (closest symbol)")
            }
            SymbolMatch::Region { name, offset } => write!(f, "{name} + 0x{offset:x}"),
            SymbolMatch::Unresolved => Ok(()),
        }
    }
}
