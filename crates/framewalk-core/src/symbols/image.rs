//! Code images loaded in the target, as reported by a backend.

use std::path::{Path, PathBuf};

use crate::types::Address;

/// A function symbol at its runtime (relocated) address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSymbol
{
    /// Linkage name as stored in the image.
    pub name: String,
    pub address: Address,
    /// Extent in bytes; 0 when the image doesn't record one.
    pub size: u64,
}

impl RawSymbol
{
    pub fn new(name: impl Into<String>, address: Address, size: u64) -> Self
    {
        Self {
            name: name.into(),
            address,
            size,
        }
    }
}

/// An executable or shared library mapped into the target
#[derive(Debug, Clone)]
pub struct LoadedImage
{
    /// Path of the backing file.
    pub path: PathBuf,
    /// Lowest mapped address of the image (inclusive).
    pub start: Address,
    /// Highest mapped address of the image (exclusive).
    pub end: Address,
    /// Function symbols, in any order.
    pub symbols: Vec<RawSymbol>,
}

impl LoadedImage
{
    pub fn new(path: impl Into<PathBuf>, start: Address, end: Address, symbols: Vec<RawSymbol>) -> Self
    {
        Self {
            path: path.into(),
            start,
            end,
            symbols,
        }
    }

    /// Short name printed in frame lines: the file name of [`path`](Self::path).
    ///
    /// ```rust
    /// use framewalk_core::symbols::LoadedImage;
    /// use framewalk_core::types::Address;
    ///
    /// let image = LoadedImage::new("/usr/lib/libc.so.6", Address::from(0x1000), Address::from(0x2000), vec![]);
    /// assert_eq!(image.name(), "libc.so.6");
    /// ```
    pub fn name(&self) -> &str
    {
        short_name(&self.path)
    }

    pub fn contains(&self, address: Address) -> bool
    {
        address >= self.start && address < self.end
    }
}

fn short_name(path: &Path) -> &str
{
    path.file_name()
        .and_then(|name| name.to_str())
        .or_else(|| path.to_str())
        .unwrap_or("<image>")
}
