//! Address resolution policy.
//!
//! Symbols first, then the memory map, then nothing.

use tracing::trace;

use super::index::SymbolIndex;
use crate::types::{Address, MemoryRegion, SymbolMatch};

/// Resolves frame addresses to printable locations
///
/// Either input may be missing: without an index every address falls through
/// to the region scan, and without regions unresolvable addresses stay
/// [`SymbolMatch::Unresolved`].
#[derive(Debug, Default)]
pub struct Resolver
{
    index: Option<SymbolIndex>,
    regions: Vec<MemoryRegion>,
}

impl Resolver
{
    pub fn new(index: Option<SymbolIndex>, regions: Vec<MemoryRegion>) -> Self
    {
        Self { index, regions }
    }

    /// Whether a symbol index is available.
    pub fn has_symbols(&self) -> bool
    {
        self.index.is_some()
    }

    /// Best-effort location of `address`.
    pub fn resolve(&self, address: Address) -> SymbolMatch
    {
        if let Some(found) = self.index.as_ref().and_then(|index| index.lookup(address)) {
            return found;
        }

        match self.regions.iter().find(|region| region.contains(address)) {
            Some(region) => {
                trace!(%address, region = region.display_name(), "resolved by memory region");
                SymbolMatch::Region {
                    name: region.display_name().to_string(),
                    offset: address.value() - region.start.value(),
                }
            }
            None => SymbolMatch::Unresolved,
        }
    }
}
