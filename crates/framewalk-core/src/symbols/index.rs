//! # Symbol Index
//!
//! The per-session symbol lookup context.
//!
//! Built once from the images a backend reports and reused for every frame.
//! Images are kept sorted by start address and each image's symbols by
//! address, so a lookup is two binary searches. Names are demangled lazily,
//! only for symbols that actually get printed.

use std::fmt;

use tracing::debug;

use super::demangle::{make_symbol_name, Demangle};
use super::image::{LoadedImage, RawSymbol};
use crate::types::{Address, SymbolMatch};

struct IndexedImage
{
    name: String,
    start: Address,
    end: Address,
    symbols: Vec<RawSymbol>,
}

impl IndexedImage
{
    fn new(image: LoadedImage) -> Self
    {
        let name = image.name().to_string();
        let mut symbols = image.symbols;

        // Same address: keep the symbol with the largest extent.
        symbols.sort_by(|a, b| a.address.cmp(&b.address).then(b.size.cmp(&a.size)));
        symbols.dedup_by_key(|symbol| symbol.address);

        // Zero-sized labels inside a sized function would shadow it.
        let mut covered_until = Address::ZERO;
        symbols.retain(|symbol| {
            if symbol.size == 0 && symbol.address < covered_until {
                return false;
            }
            covered_until = covered_until.max(symbol.address.saturating_add(symbol.size));
            true
        });

        Self {
            name,
            start: image.start,
            end: image.end,
            symbols,
        }
    }

    fn contains(&self, address: Address) -> bool
    {
        address >= self.start && address < self.end
    }

    /// Closest symbol at or below `address`.
    fn symbol_at_or_below(&self, address: Address) -> Option<&RawSymbol>
    {
        let idx = self.symbols.partition_point(|symbol| symbol.address <= address);
        idx.checked_sub(1).map(|i| &self.symbols[i])
    }
}

/// Symbol lookup context over every image loaded in a target process
pub struct SymbolIndex
{
    images: Vec<IndexedImage>,
    demangler: Box<dyn Demangle>,
}

impl SymbolIndex
{
    /// Index `images`, demangling names with `demangler` at lookup time.
    pub fn build(images: Vec<LoadedImage>, demangler: Box<dyn Demangle>) -> Self
    {
        let mut images: Vec<IndexedImage> = images.into_iter().map(IndexedImage::new).collect();
        images.sort_by_key(|image| image.start);

        debug!(
            images = images.len(),
            symbols = images.iter().map(|image| image.symbols.len()).sum::<usize>(),
            "symbol index built"
        );
        Self { images, demangler }
    }

    /// Number of indexed images.
    pub fn image_count(&self) -> usize
    {
        self.images.len()
    }

    /// Exact or nearest symbol for `address`, or `None` when no symbol information covers it.
    ///
    /// A symbol matches exactly when `address` lies in `[start, start + size)`;
    /// zero-sized symbols match only their own address. Otherwise the closest
    /// symbol below `address` within the same image is reported as nearest.
    pub fn lookup(&self, address: Address) -> Option<SymbolMatch>
    {
        let idx = self.images.partition_point(|image| image.start <= address);
        let image = self.images[..idx].iter().rev().find(|image| image.contains(address))?;
        let symbol = image.symbol_at_or_below(address)?;
        let offset = address.offset_from(symbol.address)?;

        let exact = offset < symbol.size || (symbol.size == 0 && offset == 0);
        let name = make_symbol_name(symbol.name.clone(), self.demangler.as_ref());
        let image = image.name.clone();

        Some(if exact {
            SymbolMatch::Exact {
                image,
                symbol: name,
                offset,
            }
        } else {
            SymbolMatch::Nearest {
                image,
                symbol: name,
                offset,
            }
        })
    }
}

impl fmt::Debug for SymbolIndex
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("SymbolIndex").field("images", &self.images.len()).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::symbols::{NoDemangle, RustcDemangler};

    fn libfoo() -> LoadedImage
    {
        LoadedImage::new(
            "/opt/lib/libfoo.so",
            Address::from(0x10_000),
            Address::from(0x20_000),
            vec![
                RawSymbol::new("foo_init", Address::from(0x11_000), 0x80),
                RawSymbol::new("foo_run", Address::from(0x12_000), 0x200),
                RawSymbol::new(".Lloop", Address::from(0x12_040), 0),
                RawSymbol::new("foo_alias", Address::from(0x12_000), 0),
                RawSymbol::new("_ZN3app4main17h0123456789abcdefE", Address::from(0x13_000), 0x40),
            ],
        )
    }

    fn index() -> SymbolIndex
    {
        SymbolIndex::build(vec![libfoo()], Box::new(RustcDemangler))
    }

    #[test]
    fn test_exact_match_inside_symbol()
    {
        let found = index().lookup(Address::from(0x12_044)).unwrap();
        match found {
            SymbolMatch::Exact { image, symbol, offset } => {
                assert_eq!(image, "libfoo.so");
                assert_eq!(symbol.display_name(), "foo_run");
                assert_eq!(offset, 0x44);
            }
            other => panic!("expected exact match, got {other:?}"),
        }
    }

    #[test]
    fn test_nearest_match_past_symbol_end()
    {
        let found = index().lookup(Address::from(0x11_100)).unwrap();
        assert!(matches!(
            found,
            SymbolMatch::Nearest { ref symbol, offset: 0x100, .. } if symbol.raw() == "foo_init"
        ));
    }

    #[test]
    fn test_exact_match_is_demangled()
    {
        let found = index().lookup(Address::from(0x13_010)).unwrap();
        assert_eq!(found.symbol().unwrap().display_name(), "app::main");
        assert_eq!(found.to_string(), "libfoo.so: app::main + 0x10");
    }

    #[test]
    fn test_injected_demangler_is_used()
    {
        let index = SymbolIndex::build(vec![libfoo()], Box::new(NoDemangle));
        let found = index.lookup(Address::from(0x13_010)).unwrap();
        assert_eq!(found.symbol().unwrap().display_name(), "_ZN3app4main17h0123456789abcdefE");
    }

    #[test]
    fn test_no_symbol_below_address()
    {
        assert_eq!(index().lookup(Address::from(0x10_500)), None);
    }

    #[test]
    fn test_address_outside_images()
    {
        assert_eq!(index().lookup(Address::from(0x30_000)), None);
        assert_eq!(index().lookup(Address::from(0x10)), None);
    }

    #[test]
    fn test_zero_sized_symbol_matches_only_its_address()
    {
        let image = LoadedImage::new(
            "/bin/app",
            Address::from(0x1000),
            Address::from(0x2000),
            vec![RawSymbol::new("_start", Address::from(0x1100), 0)],
        );
        let index = SymbolIndex::build(vec![image], Box::new(NoDemangle));
        assert!(matches!(index.lookup(Address::from(0x1100)), Some(SymbolMatch::Exact { offset: 0, .. })));
        assert!(matches!(index.lookup(Address::from(0x1108)), Some(SymbolMatch::Nearest { offset: 8, .. })));
    }

    #[test]
    fn test_images_are_searched_by_address()
    {
        let other = LoadedImage::new(
            "/bin/app",
            Address::from(0x1000),
            Address::from(0x2000),
            vec![RawSymbol::new("main", Address::from(0x1100), 0x100)],
        );
        let index = SymbolIndex::build(vec![libfoo(), other], Box::new(NoDemangle));
        assert_eq!(index.image_count(), 2);
        let found = index.lookup(Address::from(0x1180)).unwrap();
        assert_eq!(found.to_string(), "app: main + 0x80");
    }
}
