//! Function symbols of the ELF images mapped in the target.

use std::collections::BTreeMap;
use std::fs;

use object::{Object, ObjectSegment, ObjectSymbol, SymbolKind};
use tracing::debug;

use super::procfs::{target_root_path, MapEntry};
use crate::error::{FramewalkError, FramewalkResult};
use crate::symbols::{LoadedImage, RawSymbol};
use crate::types::{Address, ProcessId};

/// Mappings of one file, merged.
struct ImageMapping<'a>
{
    start: Address,
    end: Address,
    executable: bool,
    /// Lowest mapping; used to compute the load bias.
    first: &'a MapEntry,
}

/// Load every executable file-backed image in `maps`.
///
/// Images that can't be read or parsed are skipped; their addresses fall back
/// to the memory region scan.
pub(crate) fn load_images(process: ProcessId, maps: &[MapEntry]) -> Vec<LoadedImage>
{
    let mut by_path: BTreeMap<&str, ImageMapping<'_>> = BTreeMap::new();
    for entry in maps {
        let Some(path) = entry.file_path() else {
            continue;
        };
        let mapping = by_path.entry(path).or_insert(ImageMapping {
            start: entry.region.start,
            end: entry.region.end,
            executable: false,
            first: entry,
        });
        if entry.region.start < mapping.start {
            mapping.start = entry.region.start;
            mapping.first = entry;
        }
        mapping.end = mapping.end.max(entry.region.end);
        mapping.executable |= entry.region.is_executable();
    }

    by_path
        .into_iter()
        .filter(|(_, mapping)| mapping.executable)
        .filter_map(|(path, mapping)| match load_image(process, path, &mapping) {
            Ok(image) => Some(image),
            Err(err) => {
                debug!(path, error = %err, "skipping image");
                None
            }
        })
        .collect()
}

fn load_image(process: ProcessId, path: &str, mapping: &ImageMapping<'_>) -> FramewalkResult<LoadedImage>
{
    let data = fs::read(target_root_path(process, path)).or_else(|_| fs::read(path))?;
    let file = object::File::parse(data.as_slice())
        .map_err(|err| FramewalkError::SymbolsUnavailable(format!("failed to parse {path}: {err}")))?;

    let bias = load_bias(&file, mapping.first)
        .ok_or_else(|| FramewalkError::SymbolsUnavailable(format!("{path}: no segment maps file offset 0x{:x}", mapping.first.offset)))?;

    let symbols: Vec<RawSymbol> = file
        .symbols()
        .chain(file.dynamic_symbols())
        .filter(|symbol| symbol.kind() == SymbolKind::Text && symbol.is_definition() && symbol.address() != 0)
        .filter_map(|symbol| {
            let name = symbol.name().ok().filter(|name| !name.is_empty())?;
            Some(RawSymbol::new(
                name,
                Address::from(symbol.address().wrapping_add_signed(bias)),
                symbol.size(),
            ))
        })
        .collect();

    debug!(path, symbols = symbols.len(), bias, "loaded image");
    Ok(LoadedImage::new(path, mapping.start, mapping.end, symbols))
}

/// Difference between runtime and link-time addresses.
///
/// The lowest mapping maps file offset `entry.offset` at `entry.region.start`;
/// the segment containing that file offset says which link-time address it
/// corresponds to.
fn load_bias(file: &object::File<'_>, entry: &MapEntry) -> Option<i64>
{
    file.segments().find_map(|segment| {
        let (seg_offset, seg_size) = segment.file_range();
        let inside = entry.offset >= seg_offset && entry.offset < seg_offset.saturating_add(seg_size.max(1));
        inside.then(|| {
            let link_address = segment.address().wrapping_add(entry.offset - seg_offset);
            entry.region.start.value().wrapping_sub(link_address) as i64
        })
    })
}
