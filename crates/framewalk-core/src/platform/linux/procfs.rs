//! `/proc` parsing: thread ownership and the memory map.

use std::fs;
use std::io;
use std::path::PathBuf;

use crate::error::{FramewalkError, FramewalkResult};
use crate::types::{Address, MemoryRegion, ProcessId, ThreadId};

/// One line of `/proc/<pid>/maps`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MapEntry
{
    pub region: MemoryRegion,
    /// File offset the mapping starts at.
    pub offset: u64,
}

impl MapEntry
{
    /// Backing file, for mappings of regular files that still exist.
    pub fn file_path(&self) -> Option<&str>
    {
        self.region
            .name
            .as_deref()
            .filter(|name| name.starts_with('/') && !name.ends_with(" (deleted)"))
    }
}

/// Process (thread group) that owns `thread`.
pub(crate) fn owning_process(thread: ThreadId) -> FramewalkResult<ProcessId>
{
    let path = format!("/proc/{}/status", thread.raw());
    let status = fs::read_to_string(&path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => FramewalkError::ThreadNotFound(thread),
        _ => FramewalkError::Io(err),
    })?;
    parse_tgid(&status).ok_or_else(|| FramewalkError::InvalidArgument(format!("{path} has no Tgid line")))
}

pub(crate) fn read_maps(process: ProcessId) -> FramewalkResult<Vec<MapEntry>>
{
    let path = format!("/proc/{process}/maps");
    let maps = fs::read_to_string(&path)?;
    Ok(parse_maps(&maps))
}

/// Path to open `path` as seen from inside the target's mount namespace.
pub(crate) fn target_root_path(process: ProcessId, path: &str) -> PathBuf
{
    PathBuf::from(format!("/proc/{process}/root{path}"))
}

fn parse_tgid(status: &str) -> Option<ProcessId>
{
    status
        .lines()
        .find_map(|line| line.strip_prefix("Tgid:"))
        .and_then(|value| value.trim().parse::<u32>().ok())
        .map(ProcessId::from)
}

/// Parse a maps file, skipping lines that don't have the expected shape.
fn parse_maps(maps: &str) -> Vec<MapEntry>
{
    maps.lines().filter_map(parse_map_line).collect()
}

// "start-end perms offset dev inode   pathname"
fn parse_map_line(line: &str) -> Option<MapEntry>
{
    let mut rest = line;
    let range = take_field(&mut rest)?;
    let permissions = take_field(&mut rest)?;
    let offset = take_field(&mut rest)?;
    let _dev = take_field(&mut rest)?;
    let _inode = take_field(&mut rest)?;
    let name = rest.trim();

    let (start, end) = range.split_once('-')?;
    let start = u64::from_str_radix(start, 16).ok()?;
    let end = u64::from_str_radix(end, 16).ok()?;
    let offset = u64::from_str_radix(offset, 16).ok()?;

    Some(MapEntry {
        region: MemoryRegion::new(
            Address::from(start),
            Address::from(end),
            permissions.to_string(),
            (!name.is_empty()).then(|| name.to_string()),
        ),
        offset,
    })
}

fn take_field<'a>(rest: &mut &'a str) -> Option<&'a str>
{
    let trimmed = rest.trim_start();
    if trimmed.is_empty() {
        return None;
    }
    let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
    let (field, remainder) = trimmed.split_at(end);
    *rest = remainder;
    Some(field)
}
