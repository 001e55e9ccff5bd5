//! Process, thread, and memory region types.

use std::fmt;

use super::Address;

/// Process identifier of the target
///
/// On Linux this is the thread-group id that owns the target thread.
///
/// ```rust
/// use framewalk_core::types::ProcessId;
///
/// let pid = ProcessId::from(4242);
/// assert_eq!(u32::from(pid), 4242);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessId(pub u32);

impl From<u32> for ProcessId
{
    fn from(pid: u32) -> Self
    {
        ProcessId(pid)
    }
}

impl From<ProcessId> for u32
{
    fn from(pid: ProcessId) -> Self
    {
        pid.0
    }
}

impl fmt::Display for ProcessId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the thread being introspected
///
/// Stored as a `u64` so backends with wider thread handles fit. The Linux
/// backend narrows it back to a kernel TID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadId(pub u64);

impl ThreadId
{
    /// Raw `u64` representation of the thread identifier.
    ///
    /// ```rust
    /// use framewalk_core::types::ThreadId;
    ///
    /// let thread = ThreadId::from(12345);
    /// assert_eq!(thread.raw(), 12345);
    /// ```
    pub fn raw(&self) -> u64
    {
        self.0
    }
}

impl From<u64> for ThreadId
{
    fn from(value: u64) -> Self
    {
        Self(value)
    }
}

impl fmt::Display for ThreadId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.0)
    }
}

/// Mapped memory region in the target process
///
/// Used as the last-resort resolution for addresses no symbol covers: the
/// region that contains the address is reported with the offset into it.
///
/// ```
/// use framewalk_core::types::{Address, MemoryRegion};
///
/// let stack = MemoryRegion::new(
///     Address::from(0x7000),
///     Address::from(0x9000),
///     "rw-p".to_string(),
///     Some("[stack]".to_string()),
/// );
/// assert!(stack.contains(Address::from(0x8000)));
/// assert_eq!(stack.size(), 0x2000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRegion
{
    /// Start address of the region (inclusive)
    pub start: Address,
    /// End address of the region (exclusive)
    pub end: Address,
    /// Permission string as reported by the OS (`r`, `w`, `x`, plus flags).
    pub permissions: String,
    /// Backing file path or pseudo name such as `[stack]`; `None` for anonymous memory.
    pub name: Option<String>,
}

impl MemoryRegion
{
    /// Create a new memory region
    ///
    /// No check is made that `end > start`; an inverted region has size 0 and
    /// contains nothing.
    pub fn new(start: Address, end: Address, permissions: String, name: Option<String>) -> Self
    {
        Self {
            start,
            end,
            permissions,
            name,
        }
    }

    /// Size of the region in bytes (saturating).
    pub fn size(&self) -> u64
    {
        self.end.value().saturating_sub(self.start.value())
    }

    /// Returns `true` if the permissions contain `'x'`.
    pub fn is_executable(&self) -> bool
    {
        self.permissions.contains('x')
    }

    /// Check if an address lies within `[start, end)`.
    ///
    /// ```rust
    /// use framewalk_core::types::{Address, MemoryRegion};
    ///
    /// let region = MemoryRegion::new(Address::from(0x1000), Address::from(0x2000), "r-xp".into(), None);
    /// assert!(region.contains(Address::from(0x1000)));
    /// assert!(!region.contains(Address::from(0x2000)));
    /// ```
    pub fn contains(&self, address: Address) -> bool
    {
        address >= self.start && address < self.end
    }

    /// Name to print for this region.
    pub fn display_name(&self) -> &str
    {
        self.name.as_deref().unwrap_or("<anonymous>")
    }
}

/// CPU architecture of the debug target
///
/// The pointer size decides both how frame records are read and how wide the
/// printed frame pointer column is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Architecture
{
    /// 64-bit ARM; frame records hold `x29` (fp) then `x30` (lr).
    Arm64,
    /// 64-bit x86; frame records hold saved `rbp` then the return address.
    X86_64,
    /// Any other architecture. Frame-pointer walking is not attempted.
    Unknown(&'static str),
}

impl Architecture
{
    /// Architecture of the running `framewalk` binary.
    ///
    /// The Linux backend only traces targets of the same architecture.
    pub const fn current() -> Self
    {
        #[cfg(target_arch = "aarch64")]
        {
            Architecture::Arm64
        }

        #[cfg(target_arch = "x86_64")]
        {
            Architecture::X86_64
        }

        #[cfg(not(any(target_arch = "aarch64", target_arch = "x86_64")))]
        {
            Architecture::Unknown(std::env::consts::ARCH)
        }
    }

    /// Size of a pointer in bytes for this architecture.
    #[must_use]
    pub const fn pointer_size_bytes(self) -> u8
    {
        match self {
            Architecture::Arm64 | Architecture::X86_64 => 8,
            Architecture::Unknown(_) => std::mem::size_of::<usize>() as u8,
        }
    }

    /// Number of hex digits needed to print a full pointer.
    #[must_use]
    pub const fn pointer_hex_width(self) -> usize
    {
        self.pointer_size_bytes() as usize * 2
    }
}

impl fmt::Display for Architecture
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Architecture::Arm64 => write!(f, "arm64"),
            Architecture::X86_64 => write!(f, "x86_64"),
            Architecture::Unknown(name) => write!(f, "{name}"),
        }
    }
}
