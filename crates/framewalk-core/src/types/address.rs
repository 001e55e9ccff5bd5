//! Memory address type.

use std::fmt;
use std::ops::{Add, Sub};

/// Strongly typed address in the target's address space
///
/// This wrapper around `u64` keeps instruction pointers, frame pointers and
/// region bounds from being mixed up with offsets or sizes.
///
/// The target may use 4- or 8-byte pointers; the value is always widened to
/// `u64` and the printed width is decided by the target's
/// [`Architecture`](super::Architecture), not by this type.
///
/// ## Example
///
/// ```rust
/// use framewalk_core::types::Address;
///
/// let addr = Address::from(0x1000);
/// let next_addr = addr + 0x100;
/// assert_eq!(next_addr.value(), 0x1100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(u64);

impl Address
{
    /// The null address (0x0)
    ///
    /// A null parent frame pointer terminates a frame chain.
    pub const ZERO: Self = Address(0);

    /// Create a new address from a `u64` value
    ///
    /// ```rust
    /// use framewalk_core::types::Address;
    ///
    /// const STACK_TOP: Address = Address::new(0x7fff_0000_0000);
    /// assert_eq!(STACK_TOP.value(), 0x7fff_0000_0000);
    /// ```
    pub const fn new(value: u64) -> Self
    {
        Address(value)
    }

    /// Raw `u64` value of this address.
    pub const fn value(self) -> u64
    {
        self.0
    }

    /// Returns `true` for the null address.
    pub const fn is_null(self) -> bool
    {
        self.0 == 0
    }

    /// Add an offset to this address, checking for overflow
    ///
    /// ```rust
    /// use framewalk_core::types::Address;
    ///
    /// let addr = Address::from(0x1000);
    /// assert_eq!(addr.checked_add(0x100), Some(Address::from(0x1100)));
    /// assert_eq!(addr.checked_add(u64::MAX), None);
    /// ```
    pub fn checked_add(self, offset: u64) -> Option<Self>
    {
        self.0.checked_add(offset).map(Address)
    }

    /// Add an offset to this address, saturating at the maximum value.
    pub fn saturating_add(self, offset: u64) -> Self
    {
        Address(self.0.saturating_add(offset))
    }

    /// Distance from `base` up to this address, or `None` if `base` lies above it.
    ///
    /// ```rust
    /// use framewalk_core::types::Address;
    ///
    /// let addr = Address::from(0x1040);
    /// assert_eq!(addr.offset_from(Address::from(0x1000)), Some(0x40));
    /// assert_eq!(addr.offset_from(Address::from(0x2000)), None);
    /// ```
    pub fn offset_from(self, base: Address) -> Option<u64>
    {
        self.0.checked_sub(base.0)
    }
}

impl From<u64> for Address
{
    fn from(value: u64) -> Self
    {
        Address(value)
    }
}

impl From<Address> for u64
{
    fn from(address: Address) -> Self
    {
        address.0
    }
}

impl fmt::Display for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "0x{:016x}", self.0)
    }
}

impl fmt::LowerHex for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl Add<u64> for Address
{
    type Output = Address;

    fn add(self, rhs: u64) -> Self::Output
    {
        Address(self.0.wrapping_add(rhs))
    }
}

impl Sub<u64> for Address
{
    type Output = Address;

    fn sub(self, rhs: u64) -> Self::Output
    {
        Address(self.0.wrapping_sub(rhs))
    }
}
