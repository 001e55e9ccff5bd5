//! Tests for platform-agnostic types

use framewalk_core::types::{
    Address, Architecture, FrameLink, MemoryRegion, ProcessId, StackFrame, SymbolLanguage, SymbolMatch, SymbolName,
    ThreadId,
};

#[test]
fn test_process_id_round_trip()
{
    let pid = ProcessId::from(12345);
    assert_eq!(pid.0, 12345);
    let value: u32 = pid.into();
    assert_eq!(value, 12345);
}

#[test]
fn test_thread_id_display()
{
    assert_eq!(ThreadId::from(4242).to_string(), "4242");
    assert_eq!(ThreadId::from(4242).raw(), 4242);
}

#[test]
fn test_address_display_is_zero_padded()
{
    assert_eq!(Address::from(0x1000).to_string(), "0x0000000000001000");
    assert_eq!(format!("{:x}", Address::from(0xbeef)), "beef");
}

#[test]
fn test_address_offsets()
{
    let base = Address::from(0x1000);
    assert_eq!(Address::from(0x1042).offset_from(base), Some(0x42));
    assert_eq!(Address::from(0x0fff).offset_from(base), None);
    assert_eq!(Address::from(u64::MAX).checked_add(1), None);
    assert!(Address::ZERO.is_null());
}

#[test]
fn test_memory_region_contains_is_half_open()
{
    let region = MemoryRegion::new(Address::from(0x1000), Address::from(0x2000), "r-xp".to_string(), Some("[vdso]".to_string()));

    assert_eq!(region.size(), 0x1000);
    assert!(region.is_executable());
    assert!(region.contains(Address::from(0x1000)));
    assert!(region.contains(Address::from(0x1fff)));
    assert!(!region.contains(Address::from(0x2000)));
    assert_eq!(region.display_name(), "[vdso]");
}

#[test]
fn test_anonymous_region_display_name()
{
    let region = MemoryRegion::new(Address::from(0x1000), Address::from(0x2000), "rw-p".to_string(), None);
    assert!(!region.is_executable());
    assert_eq!(region.display_name(), "<anonymous>");
}

#[test]
fn test_frame_link_parent()
{
    let link = FrameLink {
        return_address: Address::from(0x5555_0000_1234),
        parent_fp: Address::from(0x7ffc_0000_1040),
    };
    assert_eq!(
        link.parent(),
        StackFrame::new(Address::from(0x5555_0000_1234), Address::from(0x7ffc_0000_1040))
    );
}

#[test]
fn test_pointer_width()
{
    assert_eq!(Architecture::X86_64.pointer_size_bytes(), 8);
    assert_eq!(Architecture::Arm64.pointer_hex_width(), 16);
}

#[test]
fn test_symbol_match_display()
{
    let symbol = SymbolName::new("_ZN3app4main17h0123456789abcdefE".into(), Some("app::main".into()), SymbolLanguage::Rust);
    let exact = SymbolMatch::Exact {
        image: "app".into(),
        symbol,
        offset: 0x1c,
    };

    assert!(exact.is_resolved());
    assert_eq!(exact.to_string(), "app: app::main + 0x1c");
    assert_eq!(exact.symbol().map(SymbolName::raw), Some("_ZN3app4main17h0123456789abcdefE"));
    assert!(!SymbolMatch::Unresolved.is_resolved());
    assert_eq!(SymbolMatch::Unresolved.to_string(), "");
}
