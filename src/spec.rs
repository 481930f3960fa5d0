use endian_type::types::{u32_be, u64_be};
use num_derive::FromPrimitive;

pub const FDT_MAGIC: u32 = 0xd00d_feed;
pub const FDT_VERSION: u32 = 17;
pub const FDT_LAST_COMP_VERSION: u32 = 16;
pub const FDT_BOOT_CPUID_PHYS: u32 = 0;

/// Alignment of the memory reservation block within the blob.
pub const FDT_RSVMAP_ALIGN: usize = 8;

/// A phandle is simply a u32 value other nodes use to reference a node.
pub type Phandle = u32;

/// Tokens of the structure block.
#[derive(FromPrimitive, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FdtTok {
    BeginNode = 0x1,
    EndNode = 0x2,
    Prop = 0x3,
    Nop = 0x4,
    End = 0x9,
}

impl From<FdtTok> for u32 {
    #[inline]
    fn from(tok: FdtTok) -> u32 {
        tok as u32
    }
}

// On-disk layouts of the flattened devicetree format.
#[repr(C)]
pub struct fdt_header {
    pub magic: u32_be,
    pub totalsize: u32_be,
    pub off_dt_struct: u32_be,
    pub off_dt_strings: u32_be,
    pub off_mem_rsvmap: u32_be,
    pub version: u32_be,
    pub last_comp_version: u32_be,
    pub boot_cpuid_phys: u32_be,
    pub size_dt_strings: u32_be,
    pub size_dt_struct: u32_be,
}

#[repr(C)]
pub struct fdt_prop_header {
    pub len: u32_be,
    pub nameoff: u32_be,
}

#[repr(C)]
pub struct fdt_reserve_entry {
    pub address: u64_be,
    pub size: u64_be,
}

assert_eq_size!(fdt_header, [u8; 40]);
assert_eq_size!(fdt_prop_header, [u8; 8]);
assert_eq_size!(fdt_reserve_entry, [u8; 16]);
