//! Incremental Flattened Device Tree construction.
//!
//! # Overview
//!
//! A [`DevTreeBuilder`] owns two growable blocks: the structure block ([`DevTreeStructure`]),
//! an append-only stream of tokens, node names and property values, and the strings block
//! ([`DevTreeStrings`]), a deduplicated pool of property names. Nodes are written depth first
//! and [`DevTreeBuilder::finish`] lays both blocks out behind a header and an empty memory
//! reservation map, producing a [`DevTreeBlob`].
//!
//! # Examples
//!
//! ## A minimal tree
//!
//! ```
//! use fdt_build::prelude::*;
//! use fdt_build::build::*;
//!
//! let mut fdt = DevTreeBuilder::new();
//!
//! fdt.begin_node("")?;
//! fdt.prop_u32("#address-cells", 2)?;
//! fdt.prop_u32("#size-cells", 2)?;
//! fdt.prop_string("compatible", "riscv-virtio")?;
//!
//! fdt.begin_node_at("memory", 0x8000_0000)?;
//! fdt.prop_string("device_type", "memory")?;
//! fdt.prop_u64_pair("reg", 0x8000_0000, 0x800_0000)?;
//! fdt.end_node()?;
//!
//! fdt.end_node()?;
//!
//! let blob = fdt.finish()?;
//! assert_eq!(blob.totalsize(), blob.len());
//! # Ok::<(), fdt_build::error::DevTreeError>(())
//! ```
//!
//! ## Copying into a fixed region
//!
//! The blob is an owned buffer. Placing it in guest or boot memory is an explicit, bounded copy:
//!
//! ```
//! # use fdt_build::build::*;
//! # let mut fdt = DevTreeBuilder::new();
//! # fdt.begin_node("")?;
//! # fdt.end_node()?;
//! let blob = fdt.finish()?;
//! let mut region = [0u8; 4096];
//! let written = blob.copy_into(&mut region)?;
//! assert_eq!(written, blob.len());
//! # Ok::<(), fdt_build::error::DevTreeError>(())
//! ```

#[doc(hidden)]
pub mod prop;
#[doc(hidden)]
pub mod strings;
#[doc(hidden)]
pub mod structure;
#[doc(hidden)]
pub mod tree;

pub mod layout;

#[doc(inline)]
pub use layout::DevTreeBlob;
#[doc(inline)]
pub use prop::PropWriter;
#[doc(inline)]
pub use strings::DevTreeStrings;
#[doc(inline)]
pub use structure::DevTreeStructure;
#[doc(inline)]
pub use tree::*;
