//! A Flattened Device Tree (FDT) builder for no-std environments.
//!
//! Device tree blobs describe hardware to boot loaders and kernels. This crate writes them: a
//! [`DevTreeBuilder`](build::DevTreeBuilder) is driven through a depth first sequence of
//! begin node, property and end node calls, then finished into a single big-endian blob with
//! a header, an (empty) memory reservation map, the structure block and the strings block.
//!
//! See the [`build`] module for examples.
//!
//! Reading existing device tree blobs is not supported.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;
extern crate endian_type;
#[macro_use]
extern crate memoffset;
#[macro_use]
extern crate static_assertions;

mod priv_util;

pub mod build;
pub mod error;
pub mod prelude;
pub mod spec;

#[doc(inline)]
pub use build::{DevTreeBlob, DevTreeBuilder};
#[doc(inline)]
pub use error::{DevTreeError, StructureError};
