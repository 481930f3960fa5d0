#[cfg(doc)]
use crate::build::*;

use crate::build::layout::{layout, DevTreeBlob};
use crate::build::{DevTreeStrings, DevTreeStructure};
use crate::error::{Result, StructureError};
use crate::prelude::*;

/// Initial sizing of a [`DevTreeBuilder`]'s buffers.
///
/// Both buffers grow on demand; pre-sizing only avoids reallocations when the final size is
/// roughly known.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildConfig {
    /// Initial capacity of the structure block, in 32-bit words.
    pub struct_capacity: usize,
    /// Initial capacity of the strings block, in bytes.
    pub strings_capacity: usize,
}

/// Builds a Flattened Device Tree one node and property at a time.
///
/// Nodes are written depth first: open a node with [`Self::begin_node`], write its properties
/// through the [`PropWriter`] methods, write its children, then close it with
/// [`Self::end_node`]. [`Self::finish`] lays the result out as a single blob.
///
/// Once `finish` succeeds the builder is frozen: further structural calls fail with
/// [`StructureError::Finalized`], while `finish` itself may be called again and returns the
/// same bytes.
#[derive(Clone, Debug, Default)]
pub struct DevTreeBuilder {
    structure: DevTreeStructure,
    strings: DevTreeStrings,
}

impl DevTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BuildConfig) -> Result<Self> {
        Ok(Self {
            structure: DevTreeStructure::with_capacity(config.struct_capacity)?,
            strings: DevTreeStrings::with_capacity(config.strings_capacity)?,
        })
    }

    /// Open a node. The root node is named `""`.
    pub fn begin_node(&mut self, name: &str) -> Result<()> {
        self.structure.begin_node(name)
    }

    /// Open a node with a unit address, named `<name>@<unit_address>` in lowercase hex.
    pub fn begin_node_at(&mut self, name: &str, unit_address: u64) -> Result<()> {
        self.structure.begin_node_at(name, unit_address)
    }

    /// Close the most recently opened node.
    pub fn end_node(&mut self) -> Result<()> {
        self.structure.end_node()
    }

    pub fn nop(&mut self) -> Result<()> {
        self.structure.emit_nop()
    }

    /// Number of currently open nodes.
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.structure.depth()
    }

    #[inline]
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.structure.is_ended()
    }

    #[inline]
    pub fn structure(&self) -> &DevTreeStructure {
        &self.structure
    }

    #[inline]
    pub fn strings(&self) -> &DevTreeStrings {
        &self.strings
    }

    /// Close the structure block and lay out the device tree blob.
    ///
    /// Fails with [`StructureError::UnbalancedNodes`] if any node is still open, in which case
    /// the builder is left untouched and may be completed and finished again. It also fails that
    /// way for good once [`Self::end_node`] was called with no node open.
    ///
    /// If the layout itself fails the builder is left in its building state.
    pub fn finish(&mut self) -> Result<DevTreeBlob> {
        if self.structure.is_ended() {
            return layout(self.structure.as_bytes(), self.strings.as_bytes());
        }

        self.structure.finish()?;
        match layout(self.structure.as_bytes(), self.strings.as_bytes()) {
            Ok(blob) => Ok(blob),
            Err(e) => {
                self.structure.unfinish();
                Err(e)
            }
        }
    }
}

impl PropWriter for DevTreeBuilder {
    fn blocks_mut(&mut self) -> Result<(&mut DevTreeStructure, &mut DevTreeStrings)> {
        if self.structure.is_ended() {
            return Err(StructureError::Finalized.into());
        }
        Ok((&mut self.structure, &mut self.strings))
    }
}
