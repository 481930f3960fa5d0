//! Module exporting traits of this library.
pub use crate::build::prop::PropWriter;
