//! Byte-level readers and writers for length-delimited protobuf data.
//!
//! The MVT decoder walks the protobuf wire format directly instead of going
//! through generated message types; these primitives supply varints, zig-zag
//! integers, field keys, and length-delimited sub-ranges. The writer exists
//! to assemble wire-format fixtures in tests.

mod value_reader;
mod value_writer;

pub use value_reader::ValueReader;
pub use value_writer::ValueWriter;
