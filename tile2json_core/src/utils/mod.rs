mod compression;
mod progress;

pub use compression::{compress_gzip, decompress_gzip};
pub use progress::ProgressLine;
