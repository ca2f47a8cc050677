mod byte_reader;
mod byte_writer;
mod compact;
mod error;

pub use byte_reader::ByteReader;
pub use byte_writer::ByteWriter;
pub use compact::{compact_len, read_compact, write_compact};
pub use error::SerdeErr;
