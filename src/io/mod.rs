mod input;
mod lines;
mod mmap;

pub use input::{BoxedBufReader, BoxedReader, Input};
pub use lines::{Line, LineSource};
pub use mmap::ByteStore;
