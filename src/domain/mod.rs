pub mod chunker;
pub mod entities;
pub mod errors;
pub mod ports;
pub mod text;

pub use chunker::{Chunker, DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};
pub use entities::*;
