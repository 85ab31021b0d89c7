pub mod config_io;
pub mod doc_io;
pub mod lock;
pub mod registry;

pub use doc_io::{corpus_files, read_lines, write_lines, DocError};
pub use registry::{ensure_unique, generate_id, CorpusIndex, IdError, IdLocation};
