pub mod alleles;
pub mod table;
pub mod freqs;
pub mod estimator;
pub mod stats;
pub mod scan;
pub mod vectors;

pub use table::LocusTable;
pub use scan::{PairResults, PairScanner, RESULT_HEADER};
pub use vectors::VectorExporter;
