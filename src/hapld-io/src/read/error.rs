use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("Unrecognized file suffix for input table '{}'. Accepted suffixes are '.csv', '.tsv' and '.txt'", path.display())]
    UnrecognizedExtension{path: PathBuf},

    #[error("Could not find the required column '{column}' within the input table's header row")]
    MissingColumn{column: String},

    #[error("Input table '{}' does not contain any data row", path.display())]
    EmptyTable{path: PathBuf},

    #[error("A normalized genotype table requires two adjacent columns per locus after the sample-id column. Found {found} genotype columns")]
    UnpairedColumns{found: usize},
}
