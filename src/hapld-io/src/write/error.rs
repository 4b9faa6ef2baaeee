use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriterError {
    #[error("IO error: {0}")]
    IOError(#[source] std::io::Error),

    #[error("Failed to serialize record: {0}")]
    CsvError(#[source] csv::Error),
}
