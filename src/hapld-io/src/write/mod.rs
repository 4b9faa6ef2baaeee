use std::{fs::File, io::Write, path::Path};

use anyhow::{Context, Result};

mod error;
pub use error::WriterError;

use crate::parse::create_parent_directory;

/// A generic delimited-table writer.
/// - source: boxed `csv::Writer` (can either handle file-writing, or stdout).
pub struct TableWriter<'a> {
    source: csv::Writer<Box<dyn Write + 'a>>,
}

impl<'a> TableWriter<'a> {
    /// Instantiate a new comma-delimited `TableWriter`, linked to a file (or stdout when
    /// `path` is `None`).
    ///
    /// # Errors
    /// if `path` is either an invalid file, or the user does not have the proper UNIX
    /// permissions to write at this location.
    pub fn new(path: Option<&Path>) -> Result<TableWriter<'a>> {
        Self::with_delimiter(path, b',')
    }

    /// Instantiate a new `TableWriter` with an explicit field delimiter.
    pub fn with_delimiter(path: Option<&Path>, delimiter: u8) -> Result<TableWriter<'a>> {
        use WriterError::IOError;
        let inner: Box<dyn Write> = match path {
            Some(path) => {
                create_parent_directory(path)?;
                let file = File::create(path)
                    .map_err(IOError)
                    .with_context(|| format!("While creating file '{}'", path.display()))?;
                Box::new(file)
            },
            None => Box::new(std::io::stdout()),
        };
        let source = csv::WriterBuilder::new().delimiter(delimiter).from_writer(inner);
        Ok(TableWriter{source})
    }

    /// Write one table row. Each item of the iterator becomes one delimited field.
    ///
    /// # Errors
    /// If any field fails to get written within the file.
    pub fn write_record<I, S>(&mut self, record: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        self.source.write_record(record)
            .map_err(WriterError::CsvError)
            .context("While writing record into file")
    }

    /// Flush buffered contents into the underlying destination.
    pub fn flush(&mut self) -> Result<()> {
        self.source.flush()
            .map_err(WriterError::IOError)
            .context("While flushing buffer contents of TableWriter")
    }
}
