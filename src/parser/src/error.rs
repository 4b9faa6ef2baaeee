use thiserror::Error;
use crate::FileEntity;

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("{0} {1} does not exist")]
    MissingFileEntity(FileEntity, String),

    #[error("{1} is not a {0}")]
    InvalidFileEntity(FileEntity, String),

    #[error("Failed to generate an output file prefix. Note that file prefixes are generated from the input table filestem")]
    ParseOutputPrefix,

    #[error("{0} already exists. Use --overwrite to force.")]
    CannotOverwrite(String),
}
