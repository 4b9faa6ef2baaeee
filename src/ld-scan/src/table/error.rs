use thiserror::Error;

#[derive(Error, Debug)]
pub enum TableError {
    #[error("No locus could be parsed from the provided genotype records")]
    NoLoci,
}
