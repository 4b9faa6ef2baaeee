use thiserror::Error;

#[derive(Error, Debug)]
pub enum EstimatorError {
    #[error("Cannot estimate haplotype frequencies from an empty locus-pair slice")]
    EmptySlice,

    #[error("EM estimation did not converge after {iterations} iterations")]
    NonConvergence{iterations: usize},
}
