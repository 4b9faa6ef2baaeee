use ahash::AHashMap;
use log::trace;

use crate::freqs::{AlleleFreqs, HaplotypeFreqs};

mod error;
pub use error::EstimatorError;

/// EM stops once the total absolute change in haplotype-frequency estimates over one
/// iteration falls below this tolerance.
pub const CONVERGENCE_TOLERANCE: f64 = 1e-7;

/// Hard cap on EM iterations. Exceeding it is reported as
/// [`EstimatorError::NonConvergence`], never as a silent partial estimate.
pub const MAX_ITERATIONS: usize = 100;

/// Haplotypes whose final estimated frequency falls below this threshold are pruned
/// from the output table.
pub const PRUNE_TOLERANCE: f64 = 1e-10;

/// Estimate the haplotype-frequency table of one locus-pair slice.
///
/// In phased mode each sample contributes its two known strand haplotypes, and the table
/// is the empirical distribution over these 2N observations. In unphased mode, phase is
/// ambiguous whenever both loci are heterozygous, and frequencies are estimated through
/// Expectation-Maximization.
///
/// Deterministic given the same input ordering.
///
/// # Errors
/// - [`EstimatorError::EmptySlice`] when the slice carries no complete subject.
/// - [`EstimatorError::NonConvergence`] when EM exceeds [`MAX_ITERATIONS`].
pub fn estimate(slice: &[[&str; 4]], phased: bool) -> Result<HaplotypeFreqs, EstimatorError> {
    if slice.is_empty() {
        return Err(EstimatorError::EmptySlice)
    }
    match phased {
        true  => Ok(count_phased(slice)),
        false => estimate_em(slice),
    }
}

/// Phased mode: direct counting. Each sample contributes exactly two known haplotypes,
/// (a1, b1) and (a2, b2).
fn count_phased(slice: &[[&str; 4]]) -> HaplotypeFreqs {
    let mut haps = HaplotypeFreqs::new();
    for [a1, a2, b1, b2] in slice {
        haps.add(a1, b1, 1.0);
        haps.add(a2, b2, 1.0);
    }
    haps.scale(1.0 / (2 * slice.len()) as f64);
    haps
}

/// The two haplotypes of one phase resolution, as indices into the haplotype universe.
type Resolution = [usize; 2];

/// Unphased mode: EM over the phase resolutions consistent with each sample's unordered
/// genotype. Double heterozygotes admit two resolutions; every other sample exactly one.
fn estimate_em(slice: &[[&str; 4]]) -> Result<HaplotypeFreqs, EstimatorError> {
    let mut universe: Vec<(String, String)>        = Vec::new();
    let mut index   : AHashMap<(String, String), usize> = AHashMap::new();
    let mut intern = |a: &str, b: &str| -> usize {
        let key = (a.to_string(), b.to_string());
        match index.get(&key) {
            Some(i) => *i,
            None => {
                let i = universe.len();
                index.insert(key.clone(), i);
                universe.push(key);
                i
            },
        }
    };

    let samples: Vec<Vec<Resolution>> = slice.iter()
        .map(|[a1, a2, b1, b2]| {
            let canonical = [intern(a1, b1), intern(a2, b2)];
            if a1 != a2 && b1 != b2 {
                vec![canonical, [intern(a1, b2), intern(a2, b1)]]
            } else {
                vec![canonical]
            }
        })
        .collect();

    // Initialize with the product of the marginal allele frequencies, restricted to the
    // haplotypes consistent with at least one resolution, and normalized over that set.
    let marginals_a = AlleleFreqs::from_observations(slice.iter().flat_map(|row| [row[0], row[1]]));
    let marginals_b = AlleleFreqs::from_observations(slice.iter().flat_map(|row| [row[2], row[3]]));
    let mut freqs: Vec<f64> = universe.iter()
        .map(|(a, b)| marginals_a.freq(a) * marginals_b.freq(b))
        .collect();
    let prior_total: f64 = freqs.iter().sum();
    freqs.iter_mut().for_each(|freq| *freq /= prior_total);

    let two_n = (2 * slice.len()) as f64;
    for iteration in 1..=MAX_ITERATIONS {
        // E-step: resolution posteriors ∝ product of the two haplotypes' current estimates.
        // M-step: re-estimate each haplotype as its expected count over 2N.
        let mut expected = vec![0.0; universe.len()];
        for resolutions in &samples {
            match resolutions.as_slice() {
                [only] => {
                    expected[only[0]] += 1.0;
                    expected[only[1]] += 1.0;
                },
                [cis, trans] => {
                    let w_cis   = freqs[cis[0]] * freqs[cis[1]];
                    let w_trans = freqs[trans[0]] * freqs[trans[1]];
                    let total   = w_cis + w_trans;
                    // Both resolutions starved of mass: split evenly.
                    let (p_cis, p_trans) = match total > 0.0 {
                        true  => (w_cis / total, w_trans / total),
                        false => (0.5, 0.5),
                    };
                    expected[cis[0]]   += p_cis;
                    expected[cis[1]]   += p_cis;
                    expected[trans[0]] += p_trans;
                    expected[trans[1]] += p_trans;
                },
                _ => unreachable!("a sample admits one or two phase resolutions"),
            }
        }

        let mut delta = 0.0;
        for (freq, count) in freqs.iter_mut().zip(&expected) {
            let updated = count / two_n;
            delta += (updated - *freq).abs();
            *freq = updated;
        }

        if delta < CONVERGENCE_TOLERANCE {
            trace!("EM converged after {iteration} iteration(s) (delta={delta:e})");
            let mut haps = HaplotypeFreqs::new();
            for ((a, b), freq) in universe.iter().zip(&freqs) {
                haps.add(a, b, *freq);
            }
            haps.prune(PRUNE_TOLERANCE);
            return Ok(haps)
        }
    }

    Err(EstimatorError::NonConvergence{iterations: MAX_ITERATIONS})
}
