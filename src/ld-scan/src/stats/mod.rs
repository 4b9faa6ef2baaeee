use ahash::AHashMap;

use crate::freqs::{AlleleFreqs, HaplotypeFreqs};

/// Which locus of the pair acts as the conditioning locus of a directional ALD value.
/// `W(Loc1|Loc2)` conditions on locus 2 ; `W(Loc2|Loc1)` conditions on locus 1. The two
/// directions share one code path through this toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionedOn {
    Locus1,
    Locus2,
}

/// The five per-pair point estimates. All values carry full precision; callers may round
/// for display only.
#[derive(Debug, Clone, PartialEq)]
pub struct LdEstimates {
    pub dprime      : f64,
    pub wn          : f64,
    pub w_1_given_2 : f64,
    pub w_2_given_1 : f64,
    pub n_haplotypes: usize,
}

/// Dense allele(locus1) × allele(locus2) haplotype-frequency matrix, zero where
/// unobserved. Row/column order is fixed by each locus's first-seen allele order.
#[derive(Debug)]
pub struct FreqMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl FreqMatrix {
    pub fn new(haps: &HaplotypeFreqs, freqs1: &AlleleFreqs, freqs2: &AlleleFreqs) -> Self {
        let row_index: AHashMap<&str, usize> = freqs1.alleles().enumerate().map(|(i, a)| (a, i)).collect();
        let col_index: AHashMap<&str, usize> = freqs2.alleles().enumerate().map(|(j, b)| (b, j)).collect();

        let (rows, cols) = (freqs1.len(), freqs2.len());
        let mut data = vec![0.0; rows * cols];
        for (a, b, freq) in haps.iter() {
            // Haplotypes built from the same slice as the marginals: both lookups succeed.
            if let (Some(&i), Some(&j)) = (row_index.get(a), col_index.get(b)) {
                data[i * cols + j] = freq;
            }
        }
        FreqMatrix{rows, cols, data}
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    /// Orientation-aware accessor: `x` indexes the conditioning locus, `y` the other one.
    fn oriented(&self, x: usize, y: usize, conditioned_on: ConditionedOn) -> f64 {
        match conditioned_on {
            ConditionedOn::Locus1 => self.get(x, y),
            ConditionedOn::Locus2 => self.get(y, x),
        }
    }
}

/// Compute D', Wn and both directional conditional-ALD values for one locus pair.
///
/// Monomorphic loci must be filtered out upstream: with a marginal homozygosity of 1,
/// the ALD denominator vanishes and the measure is undefined.
pub fn compute(
    haps        : &HaplotypeFreqs,
    freqs1      : &AlleleFreqs,
    freqs2      : &AlleleFreqs,
    n_haplotypes: usize,
) -> LdEstimates {
    let matrix = FreqMatrix::new(haps, freqs1, freqs2);
    LdEstimates {
        dprime      : dprime(&matrix, freqs1, freqs2),
        wn          : wn(&matrix, freqs1, freqs2),
        w_1_given_2 : conditional_ald(&matrix, freqs1, freqs2, ConditionedOn::Locus2),
        w_2_given_1 : conditional_ald(&matrix, freqs1, freqs2, ConditionedOn::Locus1),
        n_haplotypes,
    }
}

/// Standard multi-allele normalized disequilibrium coefficient (Hedrick's D').
///
/// Each allele pair's raw disequilibrium Dij = fij − pi·qj is normalized by its
/// theoretical maximum magnitude given the marginals, then aggregated into a single
/// frequency-weighted scalar in [0, 1].
fn dprime(matrix: &FreqMatrix, freqs1: &AlleleFreqs, freqs2: &AlleleFreqs) -> f64 {
    let mut aggregated = 0.0;
    for (i, a) in freqs1.alleles().enumerate() {
        let p = freqs1.freq(a);
        for (j, b) in freqs2.alleles().enumerate() {
            let q = freqs2.freq(b);
            let d = matrix.get(i, j) - p * q;
            let d_max = match d < 0.0 {
                true  => (p * q).min((1.0 - p) * (1.0 - q)),
                false => (p * (1.0 - q)).min((1.0 - p) * q),
            };
            if d_max > 0.0 {
                aggregated += p * q * d.abs() / d_max;
            }
        }
    }
    aggregated.min(1.0)
}

/// Cramer's-V analogue Wn = sqrt(χ² / (2N·(min(k1, k2)−1))).
///
/// The degrees-of-freedom term uses the SMALLER locus's allele count minus one, an
/// explicit tie-break when both loci carry equally many alleles.
fn wn(matrix: &FreqMatrix, freqs1: &AlleleFreqs, freqs2: &AlleleFreqs) -> f64 {
    let mut chi2_over_2n = 0.0;
    for (i, a) in freqs1.alleles().enumerate() {
        let p = freqs1.freq(a);
        for (j, b) in freqs2.alleles().enumerate() {
            let q = freqs2.freq(b);
            let d = matrix.get(i, j) - p * q;
            chi2_over_2n += d * d / (p * q);
        }
    }
    let dof = freqs1.len().min(freqs2.len()) - 1;
    (chi2_over_2n / dof as f64).sqrt().min(1.0)
}

/// Directional conditional ALD.
///
/// For the conditioning locus X, every allele i defines a haplotype-specific homozygosity
/// F(Y|X=i) = Σj (fij/pX_i)². Their pX_i-weighted average Fw measures how much of Y's
/// variation is explained by conditioning on X:
/// maALD² = (Fw − F_Y) / (1 − F_Y), and the reported value is sqrt(maALD²).
fn conditional_ald(
    matrix        : &FreqMatrix,
    freqs1        : &AlleleFreqs,
    freqs2        : &AlleleFreqs,
    conditioned_on: ConditionedOn,
) -> f64 {
    let (x_freqs, y_freqs) = match conditioned_on {
        ConditionedOn::Locus1 => (freqs1, freqs2),
        ConditionedOn::Locus2 => (freqs2, freqs1),
    };

    let f_y = y_freqs.homozygosity();
    debug_assert!(f_y < 1.0, "monomorphic conditioned locus must be guarded upstream");

    // Fw = Σi pX_i · Σj (fij/pX_i)² = Σi Σj fij²/pX_i
    let mut weighted_homozygosity = 0.0;
    for (x, x_allele) in x_freqs.alleles().enumerate() {
        let p_x = x_freqs.freq(x_allele);
        for y in 0..y_freqs.len() {
            let freq = matrix.oriented(x, y, conditioned_on);
            weighted_homozygosity += freq * freq / p_x;
        }
    }

    let ald_squared = (weighted_homozygosity - f_y) / (1.0 - f_y);
    ald_squared.max(0.0).sqrt().min(1.0)
}
