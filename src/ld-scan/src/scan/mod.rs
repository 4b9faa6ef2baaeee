use std::fmt;
use std::ops::{Deref, DerefMut};

use itertools::Itertools;
use log::{debug, warn};

use crate::estimator;
use crate::freqs::AlleleFreqs;
use crate::stats::{self, LdEstimates};
use crate::table::LocusTable;
use crate::vectors::VectorExporter;

/// Column names of the result table, in output order.
pub const RESULT_HEADER: [&str; 6] = [
    "Loc1~Loc2", "D'", "Wn", "W(Loc1|Loc2)", "W(Loc2|Loc1)", "N_Haplotypes",
];

/// Outcome of one locus pair: either the computed estimates, or a structured guard
/// explaining why the pair was skipped.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Computed(LdEstimates),
    NotCalculated{threshold: usize, complete_subjects: usize, detail: String},
}

/// One row of the result table.
#[derive(Debug, Clone, PartialEq)]
pub struct PairResult {
    pub loc1   : String,
    pub loc2   : String,
    pub outcome: Outcome,
}

impl PairResult {
    pub fn pair_label(&self) -> String {
        format!("{}~{}", self.loc1, self.loc2)
    }

    /// Render as the six result-table fields. Numeric fields keep full precision;
    /// rounding is left to downstream consumers.
    pub fn to_row(&self) -> [String; 6] {
        match &self.outcome {
            Outcome::Computed(estimates) => [
                self.pair_label(),
                estimates.dprime.to_string(),
                estimates.wn.to_string(),
                estimates.w_1_given_2.to_string(),
                estimates.w_2_given_1.to_string(),
                estimates.n_haplotypes.to_string(),
            ],
            Outcome::NotCalculated{threshold, complete_subjects, detail} => [
                self.pair_label(),
                "Not Calculated".to_string(),
                format!("Subject Threshold={threshold}"),
                format!("Complete subjects={complete_subjects}"),
                detail.clone(),
                String::new(),
            ],
        }
    }
}

/// Ordered collection of per-pair results. Row order is lexicographic over the
/// canonical locus order, outer index first.
#[derive(Debug, Default)]
pub struct PairResults(Vec<PairResult>);

impl Deref for PairResults {
    type Target = Vec<PairResult>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for PairResults {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl fmt::Display for PairResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", RESULT_HEADER.join(" - "))?;
        self.0.iter().try_for_each(|result| {
            writeln!(f, "{}", result.to_row().join(" - "))
        })
    }
}

/// Walks every unordered locus pair of a [`LocusTable`] and records one
/// [`PairResult`] per pair.
///
/// Guard rows and computed rows coexist in the same table: a failure within one
/// pair never aborts the remaining pairs.
pub struct PairScanner<'a> {
    table    : &'a LocusTable,
    threshold: usize,
    phased   : bool,
    exporter : Option<VectorExporter>,
}

impl<'a> PairScanner<'a> {
    pub fn new(table: &'a LocusTable, threshold: usize, phased: bool) -> Self {
        Self{table, threshold, phased, exporter: None}
    }

    /// Attach a per-pair vector exporter. Guarded pairs emit no vector file.
    pub fn with_exporter(mut self, exporter: VectorExporter) -> Self {
        self.exporter = Some(exporter);
        self
    }

    pub fn scan(&self) -> anyhow::Result<PairResults> {
        let mut results = PairResults::default();
        for (i, j) in (0..self.table.loci.len()).tuple_combinations() {
            results.push(self.scan_pair(i, j)?);
        }
        Ok(results)
    }

    fn scan_pair(&self, i: usize, j: usize) -> anyhow::Result<PairResult> {
        let (loc1, loc2) = (&self.table.loci[i], &self.table.loci[j]);
        debug!("Scanning locus pair {loc1}~{loc2}");

        let slice = self.table.pair_slice(i, j);
        let complete_subjects = slice.len();

        let guard = |detail: String| PairResult {
            loc1   : loc1.clone(),
            loc2   : loc2.clone(),
            outcome: Outcome::NotCalculated{
                threshold: self.threshold,
                complete_subjects,
                detail,
            },
        };

        if complete_subjects < self.threshold {
            return Ok(guard(".".to_string()))
        }

        let freqs1 = AlleleFreqs::from_observations(slice.iter().flat_map(|row| [row[0], row[1]]));
        let freqs2 = AlleleFreqs::from_observations(slice.iter().flat_map(|row| [row[2], row[3]]));

        let monomorphic = [(loc1, &freqs1), (loc2, &freqs2)].into_iter()
            .filter(|(_, freqs)| freqs.is_monomorphic())
            .map(|(locus, _)| format!("{locus} is monomorphic."))
            .join(" ");
        if !monomorphic.is_empty() {
            return Ok(guard(monomorphic))
        }

        let haps = match estimator::estimate(&slice, self.phased) {
            Ok(haps) => haps,
            Err(error) => {
                warn!("{loc1}~{loc2}: {error}");
                return Ok(guard(error.to_string()))
            },
        };

        let n_haplotypes = 2 * complete_subjects;
        let estimates = stats::compute(&haps, &freqs1, &freqs2, n_haplotypes);

        if let Some(exporter) = &self.exporter {
            exporter.export(loc1, loc2, &haps, &freqs1, &freqs2, n_haplotypes)?;
        }

        Ok(PairResult{loc1: loc1.clone(), loc2: loc2.clone(), outcome: Outcome::Computed(estimates)})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableError;

    const TOLERANCE: f64 = 1e-9;

    fn gl(strand1: &[&str], strand2: &[&str]) -> String {
        format!("{}+{}", strand1.join("~"), strand2.join("~"))
    }

    fn table_from(records: &[String]) -> Result<LocusTable, TableError> {
        let ids: Vec<String> = (0..records.len()).map(|i| format!("S{i}")).collect();
        LocusTable::from_gl_strings(
            ids.iter().zip(records.iter()).map(|(id, gl)| (id.as_str(), gl.as_str())),
            0,
        )
    }

    /// 12 complete samples, two biallelic loci, fully linked phase.
    fn fully_linked_table() -> Result<LocusTable, TableError> {
        let mut records = vec![gl(&["A*1", "B*1"], &["A*2", "B*2"]); 6];
        records.extend(vec![gl(&["A*1", "B*1"], &["A*1", "B*1"]); 3]);
        records.extend(vec![gl(&["A*2", "B*2"], &["A*2", "B*2"]); 3]);
        table_from(&records)
    }

    fn computed(result: &PairResult) -> &LdEstimates {
        match &result.outcome {
            Outcome::Computed(estimates) => estimates,
            other => panic!("expected a computed outcome, got {other:?}"),
        }
    }

    #[test]
    fn fully_linked_scenario() -> anyhow::Result<()> {
        let table = fully_linked_table()?;
        let results = PairScanner::new(&table, 10, true).scan()?;

        assert_eq!(results.len(), 1);
        let estimates = computed(&results[0]);
        for value in [estimates.dprime, estimates.wn, estimates.w_1_given_2, estimates.w_2_given_1] {
            assert!((value - 1.0).abs() < TOLERANCE, "expected 1, got {value}");
        }
        assert_eq!(estimates.n_haplotypes, 24);
        assert_eq!(results[0].pair_label(), "A~B");
        Ok(())
    }

    #[test]
    fn threshold_guard_row_text() -> anyhow::Result<()> {
        let records = vec![gl(&["A*1", "B*1"], &["A*2", "B*2"]); 5];
        let table = table_from(&records)?;
        let results = PairScanner::new(&table, 10, true).scan()?;

        assert_eq!(
            results[0].to_row(),
            [
                "A~B".to_string(),
                "Not Calculated".to_string(),
                "Subject Threshold=10".to_string(),
                "Complete subjects=5".to_string(),
                ".".to_string(),
                String::new(),
            ],
        );
        Ok(())
    }

    #[test]
    fn monomorphism_guard_names_every_monomorphic_locus() -> anyhow::Result<()> {
        let records = vec![
            gl(&["A*1", "B*1", "C*1"], &["A*1", "B*2", "C*1"]),
            gl(&["A*1", "B*2", "C*1"], &["A*1", "B*1", "C*1"]),
        ];
        let table = table_from(&records)?;
        let results = PairScanner::new(&table, 1, true).scan()?;

        // Pair order: A~B, A~C, B~C.
        let detail = |result: &PairResult| match &result.outcome {
            Outcome::NotCalculated{detail, ..} => detail.clone(),
            other => panic!("expected a guard outcome, got {other:?}"),
        };
        assert_eq!(detail(&results[0]), "A is monomorphic.");
        assert_eq!(detail(&results[1]), "A is monomorphic. C is monomorphic.");
        assert_eq!(detail(&results[2]), "C is monomorphic.");
        Ok(())
    }

    #[test]
    fn monomorphism_guard_fires_regardless_of_threshold() -> anyhow::Result<()> {
        let records = vec![gl(&["A*1", "B*1"], &["A*1", "B*2"]); 20];
        let table = table_from(&records)?;
        let results = PairScanner::new(&table, 1, true).scan()?;

        assert!(matches!(&results[0].outcome, Outcome::NotCalculated{..}));
        Ok(())
    }

    #[test]
    fn lowering_the_threshold_never_retracts_a_computed_pair() -> anyhow::Result<()> {
        let records = vec![
            gl(&["A*1", "B*1"], &["A*2", "B*2"]),
            gl(&["A*2", "B*1"], &["A*1", "B*2"]),
            gl(&["A*1", "B*2"], &["A*2", "B*1"]),
        ];
        let table = table_from(&records)?;

        let strict  = PairScanner::new(&table, 10, true).scan()?;
        let relaxed = PairScanner::new(&table, 1, true).scan()?;
        for (before, after) in strict.iter().zip(relaxed.iter()) {
            if matches!(before.outcome, Outcome::Computed(_)) {
                assert!(matches!(after.outcome, Outcome::Computed(_)));
            }
        }
        Ok(())
    }

    #[test]
    fn pair_order_is_lexicographic_over_the_canonical_locus_order() -> anyhow::Result<()> {
        let records = vec![gl(&["C*1", "A*1", "B*1"], &["C*2", "A*2", "B*2"]); 2];
        let table = table_from(&records)?;
        let results = PairScanner::new(&table, 1, true).scan()?;

        let labels: Vec<String> = results.iter().map(PairResult::pair_label).collect();
        assert_eq!(labels, ["C~A", "C~B", "A~B"]);
        Ok(())
    }

    #[test]
    fn estimator_failure_becomes_a_guard_row_and_the_scan_continues() -> anyhow::Result<()> {
        // Locus B never carries a second strand: the A~B and B~C slices are empty. With a
        // zero threshold the empty slices reach the estimator, whose error must surface
        // as a guard row without aborting the remaining pairs.
        let records = vec![
            gl(&["A*1", "B*1", "C*1"], &["A*2", "C*2"]),
            gl(&["A*2", "B*2", "C*2"], &["A*1", "C*1"]),
        ];
        let table = table_from(&records)?;
        let results = PairScanner::new(&table, 0, true).scan()?;

        assert_eq!(results.len(), 3);
        match &results[0].outcome {
            Outcome::NotCalculated{complete_subjects, detail, ..} => {
                assert_eq!(*complete_subjects, 0);
                assert_eq!(detail, "Cannot estimate haplotype frequencies from an empty locus-pair slice");
            },
            other => panic!("expected a guard outcome, got {other:?}"),
        }
        assert!(matches!(results[1].outcome, Outcome::Computed(_))); // A~C unaffected
        assert!(matches!(results[2].outcome, Outcome::NotCalculated{..}));
        Ok(())
    }

    #[test]
    fn equilibrium_pair_computes_near_zero_statistics() -> anyhow::Result<()> {
        let records = vec![
            gl(&["A*1", "B*1"], &["A*1", "B*2"]),
            gl(&["A*1", "B*1"], &["A*1", "B*2"]),
            gl(&["A*2", "B*1"], &["A*2", "B*2"]),
            gl(&["A*2", "B*1"], &["A*2", "B*2"]),
        ];
        let table = table_from(&records)?;
        let results = PairScanner::new(&table, 1, true).scan()?;

        let estimates = computed(&results[0]);
        assert!(estimates.dprime.abs() < TOLERANCE);
        assert!(estimates.wn.abs() < TOLERANCE);
        Ok(())
    }
}
