use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Local;
use hapld_io::{parse::can_write_file, write::TableWriter};
use log::info;

use crate::freqs::{AlleleFreqs, HaplotypeFreqs};

/// Writes one haplotype-frequency vector file per analyzed locus pair.
///
/// Each file lists every allele(Loc1) × allele(Loc2) combination, zero-frequency ones
/// included. The default file name carries the dataset prefix, phase tag, locus names
/// and a timestamp, so repeated runs never collide.
pub struct VectorExporter {
    output_dir: PathBuf,
    dataset   : String,
    phased    : bool,
    overwrite : bool,
}

impl VectorExporter {
    pub fn new(output_dir: impl Into<PathBuf>, dataset: impl Into<String>, phased: bool, overwrite: bool) -> Self {
        Self{output_dir: output_dir.into(), dataset: dataset.into(), phased, overwrite}
    }

    fn phase_tag(&self) -> &'static str {
        if self.phased { "phased" } else { "unphased" }
    }

    fn default_filename(&self, loc1: &str, loc2: &str) -> String {
        let timestamp = Local::now().format("%Y-%m-%dT%H%M%S");
        format!("{}-{}-{loc1}-{loc2}-{timestamp}.csv", self.dataset, self.phase_tag())
    }

    /// Export one pair's vector file under the default name. Returns the written path.
    pub fn export(
        &self,
        loc1        : &str,
        loc2        : &str,
        haps        : &HaplotypeFreqs,
        freqs1      : &AlleleFreqs,
        freqs2      : &AlleleFreqs,
        n_haplotypes: usize,
    ) -> Result<PathBuf> {
        let path = self.output_dir.join(self.default_filename(loc1, loc2));
        self.export_to(&path, loc1, loc2, haps, freqs1, freqs2, n_haplotypes)?;
        Ok(path)
    }

    /// Export one pair's vector file to an explicit path.
    #[allow(clippy::too_many_arguments)]
    pub fn export_to(
        &self,
        path        : &Path,
        loc1        : &str,
        loc2        : &str,
        haps        : &HaplotypeFreqs,
        freqs1      : &AlleleFreqs,
        freqs2      : &AlleleFreqs,
        n_haplotypes: usize,
    ) -> Result<()> {
        can_write_file(self.overwrite, path)?;
        info!("Writing haplotype vector file '{}'", path.display());

        let mut writer = TableWriter::new(Some(path))?;
        let pair_label = format!("{loc1}~{loc2}");
        writer.write_record(["Dataset", "Phase", pair_label.as_str(), "Frequency", "Count"])?;
        for a in freqs1.alleles() {
            for b in freqs2.alleles() {
                let freq  = haps.freq(a, b);
                let count = freq * n_haplotypes as f64;
                writer.write_record([
                    self.dataset.to_string(),
                    self.phase_tag().to_string(),
                    format!("{a}~{b}"),
                    freq.to_string(),
                    count.to_string(),
                ])?;
            }
        }
        writer.flush()
    }
}
