use ahash::AHashMap;

/// Per-locus allele-frequency table over the 2N allele observations of a locus-pair slice.
/// Alleles are kept in first-seen order, which fixes the row/column order of every
/// downstream matrix.
#[derive(Debug, Clone)]
pub struct AlleleFreqs {
    order : Vec<String>,
    counts: AHashMap<String, usize>,
    total : usize,
}

impl AlleleFreqs {
    pub fn from_observations<'a>(observations: impl IntoIterator<Item = &'a str>) -> Self {
        let mut order  = Vec::new();
        let mut counts = AHashMap::new();
        let mut total  = 0;
        for allele in observations {
            total += 1;
            *counts.entry(allele.to_string()).or_insert_with(|| {
                order.push(allele.to_string());
                0
            }) += 1;
        }
        AlleleFreqs{order, counts, total}
    }

    /// Number of distinct alleles.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// A monomorphic locus carries exactly one distinct allele value.
    pub fn is_monomorphic(&self) -> bool {
        self.order.len() == 1
    }

    /// Total number of allele observations (2N).
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn count(&self, allele: &str) -> usize {
        self.counts.get(allele).copied().unwrap_or(0)
    }

    pub fn freq(&self, allele: &str) -> f64 {
        match self.total {
            0 => 0.0,
            n => self.count(allele) as f64 / n as f64,
        }
    }

    /// Unconditional homozygosity F = Σ freq².
    pub fn homozygosity(&self) -> f64 {
        self.order.iter().map(|allele| self.freq(allele).powi(2)).sum()
    }

    /// Distinct alleles, in first-seen order.
    pub fn alleles(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

/// Two-locus haplotype-frequency table: (alleleA, alleleB) → estimated frequency.
/// Frequencies sum to 1 (± floating tolerance) over all retained haplotypes.
/// Insertion order is preserved.
#[derive(Debug, Clone, Default)]
pub struct HaplotypeFreqs {
    order: Vec<(String, String)>,
    freqs: AHashMap<(String, String), f64>,
}

impl HaplotypeFreqs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate `weight` onto the (a, b) haplotype, registering it on first sight.
    pub fn add(&mut self, a: &str, b: &str, weight: f64) {
        let key = (a.to_string(), b.to_string());
        match self.freqs.get_mut(&key) {
            Some(freq) => *freq += weight,
            None => {
                self.order.push(key.clone());
                self.freqs.insert(key, weight);
            },
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn freq(&self, a: &str, b: &str) -> f64 {
        self.freqs.get(&(a.to_string(), b.to_string())).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.freqs.values().sum()
    }

    /// Iterate haplotypes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, f64)> {
        self.order.iter().map(|key| (key.0.as_str(), key.1.as_str(), self.freqs[key]))
    }

    /// Multiply every frequency by `factor` (e.g. 1/2N after raw counting).
    pub fn scale(&mut self, factor: f64) {
        for freq in self.freqs.values_mut() {
            *freq *= factor;
        }
    }

    /// Drop haplotypes whose frequency fell below `threshold`, preserving order.
    pub fn prune(&mut self, threshold: f64) {
        let freqs = &mut self.freqs;
        self.order.retain(|key| {
            let keep = freqs[key] >= threshold;
            if !keep {
                freqs.remove(key);
            }
            keep
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allele_counting() {
        let freqs = AlleleFreqs::from_observations(["A*01", "A*02", "A*01", "A*01"]);
        assert_eq!(freqs.len(), 2);
        assert_eq!(freqs.total(), 4);
        assert_eq!(freqs.count("A*01"), 3);
        assert_eq!(freqs.freq("A*01"), 0.75);
        assert_eq!(freqs.freq("A*24"), 0.0);
        assert_eq!(freqs.alleles().collect::<Vec<_>>(), vec!["A*01", "A*02"]); // first-seen order
    }

    #[test]
    fn homozygosity() {
        let freqs = AlleleFreqs::from_observations(["A*01", "A*02", "A*01", "A*02"]);
        assert!((freqs.homozygosity() - 0.5).abs() < 1e-12);

        let monomorphic = AlleleFreqs::from_observations(["A*01", "A*01"]);
        assert!(monomorphic.is_monomorphic());
        assert!((monomorphic.homozygosity() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn haplotype_accumulation() {
        let mut haps = HaplotypeFreqs::new();
        haps.add("A*01", "B*07", 2.0);
        haps.add("A*02", "B*08", 1.0);
        haps.add("A*01", "B*07", 1.0);
        haps.scale(0.25);

        assert_eq!(haps.len(), 2);
        assert_eq!(haps.freq("A*01", "B*07"), 0.75);
        assert_eq!(haps.freq("A*01", "B*08"), 0.0);
        assert!((haps.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pruning_preserves_order() {
        let mut haps = HaplotypeFreqs::new();
        haps.add("A*01", "B*07", 0.7);
        haps.add("A*01", "B*08", 1e-12);
        haps.add("A*02", "B*08", 0.3);
        haps.prune(1e-10);

        let retained: Vec<_> = haps.iter().map(|(a, b, _)| format!("{a}~{b}")).collect();
        assert_eq!(retained, vec!["A*01~B*07", "A*02~B*08"]);
    }
}
