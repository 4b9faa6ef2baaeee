use ahash::AHashMap;
use log::trace;

use crate::alleles::{parse_allele, truncate_variant, ParsedAllele};

mod error;
pub use error::TableError;

/// The two strand cells of one sample at one locus. Loci present on only one strand
/// for a given sample leave the other strand's cell missing (not an error).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Genotype {
    pub strand1: Option<String>,
    pub strand2: Option<String>,
}

impl Genotype {
    pub fn is_complete(&self) -> bool {
        self.strand1.is_some() && self.strand2.is_some()
    }
}

/// One subject/family-member contributing one genotype record.
/// `genotypes` is parallel to the owning table's canonical locus list.
#[derive(Debug, Clone)]
pub struct Sample {
    pub id       : String,
    pub genotypes: Vec<Genotype>,
}

/// The canonical per-sample locus-allele table.
/// - `loci`   : canonical, order-preserving locus list (column schema for all samples).
/// - `prefix` : shared gene-family prefix, stripped from all allele labels. `None` when no
///   prefix delimiter was found, or when the prefix was not identical across the dataset
///   (labels are then kept verbatim).
#[derive(Debug)]
pub struct LocusTable {
    pub loci   : Vec<String>,
    pub prefix : Option<String>,
    pub samples: Vec<Sample>,
}

impl LocusTable {
    /// Assemble the table from `(sample-id, GL-string)` records, each GL-string formatted as
    /// `<strand1>+<strand2>`, each strand a `~`-delimited list of `[PREFIX-]LOCUS*VARIANT`
    /// tokens. The two strands may carry unequal locus counts.
    ///
    /// The locus list and the shared prefix are derived once from the full parsed set.
    ///
    /// # Errors
    /// [`TableError::NoLoci`] when not a single locus token could be parsed.
    pub fn from_gl_strings<'a, I>(records: I, truncate: usize) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let parse_strand = |strand: &'a str| -> Vec<ParsedAllele<'a>> {
            strand.split('~')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(parse_allele)
                .collect()
        };

        let mut parsed: Vec<(&'a str, [Vec<ParsedAllele<'a>>; 2])> = Vec::new();
        for (id, gl_string) in records {
            let (strand1, strand2) = gl_string.split_once('+').unwrap_or((gl_string, ""));
            parsed.push((id, [parse_strand(strand1), parse_strand(strand2)]));
        }

        // The prefix is stripped only when present and identical on every allele of the dataset.
        let mut tokens = parsed.iter().flat_map(|(_, strands)| strands.iter().flatten());
        let prefix = match tokens.next() {
            None        => return Err(TableError::NoLoci),
            Some(first) => match first.prefix {
                Some(p) if tokens.all(|token| token.prefix == Some(p)) => Some(p.to_string()),
                _ => None,
            },
        };

        let locus_key = |token: &ParsedAllele| -> String {
            match (prefix.is_some(), token.prefix) {
                (false, Some(p)) => format!("{p}-{}", token.locus), // inconsistent prefix: kept verbatim
                _                => token.locus.to_string(),
            }
        };
        let allele_label = |token: &ParsedAllele| -> String {
            let key = locus_key(token);
            match token.variant {
                Some(variant) => format!("{key}*{}", truncate_variant(variant, truncate)),
                None          => key,
            }
        };

        // Canonical locus order = first-seen order over samples, strand1 before strand2.
        let mut loci : Vec<String> = Vec::new();
        let mut index: AHashMap<String, usize> = AHashMap::new();
        for (_, strands) in &parsed {
            for token in strands.iter().flatten() {
                let key = locus_key(token);
                if !index.contains_key(&key) {
                    index.insert(key.clone(), loci.len());
                    loci.push(key);
                }
            }
        }

        let mut samples = Vec::with_capacity(parsed.len());
        for (id, strands) in &parsed {
            let mut genotypes = vec![Genotype::default(); loci.len()];
            for (strand_index, strand) in strands.iter().enumerate() {
                for token in strand {
                    let cell = &mut genotypes[index[&locus_key(token)]];
                    let slot = match strand_index {
                        0 => &mut cell.strand1,
                        _ => &mut cell.strand2,
                    };
                    match slot {
                        Some(_) => trace!("Sample '{id}': duplicate locus '{}' on strand {}. Keeping the first allele", locus_key(token), strand_index + 1),
                        None    => *slot = Some(allele_label(token)),
                    }
                }
            }
            samples.push(Sample{id: (*id).to_string(), genotypes});
        }

        Ok(LocusTable{loci, prefix, samples})
    }

    /// Assemble the table from a pre-normalized column-oriented layout: a fixed locus order,
    /// and per sample one `(strand1, strand2)` cell pair per locus. Allele labels are kept
    /// verbatim, save for variant truncation.
    ///
    /// # Errors
    /// [`TableError::NoLoci`] when the locus list is empty.
    pub fn from_columns<I>(loci: Vec<String>, rows: I, truncate: usize) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = (String, Vec<(Option<String>, Option<String>)>)>,
    {
        if loci.is_empty() {
            return Err(TableError::NoLoci)
        }

        let normalize = |label: Option<String>| -> Option<String> {
            let label = label?;
            Some(match label.split_once('*') {
                Some((head, variant)) if truncate > 0 => format!("{head}*{}", truncate_variant(variant, truncate)),
                _ => label,
            })
        };

        let samples = rows.into_iter()
            .map(|(id, cells)| {
                let mut cells = cells.into_iter();
                let genotypes = (0..loci.len())
                    .map(|_| {
                        let (strand1, strand2) = cells.next().unwrap_or((None, None));
                        Genotype{strand1: normalize(strand1), strand2: normalize(strand2)}
                    })
                    .collect();
                Sample{id, genotypes}
            })
            .collect();

        Ok(LocusTable{loci, prefix: None, samples})
    }

    /// Project the 4-column slice of a locus pair, restricted to complete subjects (no
    /// missing value in any of the 4 cells). Column order:
    /// `[locus-i strand1, locus-i strand2, locus-j strand1, locus-j strand2]`.
    pub fn pair_slice(&self, i: usize, j: usize) -> Vec<[&str; 4]> {
        self.samples.iter()
            .filter_map(|sample| {
                let (a, b) = (&sample.genotypes[i], &sample.genotypes[j]);
                match (&a.strand1, &a.strand2, &b.strand1, &b.strand2) {
                    (Some(a1), Some(a2), Some(b1), Some(b2)) => {
                        Some([a1.as_str(), a2.as_str(), b1.as_str(), b2.as_str()])
                    },
                    _ => None,
                }
            })
            .collect()
    }
}
