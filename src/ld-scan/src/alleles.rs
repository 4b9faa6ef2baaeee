/// The components of a `[PREFIX-]LOCUS*VARIANT` allele token.
/// - `prefix` : gene-family tag preceding the locus name (e.g. 'KIR' in 'KIR-2DL1*0010101'),
///   when a prefix delimiter is present.
/// - `locus`  : locus name (text before the variant marker, minus the prefix).
/// - `variant`: variant label (text after the variant marker). `None` when the token carries
///   no variant marker at all.
///
/// No validation of allele-name correctness is performed: malformed or unusual labels are
/// treated as ordinary distinct string values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedAllele<'a> {
    pub prefix : Option<&'a str>,
    pub locus  : &'a str,
    pub variant: Option<&'a str>,
}

/// Decompose an allele token into (prefix, locus, variant).
pub fn parse_allele(token: &str) -> ParsedAllele<'_> {
    let (locus_part, variant) = match token.split_once('*') {
        Some((locus_part, variant)) => (locus_part, Some(variant)),
        None                        => (token, None),
    };
    let (prefix, locus) = match locus_part.split_once('-') {
        Some((prefix, locus)) => (Some(prefix), locus),
        None                  => (None, locus_part),
    };
    ParsedAllele{prefix, locus, variant}
}

/// Reduce a colon-field-structured variant label to its first `depth` fields.
/// A depth of 0 disables truncation ; labels with fewer fields are left unchanged.
/// Idempotent: truncating an already-truncated label to the same or greater depth is a no-op.
pub fn truncate_variant(variant: &str, depth: usize) -> &str {
    if depth == 0 {
        return variant
    }
    match variant.match_indices(':').nth(depth - 1) {
        Some((index, _)) => &variant[..index],
        None             => variant,
    }
}
