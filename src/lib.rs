extern crate parser;
extern crate logger;

use parser::{Cli, Commands, Common, LdScan};

#[macro_use]
extern crate log;

use anyhow::Result;
use hapld_io::{read, write::TableWriter};
use ld_scan::{LocusTable, PairScanner, VectorExporter, RESULT_HEADER};

pub fn cite() {
    // If this ever becomes bloated, consider using the 'indoc' crate.
    const CITATIONS: &str = r###"
    A. If you plan to use the asymmetric linkage disequilibrium (ALD) values
       reported by hapld-rs, please cite:

        1. Thomson, G. & Single, R. M. Conditional asymmetric linkage
           disequilibrium (ALD): extending the biallelic r2 measure.
           Genetics 198, 321-331 (2014).
           https://doi.org/10.1534/genetics.114.165266


    B. For the multiallelic normalized disequilibrium coefficient D':

        1. Hedrick, P. W. Gametic disequilibrium measures: proceed with
           caution. Genetics 117, 331-341 (1987).
           https://doi.org/10.1093/genetics/117.2.331


    C. For the Wn ("Cramer's V") overall association statistic:

        1. Cockerham, C. C. & Weir, B. S. Digenic descent measures for
           finite populations. Genetics Research 30, 121-147 (1977).
           https://doi.org/10.1017/S0016672300017547

    "###;
    println!("{CITATIONS}");
}

/// Run the locus-pair scan of one genotype table and write the result table
/// (plus optional per-pair haplotype-vector files) under the output directory.
fn run_ld_scan(common: &Common, scan: &LdScan) -> Result<()> {
    let threshold = scan.checked_threshold();
    let phased    = !scan.unphased;

    // ----------------------------- Read the input table and build the locus table.
    info!("Reading genotype table '{}'", scan.input.display());
    let table = match scan.normalized {
        true => {
            let normalized = read::read_normalized_table(&scan.input)?;
            let rows = normalized.rows.into_iter().map(|row| (row.id, row.cells));
            LocusTable::from_columns(normalized.loci, rows, scan.truncate)?
        },
        false => {
            let records = read::read_family_table(&scan.input, &scan.relation_column, &scan.gl_column)?;
            let parents: Vec<&read::FamilyRecord> = records.iter()
                .filter(|record| !record.is_child())
                .collect();
            debug!("Excluded {} child record(s)", records.len() - parents.len());
            LocusTable::from_gl_strings(
                parents.iter().map(|record| (record.id.as_str(), record.gl_string.as_str())),
                scan.truncate,
            )?
        },
    };

    info!("Found {} loci across {} subjects", table.loci.len(), table.samples.len());
    if let Some(prefix) = &table.prefix {
        info!("Common locus prefix '{prefix}' stripped from allele labels");
    }

    // ----------------------------- Resolve output paths before any computation.
    let file_prefix = common.get_file_prefix(&scan.input)?;
    let result_path = file_prefix.with_extension("result");
    common.can_write_file(&result_path)?;

    let dataset = file_prefix.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "hapld".to_string());

    // ----------------------------- Scan every locus pair.
    let mut scanner = PairScanner::new(&table, threshold, phased);
    if scan.vectors {
        let exporter = VectorExporter::new(&common.output_dir, dataset, phased, common.overwrite);
        scanner = scanner.with_exporter(exporter);
    }
    let results = scanner.scan()?;

    // ----------------------------- Write the result table.
    info!("Writing result table '{}'", result_path.display());
    let mut writer = TableWriter::new(Some(&result_path))?;
    writer.write_record(RESULT_HEADER)?;
    for result in results.iter() {
        writer.write_record(result.to_row())?;
    }
    writer.flush()?;

    println!("{results}");
    Ok(())
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.commands {
        Commands::LdScan {common, scan} => {
            run_ld_scan(&common, &scan)?;
        },

        Commands::FromYaml{yaml} => {
            let cli = Cli::deserialize(&yaml)?;
            self::run(cli)?;
        },

        Commands::Cite => {
            cite();
        }
    };
    Ok(())
}
