use std::{
    fs::File,
    path::{Path, PathBuf},
    fmt::{self, Display, Formatter},
    ffi::OsStr,
};

use clap::{Parser, Subcommand};
use serde::{Serialize, Deserialize};
use log::{debug, warn};
use anyhow::{anyhow, Context, Result};

mod error;
pub use error::ParserError;

/// Floor value for `--threshold`. User-provided values below this are coerced.
pub const MIN_THRESHOLD: usize = 1;

#[derive(Parser, Debug, Serialize, Deserialize)]
#[clap(name="hapld-rs", author, version, about, long_about = None)]
#[clap(propagate_version = true)]
/// hapld-rs: pairwise LD and conditional asymmetric LD from family genotype tables
pub struct Cli {
    /// Set the verbosity level (-v -vv -vvv)
    ///
    /// Set the verbosity level of this program. Multiple levels allowed {n}
    ///
    /// -v: Info  |  -vv: Debug  | -vvv: Trace {n}
    ///
    /// Note that the program will still output warnings by default, even when this flag is off.
    /// Use --quiet/-q to disable them
    #[clap(short='v', long, parse(from_occurrences), global=true)]
    pub verbose: u8,

    /// Disable warnings.
    ///
    /// By default, warnings are emitted and redirected to the console, even when verbose mode is off.
    /// Use this argument to disable this. Only errors will be displayed.
    #[clap(short='q', long, global=true)]
    pub quiet: bool,

    #[clap(subcommand)]
    pub commands: Commands,
}

impl Cli {
    /// Serialize command line arguments within a `.yaml` file.
    ///
    /// # Behavior
    /// - File naming follows the convention '{current time}-{module name}.yaml'. current time follows
    ///   the format `YYYY`-`MM`-`DD`T`hhmmss`
    /// - File is written at the root of the user-provided `--output-dir` folder.
    ///
    /// # Errors
    /// If `serde_yaml` fails to parse `Self` to a string, or the file cannot be written.
    pub fn serialize(&self) -> Result<()> {
        let serialized = serde_yaml::to_string(&self)
            .context("Failed to serialize command line arguments")?;

        debug!("\n---- Command line args ----\n{}\n---", serialized);

        let current_time = chrono::offset::Local::now().format("%Y-%m-%dT%H%M%S").to_string();

        let output_file = match &self.commands {
            Commands::LdScan {common, scan: _} => {
                common.output_dir.join(format!("{current_time}-ld-scan.yaml"))
            },
            Commands::FromYaml {yaml: _} | Commands::Cite => return Ok(()),
        };

        std::fs::write(&output_file, serialized)
            .with_context(|| format!("Unable to serialize arguments into {}", output_file.display()))
    }

    /// Deserialize a `.yaml` file into command line arguments.
    ///
    /// # Errors
    /// If the provided `.yaml` file cannot be opened, or fails to parse into `Self`.
    pub fn deserialize(yaml: &Path) -> Result<Self> {
        let file = File::open(yaml)
            .with_context(|| format!("Failed to open {}", yaml.display()))?;
        serde_yaml::from_reader(file)
            .with_context(|| format!("Unable to deserialize arguments from {}", yaml.display()))
    }
}

#[derive(Subcommand, Debug, Serialize, Deserialize)]
pub enum Commands {
    /// Compute D', Wn and directional ALD for every locus pair of a genotype table.
    LdScan {
        #[clap(flatten)]
        common: Common,
        #[clap(flatten)]
        scan: LdScan,
    },

    /// Run hapld-rs using a previously generated .yaml configuration file.
    ///
    /// This allows users to easily re-apply a hapld-rs command using the exact same parameters
    /// and arguments.
    FromYaml {
        yaml: PathBuf,
    },

    Cite,
}

#[derive(Parser, Debug, Default, Serialize, Deserialize)]
pub struct Common {
    /// Output directory where results will be written.
    ///
    /// Note that hapld-rs will create the specified leaf directory if it is not present, but does not
    /// allow itself from creating parent directories.
    #[clap(short, long, default_value("hapld-output"), parse(try_from_os_str=valid_output_dir))]
    pub output_dir: PathBuf,

    /// Overwrite existing output files.
    ///
    /// By default, hapld-rs does not allow itself from overwriting existing results files. Use this
    /// flag to force this behaviour.
    #[clap(short='w', long)]
    pub overwrite: bool,

    /// Dataset label.
    ///
    /// Used to tag the rows of haplotype-vector files, and as the output file prefix whenever the
    /// input table's filestem is unusable. Defaults to the input filestem.
    #[clap(short, long)]
    pub label: Option<String>,
}

impl Common {
    /// Get a generic filename prefix for our output files: `--label` when provided,
    /// otherwise the filestem of the input table.
    ///
    /// # Errors
    /// - if neither `--label` nor a valid input filestem is available.
    pub fn get_file_prefix(&self, input: &Path) -> Result<PathBuf> {
        let file_prefix = match &self.label {
            Some(label) => OsStr::new(label),
            None => input.file_stem()
                .ok_or_else(|| anyhow!(ParserError::ParseOutputPrefix))
                .context("While parsing command line arguments")?,
        };
        Ok(self.output_dir.join(file_prefix))
    }

    /// Check if a given file already exists ; raise an error if such is the case, and the user did
    /// not explicitly allow file overwriting.
    ///
    /// # Errors
    /// - If the provided `path` already exists and the user did not specifically allow for file
    ///   overwrite using the `--overwrite` argument
    pub fn can_write_file(&self, path: &Path) -> Result<bool> {
        if !self.overwrite && path.exists() {
            return Err(ParserError::CannotOverwrite(path.display().to_string()))
                .context("While parsing command line arguments")
        }
        Ok(true)
    }
}

#[derive(Parser, Debug, Default, Serialize, Deserialize)]
pub struct LdScan {
    /// Input genotype table.
    ///
    /// Accepted file formats:{n}
    ///   '.csv' : comma-separated{n}
    ///   '.tsv' :   tab-separated{n}
    ///   '.txt' :   tab-separated{n}
    ///
    /// The default layout is a family table carrying a relation/role column and a GL-string
    /// column formatted as '<strand1>+<strand2>'. See --normalized for the alternative layout.
    #[clap(short, long, parse(try_from_os_str=valid_input_file))]
    pub input: PathBuf,

    /// Treat the input as a pre-normalized column-oriented genotype table.
    ///
    /// Expected layout: one sample-id column, followed by two adjacent columns per locus
    /// (one per haplotype strand), in fixed locus order. The first column of each pair names
    /// the locus. Empty cells mark missing alleles.
    #[clap(short='N', long)]
    pub normalized: bool,

    /// Minimum number of complete subjects required to analyze a locus pair.
    ///
    /// Locus pairs whose complete-subject count lies below this value are reported as
    /// 'Not Calculated'. Values below 1 are coerced to 1.
    #[clap(short, long, default_value("10"))]
    pub threshold: isize,

    /// Treat genotypes as unphased, and estimate haplotype frequencies through EM.
    ///
    /// By default, the two strands of every GL-string are considered phased, and haplotype
    /// frequencies are obtained through direct counting.
    #[clap(short, long)]
    pub unphased: bool,

    /// Truncate allele variant labels to their first <TRUNCATE> colon-delimited fields.
    ///
    /// e.g. '--truncate 2' reduces 'A*01:01:01:02' to 'A*01:01'. Labels with fewer fields are
    /// left unchanged. 0 disables truncation.
    #[clap(short='T', long, default_value("0"))]
    pub truncate: usize,

    /// Write one haplotype-vector file per analyzed locus pair.
    ///
    /// Each file contains every allele-pair combination of the locus pair, along with its
    /// estimated frequency and count.
    #[clap(long)]
    pub vectors: bool,

    /// Header name of the relation/role column (family-table layout).
    ///
    /// Rows whose value equals 'child' (case-insensitive) are excluded from the analysis.
    #[clap(long, default_value("Relation"))]
    pub relation_column: String,

    /// Header name of the GL-string column (family-table layout).
    #[clap(long, default_value("GL String"))]
    pub gl_column: String,
}

impl LdScan {
    /// Return the subject-count threshold, coerced to the [`MIN_THRESHOLD`] floor.
    pub fn checked_threshold(&self) -> usize {
        if self.threshold < MIN_THRESHOLD as isize {
            warn!("--threshold must be at least {MIN_THRESHOLD}. Coercing the provided value ({}) to {MIN_THRESHOLD}", self.threshold);
            return MIN_THRESHOLD
        }
        self.threshold as usize
    }
}

#[derive(Debug, Clone, Copy)]
pub enum FileEntity {File, Directory}

impl Display for FileEntity {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::File      => write!(f, "File"),
            Self::Directory => write!(f, "Directory"),
        }
    }
}

impl FileEntity {
    fn validate(&self, path: &Path) -> Result<(), ParserError> {
        use ParserError::InvalidFileEntity;
        let valid = match self {
            Self::File      => path.is_file(),
            Self::Directory => path.is_dir(),
        };

        if valid {
            Ok(())
        } else {
            Err(InvalidFileEntity(*self, path.display().to_string()))
        }
    }
}

fn assert_filesystem_entity_is_valid(s: &OsStr, entity: &FileEntity) -> Result<()> {
    use ParserError::MissingFileEntity;
    let path = Path::new(s);
    if ! path.exists() {
        return Err(MissingFileEntity(*entity, path.display().to_string()))
            .context("While parsing arguments.")
    }

    entity.validate(path).context("While parsing arguments.")
}

fn valid_input_file(s: &OsStr) -> Result<PathBuf> {
    assert_filesystem_entity_is_valid(s, &FileEntity::File)
        .context("While checking for file validity")?;
    Ok(PathBuf::from(s))
}

fn valid_output_dir(s: &OsStr) -> Result<PathBuf> {
    if ! Path::new(s).exists() {
        std::fs::create_dir(s)?;
    }
    assert_filesystem_entity_is_valid(s, &FileEntity::Directory)
        .context("While checking for directory validity")?;
    Ok(PathBuf::from(s))
}
