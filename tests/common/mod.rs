use std::fs;
use std::path::PathBuf;

use clap::Parser;
use tempfile::TempDir;

/// A self-contained scan workspace: one input table and one output directory, both living
/// under the same temporary directory.
pub struct ScanWorkspace {
    _tempdir  : TempDir,
    input     : PathBuf,
    output_dir: PathBuf,
}

impl ScanWorkspace {
    pub fn new(filename: &str, table: &str) -> Self {
        let tempdir = tempfile::tempdir().expect("Failed to generate temp directory");
        let input = tempdir.path().join(filename);
        fs::write(&input, table).expect("Failed to write input table");
        let output_dir = tempdir.path().join("hapld-test-output");
        ScanWorkspace{_tempdir: tempdir, input, output_dir}
    }

    /// Run `hapld-rs ld-scan` over the workspace's input table.
    pub fn run(&self, extra_args: &[&str]) {
        let mut args = vec![
            "hapld-rs".to_string(),
            "ld-scan".to_string(),
            "--input".to_string(),
            self.input.display().to_string(),
            "--output-dir".to_string(),
            self.output_dir.display().to_string(),
            "--overwrite".to_string(),
        ];
        args.extend(extra_args.iter().map(ToString::to_string));

        let cli = parser::Cli::parse_from(args);
        hapld_rs::run(cli).expect("hapld-rs run failed");
    }

    pub fn result_path(&self) -> PathBuf {
        let stem = self.input.file_stem().expect("Input table has no filestem");
        self.output_dir.join(stem).with_extension("result")
    }

    /// Parse the written result table into rows of fields (header included).
    pub fn result_rows(&self) -> Vec<Vec<String>> {
        let path = self.result_path();
        let contents = fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("Failed to open test output file: {}", path.display()));
        contents.lines()
            .map(|line| line.split(',').map(ToString::to_string).collect())
            .collect()
    }

    /// List the haplotype-vector files written under the output directory.
    pub fn vector_files(&self) -> Vec<PathBuf> {
        fs::read_dir(&self.output_dir)
            .expect("Failed to read test output directory")
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
            .collect()
    }
}
