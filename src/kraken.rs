use crate::samples::{ReadLayout, SampleSet};
use anyhow::{anyhow, Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

/// How to invoke the external kraken2 binary for one combined run.
#[derive(Debug, Clone)]
pub struct KrakenInvocation {
    pub kraken: PathBuf,
    pub db: PathBuf,
    pub threads: usize,
    pub confidence: f64,
    pub gzip_compressed: bool,
}

impl KrakenInvocation {
    /// Kraken2 already ran if any classified/unclassified artifact exists
    /// (single-end names or the `_1` names the paired template expands to).
    pub fn classification_done(tmp_dir: &Path) -> bool {
        [
            "classified_seqs.fastq",
            "unclassified_seqs.fastq",
            "classified_seqs_1.fastq",
            "unclassified_seqs_1.fastq",
        ]
        .iter()
        .any(|name| tmp_dir.join(name).is_file())
    }

    pub fn report_path(tmp_dir: &Path) -> PathBuf {
        tmp_dir.join("report.txt")
    }

    pub fn output_path(tmp_dir: &Path) -> PathBuf {
        tmp_dir.join("output.txt")
    }

    /// Argument list for one run over the concatenated reads. Paired mode
    /// uses kraken2's `#` file-name template for the read-direction pair.
    pub fn build_args(&self, samples: &SampleSet, tmp_dir: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--threads".into(),
            self.threads.to_string().into(),
            "--db".into(),
            self.db.clone().into(),
            "--confidence".into(),
            self.confidence.to_string().into(),
        ];

        let paired = samples.layout() == ReadLayout::PairedEnd;
        let seqs_template = if paired { "#.fastq" } else { ".fastq" };
        args.push("--classified-out".into());
        args.push(
            tmp_dir
                .join(format!("classified_seqs{}", seqs_template))
                .into(),
        );
        args.push("--unclassified-out".into());
        args.push(
            tmp_dir
                .join(format!("unclassified_seqs{}", seqs_template))
                .into(),
        );
        args.push("--report".into());
        args.push(Self::report_path(tmp_dir).into());
        args.push("--output".into());
        args.push(Self::output_path(tmp_dir).into());
        args.push("--use-names".into());
        if self.gzip_compressed {
            args.push("--gzip-compressed".into());
        }

        if paired {
            args.push("--paired".into());
            args.push(samples.concat_path(tmp_dir, 0).into());
            args.push(samples.concat_path(tmp_dir, 1).into());
        } else {
            args.push(samples.concat_path(tmp_dir, 0).into());
        }
        args
    }

    /// Run kraken2 over the concatenated reads, inheriting its stdio so
    /// its progress lands on the console. Nonzero exit is an error.
    pub fn run(&self, samples: &SampleSet, tmp_dir: &Path) -> Result<()> {
        let args = self.build_args(samples, tmp_dir);
        log::debug!("command: {:?} {:?}", self.kraken, args);

        let status = Command::new(&self.kraken)
            .args(&args)
            .status()
            .with_context(|| format!("failed to launch kraken2 at {:?}", self.kraken))?;
        if !status.success() {
            return Err(anyhow!("kraken2 exited with {}", status));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn sample_set(dir: &Path, suffixes: &[&str]) -> SampleSet {
        for suffix in suffixes {
            File::create(dir.join(format!("s1{}", suffix))).unwrap();
        }
        SampleSet::discover(dir, &suffixes.iter().map(|s| s.to_string()).collect::<Vec<_>>())
            .unwrap()
    }

    fn invocation() -> KrakenInvocation {
        KrakenInvocation {
            kraken: "/opt/kraken2/kraken2".into(),
            db: "/data/k2db".into(),
            threads: 8,
            confidence: 0.1,
            gzip_compressed: false,
        }
    }

    #[test]
    fn paired_args_use_hash_template_and_both_mates() {
        let dir = tempfile::tempdir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let samples = sample_set(dir.path(), &["_R1.fq", "_R2.fq"]);

        let args = invocation().build_args(&samples, tmp.path());
        let rendered: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect();

        assert!(rendered.contains(&"--paired".to_string()));
        assert!(rendered.contains(&"--use-names".to_string()));
        assert!(rendered
            .iter()
            .any(|a| a.ends_with("classified_seqs#.fastq")));
        assert!(rendered.iter().any(|a| a.ends_with("_R1.fq")));
        assert!(rendered.iter().any(|a| a.ends_with("_R2.fq")));
        assert!(!rendered.contains(&"--gzip-compressed".to_string()));
    }

    #[test]
    fn single_end_args_skip_pairing() {
        let dir = tempfile::tempdir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let samples = sample_set(dir.path(), &[".fq"]);

        let mut inv = invocation();
        inv.gzip_compressed = true;
        let rendered: Vec<String> = inv
            .build_args(&samples, tmp.path())
            .iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect();

        assert!(!rendered.contains(&"--paired".to_string()));
        assert!(rendered.contains(&"--gzip-compressed".to_string()));
        assert!(rendered.iter().any(|a| a.ends_with("classified_seqs.fastq")));
    }

    #[test]
    fn done_detection_accepts_any_artifact() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(!KrakenInvocation::classification_done(tmp.path()));
        File::create(tmp.path().join("unclassified_seqs_1.fastq")).unwrap();
        assert!(KrakenInvocation::classification_done(tmp.path()));
    }
}
