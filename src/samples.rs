use crate::utils::open_file;
use anyhow::{anyhow, Context, Result};
use flate2::read::MultiGzDecoder;
use std::collections::BTreeSet;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadLayout {
    SingleEnd,
    PairedEnd,
}

impl fmt::Display for ReadLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadLayout::SingleEnd => write!(f, "single-end"),
            ReadLayout::PairedEnd => write!(f, "paired-end"),
        }
    }
}

/// `--suffix` takes one suffix (single-end) or two comma-separated
/// suffixes (paired-end); anything else is a usage error.
pub fn parse_suffixes(arg: &str) -> Result<Vec<String>> {
    let suffixes = crate::utils::parse_comma_separated_list(arg);
    match suffixes.len() {
        1 | 2 => Ok(suffixes),
        n => Err(anyhow!("--suffix takes 1 or 2 comma-separated values, got {}", n)),
    }
}

/// The samples discovered in an input directory, in sorted name order.
#[derive(Debug, Clone)]
pub struct SampleSet {
    pub input_dir: PathBuf,
    pub suffixes: Vec<String>,
    pub names: Vec<String>,
}

impl SampleSet {
    /// Scan `input_dir` for files ending in the given suffix(es). The
    /// sample name is the file name minus the suffix; in paired mode both
    /// mates must be present.
    pub fn discover(input_dir: &Path, suffixes: &[String]) -> Result<Self> {
        let mut names: BTreeSet<String> = BTreeSet::new();

        for entry in fs::read_dir(input_dir)
            .with_context(|| format!("cannot read input directory {:?}", input_dir))?
        {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().to_string();
            for suffix in suffixes {
                if let Some(stem) = file_name.strip_suffix(suffix.as_str()) {
                    names.insert(stem.to_string());
                }
            }
        }

        if names.is_empty() {
            return Err(anyhow!(
                "no files ending in {:?} under {:?}",
                suffixes,
                input_dir
            ));
        }

        let set = Self {
            input_dir: input_dir.to_path_buf(),
            suffixes: suffixes.to_vec(),
            names: names.into_iter().collect(),
        };

        if set.layout() == ReadLayout::PairedEnd {
            for name in &set.names {
                for mate in 0..2 {
                    let path = set.mate_path(name, mate);
                    if !path.is_file() {
                        return Err(anyhow!("sample {} is missing mate file {:?}", name, path));
                    }
                }
            }
        }
        Ok(set)
    }

    pub fn layout(&self) -> ReadLayout {
        if self.suffixes.len() == 2 {
            ReadLayout::PairedEnd
        } else {
            ReadLayout::SingleEnd
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Input file for one sample and read direction.
    pub fn mate_path(&self, name: &str, mate: usize) -> PathBuf {
        self.input_dir.join(format!("{}{}", name, self.suffixes[mate]))
    }

    /// Concatenated per-direction file inside the scratch directory.
    pub fn concat_path(&self, tmp_dir: &Path, mate: usize) -> PathBuf {
        tmp_dir.join(&self.suffixes[mate])
    }

    /// Concatenate every sample's reads per direction, in sample order.
    /// Skipped entirely when the first direction's file is already there.
    /// Returns whether any work was done.
    pub fn concat_reads(&self, tmp_dir: &Path) -> Result<bool> {
        if self.concat_path(tmp_dir, 0).is_file() {
            log::info!("concatenated reads already exist, skipping");
            return Ok(false);
        }

        for mate in 0..self.suffixes.len() {
            let dest = self.concat_path(tmp_dir, mate);
            let mut writer = BufWriter::new(
                OpenOptions::new()
                    .create(true)
                    .write(true)
                    .truncate(true)
                    .open(&dest)?,
            );
            for (i, name) in self.names.iter().enumerate() {
                let src = self.mate_path(name, mate);
                log::info!(
                    "{}/{}: {:?} -> {:?}",
                    i + 1,
                    self.names.len(),
                    src.file_name().unwrap_or_default(),
                    dest.file_name().unwrap_or_default()
                );
                let mut reader = open_file(&src)?;
                io::copy(&mut reader, &mut writer)
                    .with_context(|| format!("concatenating {:?}", src))?;
            }
        }
        Ok(true)
    }

    /// Reads per sample, from the first-direction file (line count / 4).
    pub fn count_reads(&self, gzip_compressed: bool) -> Result<Vec<u64>> {
        let mut counts = Vec::with_capacity(self.names.len());
        for (i, name) in self.names.iter().enumerate() {
            let path = self.mate_path(name, 0);
            let n = count_fastq_reads(&path, gzip_compressed)?;
            log::info!("{}/{}: {} : {} reads", i + 1, self.names.len(), name, n);
            counts.push(n);
        }
        Ok(counts)
    }
}

/// Line count / 4, transparently gunzipping when asked to.
pub fn count_fastq_reads(path: &Path, gzip_compressed: bool) -> Result<u64> {
    let file = open_file(path)?;
    let reader: Box<dyn BufRead> = if gzip_compressed {
        Box::new(BufReader::new(MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    let mut lines: u64 = 0;
    for line in reader.lines() {
        line.with_context(|| format!("reading {:?}", path))?;
        lines += 1;
    }
    if lines % 4 != 0 {
        log::warn!("{:?}: {} lines is not a multiple of 4", path, lines);
    }
    Ok(lines / 4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::fs::File;
    use std::io::Write;

    fn touch(dir: &Path, name: &str, content: &str) {
        let mut f = File::create(dir.join(name)).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn suffix_arity_is_enforced() {
        assert_eq!(parse_suffixes("R1.fq,R2.fq").unwrap().len(), 2);
        assert_eq!(parse_suffixes(".fq").unwrap().len(), 1);
        assert!(parse_suffixes("a,b,c").is_err());
        assert!(parse_suffixes("").is_err());
    }

    #[test]
    fn paired_discovery_sorts_and_pairs() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "s2_R1.fq", "");
        touch(dir.path(), "s2_R2.fq", "");
        touch(dir.path(), "s1_R1.fq", "");
        touch(dir.path(), "s1_R2.fq", "");
        touch(dir.path(), "notes.txt", "");

        let set = SampleSet::discover(
            dir.path(),
            &["R1.fq".to_string(), "R2.fq".to_string()],
        )
        .unwrap();
        assert_eq!(set.layout(), ReadLayout::PairedEnd);
        assert_eq!(set.names, vec!["s1_".to_string(), "s2_".to_string()]);
    }

    #[test]
    fn missing_mate_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "s1_R1.fq", "");
        touch(dir.path(), "s1_R2.fq", "");
        touch(dir.path(), "s2_R1.fq", "");

        let err = SampleSet::discover(
            dir.path(),
            &["R1.fq".to_string(), "R2.fq".to_string()],
        )
        .unwrap_err();
        assert!(err.to_string().contains("s2_"));
    }

    #[test]
    fn no_matching_files_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "notes.txt", "");
        assert!(SampleSet::discover(dir.path(), &[".fq".to_string()]).is_err());
    }

    #[test]
    fn concatenation_appends_in_sample_order_and_skips_when_done() {
        let dir = tempfile::tempdir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.fq", "@a\nAC\n+\nII\n");
        touch(dir.path(), "b.fq", "@b\nGT\n+\nII\n");

        let set = SampleSet::discover(dir.path(), &[".fq".to_string()]).unwrap();
        assert!(set.concat_reads(tmp.path()).unwrap());

        let combined = std::fs::read_to_string(tmp.path().join(".fq")).unwrap();
        assert_eq!(combined, "@a\nAC\n+\nII\n@b\nGT\n+\nII\n");

        // second run finds the file and does nothing
        assert!(!set.concat_reads(tmp.path()).unwrap());
    }

    #[test]
    fn read_counting_handles_plain_and_gzip() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "plain.fq", "@r1\nACGT\n+\nIIII\n@r2\nACGT\n+\nIIII\n");
        assert_eq!(count_fastq_reads(&dir.path().join("plain.fq"), false).unwrap(), 2);

        let gz_path = dir.path().join("reads.fq.gz");
        let mut enc = GzEncoder::new(File::create(&gz_path).unwrap(), Compression::default());
        enc.write_all(b"@r1\nACGT\n+\nIIII\n").unwrap();
        enc.finish().unwrap();
        assert_eq!(count_fastq_reads(&gz_path, true).unwrap(), 1);
    }
}
