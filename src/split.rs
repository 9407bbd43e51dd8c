use crate::utils::open_file;
use anyhow::{anyhow, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Per-sample output file for the split classifier output.
pub fn sample_output_path(out_dir: &Path, name: &str) -> PathBuf {
    out_dir.join(format!("{}out.txt", name))
}

/// The split already ran if the last sample's output exists.
pub fn already_split(out_dir: &Path, names: &[String]) -> bool {
    names
        .last()
        .map(|name| sample_output_path(out_dir, name).is_file())
        .unwrap_or(false)
}

/// Split the combined classifier output back per sample.
///
/// Kraken2 writes one line per input read, in input order, so the
/// cumulative read counts partition the combined file: sample `i` owns
/// the lines in the half-open range given by the running sum. Every line
/// must land in exactly one output file; a combined file shorter or
/// longer than the counts demand is an error.
pub fn split_by_counts(
    combined: &Path,
    out_dir: &Path,
    names: &[String],
    counts: &[u64],
) -> Result<()> {
    if names.len() != counts.len() {
        return Err(anyhow!(
            "{} sample names but {} read counts",
            names.len(),
            counts.len()
        ));
    }

    let mut reader = BufReader::new(open_file(combined)?);
    let mut line = String::new();

    for (i, (name, &expected)) in names.iter().zip(counts.iter()).enumerate() {
        let dest = sample_output_path(out_dir, name);
        log::info!(
            "{}/{}: {:?} -> {:?}",
            i + 1,
            names.len(),
            combined.file_name().unwrap_or_default(),
            dest.file_name().unwrap_or_default()
        );
        let mut writer = BufWriter::new(File::create(&dest)?);

        let mut written: u64 = 0;
        while written < expected {
            line.clear();
            let n = reader.read_line(&mut line)?;
            if n == 0 {
                return Err(anyhow!(
                    "{:?} ran dry: sample {} got {} of {} line(s)",
                    combined,
                    name,
                    written,
                    expected
                ));
            }
            writer.write_all(line.as_bytes())?;
            written += 1;
        }
        writer.flush()?;
    }

    // counts must consume the whole file
    line.clear();
    if reader.read_line(&mut line)? != 0 && !line.trim().is_empty() {
        return Err(anyhow!(
            "{:?} has lines beyond the last sample boundary",
            combined
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_lines(path: &Path, n: usize) {
        let mut f = File::create(path).unwrap();
        for i in 0..n {
            writeln!(f, "C\tread{}\t9606\t150\t...", i).unwrap();
        }
    }

    fn names(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn every_line_lands_in_exactly_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let combined = dir.path().join("output.txt");
        write_lines(&combined, 6);

        let samples = names(&["a_", "b_", "c_"]);
        split_by_counts(&combined, dir.path(), &samples, &[3, 1, 2]).unwrap();

        let a = std::fs::read_to_string(dir.path().join("a_out.txt")).unwrap();
        let b = std::fs::read_to_string(dir.path().join("b_out.txt")).unwrap();
        let c = std::fs::read_to_string(dir.path().join("c_out.txt")).unwrap();
        assert_eq!(a.lines().count(), 3);
        assert_eq!(b.lines().count(), 1);
        assert_eq!(c.lines().count(), 2);
        assert!(b.starts_with("C\tread3"));
        // concatenating the parts reproduces the whole
        assert_eq!(
            format!("{}{}{}", a, b, c),
            std::fs::read_to_string(&combined).unwrap()
        );
    }

    #[test]
    fn empty_sample_gets_an_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let combined = dir.path().join("output.txt");
        write_lines(&combined, 2);

        let samples = names(&["a_", "empty_", "b_"]);
        split_by_counts(&combined, dir.path(), &samples, &[1, 0, 1]).unwrap();
        let empty = std::fs::read_to_string(dir.path().join("empty_out.txt")).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn shortfall_and_surplus_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let combined = dir.path().join("output.txt");
        write_lines(&combined, 3);

        let samples = names(&["a_", "b_"]);
        assert!(split_by_counts(&combined, dir.path(), &samples, &[2, 2]).is_err());
        assert!(split_by_counts(&combined, dir.path(), &samples, &[1, 1]).is_err());
        assert!(split_by_counts(&combined, dir.path(), &samples, &[1, 2]).is_ok());
    }

    #[test]
    fn split_detection_keys_on_last_sample() {
        let dir = tempfile::tempdir().unwrap();
        let samples = names(&["a_", "b_"]);
        assert!(!already_split(dir.path(), &samples));
        File::create(dir.path().join("b_out.txt")).unwrap();
        assert!(already_split(dir.path(), &samples));
    }
}
