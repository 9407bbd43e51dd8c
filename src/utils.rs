use anyhow::Result;
use std::fs::{create_dir_all, File};
use std::io;
use std::path::{Path, PathBuf};

pub fn create_dir(dirname: &Path) -> Result<()> {
    if !dirname.exists() {
        create_dir_all(dirname)?;
    }
    Ok(())
}

/// Create an output directory (and parents) and hand back its path.
pub fn create_data_dir(dirname: &Path) -> Result<PathBuf> {
    create_dir(dirname)?;
    Ok(dirname.to_path_buf())
}

pub fn open_file<P: AsRef<Path>>(path: P) -> io::Result<File> {
    File::open(&path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            io::Error::new(e.kind(), format!("File not found: {:?}", path.as_ref()))
        } else {
            e
        }
    })
}

/// Split a comma-separated argument into trimmed, nonempty parts.
pub fn parse_comma_separated_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_list_trims_and_drops_empties() {
        assert_eq!(
            parse_comma_separated_list("R1.fq, R2.fq,"),
            vec!["R1.fq".to_string(), "R2.fq".to_string()]
        );
        assert!(parse_comma_separated_list("").is_empty());
    }
}
