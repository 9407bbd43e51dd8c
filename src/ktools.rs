use crate::split::sample_output_path;
use anyhow::{anyhow, Context, Result};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// The KrakenTools scripts this tool drives, run through `python`.
#[derive(Debug, Clone)]
pub struct KrakenTools {
    pub dir: PathBuf,
    pub python: String,
}

impl KrakenTools {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            python: "python".to_string(),
        }
    }

    /// Condensed taxonomy file the report conversion needs, kept inside
    /// the database directory so one build serves every run.
    pub fn taxonomy_path(db: &Path) -> PathBuf {
        db.join("mydb_taxonomy.txt")
    }

    fn ktaxonomy_args(&self, db: &Path) -> Vec<OsString> {
        vec![
            self.dir.join("make_ktaxonomy.py").into(),
            "--nodes".into(),
            db.join("taxonomy").join("nodes.dmp").into(),
            "--names".into(),
            db.join("taxonomy").join("names.dmp").into(),
            "--seqid2taxid".into(),
            db.join("seqid2taxid.map").into(),
            "-o".into(),
            Self::taxonomy_path(db).into(),
        ]
    }

    fn kreport_args(&self, input: &Path, taxonomy: &Path, output: &Path) -> Vec<OsString> {
        vec![
            self.dir.join("make_kreport.py").into(),
            "-i".into(),
            input.into(),
            "-t".into(),
            taxonomy.into(),
            "-o".into(),
            output.into(),
        ]
    }

    /// Build the condensed taxonomy once per database, capturing the
    /// script's stdout/stderr next to it. Skipped when already present.
    pub fn ensure_taxonomy(&self, db: &Path) -> Result<bool> {
        if Self::taxonomy_path(db).is_file() {
            log::info!("taxonomy file already exists in this DB, skipping");
            return Ok(false);
        }

        log::info!("making ktaxonomy ...");
        let args = self.ktaxonomy_args(db);
        log::debug!("command: {} {:?}", self.python, args);

        let output = Command::new(&self.python)
            .args(&args)
            .output()
            .context("failed to launch make_ktaxonomy.py")?;
        fs::write(db.join("make_ktaxonomy_out.txt"), &output.stdout)?;
        fs::write(db.join("make_ktaxonomy_err.txt"), &output.stderr)?;

        if !output.status.success() {
            return Err(anyhow!("make_ktaxonomy.py exited with {}", output.status));
        }
        Ok(true)
    }

    /// Convert every sample's split output into a kreport. A failing
    /// conversion is logged and the loop carries on; the number of
    /// failures is returned so the caller can flag the run.
    pub fn make_reports(&self, db: &Path, out_dir: &Path, names: &[String]) -> Result<usize> {
        let taxonomy = Self::taxonomy_path(db);
        let mut failed = 0usize;

        for (i, name) in names.iter().enumerate() {
            let input = sample_output_path(out_dir, name);
            let report = out_dir.join(format!("{}kreport.txt", name));
            log::info!(
                "{}/{}: {:?} -> {:?}",
                i + 1,
                names.len(),
                input.file_name().unwrap_or_default(),
                report.file_name().unwrap_or_default()
            );

            let args = self.kreport_args(&input, &taxonomy, &report);
            let status = Command::new(&self.python)
                .args(&args)
                .status()
                .context("failed to launch make_kreport.py")?;
            if !status.success() {
                log::warn!("converting {} failed ({})", name, status);
                failed += 1;
            }
        }
        Ok(failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ktaxonomy_args_point_into_the_db() {
        let tools = KrakenTools::new(Path::new("/opt/KrakenTools"));
        let rendered: Vec<String> = tools
            .ktaxonomy_args(Path::new("/data/k2db"))
            .iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect();

        assert_eq!(rendered[0], "/opt/KrakenTools/make_ktaxonomy.py");
        assert!(rendered.contains(&"/data/k2db/taxonomy/nodes.dmp".to_string()));
        assert!(rendered.contains(&"/data/k2db/taxonomy/names.dmp".to_string()));
        assert!(rendered.contains(&"/data/k2db/seqid2taxid.map".to_string()));
        assert!(rendered.contains(&"/data/k2db/mydb_taxonomy.txt".to_string()));
    }

    #[test]
    fn kreport_args_wire_input_taxonomy_output() {
        let tools = KrakenTools::new(Path::new("/opt/KrakenTools"));
        let rendered: Vec<String> = tools
            .kreport_args(
                Path::new("/out/s1_out.txt"),
                Path::new("/data/k2db/mydb_taxonomy.txt"),
                Path::new("/out/s1_kreport.txt"),
            )
            .iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect();

        assert_eq!(rendered[0], "/opt/KrakenTools/make_kreport.py");
        assert_eq!(rendered[1..3], ["-i", "/out/s1_out.txt"]);
        assert_eq!(rendered[5..7], ["-o", "/out/s1_kreport.txt"]);
    }

    #[test]
    fn existing_taxonomy_short_circuits() {
        let db = tempfile::tempdir().unwrap();
        std::fs::write(KrakenTools::taxonomy_path(db.path()), "1\t|\troot\n").unwrap();
        let tools = KrakenTools::new(Path::new("/nonexistent/KrakenTools"));
        assert!(!tools.ensure_taxonomy(db.path()).unwrap());
    }
}
