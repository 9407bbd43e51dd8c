use crate::utils::open_file;
use anyhow::{anyhow, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

lazy_static! {
    // digit core of GCA_/GCF_ accessions, version suffix dropped
    static ref ACC_CORE: Regex = Regex::new(r"GC[AF]_(\d+)\.\d+").unwrap();
}

/// Two refseq_category values mark a curated assembly.
const REPRESENTATIVE_CATEGORIES: &[&str] = &["representative genome", "reference genome"];

/// Extract the nine-digit accession core shared by a GCA/GCF pair.
pub fn accession_core(accession: &str) -> Option<String> {
    ACC_CORE
        .captures(accession)
        .map(|caps| caps[1].to_string())
}

/// One record of an NCBI assembly_summary.txt, with the verbatim line kept
/// for re-emission into merged tables.
#[derive(Debug, Clone)]
pub struct SummaryRecord {
    pub accession: String,
    pub refseq_category: String,
    pub taxid: String,
    pub species_taxid: String,
    pub version_status: String,
    pub assembly_level: String,
    pub release_type: String,
    pub genome_rep: String,
    pub gbrs_paired_asm: String,
    pub paired_asm_comp: String,
    pub acc_core: Option<String>,
    pub line: String,
}

impl SummaryRecord {
    fn parse(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 20 {
            return None;
        }
        Some(Self {
            accession: fields[0].to_string(),
            refseq_category: fields[4].to_string(),
            taxid: fields[5].to_string(),
            species_taxid: fields[6].to_string(),
            version_status: fields[10].to_string(),
            assembly_level: fields[11].to_string(),
            release_type: fields[12].to_string(),
            genome_rep: fields[13].to_string(),
            gbrs_paired_asm: fields[17].to_string(),
            paired_asm_comp: fields[18].to_string(),
            acc_core: accession_core(fields[0]),
            line: line.to_string(),
        })
    }

    pub fn is_representative(&self) -> bool {
        REPRESENTATIVE_CATEGORIES.contains(&self.refseq_category.as_str())
    }
}

/// A parsed assembly-summary table: the column-name header line plus records.
#[derive(Debug, Clone, Default)]
pub struct SummaryTable {
    pub header: String,
    pub records: Vec<SummaryRecord>,
}

impl SummaryTable {
    /// Load a tab-separated summary. Leading `#` lines are comments; the
    /// last of them carries the column names. Short lines are skipped with
    /// a warning.
    pub fn load(path: &Path) -> Result<Self> {
        let file = open_file(path)?;
        let reader = BufReader::new(file);

        let mut table = SummaryTable::default();
        let mut skipped = 0usize;

        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            if line.starts_with('#') {
                table.header = line;
                continue;
            }
            match SummaryRecord::parse(&line) {
                Some(record) => table.records.push(record),
                None => skipped += 1,
            }
        }

        if table.header.is_empty() {
            return Err(anyhow!("{:?} has no header line", path));
        }
        if skipped > 0 {
            log::warn!("{:?}: skipped {} short line(s)", path, skipped);
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn acc_core_set(&self) -> HashSet<&str> {
        self.records
            .iter()
            .filter_map(|r| r.acc_core.as_deref())
            .collect()
    }

    pub fn taxid_set(&self) -> HashSet<&str> {
        self.records.iter().map(|r| r.taxid.as_str()).collect()
    }

    pub fn species_taxid_set(&self) -> HashSet<&str> {
        self.records
            .iter()
            .map(|r| r.species_taxid.as_str())
            .collect()
    }

    /// Records whose refseq_category marks a representative/reference genome.
    pub fn representative(&self) -> SummaryTable {
        SummaryTable {
            header: self.header.clone(),
            records: self
                .records
                .iter()
                .filter(|r| r.is_representative())
                .cloned()
                .collect(),
        }
    }

    /// Write the table back out: the header line, then each record verbatim.
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        writeln!(writer, "{}", self.header)?;
        for record in &self.records {
            writeln!(writer, "{}", record.line)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Union of a RefSeq and a GenBank table for one domain: every RefSeq
/// record, then the GenBank records whose accession core RefSeq lacks.
/// Records without a parsable accession never enter from the GenBank side.
pub fn union_tables(refseq: &SummaryTable, genbank: &SummaryTable) -> SummaryTable {
    let seen: HashSet<&str> = refseq.acc_core_set();

    let mut records = refseq.records.clone();
    records.extend(
        genbank
            .records
            .iter()
            .filter(|r| {
                r.acc_core
                    .as_deref()
                    .map(|core| !seen.contains(core))
                    .unwrap_or(false)
            })
            .cloned(),
    );

    SummaryTable {
        header: refseq.header.clone(),
        records,
    }
}
