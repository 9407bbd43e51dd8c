use crate::summary::SummaryTable;
use anyhow::Result;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Occurrence counts sorted descending, ties broken alphabetically.
pub fn value_counts<'a, I>(values: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    let mut sorted: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(value, count)| (value.to_string(), count))
        .collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted
}

fn write_counts(writer: &mut impl Write, counts: &[(String, usize)]) -> Result<()> {
    for (value, count) in counts {
        writeln!(writer, "{}\t{}", value, count)?;
    }
    Ok(())
}

/// Per-column descriptive statistics for one downloaded summary, one file
/// per site/domain pair.
pub fn write_stat_report(table: &SummaryTable, path: &Path) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);

    writeln!(w, "***** col 1: accession *****")?;
    writeln!(w, "counts: {}", table.len())?;
    let unique_acc: std::collections::HashSet<&str> =
        table.records.iter().map(|r| r.accession.as_str()).collect();
    writeln!(w, "unique: {}", unique_acc.len())?;
    writeln!(w, "unique acc9: {}", table.acc_core_set().len())?;

    writeln!(w, "\n***** col 5: refseq_category *****")?;
    write_counts(
        &mut w,
        &value_counts(table.records.iter().map(|r| r.refseq_category.as_str())),
    )?;

    writeln!(w, "\n***** col 6: taxid *****")?;
    writeln!(w, "unique: {}", table.taxid_set().len())?;

    writeln!(w, "\n***** col 7: species_taxid *****")?;
    writeln!(w, "unique: {}", table.species_taxid_set().len())?;

    writeln!(w, "\n***** col 11: version_status *****")?;
    write_counts(
        &mut w,
        &value_counts(table.records.iter().map(|r| r.version_status.as_str())),
    )?;

    writeln!(w, "\n***** col 12: assembly_level *****")?;
    write_counts(
        &mut w,
        &value_counts(table.records.iter().map(|r| r.assembly_level.as_str())),
    )?;

    writeln!(w, "\n***** col 13: release_type *****")?;
    write_counts(
        &mut w,
        &value_counts(table.records.iter().map(|r| r.release_type.as_str())),
    )?;

    writeln!(w, "\n***** col 14: genome_rep *****")?;
    write_counts(
        &mut w,
        &value_counts(table.records.iter().map(|r| r.genome_rep.as_str())),
    )?;

    let paired = table
        .records
        .iter()
        .filter(|r| r.gbrs_paired_asm != "na")
        .count();
    writeln!(w, "\n***** col 18: gbrs_paired_asm *****")?;
    writeln!(w, "paired: {}", paired)?;
    writeln!(w, "no paired: {}", table.len() - paired)?;

    writeln!(w, "\n***** col 19: paired_asm_comp *****")?;
    write_counts(
        &mut w,
        &value_counts(table.records.iter().map(|r| r.paired_asm_comp.as_str())),
    )?;

    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_sort_by_count_then_name() {
        let values = ["latest", "replaced", "latest", "suppressed", "replaced"];
        let counts = value_counts(values.iter().copied());
        assert_eq!(
            counts,
            vec![
                ("latest".to_string(), 2),
                ("replaced".to_string(), 2),
                ("suppressed".to_string(), 1),
            ]
        );
    }

    #[test]
    fn empty_input_gives_empty_counts() {
        assert!(value_counts(std::iter::empty::<&str>()).is_empty());
    }
}
