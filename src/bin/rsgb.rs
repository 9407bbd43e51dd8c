use anyhow::Result;
use clap::{Parser, ValueEnum};
use k2batch::down::{download_all, FetchJob};
use k2batch::stats::write_stat_report;
use k2batch::summary::{union_tables, SummaryTable};
use k2batch::venn::{
    title_case, venn2_regions, venn3_regions, VennPanel, VennRow,
};
use k2batch::{logger, utils};
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use tokio::runtime::Builder;

const NCBI_GEN_URL: &str = "https://ftp.ncbi.nlm.nih.gov/genomes/";

const NCBI_DOMAINS: &[&str] = &[
    "archaea",
    "bacteria",
    "fungi",
    "protozoa",
    "viral",
    "plant",
    "invertebrate",
    "vertebrate_mammalian",
    "vertebrate_other",
];

fn validate_domain(domain: &str) -> Result<String, String> {
    if NCBI_DOMAINS.contains(&domain) {
        Ok(domain.to_string())
    } else {
        Err(format!(
            "unknown domain '{}', expected one of: {}",
            domain,
            NCBI_DOMAINS.join(", ")
        ))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum SummarySet {
    /// union of refseq and genbank
    Rsgb,
    /// refseq only
    Refseq,
    /// genbank only
    Genbank,
}

impl SummarySet {
    fn sites(&self) -> &'static [&'static str] {
        match self {
            SummarySet::Rsgb => &["refseq", "genbank"],
            SummarySet::Refseq => &["refseq"],
            SummarySet::Genbank => &["genbank"],
        }
    }
}

impl fmt::Display for SummarySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SummarySet::Rsgb => "rsgb",
                SummarySet::Refseq => "refseq",
                SummarySet::Genbank => "genbank",
            }
        )
    }
}

#[derive(Parser, Debug)]
#[clap(
    version,
    about = "download and merge NCBI assembly summary tables",
    long_about = "Downloads per-domain assembly_summary.txt tables from NCBI RefSeq/GenBank, \
computes per-column statistics, unions both sites per domain and renders Venn comparison figures."
)]
struct Args {
    /// Directory for the downloaded and merged assembly summary tables
    #[arg(short, long, required = true)]
    output: PathBuf,

    /// Domain(s) to include; all nine NCBI genome domains by default
    #[arg(short, long, num_args = 1.., value_parser = validate_domain,
          default_values_t = NCBI_DOMAINS.iter().map(|d| d.to_string()))]
    domain: Vec<String>,

    /// Which site(s) to aggregate; rsgb is the union of refseq and genbank
    #[arg(short, long, value_enum, default_value_t = SummarySet::Rsgb)]
    set: SummarySet,

    /// Domain(s) that also get a representative-genome-only table
    #[arg(short, long, num_args = 0.., value_parser = validate_domain,
          default_values_t = ["plant", "invertebrate", "vertebrate_mammalian", "vertebrate_other"].iter().map(|d| d.to_string()))]
    rep: Vec<String>,

    /// Download concurrency
    #[arg(short, long, default_value_t = num_cpus::get().min(8))]
    parallel: usize,
}

fn summary_file(as_dir: &PathBuf, site: &str, domain: &str) -> PathBuf {
    as_dir.join(format!("{}_{}_assembly_summary.txt", site, domain))
}

/// The six comparison panels for one domain: RefSeq vs GenBank for the
/// accession core, taxid and species taxid, then the same three keys with
/// the representative subset of the union as a third set.
fn two_panel(title: String, a: &HashSet<&str>, b: &HashSet<&str>) -> VennPanel {
    VennPanel::Two {
        title,
        labels: ["RefSeq".into(), "GenBank".into()],
        regions: venn2_regions(a, b),
    }
}

fn three_panel(title: String, a: &HashSet<&str>, b: &HashSet<&str>, c: &HashSet<&str>) -> VennPanel {
    VennPanel::Three {
        title,
        labels: ["RefSeq".into(), "GenBank".into(), "Representative".into()],
        regions: venn3_regions(a, b, c),
    }
}

fn venn_row(
    domain: &str,
    refseq: &SummaryTable,
    genbank: &SummaryTable,
    merged: &SummaryTable,
) -> VennRow {
    let rep = merged.representative();
    let (rs_acc, gb_acc, rep_acc) = (
        refseq.acc_core_set(),
        genbank.acc_core_set(),
        rep.acc_core_set(),
    );
    let (rs_tax, gb_tax, rep_tax) = (refseq.taxid_set(), genbank.taxid_set(), rep.taxid_set());
    let (rs_sp, gb_sp, rep_sp) = (
        refseq.species_taxid_set(),
        genbank.species_taxid_set(),
        rep.species_taxid_set(),
    );

    let pretty = title_case(domain);
    VennRow {
        domain: domain.to_string(),
        panels: vec![
            two_panel(format!("{} accession", pretty), &rs_acc, &gb_acc),
            two_panel(format!("{} taxid", pretty), &rs_tax, &gb_tax),
            two_panel(format!("{} species_taxid", pretty), &rs_sp, &gb_sp),
            three_panel(format!("{} accession", pretty), &rs_acc, &gb_acc, &rep_acc),
            three_panel(format!("{} taxid", pretty), &rs_tax, &gb_tax, &rep_tax),
            three_panel(format!("{} species_taxid", pretty), &rs_sp, &gb_sp, &rep_sp),
        ],
    }
}

async fn async_run(args: Args) -> Result<()> {
    let out_dir = utils::create_data_dir(&args.output)?;
    let as_dir = out_dir.join("assembly_summary");
    let stat_dir = as_dir.join("stat");
    utils::create_dir(&as_dir)?;
    utils::create_dir(&stat_dir)?;

    let banner = "*".repeat(10);
    log::info!("{} download assembly summary {}", banner, banner);

    let mut jobs = vec![];
    for domain in &args.domain {
        for site in args.set.sites() {
            jobs.push(FetchJob::new(
                format!("{}{}/{}/assembly_summary.txt", NCBI_GEN_URL, site, domain),
                summary_file(&as_dir, site, domain),
                format!("{} {}", domain, site),
            ));
        }
    }
    let fetched = download_all(jobs, args.parallel).await?;
    log::info!("{} table(s) transferred", fetched);

    log::info!("{} per-column statistics {}", banner, banner);
    for domain in &args.domain {
        for site in args.set.sites() {
            let table = SummaryTable::load(&summary_file(&as_dir, site, domain))?;
            write_stat_report(
                &table,
                &stat_dir.join(format!("{}_{}_stat.txt", site, domain)),
            )?;
        }
    }

    log::info!("{} merge and compare {}", banner, banner);
    let mut venn_rows = vec![];
    for (i, domain) in args.domain.iter().enumerate() {
        log::info!("domain [{}]: {}", i + 1, domain);

        let merged = match args.set {
            SummarySet::Rsgb => {
                let refseq = SummaryTable::load(&summary_file(&as_dir, "refseq", domain))?;
                let genbank = SummaryTable::load(&summary_file(&as_dir, "genbank", domain))?;
                let merged = union_tables(&refseq, &genbank);
                venn_rows.push(venn_row(domain, &refseq, &genbank, &merged));
                merged.write(&summary_file(&as_dir, "rsgb", domain))?;
                merged
            }
            // single-site run: the downloaded table already carries the
            // final name, only the representative subset is derived
            single => SummaryTable::load(&summary_file(&as_dir, &single.to_string(), domain))?,
        };
        if args.rep.contains(domain) {
            log::info!("also writing the representative-genome table");
            merged.representative().write(&as_dir.join(format!(
                "{}_{}_rep_assembly_summary.txt",
                args.set, domain
            )))?;
        }
    }

    if !venn_rows.is_empty() {
        let plot_dir = as_dir.join("plot");
        utils::create_dir(&plot_dir)?;
        let figure = plot_dir.join(format!("{}_venn.svg", args.set));
        k2batch::venn::render_grid(&figure, &venn_rows)?;
        log::info!("venn comparison figure saved to {:?}", figure);
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let out_dir = utils::create_data_dir(&args.output)?;
    logger::init(&out_dir.join("log.log"))?;

    let banner = "*".repeat(10);
    log::info!("{} database version {}", banner, banner);
    log::info!("DB home: {:?}", args.output);
    log::info!("domain: {}", args.domain.join(" "));
    log::info!("domain(rep): {}", args.rep.join(" "));
    log::info!("set type: {}", args.set);

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .thread_name("rsgb")
        .worker_threads(args.parallel.max(1))
        .build()?;

    runtime.block_on(async_run(args))
}
