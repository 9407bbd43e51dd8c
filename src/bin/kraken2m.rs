use anyhow::{anyhow, Result};
use clap::Parser;
use k2batch::kraken::KrakenInvocation;
use k2batch::ktools::KrakenTools;
use k2batch::samples::{parse_suffixes, SampleSet};
use k2batch::split::{already_split, split_by_counts};
use k2batch::{logger, utils};
use std::fs;
use std::path::PathBuf;

fn parse_confidence(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("invalid number: {}", s))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("confidence must be in [0, 1], got {}", value))
    }
}

#[derive(Parser, Debug)]
#[command(name = "kraken2m")]
#[command(version)]
#[command(about = "classify many fastq samples in a single Kraken2 run")]
#[command(long_about = "\
Concatenates the reads of every sample so the Kraken2 index is loaded once, \
runs the classifier over the combined input, splits its output back per \
sample by read counts, and converts each part into a report with the \
KrakenTools scripts (make_ktaxonomy.py / make_kreport.py).")]
struct Args {
    /// Directory of fastq files; only names ending in the --suffix value(s) are used
    #[arg(short, long, required = true, help_heading = "Required")]
    input: PathBuf,

    /// Read-file suffix(es): 'R1.fastq,R2.fastq' for paired-end, '.fq' for single-end
    #[arg(short, long, required = true, help_heading = "Required")]
    suffix: String,

    /// Kraken2 database directory
    #[arg(short, long, required = true, help_heading = "Required")]
    db: PathBuf,

    /// Path of the kraken2 executable
    #[arg(short, long, required = true, help_heading = "Required")]
    kraken: PathBuf,

    /// Directory holding the KrakenTools scripts
    #[arg(long = "kraken-tools", required = true, help_heading = "Required")]
    kraken_tools: PathBuf,

    /// Directory for per-sample outputs and reports
    #[arg(short, long, default_value = "./kraken2_output", help_heading = "Optional")]
    output: PathBuf,

    /// Confidence score threshold passed to Kraken2
    #[arg(short, long, value_parser = parse_confidence, default_value = "0", help_heading = "Optional")]
    confidence: f64,

    /// Threads for the Kraken2 run
    #[arg(short, long, default_value = "1", help_heading = "Optional")]
    threads: usize,

    /// Input files are gzip-compressed
    #[arg(long, help_heading = "Optional")]
    gzip_compressed: bool,
}

fn run(args: Args) -> Result<()> {
    let suffixes = parse_suffixes(&args.suffix)?;

    if !args.db.is_dir() {
        return Err(anyhow!("unable to find the Kraken2 DB in {:?}", args.db));
    }
    if !args.kraken_tools.is_dir() {
        return Err(anyhow!(
            "unable to find KrakenTools in {:?}",
            args.kraken_tools
        ));
    }

    let input_dir = fs::canonicalize(&args.input)
        .map_err(|e| anyhow!("input directory {:?}: {}", args.input, e))?;
    let out_dir = fs::canonicalize(utils::create_data_dir(&args.output)?)?;
    let tmp_dir = out_dir.join("tmp");
    utils::create_dir(&tmp_dir)?;

    let banner = "*".repeat(15);

    let samples = SampleSet::discover(&input_dir, &suffixes)?;
    log::info!("{} {} samples", samples.len(), samples.layout());

    log::info!("{} concatenate reads {}", banner, banner);
    samples.concat_reads(&tmp_dir)?;

    log::info!("{} running kraken2 {}", banner, banner);
    if KrakenInvocation::classification_done(&tmp_dir) {
        log::info!("classification looks already done, skipping");
    } else {
        let invocation = KrakenInvocation {
            kraken: args.kraken.clone(),
            db: args.db.clone(),
            threads: args.threads,
            confidence: args.confidence,
            gzip_compressed: args.gzip_compressed,
        };
        invocation.run(&samples, &tmp_dir)?;
    }

    log::info!("{} count reads {}", banner, banner);
    let counts = samples.count_reads(args.gzip_compressed)?;

    log::info!("{} split output.txt {}", banner, banner);
    if already_split(&out_dir, &samples.names) {
        log::info!("looks like it had been split, skipping");
    } else {
        split_by_counts(
            &KrakenInvocation::output_path(&tmp_dir),
            &out_dir,
            &samples.names,
            &counts,
        )?;
    }

    log::info!("{} convert results to report {}", banner, banner);
    let tools = KrakenTools::new(&args.kraken_tools);
    tools.ensure_taxonomy(&args.db)?;
    let failed = tools.make_reports(&args.db, &out_dir, &samples.names)?;
    if failed > 0 {
        log::warn!("{} report conversion(s) failed", failed);
    }

    log::info!("all done");
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let out_dir = utils::create_data_dir(&args.output)?;
    logger::init(&out_dir.join("log.log"))?;
    log::info!("{:?}", args);

    run(args)
}
