//! k2batch - batch helpers around Kraken2 workflows.
//!
//! Two tools share this library:
//! - `rsgb`: downloads NCBI assembly-summary tables for RefSeq/GenBank,
//!   computes per-column statistics, unions the two sites per domain and
//!   renders Venn comparison figures.
//! - `kraken2m`: classifies many FASTQ samples in a single Kraken2 run and
//!   converts the split results into per-sample reports via KrakenTools.

pub mod client;
pub mod down;
pub mod kraken;
pub mod ktools;
pub mod logger;
pub mod samples;
pub mod split;
pub mod stats;
pub mod summary;
pub mod utils;
pub mod venn;
