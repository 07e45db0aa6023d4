use std::{convert::Infallible, path::PathBuf, time::Instant};

use anyhow::{Context, Result};
use clap::Parser;
use flatrec::{open_as, open_path, Config, Input, MetaValue, Region};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Count the records in a genomic flat file and print its metadata.
#[derive(Parser)]
struct Args {
    /// Input file path (stdin if omitted; requires --format)
    path: Option<PathBuf>,
    /// Format identifier (bed, bigbed, bigwig, maf, fasta, gff, vcf, sam, wig)
    #[clap(short, long)]
    format: Option<String>,
    /// Restrict to a region, e.g. chr1:10,000-20,000 (indexed formats only)
    #[clap(short, long)]
    region: Option<Region>,
    /// Skip metadata blocks instead of parsing them
    #[clap(long)]
    no_metadata: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::default().parse_metadata(!args.no_metadata);
    let mut parser = match (&args.format, &args.path) {
        (Some(format), path) => open_as(format, Input::from_optional_path(path.clone()), config)?,
        (None, Some(path)) => open_path(path, config)
            .with_context(|| format!("cannot infer a format for {}, pass --format", path.display()))?,
        (None, None) => anyhow::bail!("reading stdin requires --format"),
    };
    info!(format = %parser.kind(), "Opened input");

    if let Some(region) = &args.region {
        parser
            .seek(region)
            .with_context(|| format!("{} input cannot seek to {region}", parser.format_name()))?;
    }

    let start = Instant::now();
    let mut bases = 0u64;
    let records = parser.try_for_each_record(|record, _| {
        bases += record.end.saturating_sub(record.start);
        Ok::<_, Infallible>(())
    })?;
    let elapsed = start.elapsed();

    let mut keys: Vec<_> = parser.metadata().iter().collect();
    keys.sort_by_key(|(key, _)| *key);
    for (key, value) in keys {
        match value {
            MetaValue::Text(text) => println!("#{key}\t{text}"),
            MetaValue::List(items) => println!("#{key}\t{} entries", items.len()),
        }
    }
    println!("records\t{records}");
    println!("span\t{bases}");

    eprintln!("Elapsed time: {:?}", elapsed);
    eprintln!(
        "Throughput: {:.2} M records/s",
        records as f64 / elapsed.as_secs_f64().max(f64::EPSILON) / 1_000_000.0
    );
    parser.close()?;
    Ok(())
}
