use std::{
    fs::File,
    io::{BufWriter, Write},
    time::Instant,
};

use anyhow::Result;
use clap::Parser;
use rand::{rngs::SmallRng, Rng, SeedableRng};

/// Generate a random BED6 file, sorted within each chromosome.
#[derive(Parser)]
struct Args {
    /// Output file path
    #[clap(required = true)]
    path: String,
    /// Number of records to generate (in millions)
    #[clap(long, default_value_t = 1.0)]
    records: f64,
    #[clap(long, default_value_t = 24)]
    chroms: u32,
    #[clap(long, default_value_t = 5_000)]
    max_len: u64,
    /// Write a track line and a comment before the records
    #[clap(long)]
    header: bool,
    #[clap(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut writer = BufWriter::new(File::create(&args.path)?);
    let mut rng = if let Some(seed) = args.seed {
        SmallRng::seed_from_u64(seed)
    } else {
        SmallRng::from_os_rng()
    };

    if args.header {
        writeln!(writer, "# generated by flatrec random")?;
        writeln!(writer, "track name=random description=\"random features\" useScore=1")?;
    }

    let start = Instant::now();
    let num_records = (args.records * 1_000_000.0) as usize;
    let per_chrom = num_records.div_ceil(args.chroms.max(1) as usize).max(1);
    let mut written = 0;
    for chrom in 1..=args.chroms.max(1) {
        let mut position = 0u64;
        for _ in 0..per_chrom.min(num_records - written) {
            position += rng.random_range(0..1_000);
            let len = rng.random_range(1..=args.max_len.max(1));
            let strand = match rng.random_range(0..3) {
                0 => '+',
                1 => '-',
                _ => '.',
            };
            writeln!(
                writer,
                "chr{chrom}\t{position}\t{}\tfeat{written}\t{}\t{strand}",
                position + len,
                rng.random_range(0..=1000)
            )?;
            written += 1;
        }
    }
    writer.flush()?;
    let elapsed = start.elapsed();

    eprintln!("Finished generating {} records", written);
    eprintln!("Elapsed time: {:?}", elapsed);
    Ok(())
}
