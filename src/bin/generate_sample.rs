use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use rusty_mass::data::model::{MeasurementRow, MeasurementTable};
use rusty_mass::data::store::write_parquet;

/// Write a synthetic collision-measurement file.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Output path; `.csv`, `.txt`, `.tsv` or `.parquet`
    #[arg(long, default_value = "sample_events.csv")]
    output: PathBuf,

    /// Number of events
    #[arg(long, default_value_t = 5000)]
    events: usize,

    /// RNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Split rows round-robin into this many groups (Parquet only)
    #[arg(long, default_value_t = 1)]
    groups: usize,
}

/// Resonances as (mass, width) in GeV, one per energy window.
const RESONANCES: [(f64, f64); 5] = [
    (3.097, 0.05),   // J/psi
    (9.46, 0.12),    // Upsilon
    (91.19, 2.5),    // Z
    (1000.0, 30.0),  // heavy Z'
    (1500.0, 45.0),  // graviton-like diphoton bump
];

const HIGGS: (f64, f64) = (125.1, 2.0);

fn gaussian_sample(rng: &mut SimpleRng, (mu, sigma): (f64, f64)) -> f64 {
    rng.gauss(mu, sigma)
}

/// Falling continuum above 1 GeV.
fn continuum_sample(rng: &mut SimpleRng, scale: f64) -> f64 {
    1.0 - scale * rng.next_f64().max(1e-15).ln()
}

/// SplitMix64 stream; deterministic per seed.
struct SimpleRng(u64);

impl SimpleRng {
    fn new(seed: u64) -> Self {
        SimpleRng(seed)
    }

    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    /// Uniform in [0, 1).
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * f64::EPSILON / 2.0
    }

    fn pick(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n
    }

    /// Normal deviate, polar Box-Muller.
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        loop {
            let u = 2.0 * self.next_f64() - 1.0;
            let v = 2.0 * self.next_f64() - 1.0;
            let s = u * u + v * v;
            if s > 0.0 && s < 1.0 {
                return mean + std_dev * u * (-2.0 * s.ln() / s).sqrt();
            }
        }
    }
}

fn generate_event(rng: &mut SimpleRng) -> MeasurementRow {
    let roll = rng.next_f64();
    if roll < 0.70 {
        let particle_type = if roll < 0.35 { 1 } else { 2 };
        let mass = if rng.next_f64() < 0.6 {
            let resonance = RESONANCES[rng.pick(4)];
            gaussian_sample(rng, resonance)
        } else {
            continuum_sample(rng, 60.0)
        };
        MeasurementRow::new(mass, particle_type, "")
    } else if roll < 0.85 {
        let mass = match rng.pick(3) {
            0 => gaussian_sample(rng, HIGGS),
            1 => gaussian_sample(rng, RESONANCES[4]),
            _ => continuum_sample(rng, 200.0),
        };
        MeasurementRow::new(mass, 3, "")
    } else {
        let combination = ["4ee", "4mm", "4me"][rng.pick(3)];
        let mass = if rng.next_f64() < 0.5 {
            gaussian_sample(rng, HIGGS)
        } else {
            gaussian_sample(rng, RESONANCES[2]) + continuum_sample(rng, 80.0)
        };
        MeasurementRow::new(mass, 4, combination)
    }
}

fn write_delimited(args: &Args, rows: &[MeasurementRow], delimiter: u8) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;

    for (i, row) in rows.iter().enumerate() {
        writer.write_record([
            format!("{:.4}", row.invariant_mass),
            row.particle_type.to_string(),
            row.combination.clone(),
        ])?;
        // A few malformed lines, as found in real exports.
        if i % 997 == 996 {
            writer.write_record(["n/a", "1", ""])?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mut rng = SimpleRng::new(args.seed);

    let mut rows: Vec<MeasurementRow> = (0..args.events).map(|_| generate_event(&mut rng)).collect();
    // Detector glitches: a handful of non-positive masses.
    for row in rows.iter_mut().step_by(1000) {
        row.invariant_mass = 0.0;
    }

    let ext = args
        .output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => {
            let n_groups = args.groups.max(1);
            let ids: Vec<String> = (1..=n_groups).map(|g| format!("group-{g}")).collect();
            let mut tables: Vec<Vec<MeasurementRow>> = vec![Vec::new(); n_groups];
            for (i, row) in rows.into_iter().enumerate() {
                tables[i % n_groups].push(row);
            }
            let tables: Vec<MeasurementTable> = tables.into_iter().map(MeasurementTable::from_rows).collect();
            let groups: Vec<(Option<&str>, &MeasurementTable)> = ids
                .iter()
                .map(|id| Some(id.as_str()))
                .zip(tables.iter())
                .collect();
            write_parquet(&args.output, &groups)?;
        }
        "tsv" => write_delimited(&args, &rows, b'\t')?,
        _ => write_delimited(&args, &rows, b',')?,
    }

    println!("Wrote {} events to {}", args.events, args.output.display());
    Ok(())
}
