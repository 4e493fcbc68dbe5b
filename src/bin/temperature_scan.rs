//! Temperature scan: one fully independent model instance per temperature,
//! run across the rayon pool, summarized into one CSV row each.
//
//  Compile & run:  `cargo run --release --bin temperature_scan -- --model Ising --L 16`

use clap::builder::RangedU64ValueParser;
use clap::Parser;
use csv::WriterBuilder;
use indicatif::{ProgressBar, ProgressStyle};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;
use spinlab::simulation::{run_schedule, ModelKind, Sample, Schedule};
use spinlab::stats::{summarize, Summary};
use spinlab::utils::rng::stream_rng;
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "Ising")]
    model: String,

    #[arg(long = "L", default_value_t = 16, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    l: usize,

    #[arg(long = "J", default_value_t = 1.0)]
    j: f64,

    #[arg(long = "M", default_value_t = 6, value_parser = RangedU64ValueParser::<usize>::new().range(2..))]
    m: usize,

    #[arg(long, default_value_t = 1.0)]
    t_min: f64,

    #[arg(long, default_value_t = 3.5)]
    t_max: f64,

    /// Number of temperatures, endpoints included
    #[arg(long, default_value_t = 26)]
    n_temps: usize,

    /// Measurements per temperature
    #[arg(long, default_value_t = 2000)]
    samples: usize,

    #[arg(long, default_value_t = 2000)]
    burnin: usize,

    #[arg(long, default_value_t = 5)]
    thin: usize,

    /// Master seed; OS entropy if omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Report <M>/N instead of <|M|>/N
    #[arg(long)]
    signed: bool,

    #[arg(long, default_value = "scan_results.csv")]
    output: PathBuf,
}

/// Row to be written to CSV.
#[derive(Debug)]
struct Row {
    temperature: f64,
    summary:     Summary,
}

fn temperatures(t_min: f64, t_max: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![t_min],
        _ => (0..n)
            .map(|i| t_min + (t_max - t_min) * i as f64 / (n - 1) as f64)
            .collect(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let kind = match cli.model.parse::<ModelKind>() {
        Ok(kind) => kind,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let schedule = Schedule {
        burnin_sweeps:  cli.burnin,
        thin:           cli.thin,
        samples:        cli.samples,
        snapshot_every: 0,
    };
    let master = cli.seed.unwrap_or_else(|| ChaCha20Rng::from_entropy().next_u64());
    let temps = temperatures(cli.t_min, cli.t_max, cli.n_temps);
    println!("{kind} L={} J={}: {} temperatures, master seed {master}", cli.l, cli.j, temps.len());

    let bar = ProgressBar::new(temps.len() as u64);
    bar.set_style(ProgressStyle::with_template(
        " {bar:40.cyan/blue} {pos}/{len} [{elapsed_precise}]",
    )?);

    let results: Mutex<Vec<Row>> = Mutex::new(Vec::new());

    temps
        .par_iter()
        .enumerate()
        .try_for_each(|(idx, &temperature)| -> spinlab::Result<()> {
            let mut model = kind.build(cli.l, cli.m, temperature, cli.j, stream_rng(master, idx));
            let mut samples = Vec::with_capacity(schedule.samples);
            run_schedule(&mut *model, &schedule, |sample: &Sample, _| {
                samples.push(*sample);
                Ok(())
            })?;

            let summary = summarize(&samples, cli.l, temperature, !cli.signed);
            log::debug!("T={temperature:.3}: {summary:?}");
            results.lock().unwrap().push(Row { temperature, summary });
            bar.inc(1);
            Ok(())
        })?;
    bar.finish();

    let mut rows = results.into_inner().unwrap();
    rows.sort_by(|a, b| a.temperature.total_cmp(&b.temperature));

    let mut wtr = WriterBuilder::new().from_path(&cli.output)?;
    wtr.write_record([
        "model", "temperature", "lattice_size",
        "energy_per_spin", "magnetization_per_spin", "heat_capacity", "susceptibility",
        "error_energy", "error_magnetization", "error_cv", "error_chi",
    ])?;
    for r in &rows {
        let s = &r.summary;
        wtr.write_record(&[
            kind.to_string(), r.temperature.to_string(), cli.l.to_string(),
            s.energy.to_string(), s.magnetization.to_string(),
            s.specific_heat.to_string(), s.susceptibility.to_string(),
            s.err_energy.to_string(), s.err_magnetization.to_string(),
            s.err_specific_heat.to_string(), s.err_susceptibility.to_string(),
        ])?;
    }
    wtr.flush()?;
    println!("Scan complete → {}", cli.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_grid() {
        assert_eq!(temperatures(1.0, 2.0, 3), vec![1.0, 1.5, 2.0]);
        assert_eq!(temperatures(1.0, 2.0, 1), vec![1.0]);
        assert!(temperatures(1.0, 2.0, 0).is_empty());
    }

    #[test]
    fn test_degenerate_sizes_rejected_at_parse() {
        assert!(Cli::try_parse_from(["temperature_scan", "--L", "0"]).is_err());
        assert!(Cli::try_parse_from(["temperature_scan", "--M", "1"]).is_err());
        assert_eq!(Cli::try_parse_from(["temperature_scan"]).unwrap().l, 16);
    }
}
