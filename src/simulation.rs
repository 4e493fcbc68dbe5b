//! Measurement schedule: burn-in sweeps, then alternating thinning sweeps
//! and observable samples, with periodic lattice snapshots.

use crate::clock::ClockModel;
use crate::error::{Result, SimError};
use crate::ising::IsingModel;
use crate::lattice::SpinModel;
use crate::xy::XYModel;
use rand_chacha::ChaCha20Rng;
use std::fmt;
use std::str::FromStr;

/// Which spin model a driver runs. Parsed from `Ising`, `Clock` or `XY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Ising,
    Clock,
    XY,
}

impl FromStr for ModelKind {
    type Err = SimError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Ising" => Ok(Self::Ising),
            "Clock" => Ok(Self::Clock),
            "XY" => Ok(Self::XY),
            _ => Err(SimError::UnknownModel(s.to_string())),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ising => "Ising",
            Self::Clock => "Clock",
            Self::XY => "XY",
        };
        f.write_str(name)
    }
}

impl ModelKind {
    /// Hot-started instance owning `rng`. `states` is only read by the
    /// clock model.
    pub fn build(
        self,
        l: usize,
        states: usize,
        temperature: f64,
        coupling: f64,
        rng: ChaCha20Rng,
    ) -> Box<dyn SpinModel + Send> {
        match self {
            Self::Ising => Box::new(IsingModel::from_rng(l, temperature, coupling, rng)),
            Self::Clock => Box::new(ClockModel::from_rng(l, states, temperature, coupling, rng)),
            Self::XY => Box::new(XYModel::from_rng(l, temperature, coupling, rng)),
        }
    }

    /// Snapshot cadence used when the driver is not given one.
    pub fn default_snapshot_every(self, samples: usize) -> usize {
        match self {
            Self::Ising => (samples / 20).max(1),
            Self::Clock | Self::XY => 500,
        }
    }
}

/// Run-time schedule (single source of truth for the drivers).
#[derive(Debug, Clone)]
pub struct Schedule {
    pub burnin_sweeps:  usize,
    pub thin:           usize,
    pub samples:        usize,
    /// Snapshot after every `snapshot_every`-th sample; 0 disables.
    pub snapshot_every: usize,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            burnin_sweeps:  2000,
            thin:           5,
            samples:        10_000,
            snapshot_every: 500,
        }
    }
}

impl Schedule {
    /// Whether a snapshot follows sample `k` (0-based).
    pub fn is_snapshot(&self, k: usize) -> bool {
        self.snapshot_every > 0 && (k + 1) % self.snapshot_every == 0
    }
}

/// One recorded measurement of total energy and magnetization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub step:          usize,
    pub energy:        f64,
    pub magnetization: f64,
}

impl Sample {
    pub fn measure<M: SpinModel + ?Sized>(model: &M, step: usize) -> Self {
        Self {
            step,
            energy: model.compute_energy(),
            magnetization: model.compute_magnetization(),
        }
    }

    pub fn energy_squared(&self) -> f64 {
        self.energy * self.energy
    }

    pub fn magnetization_squared(&self) -> f64 {
        self.magnetization * self.magnetization
    }
}

/// Drive `model` through `schedule`, handing every sample to `on_sample`
/// right after it is measured. The callback sees the model so it can
/// snapshot the lattice.
pub fn run_schedule<M, F>(model: &mut M, schedule: &Schedule, mut on_sample: F) -> Result<()>
where
    M: SpinModel + ?Sized,
    F: FnMut(&Sample, &M) -> Result<()>,
{
    for _ in 0..schedule.burnin_sweeps {
        model.metropolis_sweep();
    }
    log::debug!("burn-in done after {} sweeps", schedule.burnin_sweeps);

    for k in 0..schedule.samples {
        for _ in 0..schedule.thin {
            model.metropolis_sweep();
        }
        let sample = Sample::measure(&*model, k);
        on_sample(&sample, &*model)?;
    }
    Ok(())
}
