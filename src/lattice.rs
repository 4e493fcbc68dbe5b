//! Conventions shared by the three spin models: toroidal neighbor lookup,
//! the Metropolis acceptance rule, and the CSV lattice snapshot.

use crate::error::Result;
use csv::WriterBuilder;
use std::fmt::Display;
use std::path::Path;

/// The four nearest neighbors of `(i, j)` on an `l`×`l` torus, in the order
/// up, down, left, right.
#[inline]
pub fn neighbors(i: usize, j: usize, l: usize) -> [(usize, usize); 4] {
    [
        ((i + l - 1) % l, j),
        ((i + 1) % l, j),
        (i, (j + l - 1) % l),
        (i, (j + 1) % l),
    ]
}

/// Boltzmann factor `exp(-ΔE / T)` that a uniform `r` has to undercut.
#[inline(always)]
pub fn acceptance_threshold(delta_e: f64, temperature: f64) -> f64 {
    (-delta_e / temperature).exp()
}

/// Metropolis rule: downhill moves are always taken, uphill moves iff
/// `r < exp(-ΔE / T)`.
#[inline]
pub fn metropolis_accept(delta_e: f64, temperature: f64, r: f64) -> bool {
    delta_e <= 0.0 || r < acceptance_threshold(delta_e, temperature)
}

/// Write the leading `l`×`l` block of `grid` as `l` comma-separated lines.
///
/// Values go through `Display` unchanged. Panics if `grid` is smaller than
/// `l`×`l`.
pub fn write_grid<T: Display>(grid: &[Vec<T>], l: usize, path: impl AsRef<Path>) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .from_path(path.as_ref())?;
    for row in &grid[..l] {
        wtr.write_record(row[..l].iter().map(|v| v.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Public contract common to the Ising, clock and XY engines.
pub trait SpinModel {
    /// Linear lattice size `L`.
    fn size(&self) -> usize;

    /// Total energy, counting each bond once through its right and down
    /// neighbors.
    fn compute_energy(&self) -> f64;

    /// Magnetization. Normalization is model specific.
    fn compute_magnetization(&self) -> f64;

    /// One randomized single-site Metropolis attempt.
    fn metropolis_update(&mut self);

    /// `L × L` randomized attempts, sites drawn with replacement.
    fn metropolis_sweep(&mut self) {
        let n = self.size() * self.size();
        for _ in 0..n {
            self.metropolis_update();
        }
    }

    /// Deterministic attempt at site `(i, j)`, driven by the forced
    /// overrides when they are set. Returns whether the lattice changed.
    fn metropolis_update_at(&mut self, i: usize, j: usize) -> bool;

    /// Sticky acceptance-random override; a negative value disables it.
    fn set_forced_random(&mut self, r: f64);

    /// CSV snapshot of the lattice.
    fn save_lattice(&self, path: &Path) -> Result<()>;
}
