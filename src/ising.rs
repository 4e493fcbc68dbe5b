//! Two-state Ising model on a periodic L×L lattice.

use crate::error::{Result, SimError};
use crate::lattice::{acceptance_threshold, metropolis_accept, neighbors, write_grid, SpinModel};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::path::Path;

/// Ising lattice with spins in {-1, +1} and its own random engine.
#[derive(Debug, Clone)]
pub struct IsingModel<R = ChaCha20Rng> {
    l: usize,
    temperature: f64,
    coupling: f64,
    lattice: Vec<Vec<i32>>,
    forced_random: Option<f64>,
    rng: R,
}

impl IsingModel<ChaCha20Rng> {
    /// Hot start with an entropy-seeded engine.
    pub fn new(l: usize, temperature: f64, coupling: f64) -> Self {
        Self::from_rng(l, temperature, coupling, ChaCha20Rng::from_entropy())
    }

    pub fn with_seed(l: usize, temperature: f64, coupling: f64, seed: u64) -> Self {
        Self::from_rng(l, temperature, coupling, ChaCha20Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> IsingModel<R> {
    /// Hot start drawing every spin from a caller-supplied engine.
    pub fn from_rng(l: usize, temperature: f64, coupling: f64, mut rng: R) -> Self {
        let lattice = (0..l)
            .map(|_| {
                (0..l)
                    .map(|_| if rng.gen::<bool>() { 1 } else { -1 })
                    .collect()
            })
            .collect();
        Self {
            l,
            temperature,
            coupling,
            lattice,
            forced_random: None,
            rng,
        }
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn coupling(&self) -> f64 {
        self.coupling
    }

    pub fn lattice(&self) -> &[Vec<i32>] {
        &self.lattice
    }

    #[inline]
    pub fn spin(&self, i: usize, j: usize) -> i32 {
        self.lattice[i][j]
    }

    /// Replace the whole grid. Every row must have exactly `L` entries and
    /// there must be exactly `L` rows.
    pub fn set_lattice(&mut self, new_lattice: Vec<Vec<i32>>) -> Result<()> {
        let rows = new_lattice.len();
        if rows != self.l {
            return Err(SimError::DimensionMismatch {
                expected: self.l,
                rows,
                cols: new_lattice.first().map_or(0, Vec::len),
            });
        }
        if let Some(row) = new_lattice.iter().find(|row| row.len() != self.l) {
            return Err(SimError::DimensionMismatch {
                expected: self.l,
                rows,
                cols: row.len(),
            });
        }
        self.lattice = new_lattice;
        Ok(())
    }

    /// Flip energy `2 J s Σ s_nb`.
    #[inline]
    fn delta_energy(&self, i: usize, j: usize) -> f64 {
        let neighbor_sum: i32 = neighbors(i, j, self.l)
            .iter()
            .map(|&(ni, nj)| self.lattice[ni][nj])
            .sum();
        2.0 * self.coupling * (self.lattice[i][j] * neighbor_sum) as f64
    }
}

impl<R: Rng + SeedableRng> IsingModel<R> {
    /// Reseed the engine in place.
    pub fn set_seed(&mut self, seed: u64) {
        self.rng = R::seed_from_u64(seed);
    }
}

impl<R: Rng> SpinModel for IsingModel<R> {
    fn size(&self) -> usize {
        self.l
    }

    fn compute_energy(&self) -> f64 {
        let l = self.l;
        let mut energy = 0.0;
        for i in 0..l {
            for j in 0..l {
                let spin = self.lattice[i][j];
                let right = self.lattice[i][(j + 1) % l];
                let down = self.lattice[(i + 1) % l][j];
                energy -= self.coupling * (spin * (right + down)) as f64;
            }
        }
        energy
    }

    /// Total magnetization `Σ s`, not divided by `N`.
    fn compute_magnetization(&self) -> f64 {
        self.lattice
            .iter()
            .flat_map(|row| row.iter())
            .map(|&s| s as f64)
            .sum()
    }

    fn metropolis_update(&mut self) {
        let i = self.rng.gen_range(0..self.l);
        let j = self.rng.gen_range(0..self.l);

        let delta_e = self.delta_energy(i, j);
        if delta_e <= 0.0 || self.rng.gen::<f64>() < acceptance_threshold(delta_e, self.temperature) {
            self.lattice[i][j] = -self.lattice[i][j];
        }
    }

    /// Always proposes the flip at `(i, j)`.
    fn metropolis_update_at(&mut self, i: usize, j: usize) -> bool {
        assert!(i < self.l && j < self.l, "site ({i}, {j}) outside {0}x{0} lattice", self.l);

        let delta_e = self.delta_energy(i, j);
        let r = match self.forced_random {
            Some(r) => r,
            None => self.rng.gen::<f64>(),
        };
        log::debug!(
            "ising ({i}, {j}): forced_random = {:?}, deltaE = {delta_e}, r = {r}, threshold = {}",
            self.forced_random,
            acceptance_threshold(delta_e, self.temperature),
        );

        if metropolis_accept(delta_e, self.temperature, r) {
            self.lattice[i][j] = -self.lattice[i][j];
            return true;
        }
        false
    }

    fn set_forced_random(&mut self, r: f64) {
        self.forced_random = (r >= 0.0).then_some(r);
    }

    fn save_lattice(&self, path: &Path) -> Result<()> {
        write_grid(&self.lattice, self.l, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aligned(l: usize, s: i32) -> Vec<Vec<i32>> {
        vec![vec![s; l]; l]
    }

    #[test]
    fn test_hot_start_values() {
        let model = IsingModel::with_seed(8, 2.0, 1.0, 1);
        assert_eq!(model.lattice().len(), 8);
        for row in model.lattice() {
            assert_eq!(row.len(), 8);
            assert!(row.iter().all(|&s| s == 1 || s == -1));
        }
    }

    #[test]
    fn test_aligned_energy() {
        for l in 2..6 {
            let mut model = IsingModel::with_seed(l, 1.0, 1.0, 3);
            model.set_lattice(aligned(l, 1)).unwrap();
            assert_eq!(model.compute_energy(), -2.0 * (l * l) as f64);
            assert_eq!(model.compute_magnetization(), (l * l) as f64);
        }
    }

    #[test]
    fn test_rejects_wrong_row_count() {
        let mut model = IsingModel::with_seed(4, 1.0, 1.0, 3);
        let err = model.set_lattice(aligned(3, 1)).unwrap_err();
        assert!(matches!(err, SimError::DimensionMismatch { expected: 4, rows: 3, .. }));
    }

    #[test]
    fn test_rejects_ragged_grid() {
        let mut model = IsingModel::with_seed(3, 1.0, 1.0, 3);
        let before = model.lattice().to_vec();
        let grid = vec![vec![1, 1, 1], vec![1, 1], vec![1, 1, 1]];
        assert!(model.set_lattice(grid).is_err());
        assert_eq!(model.lattice(), &before[..]);
    }

    #[test]
    fn test_forced_flip_downhill() {
        // Lone down spin in an up background: flipping it gains energy -8J.
        let mut model = IsingModel::with_seed(3, 1.0, 1.0, 5);
        let mut grid = aligned(3, 1);
        grid[1][1] = -1;
        model.set_lattice(grid).unwrap();
        model.set_forced_random(0.99);
        assert!(model.metropolis_update_at(1, 1));
        assert_eq!(model.spin(1, 1), 1);
    }

    #[test]
    fn test_forced_random_is_sticky() {
        // Flipping an aligned spin costs 8J; exp(-8) is far below 0.5.
        let mut model = IsingModel::with_seed(3, 1.0, 1.0, 5);
        model.set_lattice(aligned(3, 1)).unwrap();
        model.set_forced_random(0.5);
        for _ in 0..10 {
            assert!(!model.metropolis_update_at(0, 0));
        }
        assert_eq!(model.spin(0, 0), 1);

        model.set_forced_random(0.0);
        assert!(model.metropolis_update_at(0, 0));
        assert_eq!(model.spin(0, 0), -1);
    }

    #[test]
    #[should_panic]
    fn test_site_out_of_range_panics() {
        let mut model = IsingModel::with_seed(3, 1.0, 1.0, 5);
        model.metropolis_update_at(3, 0);
    }
}
