//! Planar XY model with continuous angles in `[0, 2π)`.

use crate::error::Result;
use crate::lattice::{acceptance_threshold, metropolis_accept, neighbors, write_grid, SpinModel};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::f64::consts::TAU;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct XYModel<R = ChaCha20Rng> {
    l: usize,
    temperature: f64,
    coupling: f64,
    lattice: Vec<Vec<f64>>,
    forced_angle: Option<f64>,
    forced_random: Option<f64>,
    rng: R,
}

impl XYModel<ChaCha20Rng> {
    pub fn new(l: usize, temperature: f64, coupling: f64) -> Self {
        Self::from_rng(l, temperature, coupling, ChaCha20Rng::from_entropy())
    }

    pub fn with_seed(l: usize, temperature: f64, coupling: f64, seed: u64) -> Self {
        Self::from_rng(l, temperature, coupling, ChaCha20Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> XYModel<R> {
    pub fn from_rng(l: usize, temperature: f64, coupling: f64, mut rng: R) -> Self {
        let lattice = (0..l)
            .map(|_| (0..l).map(|_| rng.gen_range(0.0..TAU)).collect())
            .collect();
        Self {
            l,
            temperature,
            coupling,
            lattice,
            forced_angle: None,
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

    pub fn lattice(&self) -> &[Vec<f64>] {
        &self.lattice
    }

    #[inline]
    pub fn angle(&self, i: usize, j: usize) -> f64 {
        self.lattice[i][j]
    }

    /// Replace the whole grid without checking its dimensions.
    pub fn set_lattice(&mut self, new_lattice: Vec<Vec<f64>>) {
        self.lattice = new_lattice;
    }

    /// Sticky proposal override; a negative value disables it.
    pub fn set_forced_angle(&mut self, angle: f64) {
        self.forced_angle = (angle >= 0.0).then_some(angle);
    }

    /// `J Σ [cos(new - nb) - cos(old - nb)]`, i.e. current minus proposed
    /// energy, the same inverted sign as the clock model.
    fn delta_energy(&self, i: usize, j: usize, old_phi: f64, new_phi: f64) -> f64 {
        neighbors(i, j, self.l)
            .iter()
            .map(|&(ni, nj)| {
                let neighbor_phi = self.lattice[ni][nj];
                self.coupling * ((new_phi - neighbor_phi).cos() - (old_phi - neighbor_phi).cos())
            })
            .sum()
    }
}

impl<R: Rng> SpinModel for XYModel<R> {
    fn size(&self) -> usize {
        self.l
    }

    fn compute_energy(&self) -> f64 {
        let l = self.l;
        let mut energy = 0.0;
        for i in 0..l {
            for j in 0..l {
                let phi = self.lattice[i][j];
                let right = self.lattice[i][(j + 1) % l];
                let down = self.lattice[(i + 1) % l][j];
                energy -= self.coupling * ((phi - right).cos() + (phi - down).cos());
            }
        }
        energy
    }

    /// Length of the summed unit vectors divided by `N = L²`, so in `[0, 1]`.
    fn compute_magnetization(&self) -> f64 {
        let (mx, my) = self.lattice[..self.l]
            .iter()
            .flat_map(|row| row[..self.l].iter())
            .fold((0.0f64, 0.0f64), |(mx, my), &phi: &f64| (mx + phi.cos(), my + phi.sin()));
        mx.hypot(my) / (self.l * self.l) as f64
    }

    /// Proposes a fresh uniform angle; it may coincide with the old one.
    fn metropolis_update(&mut self) {
        let i = self.rng.gen_range(0..self.l);
        let j = self.rng.gen_range(0..self.l);

        let old_phi = self.lattice[i][j];
        let new_phi = self.rng.gen_range(0.0..TAU);

        let delta_e = self.delta_energy(i, j, old_phi, new_phi);
        if delta_e <= 0.0 || self.rng.gen::<f64>() < acceptance_threshold(delta_e, self.temperature) {
            self.lattice[i][j] = new_phi;
        }
    }

    /// The angle is drawn before the acceptance value whenever either one is
    /// not forced.
    fn metropolis_update_at(&mut self, i: usize, j: usize) -> bool {
        assert!(i < self.l && j < self.l, "site ({i}, {j}) outside {0}x{0} lattice", self.l);

        let old_phi = self.lattice[i][j];
        let new_phi = match self.forced_angle {
            Some(angle) => angle,
            None => self.rng.gen_range(0.0..TAU),
        };
        let r = match self.forced_random {
            Some(r) => r,
            None => self.rng.gen::<f64>(),
        };

        let delta_e = self.delta_energy(i, j, old_phi, new_phi);
        log::debug!(
            "xy ({i}, {j}): deltaE = {delta_e}, r = {r}, threshold = {}",
            acceptance_threshold(delta_e, self.temperature),
        );

        if metropolis_accept(delta_e, self.temperature, r) {
            self.lattice[i][j] = new_phi;
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
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_hot_start_in_range() {
        let model = XYModel::with_seed(6, 1.0, 1.0, 4);
        assert!(model
            .lattice()
            .iter()
            .flatten()
            .all(|&phi| (0.0..TAU).contains(&phi)));
    }

    #[test]
    fn test_aligned_state() {
        let mut model = XYModel::with_seed(3, 1.0, 1.0, 4);
        model.set_lattice(vec![vec![1.25; 3]; 3]);
        assert_relative_eq!(model.compute_energy(), -18.0, epsilon = 1e-12);
        assert_relative_eq!(model.compute_magnetization(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_forced_antiparallel_accepted() {
        // Flipping one site by π against aligned neighbors: ΔE = -8J.
        let mut model = XYModel::with_seed(3, 0.5, 1.0, 4);
        model.set_lattice(vec![vec![0.0; 3]; 3]);
        model.set_forced_angle(PI);
        model.set_forced_random(0.5);
        assert!(model.metropolis_update_at(2, 2));
        assert_eq!(model.angle(2, 2), PI);
    }

    #[test]
    fn test_forced_realignment_rejected() {
        let mut model = XYModel::with_seed(3, 0.5, 1.0, 4);
        let mut grid = vec![vec![0.0; 3]; 3];
        grid[0][0] = PI;
        model.set_lattice(grid);
        model.set_forced_angle(0.0);
        model.set_forced_random(0.99);
        assert!(!model.metropolis_update_at(0, 0));
        assert_eq!(model.angle(0, 0), PI);
    }

    #[test]
    fn test_delta_energy_is_current_minus_proposed() {
        let mut model = XYModel::with_seed(3, 1.0, 0.7, 4);
        model.set_lattice(vec![vec![0.3; 3]; 3]);
        let before = model.compute_energy();
        let delta_e = model.delta_energy(1, 2, 0.3, 2.0);

        model.set_forced_angle(2.0);
        model.set_forced_random(0.0);
        assert!(model.metropolis_update_at(1, 2));

        assert!(delta_e < 0.0);
        assert_relative_eq!(delta_e, before - model.compute_energy(), epsilon = 1e-12);
    }

    #[test]
    fn test_forced_angle_is_sticky() {
        let mut model = XYModel::with_seed(3, 1.0, 1.0, 4);
        model.set_lattice(vec![vec![0.0; 3]; 3]);
        model.set_forced_angle(1.0);
        model.set_forced_random(0.0);
        for (i, j) in [(0, 0), (1, 2), (2, 1)] {
            assert!(model.metropolis_update_at(i, j));
            assert_eq!(model.angle(i, j), 1.0);
        }
        assert_eq!(model.angle(1, 1), 0.0);
    }

    #[test]
    fn test_unforced_proposal_stays_in_range() {
        let mut model = XYModel::with_seed(4, 1.0, 1.0, 9);
        model.set_forced_random(0.0);
        for k in 0..64 {
            model.metropolis_update_at(k % 4, (k / 4) % 4);
        }
        assert!(model.lattice().iter().flatten().all(|&phi| (0.0..TAU).contains(&phi)));
    }
}
