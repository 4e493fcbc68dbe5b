//! M-state clock model: each site points at one of `M` evenly spaced angles
//! `2πm/M` on the unit circle.

use crate::error::Result;
use crate::lattice::{acceptance_threshold, metropolis_accept, neighbors, write_grid, SpinModel};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::f64::consts::TAU;
use std::path::Path;

/// Clock lattice holding state indices in `0..M`.
#[derive(Debug, Clone)]
pub struct ClockModel<R = ChaCha20Rng> {
    l: usize,
    m: usize,
    temperature: f64,
    coupling: f64,
    lattice: Vec<Vec<usize>>,
    forced_state: Option<usize>,
    forced_random: Option<f64>,
    rng: R,
}

impl ClockModel<ChaCha20Rng> {
    pub fn new(l: usize, m: usize, temperature: f64, coupling: f64) -> Self {
        Self::from_rng(l, m, temperature, coupling, ChaCha20Rng::from_entropy())
    }

    pub fn with_seed(l: usize, m: usize, temperature: f64, coupling: f64, seed: u64) -> Self {
        Self::from_rng(l, m, temperature, coupling, ChaCha20Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> ClockModel<R> {
    /// Hot start, every state uniform over `0..M`.
    ///
    /// Panics if `m < 2`: the randomized update needs a second state to
    /// propose.
    pub fn from_rng(l: usize, m: usize, temperature: f64, coupling: f64, mut rng: R) -> Self {
        assert!(m >= 2, "clock model needs at least 2 states, got {m}");
        let lattice = (0..l)
            .map(|_| (0..l).map(|_| rng.gen_range(0..m)).collect())
            .collect();
        Self {
            l,
            m,
            temperature,
            coupling,
            lattice,
            forced_state: None,
            forced_random: None,
            rng,
        }
    }

    /// Number of clock states `M`.
    pub fn states(&self) -> usize {
        self.m
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn coupling(&self) -> f64 {
        self.coupling
    }

    pub fn lattice(&self) -> &[Vec<usize>] {
        &self.lattice
    }

    #[inline]
    pub fn state(&self, i: usize, j: usize) -> usize {
        self.lattice[i][j]
    }

    /// Replace the whole grid. Dimensions are not checked; a grid smaller
    /// than `L`×`L` makes later updates panic on indexing.
    pub fn set_lattice(&mut self, new_lattice: Vec<Vec<usize>>) {
        self.lattice = new_lattice;
    }

    /// Sticky proposal override for [`SpinModel::metropolis_update_at`];
    /// a negative value disables it.
    pub fn set_forced_state(&mut self, s: i64) {
        self.forced_state = usize::try_from(s).ok();
    }

    /// `cos(2π(m1 - m2)/M)`
    #[inline]
    fn spin_dot(&self, m1: usize, m2: usize) -> f64 {
        (TAU * (m1 as f64 - m2 as f64) / self.m as f64).cos()
    }

    /// `J Σ [cos(new - nb) - cos(old - nb)]` over the four neighbors.
    ///
    /// Against the `-J cos` bond energy this is the current energy minus the
    /// proposed one, so accepted moves tend to raise the energy and a `J > 0`
    /// lattice drifts toward anti-alignment. The XY model shares the quirk.
    fn delta_energy(&self, i: usize, j: usize, old_state: usize, new_state: usize) -> f64 {
        neighbors(i, j, self.l)
            .iter()
            .map(|&(ni, nj)| {
                let neighbor = self.lattice[ni][nj];
                self.coupling * (self.spin_dot(new_state, neighbor) - self.spin_dot(old_state, neighbor))
            })
            .sum()
    }
}

impl<R: Rng> SpinModel for ClockModel<R> {
    fn size(&self) -> usize {
        self.l
    }

    fn compute_energy(&self) -> f64 {
        let l = self.l;
        let mut energy = 0.0;
        for i in 0..l {
            for j in 0..l {
                let m = self.lattice[i][j];
                let right = self.lattice[i][(j + 1) % l];
                let down = self.lattice[(i + 1) % l][j];
                energy -= self.coupling * (self.spin_dot(m, right) + self.spin_dot(m, down));
            }
        }
        energy
    }

    /// Length of the summed unit vectors. Not divided by `N`, unlike
    /// the XY model.
    fn compute_magnetization(&self) -> f64 {
        let (mx, my) = self.lattice[..self.l]
            .iter()
            .flat_map(|row| row[..self.l].iter())
            .fold((0.0f64, 0.0f64), |(mx, my), &m| {
                let angle = TAU * m as f64 / self.m as f64;
                (mx + angle.cos(), my + angle.sin())
            });
        mx.hypot(my)
    }

    /// Proposes a state different from the current one, redrawn until it
    /// differs.
    fn metropolis_update(&mut self) {
        let i = self.rng.gen_range(0..self.l);
        let j = self.rng.gen_range(0..self.l);
        let old_state = self.lattice[i][j];

        let mut new_state = old_state;
        while new_state == old_state {
            new_state = self.rng.gen_range(0..self.m);
        }

        let delta_e = self.delta_energy(i, j, old_state, new_state);
        if delta_e <= 0.0 || self.rng.gen::<f64>() < acceptance_threshold(delta_e, self.temperature) {
            self.lattice[i][j] = new_state;
        }
    }

    /// Only the forced state is ever proposed. Without one, or when it equals
    /// the current state, returns `false` without drawing anything.
    fn metropolis_update_at(&mut self, i: usize, j: usize) -> bool {
        assert!(i < self.l && j < self.l, "site ({i}, {j}) outside {0}x{0} lattice", self.l);

        let old_state = self.lattice[i][j];
        let new_state = self.forced_state.unwrap_or(old_state);
        if new_state == old_state {
            return false;
        }

        let delta_e = self.delta_energy(i, j, old_state, new_state);
        let r = match self.forced_random {
            Some(r) => r,
            None => self.rng.gen::<f64>(),
        };
        log::debug!(
            "clock ({i}, {j}): {old_state} -> {new_state}, deltaE = {delta_e}, r = {r}, threshold = {}",
            acceptance_threshold(delta_e, self.temperature),
        );

        if metropolis_accept(delta_e, self.temperature, r) {
            self.lattice[i][j] = new_state;
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
