pub mod error;
pub mod lattice;
pub mod ising;
pub mod clock;
pub mod xy;
pub mod simulation;
pub mod stats;
pub mod utils;

pub use error::{Result, SimError};
pub use lattice::SpinModel;
pub use ising::IsingModel;
pub use clock::ClockModel;
pub use xy::XYModel;
