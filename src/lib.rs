//! Optimal ordering policies for a single-item inventory with Poisson demand.
//!
//! The problem is a Markov decision process over stock levels `0..=capacity`.
//! [`solver::value_iteration`] solves the unbounded-horizon problem and
//! [`solver::backward_dp`] solves a finite horizon by backward induction.

pub mod config;
pub mod demand;
pub mod error;
pub mod inventory;
pub mod logging;
pub mod policy;
pub mod solver;

pub use error::{MdpError, Result};
pub use inventory::InventorySystem;
