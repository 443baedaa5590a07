//! Dynamic-programming solvers for the inventory problem.
//!
//! Both solvers maximize `cost(s, a)` plus the expected continuation value,
//! sweeping every state from a read-only snapshot of the previous values.

use ndarray::{Array1, Array2, ArrayView1};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{MdpError, Result};
use crate::inventory::InventorySystem;
use crate::policy::{StationaryPolicy, TimedPolicy};

/// Stopping rule for value iteration.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ValueIterationOptions {
    /// Stop once no state value moves by this much in a sweep
    pub epsilon: f64,
    /// Hard cap on sweeps
    pub max_iterations: u32,
    /// Weight on the continuation value; 1.0 is undiscounted
    pub discount: f64,
}

impl Default for ValueIterationOptions {
    fn default() -> Self {
        ValueIterationOptions { epsilon: 0.1, max_iterations: 100, discount: 1.0 }
    }
}

impl ValueIterationOptions {
    fn validate(&self) -> Result<()> {
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(MdpError::InvalidParameter(format!(
                "epsilon must be finite and positive, got {}", self.epsilon
            )));
        }
        if self.max_iterations == 0 {
            return Err(MdpError::InvalidParameter(
                "max_iterations must be at least 1".to_string()));
        }
        if !(self.discount > 0.0 && self.discount <= 1.0) {
            return Err(MdpError::InvalidParameter(format!(
                "discount must be in (0, 1], got {}", self.discount
            )));
        }
        Ok(())
    }
}

/// Outcome of value iteration.
#[derive(Debug, Clone)]
pub struct ValueIteration {
    pub policy: StationaryPolicy,
    /// Negated mean of the final value function
    pub optimal_cost: f64,
    /// Sweeps performed
    pub iterations: u32,
    /// Largest change in any state value during the last sweep
    pub residual: f64,
    /// Whether the residual dropped below epsilon before the cap
    pub converged: bool,
}

impl ValueIteration {
    /// Turn a run that stopped on the iteration cap into an error.
    pub fn ensure_converged(&self) -> Result<&ValueIteration> {
        if self.converged {
            Ok(self)
        } else {
            Err(MdpError::NonConvergence {
                iterations: self.iterations,
                residual: self.residual,
            })
        }
    }
}

/// Pick the first order quantity with the highest value.
///
/// A later order only replaces the current best when it is strictly better.
fn best_order<I>(q_values: I) -> (u32, f64)
where
    I: IntoIterator<Item = f64>,
{
    let mut best = (0, f64::NEG_INFINITY);
    for (a, q) in q_values.into_iter().enumerate() {
        if q > best.1 {
            best = (a as u32, q);
        }
    }
    best
}

/// One Bellman sweep over all states.
///
/// `continuation[l]` is the expected next-period value once stock reaches
/// level `l`; a state's feasible orders are the non-infinite cells of its
/// cost row.
fn bellman_sweep(
    costs: &Array2<f64>,
    continuation: ArrayView1<f64>,
    value: &mut Array1<f64>,
    order: &mut Array1<u32>,
) {
    let dim = continuation.len();
    for s in 0..dim {
        let (a, q) = best_order(
            (0..dim - s).map(|a| costs[[s, a]] + continuation[s + a]));
        value[s] = q;
        order[s] = a;
    }
}

/// Value iteration over an unbounded horizon.
///
/// Starts from zero values and repeats Jacobi sweeps until the largest
/// change is below `epsilon` or `max_iterations` sweeps have run. Running
/// into the cap is reported through `converged`, not as an error.
pub fn value_iteration(
    system: &InventorySystem, options: &ValueIterationOptions,
) -> Result<ValueIteration> {
    options.validate()?;
    let costs = system.cost_table();
    let transitions = system.transition_matrix();

    let mut current = StationaryPolicy::new(system.capacity);
    let mut residual = f64::INFINITY;
    let mut iterations = 0;
    let mut converged = false;
    while iterations < options.max_iterations {
        iterations += 1;
        let continuation = transitions.dot(&current.value) * options.discount;
        let mut next = StationaryPolicy::new(system.capacity);
        bellman_sweep(&costs, continuation.view(), &mut next.value, &mut next.order);
        residual = (&next.value - &current.value)
            .iter()
            .fold(0.0_f64, |acc, diff| acc.max(diff.abs()));
        current = next;
        debug!(iteration = iterations, residual, "value iteration sweep");
        if residual < options.epsilon {
            converged = true;
            break;
        }
    }

    let optimal_cost = current.average_cost();
    if converged {
        info!(iterations, residual, optimal_cost, "value iteration converged");
    } else {
        warn!(
            iterations, residual, epsilon = options.epsilon,
            "value iteration stopped at the iteration cap without converging"
        );
    }
    Ok(ValueIteration { policy: current, optimal_cost, iterations, residual, converged })
}

/// Backward induction over `horizon` periods.
///
/// Period `horizon` carries zero value; each earlier period is solved from
/// the one after it, mapping every demand to the stock it leaves behind.
pub fn backward_dp(system: &InventorySystem, horizon: u32) -> Result<TimedPolicy> {
    if horizon == 0 {
        return Err(MdpError::InvalidParameter(
            "horizon must be at least 1 period".to_string()));
    }
    let costs = system.cost_table();
    let mut plan = TimedPolicy::new(horizon, system.capacity);

    for t in (0..horizon as usize).rev() {
        let continuation: Array1<f64> = {
            let next = plan.value.row(t + 1);
            (0..=system.capacity)
                .map(|level| system.expected_by_demand(level, next))
                .collect()
        };
        let mut value = Array1::<f64>::zeros(system.num_states());
        let mut order = Array1::<u32>::zeros(system.num_states());
        bellman_sweep(&costs, continuation.view(), &mut value, &mut order);
        plan.value.row_mut(t).assign(&value);
        plan.order.row_mut(t).assign(&order);
        debug!(period = t, "backward induction step");
    }

    info!(horizon, "backward induction finished");
    Ok(plan)
}

impl InventorySystem {
    /// Value iteration with the default stopping rule (epsilon 0.1, 100 sweeps, undiscounted).
    pub fn value_iteration(&self) -> Result<ValueIteration> {
        value_iteration(self, &ValueIterationOptions::default())
    }

    pub fn value_iteration_with(&self, options: &ValueIterationOptions) -> Result<ValueIteration> {
        value_iteration(self, options)
    }

    pub fn backward_dp(&self, horizon: u32) -> Result<TimedPolicy> {
        backward_dp(self, horizon)
    }
}
