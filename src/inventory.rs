use ndarray::{Array1, Array2, ArrayView1};

use crate::demand::{contiguous_max, Demand, Truncation};
use crate::error::{MdpError, Result};

/// Single-item inventory problem with Poisson demand.
///
/// States are stock levels `0..=capacity`. In state `s` the order quantity
/// `a` may be anything in `0..=capacity - s`.
#[derive(Debug, Clone)]
pub struct InventorySystem {
    /// Largest stock level that can be held
    pub capacity: u32,
    /// Charged per unit left over at the end of a period
    pub holding_cost: f64,
    /// Charged per unit of unmet demand
    pub penalty_cost: f64,
    /// Charged per unit ordered
    pub order_cost: f64,
    pub demand: Demand,
}

impl InventorySystem {
    /// Build from explicit state and demand spaces, each `0, 1, .., max`.
    pub fn new(
        states: &[u32], demands: &[u32],
        holding_cost: f64, penalty_cost: f64, order_cost: f64,
        demand_rate: f64,
    ) -> Result<InventorySystem> {
        let capacity = contiguous_max("state space", states)?;
        let demand = Demand::with_support(demand_rate, demands)?;
        InventorySystem::assemble(
            capacity, holding_cost, penalty_cost, order_cost, demand)
    }

    /// Build from a capacity, deriving the demand support from `truncation`.
    pub fn with_capacity(
        capacity: u32,
        holding_cost: f64, penalty_cost: f64, order_cost: f64,
        demand_rate: f64, truncation: Truncation,
    ) -> Result<InventorySystem> {
        let demand = Demand::new(demand_rate, truncation)?;
        InventorySystem::assemble(
            capacity, holding_cost, penalty_cost, order_cost, demand)
    }

    fn assemble(
        capacity: u32,
        holding_cost: f64, penalty_cost: f64, order_cost: f64,
        demand: Demand,
    ) -> Result<InventorySystem> {
        for (name, value) in [
            ("holding cost", holding_cost),
            ("penalty cost", penalty_cost),
            ("order cost", order_cost),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(MdpError::InvalidParameter(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        Ok(InventorySystem {
            capacity, holding_cost, penalty_cost, order_cost, demand
        })
    }

    /// Number of states, `capacity + 1`.
    pub fn num_states(&self) -> usize {
        self.capacity as usize + 1
    }

    /// Check that ordering `a` in state `s` stays within capacity.
    pub fn check_action(&self, s: u32, a: u32) -> Result<()> {
        if s > self.capacity {
            return Err(MdpError::InvalidParameter(format!(
                "state {s} exceeds capacity {}", self.capacity
            )));
        }
        if a > self.capacity - s {
            return Err(MdpError::InvalidParameter(format!(
                "ordering {a} in state {s} exceeds capacity {}", self.capacity
            )));
        }
        Ok(())
    }

    /// Expected single-period reward of ordering `a` in state `s`.
    ///
    /// This is the negated expected cost: holding cost on leftover stock,
    /// penalty on unmet demand, and the ordering cost. Expectations are taken
    /// over the truncated demand support.
    pub fn cost(&self, s: u32, a: u32) -> f64 {
        let level = i64::from(s) + i64::from(a);
        let mut leftover = 0.0;
        let mut shortage = 0.0;
        for (d, p) in self.demand.support() {
            let d = i64::from(d);
            leftover += (level - d).max(0) as f64 * p;
            shortage += (d - level).max(0) as f64 * p;
        }
        -self.holding_cost * leftover
            - self.penalty_cost * shortage
            - self.order_cost * f64::from(a)
    }

    /// Rewards for every state and order quantity. Indexes: state, order.
    /// Orders that would exceed capacity are `-inf`.
    pub fn cost_table(&self) -> Array2<f64> {
        let dim = self.num_states();
        let mut costs = Array2::<f64>::from_elem((dim, dim), f64::NEG_INFINITY);
        for s in 0..=self.capacity {
            for a in 0..=(self.capacity - s) {
                costs[[s as usize, a as usize]] = self.cost(s, a);
            }
        }
        costs
    }

    /// Probability of reaching `s_next` after ordering `a` in state `s`.
    ///
    /// Meaningful for `s + a <= capacity`; larger levels saturate and get
    /// no probability mass.
    pub fn transition_prob(&self, s_next: u32, s: u32, a: u32) -> f64 {
        let level = s.saturating_add(a);
        // Stock left over after demand is met.
        if s_next > 0 && s_next <= level {
            return self.demand.prob(level - s_next);
        }
        // Every demand of at least `level` empties the shelf.
        if s_next == 0 {
            return (self.demand.support_mass() - self.demand.prob_below(level)).max(0.0);
        }
        // Stock can't grow past what was ordered.
        0.0
    }

    /// Distribution over next states after ordering `a` in state `s`.
    pub fn transition_row(&self, s: u32, a: u32) -> Array1<f64> {
        (0..=self.capacity)
            .map(|s_next| self.transition_prob(s_next, s, a))
            .collect()
    }

    /// Transition probabilities by post-order stock level.
    ///
    /// The next state depends on `s` and `a` only through `s + a`, so row
    /// `s + a` holds `P(s_next | s, a)`. Indexes: stock level, next state.
    pub fn transition_matrix(&self) -> Array2<f64> {
        let dim = self.num_states();
        let mut probs = Array2::<f64>::zeros((dim, dim));
        for level in 0..=self.capacity {
            probs.row_mut(level as usize).assign(&self.transition_row(level, 0));
        }
        probs
    }

    /// Expected value of `next` one period after reaching stock level `level`,
    /// mapping each demand straight to the state it leaves behind.
    pub fn expected_by_demand(&self, level: u32, next: ArrayView1<f64>) -> f64 {
        self.demand
            .support()
            .map(|(d, p)| p * next[level.saturating_sub(d) as usize])
            .sum()
    }

    /// Print the transition table for order quantity `a`.
    pub fn show_transitions(&self, a: u32) {
        println!("\n=== Transition Probabilities (order {a}) ===");
        print!("   next state:");
        for s_next in 0..=self.capacity {
            print!("{:9}", s_next);
        }
        println!();
        for s in 0..=self.capacity.saturating_sub(a) {
            print!("stock {s:>6} | ");
            for s_next in 0..=self.capacity {
                print!("{:8.4} ", self.transition_prob(s_next, s, a));
            }
            println!();
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use test_case::test_case;

    fn sample_system() -> InventorySystem {
        let states: Vec<u32> = (0..=10).collect();
        let demands: Vec<u32> = (0..=20).collect();
        InventorySystem::new(&states, &demands, 1.0, 2.0, 1.0, 10.0).unwrap()
    }

    #[test_case(0, 0; "Empty and no order")]
    #[test_case(0, 4; "Empty with order")]
    #[test_case(3, 0; "Stock and no order")]
    #[test_case(2, 5; "Stock with order")]
    fn deterministic_demand_cost(s: u32, a: u32) {
        // Arrange
        let system = InventorySystem::new(
            &[0, 1, 2, 3, 4, 5, 6, 7, 8], &[0], 1.5, 2.0, 0.5, 3.0).unwrap();
        let p0 = system.demand.pmf[0];
        // Act
        let c = system.cost(s, a);
        // Assert
        let expected = -1.5 * (s + a) as f64 * p0 - 0.5 * a as f64;
        assert_abs_diff_eq!(c, expected, epsilon = 1e-12);
    }

    #[test]
    fn empty_shelf_cost_is_expected_shortage() {
        // Arrange
        let system = sample_system();
        let mean: f64 = system.demand.support().map(|(d, p)| d as f64 * p).sum();
        // Act
        let c = system.cost(0, 0);
        // Assert
        assert_abs_diff_eq!(c, -2.0 * mean, epsilon = 1e-12);
    }

    #[test]
    fn cost_table_marks_infeasible_orders() {
        // Act
        let costs = sample_system().cost_table();
        // Assert
        assert_eq!(costs.dim(), (11, 11));
        assert_eq!(costs[[10, 1]], f64::NEG_INFINITY);
        assert_eq!(costs[[3, 7]], sample_system().cost(3, 7));
        assert!(costs[[3, 8]].is_infinite());
    }

    #[test_case(1.0; "Low rate")]
    #[test_case(4.0; "Medium rate")]
    #[test_case(10.0; "High rate")]
    fn transition_rows_conserve_support_mass(rate: f64) {
        // Arrange
        let system = InventorySystem::with_capacity(
            12, 1.0, 2.0, 1.0, rate, Truncation::default()).unwrap();
        let mass = system.demand.support_mass();
        // Act / Assert
        for s in 0..=12 {
            for a in 0..=(12 - s) {
                let total = system.transition_row(s, a).sum();
                assert_abs_diff_eq!(total, mass, epsilon = 1e-9);
                assert_abs_diff_eq!(total, 1.0, epsilon = 1.0 - mass + 1e-9);
            }
        }
    }

    #[test]
    fn short_support_keeps_rows_at_support_mass() {
        // Arrange
        let system = InventorySystem::with_capacity(
            10, 1.0, 2.0, 1.0, 3.0, Truncation::UpperBound { max_demand: 4 }).unwrap();
        // Act / Assert
        for a in 0..=10 {
            let row = system.transition_row(0, a);
            assert!(row.iter().all(|p| *p >= 0.0));
            assert_abs_diff_eq!(row.sum(), system.demand.support_mass(), epsilon = 1e-9);
        }
    }

    #[test]
    fn no_transition_above_stock_level() {
        // Arrange
        let system = sample_system();
        // Assert
        assert_eq!(system.transition_prob(6, 2, 3), 0.0);
        assert_eq!(system.transition_prob(5, 2, 3), system.demand.pmf[0]);
        assert_eq!(system.transition_prob(1, 2, 3), system.demand.pmf[4]);
    }

    #[test]
    fn huge_stock_level_empties_nothing() {
        // Arrange
        let system = sample_system();
        // Act
        let row = system.transition_row(u32::MAX, 1);
        // Assert
        assert_eq!(system.transition_prob(0, u32::MAX, 1), 0.0);
        assert_eq!(system.transition_prob(3, u32::MAX, 1), 0.0);
        assert_eq!(row.sum(), 0.0);
    }

    #[test]
    fn matrix_rows_match_transition_rows() {
        // Arrange
        let system = sample_system();
        // Act
        let matrix = system.transition_matrix();
        // Assert
        assert_eq!(matrix.row(7), system.transition_row(3, 4));
        assert_eq!(matrix.row(0), system.transition_row(0, 0));
    }

    #[test]
    fn demand_mapping_matches_transition_law() {
        // Arrange
        let system = sample_system();
        let next: Array1<f64> = (0..=10).map(|s| -3.0 * s as f64 - 1.0).collect();
        // Act / Assert
        for s in 0..=10 {
            for a in 0..=(10 - s) {
                let by_transition = system.transition_row(s, a).dot(&next);
                let by_demand = system.expected_by_demand(s + a, next.view());
                assert_abs_diff_eq!(by_transition, by_demand, epsilon = 1e-9);
            }
        }
    }

    #[test_case(-1.0, 2.0, 1.0; "Negative holding cost")]
    #[test_case(1.0, -2.0, 1.0; "Negative penalty cost")]
    #[test_case(1.0, 2.0, f64::NAN; "NaN order cost")]
    fn rejects_bad_costs(h: f64, e: f64, c: f64) {
        let result = InventorySystem::with_capacity(
            5, h, e, c, 2.0, Truncation::default());
        assert!(matches!(result, Err(MdpError::InvalidParameter(_))));
    }

    #[test]
    fn rejects_bad_state_space() {
        let result = InventorySystem::new(&[], &[0, 1], 1.0, 1.0, 1.0, 1.0);
        assert!(matches!(result, Err(MdpError::InvalidParameter(_))));
        let result = InventorySystem::new(&[0, 2], &[0, 1], 1.0, 1.0, 1.0, 1.0);
        assert!(matches!(result, Err(MdpError::InvalidParameter(_))));
    }

    #[test]
    fn check_action_bounds() {
        let system = sample_system();
        assert!(system.check_action(4, 6).is_ok());
        assert!(system.check_action(4, 7).is_err());
        assert!(system.check_action(11, 0).is_err());
    }
}
