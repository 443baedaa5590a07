use std::io::Write;

use ndarray::{Array1, Array2};

use crate::error::Result;

/// Stationary ordering rule with its value function. Indexed by stock level.
#[derive(Debug, Clone, PartialEq)]
pub struct StationaryPolicy {
    pub value: Array1<f64>,
    pub order: Array1<u32>,
}

impl StationaryPolicy {
    /// Zero values and zero orders for states `0..=capacity`.
    pub fn new(capacity: u32) -> StationaryPolicy {
        let dim = capacity as usize + 1;
        StationaryPolicy {
            value: Array1::<f64>::zeros(dim),
            order: Array1::<u32>::zeros(dim),
        }
    }

    /// Mean cost per state, the negated mean of the value function.
    pub fn average_cost(&self) -> f64 {
        -self.value.mean().unwrap_or(0.0)
    }

    pub fn show(&self) {
        println!("{:>8} {:>8} {:>12}", "stock", "order", "value");
        for (s, (a, v)) in self.order.iter().zip(self.value.iter()).enumerate() {
            println!("{:>8} {:>8} {:>12.4}", s, a, v);
        }
    }
}

/// Per-period ordering rule for a finite horizon.
///
/// Indexes to `value` and `order` are [period, stock level]. Period
/// `horizon` is the terminal boundary: zero value, zero order.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedPolicy {
    pub horizon: u32,
    pub value: Array2<f64>,
    pub order: Array2<u32>,
}

impl TimedPolicy {
    pub fn new(horizon: u32, capacity: u32) -> TimedPolicy {
        let dimensions = (horizon as usize + 1, capacity as usize + 1);
        TimedPolicy {
            horizon,
            value: Array2::<f64>::zeros(dimensions),
            order: Array2::<u32>::zeros(dimensions),
        }
    }

    pub fn value(&self, t: u32, s: u32) -> f64 {
        self.value[[t as usize, s as usize]]
    }

    pub fn order(&self, t: u32, s: u32) -> u32 {
        self.order[[t as usize, s as usize]]
    }

    pub fn show(&self) {
        print!("  period |");
        for s in 0..self.order.ncols() {
            print!("{:>9}", s);
        }
        println!();
        for (t, (orders, values)) in
            self.order.rows().into_iter().zip(self.value.rows()).enumerate()
        {
            print!("{t:>8} |");
            for a in orders.iter() {
                print!("{:>9}", a);
            }
            println!("   orders");
            print!("{:>8} |", "");
            for v in values.iter() {
                print!("{:>9.3}", v);
            }
            println!("   values");
        }
    }

    /// Write one `t,state,order,value` record per cell.
    pub fn write_csv<W: Write>(&self, out: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(["t", "state", "order", "value"])?;
        for ((t, s), a) in self.order.indexed_iter() {
            writer.write_record([
                t.to_string(),
                s.to_string(),
                a.to_string(),
                self.value[[t, s]].to_string(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}
