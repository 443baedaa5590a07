use ndarray::Array1;
use serde::Deserialize;
use statrs::distribution::{Discrete, DiscreteCDF, Poisson};

use crate::error::{MdpError, Result};

/// Largest demand value a support may reach.
pub const MAX_SUPPORT: u32 = 1_000_000;

/// How far into the Poisson tail the demand support reaches.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Truncation {
    /// Largest demand is `ceil(rate + sigmas * sqrt(rate))`.
    MeanPlusSigmas { sigmas: f64 },
    /// Largest demand is given explicitly.
    UpperBound { max_demand: u32 },
}

impl Default for Truncation {
    fn default() -> Self {
        Truncation::MeanPlusSigmas { sigmas: 3.0 }
    }
}

impl Truncation {
    /// Largest demand value kept in the support for a Poisson rate.
    pub fn max_demand(&self, rate: f64) -> Result<u32> {
        match *self {
            Truncation::UpperBound { max_demand } => Ok(max_demand),
            Truncation::MeanPlusSigmas { sigmas } => {
                if !sigmas.is_finite() || sigmas < 0.0 {
                    return Err(MdpError::InvalidParameter(format!(
                        "truncation sigmas must be finite and non-negative, got {sigmas}"
                    )));
                }
                let bound = (rate + sigmas * rate.sqrt()).ceil();
                if !bound.is_finite() || bound > MAX_SUPPORT as f64 {
                    return Err(MdpError::InvalidParameter(format!(
                        "demand support bound {bound} exceeds {MAX_SUPPORT}"
                    )));
                }
                Ok(bound as u32)
            }
        }
    }
}

/// Poisson demand truncated to the support `0..=max_demand`.
///
/// Probabilities are calculated once when the object is constructed.
/// Both tables are indexed by demand value.
#[derive(Debug, Clone)]
pub struct Demand {
    /// Poisson rate (mean demand per period)
    pub rate: f64,
    /// Largest demand value in the support
    pub max_demand: u32,
    /// P(D = d)
    pub pmf: Array1<f64>,
    /// P(D <= d)
    pub cdf: Array1<f64>,
}

impl Demand {
    pub fn new(rate: f64, truncation: Truncation) -> Result<Demand> {
        validate_rate(rate)?;
        let max_demand = truncation.max_demand(rate)?;
        Demand::from_bound(rate, max_demand)
    }

    /// Use an explicit demand support. It must be `0, 1, .., max_demand`.
    pub fn with_support(rate: f64, support: &[u32]) -> Result<Demand> {
        validate_rate(rate)?;
        let max_demand = contiguous_max("demand space", support)?;
        Demand::from_bound(rate, max_demand)
    }

    fn from_bound(rate: f64, max_demand: u32) -> Result<Demand> {
        if max_demand > MAX_SUPPORT {
            return Err(MdpError::InvalidParameter(format!(
                "demand support bound {max_demand} exceeds {MAX_SUPPORT}"
            )));
        }
        let dist = Poisson::new(rate).map_err(|e| {
            MdpError::InvalidParameter(format!("poisson rate {rate}: {e}"))
        })?;
        let dim = max_demand as usize + 1;
        let mut pmf = Array1::<f64>::zeros(dim);
        let mut cdf = Array1::<f64>::zeros(dim);
        for d in 0..dim {
            pmf[d] = dist.pmf(d as u64);
            cdf[d] = dist.cdf(d as u64);
        }
        Ok(Demand { rate, max_demand, pmf, cdf })
    }

    /// Probability of demand `d`; zero outside the support.
    pub fn prob(&self, d: u32) -> f64 {
        if d > self.max_demand {
            return 0.0;
        }
        self.pmf[d as usize]
    }

    /// P(D < d) restricted to the support, so demands past `max_demand` add nothing.
    pub fn prob_below(&self, d: u32) -> f64 {
        if d == 0 {
            return 0.0;
        }
        self.cdf[(d - 1).min(self.max_demand) as usize]
    }

    /// Probability mass kept by the truncation, `cdf(max_demand)`.
    pub fn support_mass(&self) -> f64 {
        self.cdf[self.max_demand as usize]
    }

    /// Demand values paired with their probabilities.
    pub fn support(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.pmf.iter().enumerate().map(|(d, p)| (d as u32, *p))
    }

    /// Print the demand distribution table.
    pub fn show(&self) {
        println!("\n=== Demand Distribution (Poisson, rate {:.2}) ===", self.rate);
        println!("{:>8} {:>10} {:>10}", "demand", "pmf", "cdf");
        for (d, p) in self.support() {
            println!("{:>8} {:>10.6} {:>10.6}", d, p, self.cdf[d as usize]);
        }
        println!("Truncated tail mass: {:.6}", 1.0 - self.support_mass());
    }
}

fn validate_rate(rate: f64) -> Result<()> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(MdpError::InvalidParameter(format!(
            "demand rate must be finite and positive, got {rate}"
        )));
    }
    Ok(())
}

/// Check that `values` is `0, 1, .., max` and return `max`.
pub(crate) fn contiguous_max(name: &str, values: &[u32]) -> Result<u32> {
    if values.is_empty() {
        return Err(MdpError::InvalidParameter(format!("{name} is empty")));
    }
    for (i, v) in values.iter().enumerate() {
        if *v as usize != i {
            return Err(MdpError::InvalidParameter(format!(
                "{name} must be 0, 1, 2, .. without gaps; found {v} at position {i}"
            )));
        }
    }
    Ok(values.len() as u32 - 1)
}
