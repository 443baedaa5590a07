use thiserror::Error;

/// Errors raised while building or solving an inventory problem.
#[derive(Error, Debug)]
pub enum MdpError {
    /// Rejected problem or solver parameter.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Value iteration hit its iteration cap before the stopping rule held.
    #[error("Value iteration did not converge after {iterations} iterations (residual {residual:.4})")]
    NonConvergence { iterations: u32, residual: f64 },

    /// Configuration file could not be read.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, MdpError>;
