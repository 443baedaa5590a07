use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use rustinv::config::InventoryConfig;
use rustinv::Result;


/// Command line argument parser.
#[derive(Parser, Debug)]
#[command(about = "Solve a single-item inventory problem with Poisson demand", long_about = None)]
pub struct Args {
    /// Path to inventory configuration TOML file.
    config_path: PathBuf,

    #[command(subcommand)]
    command: Commands
}


#[derive(Subcommand, Debug)]
enum Commands {
    /// Print demand probabilities and the transition table for one order size.
    Probs {
        #[arg(short, long, default_value_t = 0)]
        order: u32,
    },
    /// Calculate expected single-period cost of an order.
    Cost {state: u32, order: u32},
    /// Solve the unbounded-horizon problem with value iteration.
    Solve,
    /// Solve a finite horizon with backward induction.
    Plan {
        /// Number of periods; overrides the configuration file.
        #[arg(long)]
        horizon: Option<u32>,
        /// Write the plan as CSV to stdout.
        #[arg(long)]
        csv: bool,
    },
}


fn main() -> ExitCode {
    rustinv::logging::init_tracing();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}


fn run(args: &Args) -> Result<()> {
    info!(path = %args.config_path.display(), "reading config file");
    let config = InventoryConfig::load(&args.config_path)?;
    let system = config.build_system()?;
    info!(
        capacity = system.capacity,
        max_demand = system.demand.max_demand,
        "built inventory system"
    );

    match &args.command {
        Commands::Probs {order} => {
            system.check_action(0, *order)?;
            system.demand.show();
            system.show_transitions(*order);
        }
        Commands::Cost {state, order} => {
            system.check_action(*state, *order)?;
            println!("Expected cost: {:.4}", -system.cost(*state, *order));
        }
        Commands::Solve => {
            let result = system.value_iteration_with(&config.value_iteration)?;
            result.policy.show();
            println!("Optimal cost: {:.4}", result.optimal_cost);
            println!(
                "Iterations: {} (residual {:.4}, {})",
                result.iterations, result.residual,
                if result.converged { "converged" } else { "NOT converged" }
            );
        }
        Commands::Plan {horizon, csv} => {
            let plan = system.backward_dp(horizon.unwrap_or(config.horizon))?;
            if *csv {
                plan.write_csv(std::io::stdout().lock())?;
            } else {
                plan.show();
            }
        }
    }
    Ok(())
}
