//! mtlsyn Command Line Interface
//!
//! This crate contains the `mtlsyn` binary, which reads a synthesis problem
//! (a plant, an MTL formula describing the undesired behavior, an action
//! partition and the region constant K), runs the game search and reports
//! whether a controller exists. A found controller and the search tree can
//! be exported in the DOT format.

use clap::Parser;
use human_panic::setup_panic;
use log::{error, info};

use crate::cli::{Cli, initialize_logger, parse_input_file, run_synthesis, visualize_plant};

mod cli;
mod mtlsyn_config;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_panic!();

    let cli = Cli::parse();
    initialize_logger(cli.log_config)?;
    match cli.command {
        cli::Commands::Synthesize {
            input,
            config_file,
            controller_out,
            tree_out,
            incremental_labeling,
            terminate_early,
            single_threaded,
            heuristic,
        } => {
            let problem = parse_input_file(&input)?;
            info!(
                "Parsed the plant '{}' with {} locations",
                problem.name,
                problem.plant.get_locations().len()
            );
            let configuration = mtlsyn_config::load_configuration(config_file)?;
            let result = run_synthesis(
                problem,
                &configuration,
                incremental_labeling,
                terminate_early,
                single_threaded,
                heuristic,
                controller_out,
                tree_out,
            );
            if let Err(e) = &result {
                error!("Synthesis failed: {e}");
            }
            result.map_err(Into::into)
        }
        cli::Commands::Visualize { input, output } => {
            let problem = parse_input_file(&input)?;
            visualize_plant(&problem.plant, &output)?;
            Ok(())
        }
    }
}
