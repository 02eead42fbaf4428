//! Command line interface of mtlsyn
//!
//! mtlsyn uses the `clap` crate to parse command line arguments. This module
//! defines the available commands and options as well as the glue code that
//! turns a parsed synthesis problem into a configured [`TreeSearch`] run.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{LevelFilter, info, warn};
use log4rs::{
    Config,
    append::console::ConsoleAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
};

use mtlsyn_automata::dot::ToDot;
use mtlsyn_automata::regions::RegionIndex;
use mtlsyn_automata::ta::TimedAutomaton;
use mtlsyn_logic::{AtomicProposition, BoundType, MTLFormula};
use mtlsyn_parser::{ProblemParser, SynthesisProblem};
use mtlsyn_search::NodeLabel;
use mtlsyn_search::create_controller::create_controller;
use mtlsyn_search::heuristics::{
    BfsHeuristic, CompositeHeuristic, DfsHeuristic, Heuristic, NumCanonicalWordsHeuristic,
    PreferEnvironmentActionHeuristic, TimeHeuristic,
};
use mtlsyn_search::search::TreeSearch;
use mtlsyn_search::visualization::search_tree_to_dot;
use mtlsyn_translation::translate;

use crate::mtlsyn_config::MTLSynConfig;

/// mtlsyn - controller synthesis for timed automata against MTL
/// specifications
///
/// Given a plant modeled as a timed automaton and an undesired behavior
/// expressed as an MTL formula, mtlsyn decides whether a controller can
/// avoid the undesired behavior regardless of the environment's choices,
/// and if so extracts a winning strategy as another timed automaton.
#[derive(Parser, Debug)]
#[command(version, name = "mtlsyn", about, long_about)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) log_config: LoggerConfig,
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Read a synthesis problem and search for a controller
    Synthesize {
        /// Location of the problem file
        input: PathBuf,

        /// Configuration file for the synthesizer
        #[arg(short, long, value_name = "CONFIG_FILE")]
        config_file: Option<PathBuf>,

        /// Write the synthesized controller to this file in DOT format
        #[arg(short = 'o', long, value_name = "CONTROLLER_OUT")]
        controller_out: Option<PathBuf>,

        /// Write the labeled search tree to this file in DOT format
        #[arg(long, value_name = "TREE_OUT")]
        tree_out: Option<PathBuf>,

        /// Label the tree incrementally while the search is running
        #[arg(short, long, default_value_t = false)]
        incremental_labeling: bool,

        /// Cancel subtrees that can no longer influence the verdict
        /// (requires incremental labeling)
        #[arg(short, long, default_value_t = false)]
        terminate_early: bool,

        /// Process the search queue deterministically on a single thread
        #[arg(short, long, default_value_t = false)]
        single_threaded: bool,

        /// The heuristic used to order node expansions
        #[arg(long, value_enum, default_value_t = HeuristicOption::Bfs)]
        heuristic: HeuristicOption,
    },
    /// Read a synthesis problem and visualize the plant
    Visualize {
        /// Location of the problem file
        input: PathBuf,

        /// Output file for the DOT graph
        output: PathBuf,
    },
}

/// Heuristics selectable on the command line
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub(crate) enum HeuristicOption {
    /// Expand nodes in breadth-first order
    Bfs,
    /// Expand nodes in depth-first order
    Dfs,
    /// Prefer nodes that are reachable early in time
    Time,
    /// Prefer nodes reached by an environment action
    PreferEnvironment,
    /// Prefer nodes with few canonical words
    NumWords,
    /// A weighted combination of the time, environment and word-count
    /// heuristics; the weights are read from the configuration
    Composite,
}

#[derive(Debug, Args)]
pub(crate) struct LoggerConfig {
    /// Read the logger configuration from a file in the log4rs format
    #[arg(long)]
    logger_config_file: Option<String>,

    /// Enable debug output.
    /// **Note**: This flag must be passed first, before any command.
    #[arg(short, long, default_value_t = false)]
    debug: bool,
}

/// Initialize the logger as specified in `cfg`
///
/// By default the logger is configured to log to stdout. If a log4rs
/// configuration file is given in `cfg`, the configuration from that file
/// is used instead.
pub(crate) fn initialize_logger(cfg: LoggerConfig) -> Result<(), anyhow::Error> {
    if let Some(f) = cfg.logger_config_file {
        log4rs::init_file(f, Default::default())
            .with_context(|| "Failed to read logger config file")?;
        return Ok(());
    }

    let encoder = match cfg.debug {
        true => PatternEncoder::new("{d(%Y-%m-%d %H:%M:%S)} - {h({l})} - [{f}:{L}] - {m}{n}"),
        false => PatternEncoder::new("{d(%H:%M:%S)} - {h({l})} - {m}{n}"),
    };
    let stdout = ConsoleAppender::builder().encoder(Box::new(encoder)).build();
    let level = if cfg.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let log_config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(level))
        .with_context(|| "Failed to assemble the logger configuration")?;
    log4rs::init_config(log_config).with_context(|| "Failed to initialize the console logger")?;
    Ok(())
}

/// Read and parse the problem file
pub(crate) fn parse_input_file(input: &Path) -> Result<SynthesisProblem, anyhow::Error> {
    let content = fs::read_to_string(input).with_context(|| "Unable to read the problem file")?;
    ProblemParser::new().parse_problem(&content)
}

/// The largest constant appearing in the plant guards or the specification
/// intervals
fn maximal_constant(plant: &TimedAutomaton<String>, specification: &MTLFormula) -> RegionIndex {
    let plant_max = plant
        .get_transitions()
        .flat_map(|t| t.guard().values().flatten())
        .map(|constraint| constraint.constant())
        .max()
        .unwrap_or(0);
    let spec_max = specification_constant(specification);
    plant_max.max(spec_max)
}

fn specification_constant(formula: &MTLFormula) -> RegionIndex {
    match formula {
        MTLFormula::True | MTLFormula::False | MTLFormula::Atomic(_) => 0,
        MTLFormula::Not(inner) => specification_constant(inner),
        MTLFormula::And(lhs, rhs) | MTLFormula::Or(lhs, rhs) => {
            specification_constant(lhs).max(specification_constant(rhs))
        }
        MTLFormula::Until(lhs, rhs, interval) | MTLFormula::DualUntil(lhs, rhs, interval) => {
            interval_constant(interval)
                .max(specification_constant(lhs))
                .max(specification_constant(rhs))
        }
        MTLFormula::Finally(inner, interval) | MTLFormula::Globally(inner, interval) => {
            interval_constant(interval).max(specification_constant(inner))
        }
    }
}

fn interval_constant(interval: &mtlsyn_logic::TimeInterval) -> RegionIndex {
    let lower = match interval.lower_bound() {
        BoundType::Infinite => 0,
        _ => interval.lower(),
    };
    let upper = match interval.upper_bound() {
        BoundType::Infinite => 0,
        _ => interval.upper(),
    };
    lower.max(upper)
}

/// Build the heuristic selected on the command line
fn build_heuristic(
    option: HeuristicOption,
    configuration: &MTLSynConfig,
    environment_actions: &BTreeSet<String>,
) -> Box<dyn Heuristic<String> + Send> {
    match option {
        HeuristicOption::Bfs => Box::new(BfsHeuristic::default()),
        HeuristicOption::Dfs => Box::new(DfsHeuristic::default()),
        HeuristicOption::Time => Box::new(TimeHeuristic),
        HeuristicOption::PreferEnvironment => Box::new(PreferEnvironmentActionHeuristic::new(
            environment_actions.iter().cloned(),
        )),
        HeuristicOption::NumWords => Box::new(NumCanonicalWordsHeuristic),
        HeuristicOption::Composite => {
            let weights = configuration.get_composite_weights();
            info!(
                "Using the composite heuristic with weights time={}, environment={}, words={}",
                weights.time, weights.environment, weights.canonical_words
            );
            Box::new(CompositeHeuristic::new(vec![
                (weights.time, Box::new(TimeHeuristic)),
                (
                    weights.environment,
                    Box::new(PreferEnvironmentActionHeuristic::new(
                        environment_actions.iter().cloned(),
                    )),
                ),
                (weights.canonical_words, Box::new(NumCanonicalWordsHeuristic)),
            ]))
        }
    }
}

/// Run the search and report the verdict
#[allow(clippy::too_many_arguments)]
pub(crate) fn run_synthesis(
    problem: SynthesisProblem,
    configuration: &MTLSynConfig,
    incremental_labeling: bool,
    terminate_early: bool,
    single_threaded: bool,
    heuristic: HeuristicOption,
    controller_out: Option<PathBuf>,
    tree_out: Option<PathBuf>,
) -> Result<(), anyhow::Error> {
    if terminate_early && !incremental_labeling {
        return Err(anyhow!("Early termination requires incremental labeling"));
    }
    let required_k = maximal_constant(&problem.plant, &problem.specification);
    if problem.k < required_k {
        warn!(
            "The constant K = {} is smaller than the largest constant {} of the problem",
            problem.k, required_k
        );
    }

    let alphabet: BTreeSet<_> = problem
        .plant
        .get_alphabet()
        .iter()
        .map(AtomicProposition::new)
        .chain(problem.specification.alphabet())
        .collect();
    let ata = translate(&problem.specification, Some(alphabet))
        .with_context(|| "Failed to translate the specification")?;

    let heuristic = build_heuristic(heuristic, configuration, &problem.environment_actions);
    let search = TreeSearch::new(
        Arc::new(problem.plant),
        Arc::new(ata),
        problem.controller_actions,
        problem.environment_actions,
        problem.k,
        incremental_labeling,
        terminate_early,
        heuristic,
    );
    info!("Building the search tree");
    search.build_tree(!single_threaded);
    if !incremental_labeling {
        search.label();
    }
    info!("Explored {} nodes", search.get_size());

    if let Some(tree_out) = tree_out {
        fs::write(&tree_out, search_tree_to_dot(search.get_root()))
            .with_context(|| "Failed to write the search tree")?;
        info!("Wrote the search tree to {}", tree_out.display());
    }

    match search.get_root().label() {
        NodeLabel::Top => {
            info!("A controller exists for '{}'", problem.name);
            if let Some(controller_out) = controller_out {
                let controller = create_controller(search.get_root(), problem.k)
                    .map_err(|e| anyhow!("Failed to extract the controller: {e}"))?;
                fs::write(&controller_out, controller.to_dot())
                    .with_context(|| "Failed to write the controller")?;
                info!("Wrote the controller to {}", controller_out.display());
            }
        }
        NodeLabel::Bottom => {
            info!(
                "No controller exists for '{}': the environment can always enforce the undesired behavior",
                problem.name
            );
        }
        label => {
            return Err(anyhow!("The search finished with an unlabeled root ({label:?})"));
        }
    }
    Ok(())
}

/// Write the plant as a DOT graph
pub(crate) fn visualize_plant(
    plant: &TimedAutomaton<String>,
    output: &Path,
) -> Result<(), anyhow::Error> {
    fs::write(output, plant.to_dot()).with_context(|| "Failed to write the visualization")?;
    info!("Wrote the plant to {}", output.display());
    Ok(())
}
