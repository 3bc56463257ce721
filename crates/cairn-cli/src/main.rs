// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

mod args;
mod naive;

use args::{Args, MlMode, ProblemArg};
use cairn_core::num::tolerance::is_integral;
use cairn_lp::model::{LpModel, RowSense};
use cairn_model::column::Column;
use cairn_model::edge::{Edge, EdgePair};
use cairn_model::instance::{Instance, VrpKind};
use cairn_model::loading::InstanceLoader;
use cairn_search::branch::operator::BranchingOperator;
use cairn_search::bucket::BucketGraph;
use cairn_search::callbacks::{BranchDecision, CallbackError, SearchCallbacks};
use cairn_search::checkpoint::NodeSnapshot;
use cairn_search::controller::{BbtConfig, BbtController, BranchStyle};
use cairn_search::monitor::composite::CompositeMonitor;
use cairn_search::monitor::log::LogMonitor;
use cairn_search::node::{BbNode, NodeIndexer};
use cairn_search::result::{BbtOutcome, SearchResult};
use cairn_search::selector::scorer::{CandidateScorer, TestingCallbacks};
use clap::Parser;
use naive::NaivePricer;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Route enumeration in the demo pricer is exponential; larger instances
/// need a real labeling engine.
const MAX_DEMO_DIM: usize = 14;

/// Resource bins per vertex of the arc graph.
const BINS_PER_VERTEX: usize = 2;

fn enable_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
}

/// Everything `solve_instance` needs besides the instance itself.
struct RunOptions {
    time_limit: Duration,
    three_way: bool,
    phase0: usize,
    phase1: usize,
    phase2: usize,
    node_out: Option<PathBuf>,
    resume_from: Option<NodeSnapshot>,
    quiet: bool,
}

impl RunOptions {
    fn from_args(args: &Args, resume_from: Option<NodeSnapshot>) -> Self {
        Self {
            time_limit: Duration::from_secs(args.time_limit),
            three_way: args.three_way,
            phase0: args.phase0,
            phase1: args.phase1,
            phase2: args.phase2,
            node_out: args.node_out.clone(),
            resume_from,
            quiet: false,
        }
    }
}

/// The empty master: the dummy column covering one partitioning row per
/// customer. Pricing fills in the real columns.
fn build_root(indexer: &NodeIndexer, instance: &Instance, symmetry: bool) -> BbNode {
    let mut lp = LpModel::new();
    lp.add_col(Column::DUMMY_COST, &[]);
    for _ in instance.customers() {
        lp.add_row(&[0], &[1.0], RowSense::Eq, 1.0);
    }
    BbNode::root(
        indexer,
        lp,
        vec![Column::dummy()],
        BucketGraph::complete(instance.dim(), BINS_PER_VERTEX, symmetry),
    )
}

/// Wires the demo collaborators to the tree controller and runs the
/// search.
fn solve_instance(instance: &Instance, options: RunOptions) -> BbtOutcome {
    let symmetry = instance.kind() == VrpKind::Cvrp;
    let indexer = NodeIndexer::new();
    let pricer = NaivePricer::new(instance);
    let operator = BranchingOperator::default();

    let root = match &options.resume_from {
        Some(snapshot) => {
            snapshot.restore(&indexer, instance.dim(), BINS_PER_VERTEX, symmetry)
        }
        None => build_root(&indexer, instance, symmetry),
    };

    let callbacks = SearchCallbacks {
        pricing_at_begin: Box::new(move |node: &mut BbNode| pricer.price(node)),
        cutting: Box::new(|_node: &mut BbNode| {
            // cut separation is an external collaborator; the demo runs
            // the plain set-partitioning relaxation
            Ok(())
        }),
        candidate_map: Box::new(|node: &mut BbNode| {
            let map = node
                .sol_edge_map()
                .map_err(|err| CallbackError::Failed(err.to_string()))?;
            Ok(map
                .iter()
                .filter(|&(_, &usage)| !is_integral(usage))
                .map(|(&edge, &usage)| (edge, usage))
                .collect::<HashMap<Edge, f64>>())
        }),
        impose_branching: Box::new({
            let indexer = &indexer;
            move |node, decision| match decision {
                BranchDecision::Single(edge) => Ok(operator.impose(indexer, node, edge)),
                BranchDecision::Pair(first, second) => {
                    Ok(operator.impose_three(indexer, node, EdgePair::new(first, second)))
                }
            }
        }),
        external_selection: None,
        node_out: options.node_out.clone().map(|path| {
            Box::new(move |node: &BbNode| {
                NodeSnapshot::capture(node)
                    .write(&path)
                    .map_err(|err| CallbackError::Failed(err.to_string()))
            }) as Box<dyn FnMut(&BbNode) -> Result<(), CallbackError>>
        }),
    };

    let testing = TestingCallbacks {
        lp: Box::new(move |node: &mut BbNode, edge: &Edge| pricer.strong_branch_test(node, edge)),
        heuristic: Box::new(move |node: &mut BbNode, edge: &Edge| {
            pricer.strong_branch_test(node, edge)
        }),
        exact: Box::new(move |node: &mut BbNode, edge: &Edge| {
            pricer.strong_branch_test(node, edge)
        }),
    };

    let config = BbtConfig {
        time_limit: options.time_limit,
        prune_epsilon: 1e-6,
        branch_style: if options.three_way {
            BranchStyle::ThreeWay
        } else {
            BranchStyle::TwoWay
        },
    };
    let scorer = CandidateScorer::new(options.phase0, options.phase1, options.phase2, 0);
    let mut monitor = CompositeMonitor::new();
    if !options.quiet {
        monitor.push(Box::new(LogMonitor::new(Duration::from_secs(2))));
    }

    let mut controller =
        BbtController::new(config, scorer, testing, callbacks, Vec::new(), monitor);
    controller.solve(root)
}

fn main() {
    let args = Args::parse();
    enable_tracing();

    if let Err(err) = args.validate() {
        eprintln!("{}", err);
        std::process::exit(3);
    }
    if args.ml != MlMode::NoUse {
        warn!(
            mode = %args.ml,
            "machine-learning scorers are external plug-ins; using pseudo-cost selection"
        );
    }

    let loader = match args.problem {
        ProblemArg::Auto => InstanceLoader::new(),
        ProblemArg::Cvrp => InstanceLoader::with_kind(VrpKind::Cvrp),
        ProblemArg::Vrptw => InstanceLoader::with_kind(VrpKind::Vrptw),
    };
    let instance = match loader.from_path(&args.instance) {
        Ok(instance) => instance,
        Err(err) => {
            eprintln!("failed to load instance: {}", err);
            std::process::exit(4);
        }
    };
    if instance.dim() > MAX_DEMO_DIM {
        eprintln!(
            "configuration error: the demo pricer enumerates routes and supports at most {} vertices, instance has {}",
            MAX_DEMO_DIM,
            instance.dim()
        );
        std::process::exit(3);
    }
    info!(instance = %instance, "instance loaded");

    let resume_from = match &args.node_in {
        Some(path) => match NodeSnapshot::read(path) {
            Ok(snapshot) => {
                info!(path = %path.display(), "resuming from node checkpoint");
                Some(snapshot)
            }
            Err(err) => {
                eprintln!("failed to read node checkpoint: {}", err);
                std::process::exit(4);
            }
        },
        None => None,
    };

    let outcome = solve_instance(&instance, RunOptions::from_args(&args, resume_from));

    println!("{}", outcome);
    match outcome.result() {
        SearchResult::Optimal(solution) | SearchResult::Feasible(solution) => {
            println!("{}", solution);
        }
        SearchResult::Infeasible => println!("instance is infeasible"),
        SearchResult::Unknown => println!("no solution found within the limits"),
    }

    std::process::exit(outcome.exit_code());
}
