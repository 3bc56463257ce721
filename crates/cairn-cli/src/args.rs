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

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Problem class selection.
#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
pub enum ProblemArg {
    /// Detect from the instance file's sections.
    Auto,
    Cvrp,
    Vrptw,
}

/// Machine-learning candidate-selection mode.
#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
pub enum MlMode {
    /// Classic pseudo-cost strong branching.
    #[value(name = "no-use")]
    NoUse,
    /// Collect stage-1 training data while branching classically.
    #[value(name = "get-data-1")]
    GetData1,
    /// Collect stage-2 training data.
    #[value(name = "get-data-2")]
    GetData2,
    /// Score candidates with a trained model.
    #[value(name = "use-model")]
    UseModel,
}

impl std::fmt::Display for MlMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MlMode::NoUse => write!(f, "no-use"),
            MlMode::GetData1 => write!(f, "get-data-1"),
            MlMode::GetData2 => write!(f, "get-data-2"),
            MlMode::UseModel => write!(f, "use-model"),
        }
    }
}

/// Branch-cut-and-price solver for CVRP and VRPTW instances.
#[derive(Debug, Parser)]
#[command(name = "cairn", version, about)]
pub struct Args {
    /// Path to a TSPLIB-like instance file.
    pub instance: PathBuf,

    /// Problem class; `auto` detects time-window sections.
    #[arg(long, value_enum, default_value = "auto")]
    pub problem: ProblemArg,

    /// Soft time limit in seconds.
    #[arg(long, default_value_t = 3600)]
    pub time_limit: u64,

    /// Machine-learning candidate-selection mode.
    #[arg(long, value_enum, default_value = "no-use")]
    pub ml: MlMode,

    /// Branch on edge pairs (3-way) instead of single edges.
    #[arg(long)]
    pub three_way: bool,

    /// Write a checkpoint of each processed node to this path.
    #[arg(long)]
    pub node_out: Option<PathBuf>,

    /// Resume from a node checkpoint instead of the instance root.
    #[arg(long)]
    pub node_in: Option<PathBuf>,

    /// Candidate counts of the testing phases: screening, heuristic,
    /// exact.
    #[arg(long, default_value_t = 15)]
    pub phase0: usize,
    #[arg(long, default_value_t = 3)]
    pub phase1: usize,
    #[arg(long, default_value_t = 1)]
    pub phase2: usize,
}

/// A configuration inconsistency detected before the search starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(pub String);

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "configuration error: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

impl Args {
    /// Rejects inconsistent flag combinations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.three_way && self.ml != MlMode::NoUse {
            return Err(ConfigError(format!(
                "machine-learning mode `{}` cannot drive 3-way branching",
                self.ml
            )));
        }
        if self.phase0 == 0 {
            return Err(ConfigError(String::from(
                "the screening phase needs at least one candidate (--phase0 >= 1)",
            )));
        }
        Ok(())
    }
}
