use bitgraph::prelude::*;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "bitgraph")]
#[command(author, version, about = "Transitive closures of binary adjacency matrices")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a closure and report its cost
    Closure {
        #[command(flatten)]
        input: InputArgs,

        /// Closure strategy
        #[arg(long, value_enum, default_value_t = Strategy::Reflexive)]
        variant: Strategy,

        /// Exponent rounding for the optimized strategy (none, soft, hard)
        #[arg(long, default_value = "none")]
        mode: OptimizeMode,

        /// Leave the diagonal alone (paths of at least one edge)
        #[arg(long)]
        non_reflexive: bool,

        /// Iterate to the rank limit even after the closure stabilizes
        #[arg(long)]
        full: bool,

        /// Compare every strategy against breadth-first search
        #[arg(long)]
        check: bool,

        /// Print the closure rows
        #[arg(long)]
        print: bool,
    },

    /// Report node classes and connectivity of a closure
    Analyze {
        #[command(flatten)]
        input: InputArgs,

        /// Leave the diagonal alone (paths of at least one edge)
        #[arg(long)]
        non_reflexive: bool,

        /// List cycles reachable from this node
        #[arg(long)]
        cycles_from: Option<usize>,
    },

    /// Show the factor plan for an exponent
    Factor {
        /// Exponent to factor
        exponent: u64,

        /// Exponent rounding (none, soft, hard)
        #[arg(long, default_value = "none")]
        mode: OptimizeMode,
    },

    /// Validate the bundled matrices (fast, deterministic)
    #[command(alias = "test")]
    Validate,
}

#[derive(Args)]
struct InputArgs {
    /// Read a 0/1 matrix from a file instead of generating one
    #[arg(long)]
    input: Option<PathBuf>,

    /// Node count of the random matrix
    #[arg(long, default_value_t = 64)]
    dim: usize,

    /// Per-mille edge probability of the random matrix
    #[arg(long, default_value_t = 50)]
    level: u32,

    /// Seed of the random matrix
    #[arg(long, default_value_t = 0xC0FFEE)]
    seed: u64,
}

#[derive(Clone, Copy, ValueEnum)]
enum Strategy {
    Reflexive,
    Matrices,
    Slides,
    Optimized,
}

impl InputArgs {
    fn load(&self) -> Result<BitMatrix, String> {
        match &self.input {
            Some(path) => bitgraph::graph::load_from_file(path)
                .map_err(|e| format!("{}: {e}", path.display())),
            None => BitMatrix::build(MatrixSource::Random(RandomSpec {
                seed: self.seed,
                ..RandomSpec::square(self.dim, self.level)
            }))
            .map_err(|e| e.to_string()),
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Closure {
            input,
            variant,
            mode,
            non_reflexive,
            full,
            check,
            print,
        } => {
            let options = ClosureOptions {
                add_unit: !non_reflexive,
                full,
            };
            let variant = match variant {
                Strategy::Reflexive => ClosureVariant::Reflexive,
                Strategy::Matrices => ClosureVariant::Matrices,
                Strategy::Slides => ClosureVariant::Slides,
                Strategy::Optimized => ClosureVariant::Optimized(mode),
            };
            run_closure(&input, variant, options, check, print)
        }
        Commands::Analyze {
            input,
            non_reflexive,
            cycles_from,
        } => run_analyze(&input, !non_reflexive, cycles_from),
        Commands::Factor { exponent, mode } => run_factor(exponent, mode),
        Commands::Validate => bitgraph::validate::validate_known_matrices()
            .map(|()| println!("Validation OK: bundled matrices agree across every strategy.")),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_closure(
    input: &InputArgs,
    variant: ClosureVariant,
    options: ClosureOptions,
    check: bool,
    print: bool,
) -> Result<(), String> {
    let m = input.load()?;
    info!(dim = m.dim_m(), edges = m.edge_count(), "matrix ready");

    let start = Instant::now();
    let result = compute_closure(&m, variant, options).map_err(|e| e.to_string())?;
    let elapsed = start.elapsed();

    println!(
        "{variant:?}: dim={} edges={} closure_edges={} deep={} operations={} time={:.3}ms",
        m.dim_m(),
        m.edge_count(),
        result.closure.edge_count(),
        result.deep.map_or_else(|| "-".to_owned(), |d| d.to_string()),
        result.operations.map_or_else(|| "-".to_owned(), |o| o.to_string()),
        elapsed.as_secs_f64() * 1e3
    );
    if print {
        print!("{}", result.closure);
    }
    if check {
        let start = Instant::now();
        cross_check_closures(&m)?;
        println!(
            "cross-check OK ({:.3}ms)",
            start.elapsed().as_secs_f64() * 1e3
        );
    }
    Ok(())
}

fn run_analyze(input: &InputArgs, add_unit: bool, cycles_from: Option<usize>) -> Result<(), String> {
    let m = input.load()?;
    let options = ClosureOptions {
        add_unit,
        full: false,
    };
    let result = closure_reflexive(&m, options).map_err(|e| e.to_string())?;
    let analysis = ClosureAnalysis::new(&result).map_err(|e| e.to_string())?;
    let report = analysis.report();
    let c = analysis.connectivity();

    print!("{analysis}");
    println!("connected_fully:     {}", report.connected_fully);
    println!("symmetric:           {}", report.symmetric);
    println!("minimally_symmetric: {}", report.minimally_symmetric);
    println!("reflexive:           {}", report.reflexive);
    println!("start:               {:?}", report.nodes_start);
    println!("end:                 {:?}", report.nodes_end);
    println!("lonely:              {:?}", report.nodes_lonely);
    println!("reaching_all_wow:    {:?}", report.nodes_reaching_all_wow);
    println!("reached_fully_wow:   {:?}", report.nodes_reached_fully_wow);
    println!("not_connected:       {:?}", c.not_connected);
    for (i, group) in c.groups.iter().enumerate() {
        println!("group {i}:             {group:?}");
    }

    if let Some(start) = cycles_from {
        let found = analysis
            .paths_cycle(start, DepthLimit::Full)
            .map_err(|e| e.to_string())?;
        println!("cycles from {start}: {:?}", found.cycles);
        println!("reached from {start}: {:?}", found.nodes_reached);
    }
    Ok(())
}

fn run_factor(exponent: u64, mode: OptimizeMode) -> Result<(), String> {
    let plan = FactorPlan::decompose(exponent, mode).map_err(|e| e.to_string())?;
    println!("{plan}");
    println!("exponents of two: {:?}", plan.exponents_of_two());
    println!("elementaries:     {:?}", plan.elementaries());
    println!("operations:       {}", plan.operations());
    Ok(())
}
