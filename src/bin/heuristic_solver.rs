use std::{path::PathBuf, time::Instant};

use etsp::{
    algorithm::{ExecutionMode, default_parallelism},
    geometry::Point,
    heuristic::{self, *},
    io::{PointReader, SolutionWriter, TimingReport},
    log::build_logger_for_verbosity,
    utils::Solution,
};
use log::{LevelFilter, info};
use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(about = "Computes a tour without crossing edges by randomized local search")]
struct Opts {
    /// sequential, shared or distributed
    #[structopt(short, long, default_value = "shared")]
    mode: ExecutionMode,

    /// Worker threads in shared mode [default: available parallelism]
    #[structopt(short, long)]
    threads: Option<usize>,

    /// Ranks in distributed mode [default: available parallelism]
    #[structopt(short, long)]
    processes: Option<usize>,

    /// Number of random restarts
    #[structopt(short, long)]
    restarts: Option<usize>,

    /// Maximal number of passes over all edge pairs per restart
    #[structopt(long)]
    max_passes: Option<usize>,

    #[structopt(short, long)]
    seed: Option<u64>,

    /// Reverse the path between crossing edges instead of only exchanging its end points
    #[structopt(long)]
    reverse_segment: bool,

    #[structopt(short, long)]
    input: Option<PathBuf>,

    #[structopt(short, long)]
    output: Option<PathBuf>,

    /// Store the elapsed time as JSON
    #[structopt(long)]
    report: Option<PathBuf>,

    #[structopt(short, long, parse(from_occurrences))]
    verbose: usize,
}

impl Opts {
    fn configuration(&self) -> LocalSearchConfiguration {
        let mut config = LocalSearchConfiguration::default();
        if let Some(restarts) = self.restarts {
            config = config.with_restarts(restarts);
        }
        if let Some(max_passes) = self.max_passes {
            config = config.with_max_passes(max_passes);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if self.reverse_segment {
            config = config.with_strategy(UncrossStrategy::ReverseSegment);
        }
        config
    }
}

fn load_points(path: &Option<PathBuf>) -> anyhow::Result<Vec<Point>> {
    if let Some(path) = path {
        Ok(Vec::<Point>::try_read_points_file(path)?)
    } else {
        let stdin = std::io::stdin().lock();
        Ok(Vec::<Point>::try_read_points(stdin)?)
    }
}

fn write_solution(solution: &Solution, path: &Option<PathBuf>) -> anyhow::Result<()> {
    if let Some(path) = path {
        solution.try_write_solution_file(path)?;
    } else {
        solution.try_write_solution(std::io::stdout().lock())?;
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::from_args();
    build_logger_for_verbosity(LevelFilter::Warn, opts.verbose);

    let points = load_points(&opts.input)?;
    let config = opts.configuration();

    info!(
        "Run local search on n={} in {:?} mode ({config:?})",
        points.len(),
        opts.mode
    );

    let start = Instant::now();

    let solution = match opts.mode {
        ExecutionMode::Sequential => heuristic::solve_sequential(&points, &config)?,
        ExecutionMode::SharedMemory => {
            let threads = opts.threads.unwrap_or_else(default_parallelism);
            ParallelLocalSearch::new(threads, config)?.solve(&points)?
        }
        ExecutionMode::Distributed => {
            let processes = opts.processes.unwrap_or_else(default_parallelism);
            heuristic::distributed::solve_distributed(
                &points,
                processes,
                &DistributedLocalSearch::new(config)?,
            )?
        }
    };

    let elapsed = start.elapsed();
    eprintln!("{:.6}", elapsed.as_secs_f64());
    info!("Local search took {elapsed:?}");

    write_solution(&solution, &opts.output)?;

    if let Some(path) = &opts.report {
        TimingReport::from_elapsed(elapsed).try_write_file(path)?;
    }

    Ok(())
}
