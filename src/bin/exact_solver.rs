use std::{path::PathBuf, time::Instant};

use etsp::{
    algorithm::{ExecutionMode, default_parallelism},
    exact::{self, *},
    geometry::Point,
    heuristic::{LocalSearchConfiguration, ParallelLocalSearch},
    io::{PointReader, SolutionWriter, TimingReport},
    log::build_logger_for_verbosity,
    utils::Solution,
};
use log::{LevelFilter, info};
use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(about = "Computes an optimal tour through a set of points in the plane")]
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

    /// Which of several optimal tours to keep: first or last
    #[structopt(long, default_value = "first")]
    tie_policy: TiePolicy,

    /// Disable pruning and enumerate every tour
    #[structopt(long)]
    exhaustive: bool,

    /// Seed the bound with the result of the local search
    #[structopt(long)]
    warm_start: bool,

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
    let threads = opts.threads.unwrap_or_else(default_parallelism);
    let processes = opts.processes.unwrap_or_else(default_parallelism);

    let pruning = if opts.exhaustive {
        Pruning::Exhaustive
    } else {
        Pruning::Bounded
    };
    let config = SearchConfiguration::default()
        .with_tie_policy(opts.tie_policy)
        .with_pruning(pruning);

    info!(
        "Solve n={} exactly in {:?} mode ({config:?})",
        points.len(),
        opts.mode
    );

    let start = Instant::now();

    let warm_start = if opts.warm_start {
        ParallelLocalSearch::new(threads, LocalSearchConfiguration::default())?.warm_start(&points)
    } else {
        None
    };

    let solution = match opts.mode {
        ExecutionMode::Sequential => exact::solve_sequential(
            &points,
            &config,
            warm_start.map(|tour| BestBound::from_tour(tour, &points)),
        ),
        ExecutionMode::SharedMemory => {
            let mut dispatcher = SharedMemoryDispatcher::new(threads)?.with_configuration(config);
            if let Some(tour) = warm_start {
                dispatcher = dispatcher.with_warm_start(BestBound::from_tour(tour, &points));
            }
            dispatcher.solve(&points)?
        }
        ExecutionMode::Distributed => {
            let mut dispatcher = DistributedDispatcher::new().with_configuration(config);
            if let Some(tour) = warm_start {
                dispatcher = dispatcher.with_warm_start(tour);
            }
            solve_distributed(&points, processes, &dispatcher)?
        }
    };

    let elapsed = start.elapsed();
    eprintln!("{:.6}", elapsed.as_secs_f64());
    info!("Search took {elapsed:?}");

    write_solution(&solution, &opts.output)?;

    if let Some(path) = &opts.report {
        TimingReport::from_elapsed(elapsed).try_write_file(path)?;
    }

    Ok(())
}
