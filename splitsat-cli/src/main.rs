use std::fs;
use std::io;
use std::io::Write;
use std::time::Duration;

use anyhow::Error;
use clap::App;
use env_logger::{fmt, Builder, Target};
use log::{error, info};
use log::{Level, LevelFilter, Record};

use splitsat::{PartitionSolver, SolvingResult, Strategy};
use splitsat_dimacs::{parse_dimacs, write_solution};

mod dpll;

use dpll::DpllSolver;

fn main() {
    let exit_code = match main_with_err() {
        Err(err) => {
            error!("{}", err);
            1
        }
        Ok(exit_code) => exit_code,
    };
    std::process::exit(exit_code);
}

fn main_with_err() -> Result<i32, Error> {
    let matches = App::new("splitsat")
        .version(env!("CARGO_PKG_VERSION"))
        .arg_from_usage("[INPUT] 'The input file to use (stdin if omitted)'")
        .arg_from_usage(
            "-s, --strategy=[STRATEGY] 'Partitioning strategy: disconnected, fast, greedy or \
             one-point (default greedy)'",
        )
        .arg_from_usage("-p, --partitions=[COUNT] 'Seed partitions for the greedy strategy'")
        .arg_from_usage("-t, --time-limit=[MS] 'Wall clock budget in milliseconds'")
        .get_matches();

    let format = |buf: &mut fmt::Formatter, record: &Record| {
        if record.level() == Level::Info {
            writeln!(buf, "c {}", record.args())
        } else {
            writeln!(buf, "c {}: {}", record.level(), record.args())
        }
    };

    let mut builder = Builder::new();
    builder
        .target(Target::Stdout)
        .format(format)
        .filter(None, LevelFilter::Info);

    if let Ok(ref env_var) = std::env::var("SPLITSAT_LOG") {
        builder.parse_filters(env_var);
    }

    builder.init();

    info!("This is splitsat {}", env!("CARGO_PKG_VERSION"));

    let mut strategy = match matches.value_of("strategy") {
        None => Strategy::default(),
        Some(name) => name.parse()?,
    };
    if let Some(count) = matches.value_of("partitions") {
        let partitions = count.parse::<usize>()?;
        match strategy {
            Strategy::Greedy { .. } => strategy = Strategy::Greedy { partitions },
            _ => info!("--partitions only applies to the greedy strategy, ignored"),
        }
    }

    let timeout = matches
        .value_of("time-limit")
        .map(|millis| millis.parse::<u64>())
        .transpose()?
        .map(Duration::from_millis);

    let stdin = io::stdin();

    let mut locked_stdin;
    let mut opened_file;

    let file = match matches.value_of("INPUT") {
        Some(path) => {
            info!("Reading file '{}'", path);
            opened_file = fs::File::open(path)?;
            &mut opened_file as &mut dyn io::Read
        }
        None => {
            info!("Reading from stdin");
            locked_stdin = stdin.lock();
            &mut locked_stdin as &mut dyn io::Read
        }
    };

    let formula = parse_dimacs(file)?;

    info!(
        "Parsed formula with {} variables and {} clauses",
        formula.var_count(),
        formula.len()
    );
    if !formula.is_empty() {
        let lengths = formula.clause_length_stats();
        info!(
            "Density {:.3}, clause lengths {}..{} (avg {:.2})",
            formula.density(),
            lengths.min,
            lengths.max,
            lengths.avg
        );
    }
    info!("Partitioning with the {} strategy", strategy);

    let mut solver = PartitionSolver::new(strategy);
    solver.set_partition_solver(Box::new(DpllSolver::default()));

    let solution = solver.solve(&formula, timeout)?;

    let stdout = io::stdout();
    write_solution(&mut stdout.lock(), &solution)?;

    Ok(match solution.result {
        SolvingResult::Satisfiable => 10,
        SolvingResult::Unsatisfiable => 20,
        SolvingResult::Undefined => 0,
    })
}
