//! Command line entry point.
//!
//! Runs the reference strategies and/or the generated functions and prints
//! the results. Any error is logged and turns into exit status 1.

use clap::{Args, Parser, Subcommand, ValueEnum};
use fibjit::core::config::{
    opt_level_from_u8, DEFAULT_JIT_N, DEFAULT_NAIVE_LIMIT, DEFAULT_REFERENCE_N,
};
use fibjit::reference::timing::time_strategy;
use fibjit::{jit_fib, Error, FibForm, IntWidth, RunConfig, Strategy};
use std::process;

#[derive(Parser, Debug)]
#[command(name = "fibjit", version, about = "Fibonacci reference strategies and JIT-compiled fib")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Time the four reference strategies
    Reference(ReferenceArgs),
    /// Generate, compile and run fib
    Jit(JitArgs),
    /// Run both with default inputs
    All,
}

#[derive(Args, Debug)]
struct ReferenceArgs {
    /// Fibonacci index
    #[arg(long, default_value_t = DEFAULT_REFERENCE_N)]
    n: u32,

    /// Skip the naive recursive strategy above this index
    #[arg(long, default_value_t = DEFAULT_NAIVE_LIMIT)]
    naive_limit: u32,
}

#[derive(Args, Debug)]
struct JitArgs {
    /// Argument passed to the generated function
    #[arg(long, default_value_t = DEFAULT_JIT_N, allow_negative_numbers = true)]
    n: i64,

    #[arg(long, value_enum, default_value_t = FormArg::Both)]
    form: FormArg,

    /// Integer width of the generated signature
    #[arg(long, value_enum, default_value_t = WidthArg::W32)]
    width: WidthArg,

    /// Backend optimization level (0-3)
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=3))]
    opt_level: u8,

    /// Print the generated module before compiling it
    #[arg(long)]
    dump_ir: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormArg {
    Iterative,
    Recursive,
    Both,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum WidthArg {
    #[value(name = "32")]
    W32,
    #[value(name = "64")]
    W64,
}

impl From<FormArg> for Vec<FibForm> {
    fn from(form: FormArg) -> Self {
        match form {
            FormArg::Iterative => vec![FibForm::Iterative],
            FormArg::Recursive => vec![FibForm::Recursive],
            FormArg::Both => FibForm::ALL.to_vec(),
        }
    }
}

impl From<WidthArg> for IntWidth {
    fn from(width: WidthArg) -> Self {
        match width {
            WidthArg::W32 => IntWidth::I32,
            WidthArg::W64 => IntWidth::I64,
        }
    }
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn run_reference(config: &RunConfig) -> Result<(), Error> {
    for strategy in Strategy::ALL {
        if strategy == Strategy::Recursive && !config.runs_naive() {
            log::warn!(
                "Skipping {} Fibonacci for n={} (above naive limit {})",
                strategy,
                config.reference_n,
                config.naive_limit
            );
            continue;
        }

        let timed = time_strategy(strategy, config.reference_n)?;
        println!("{}", timed);
    }
    Ok(())
}

fn run_jit(config: &RunConfig) -> Result<(), Error> {
    for &form in &config.forms {
        println!("Generating {} fib ({})...", form, config.width);
        let run = jit_fib(form, config.width, config.jit_n, config.opt_level, config.dump_ir)?;
        if let Some(ir) = &run.ir {
            println!("{}", ir);
        }
        println!("{}", run);
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command.unwrap_or(Command::All) {
        Command::Reference(args) => {
            let config = RunConfig {
                reference_n: args.n,
                naive_limit: args.naive_limit,
                ..RunConfig::default()
            };
            run_reference(&config)
        }
        Command::Jit(args) => {
            let config = RunConfig {
                jit_n: args.n,
                forms: args.form.into(),
                width: args.width.into(),
                opt_level: opt_level_from_u8(args.opt_level),
                dump_ir: args.dump_ir,
                ..RunConfig::default()
            };
            run_jit(&config)
        }
        Command::All => {
            let config = RunConfig::default();
            run_reference(&config).and_then(|()| run_jit(&config))
        }
    };

    if let Err(err) = result {
        log::error!("{}", err);
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}
