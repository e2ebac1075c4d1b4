//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - initializes logging
//! - parses CLI arguments
//! - builds background tables
//! - prints summaries/evaluations
//! - writes optional exports

use clap::Parser;

use crate::cli::{BuildArgs, Command, EvalArgs, ShowArgs};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `bg` binary.
pub fn run() -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Build(args) => handle_build(args),
        Command::Eval(args) => handle_eval(args),
        Command::Show(args) => handle_show(args),
    }
}

fn handle_build(args: BuildArgs) -> Result<(), AppError> {
    let table = pipeline::run_build(&args.model)?;

    println!("{}", crate::report::format_build_summary(&table, args.rows)?);

    // Optional exports.
    if let Some(path) = &args.export {
        crate::io::write_samples_csv(path, table.samples())?;
        log::info!("wrote grid samples to {}", path.display());
    }
    if let Some(path) = &args.export_json {
        crate::io::write_table_json(path, &table)?;
        log::info!("wrote table snapshot to {}", path.display());
    }

    Ok(())
}

fn handle_eval(args: EvalArgs) -> Result<(), AppError> {
    let table = pipeline::run_build(&args.model)?;

    let (label, input) = if args.chi {
        ("z".to_string(), "chi")
    } else if args.derivative {
        (format!("d{}/dz", args.function.label()), "z")
    } else {
        (args.function.label().to_string(), "z")
    };

    let rows = args
        .points
        .iter()
        .map(|&x| -> Result<(f64, f64), AppError> {
            let value = if args.chi {
                table.z_of_chi(x)
            } else if args.derivative {
                table.derivative(args.function, x)
            } else {
                table.evaluate(args.function, x)
            }?;
            Ok((x, value))
        })
        .collect::<Result<Vec<_>, _>>()?;

    println!("{}", crate::report::format_evaluations(&label, input, &rows));
    Ok(())
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let table = crate::io::load_table(&args.table)?;
    log::debug!("loaded {} bins from {}", table.len(), args.table.display());
    println!("{}", crate::report::format_build_summary(&table, args.rows)?);
    Ok(())
}
