//! Command-line driver for the bytecode analyzer (§4.J).
//!
//! Usage:
//!   vm-analyzer <descriptor.json> <class> <method> concrete [args...]
//!   vm-analyzer <descriptor.json> <class> <method> sign
//!   vm-analyzer <descriptor.json> <class> <method> concolic

use std::env;
use std::fs;
use std::process::ExitCode;

use vm_analyzer::class_table::ClassTable;
use vm_analyzer::value::Seed;
use vm_analyzer::{analyze_signs, concolic, run_method_with_output, ClassProvider};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    if args.len() < 5 {
        print_usage();
        return ExitCode::FAILURE;
    }

    let descriptor_path = &args[1];
    let class = &args[2];
    let method = &args[3];
    let mode = args[4].as_str();

    let text = match fs::read_to_string(descriptor_path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: reading '{}': {}", descriptor_path, e);
            return ExitCode::FAILURE;
        }
    };

    let table = match ClassTable::from_descriptor_json(&text) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match mode {
        "concrete" => run_concrete(&table, class, method, &args[5..]),
        "sign" => run_sign(&table, class, method),
        "concolic" => run_concolic(&table, class, method),
        other => {
            eprintln!("error: unknown mode '{}'", other);
            print_usage();
            ExitCode::FAILURE
        }
    }
}

fn parse_seeds(raw_args: &[String]) -> Vec<Seed> {
    raw_args
        .iter()
        .map(|a| match a.as_str() {
            "true" => Seed::Bool(true),
            "false" => Seed::Bool(false),
            _ if a.starts_with('[') && a.ends_with(']') => {
                let cells = a[1..a.len() - 1]
                    .split(',')
                    .filter(|s| !s.trim().is_empty())
                    .map(|s| s.trim().parse().unwrap_or(0))
                    .collect();
                Seed::IntArray(cells)
            }
            _ => Seed::Int(a.parse().unwrap_or(0)),
        })
        .collect()
}

fn run_concrete(table: &dyn ClassProvider, class: &str, method: &str, raw_args: &[String]) -> ExitCode {
    let seeds = parse_seeds(raw_args);
    match run_method_with_output(table, class, method, &seeds) {
        Ok((outcome, output)) => {
            if !output.is_empty() {
                print!("{}", output);
            }
            match outcome {
                vm_analyzer::dispatcher::RunOutcome::Returned(v) => println!("=> {}", v),
                vm_analyzer::dispatcher::RunOutcome::Excepted(verdict) => println!("=> {}", verdict),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_sign(table: &dyn ClassProvider, class: &str, method: &str) -> ExitCode {
    match analyze_signs(table, class, method) {
        Ok(verdicts) => {
            for v in verdicts {
                println!("{}", v);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_concolic(table: &dyn ClassProvider, class: &str, method: &str) -> ExitCode {
    match concolic(table, class, method) {
        Ok(report) => {
            println!("{}", report.verdict);
            if let Some(witness) = report.witness {
                println!("witness: {:?}", witness);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    eprintln!(
        "usage:\n  \
         vm-analyzer <descriptor.json> <class> <method> concrete [args...]\n  \
         vm-analyzer <descriptor.json> <class> <method> sign\n  \
         vm-analyzer <descriptor.json> <class> <method> concolic"
    );
}
