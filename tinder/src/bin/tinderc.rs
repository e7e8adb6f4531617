//! Command-line driver: compile a Tinder source file and print its
//! diagnostics, human-readable or as JSON.

use std::env;
use std::fs;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut json = false;
    let mut path: Option<String> = None;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--json" => json = true,
            "--help" | "-h" => {
                println!("usage: tinderc [--json] <file>");
                return ExitCode::SUCCESS;
            }
            other => {
                if path.replace(other.to_string()).is_some() {
                    eprintln!("usage: tinderc [--json] <file>");
                    return ExitCode::FAILURE;
                }
            }
        }
    }
    let Some(path) = path else {
        eprintln!("usage: tinderc [--json] <file>");
        return ExitCode::FAILURE;
    };

    let source = match fs::read_to_string(&path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("tinderc: cannot read {path}: {err}");
            return ExitCode::FAILURE;
        }
    };

    let result = tinder::compile(&path, &source);

    if json {
        match serde_json::to_string_pretty(&result.diagnostics) {
            Ok(rendered) => println!("{rendered}"),
            Err(err) => {
                eprintln!("tinderc: cannot serialize diagnostics: {err}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        for line in result.render_diagnostics() {
            eprintln!("{line}");
        }
    }

    if result.module.is_some() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
