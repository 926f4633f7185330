use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use loxwalk::error::EXIT_IO_ERROR;
use loxwalk::{lexer, parser, printer};
use loxwalk::resolver::Severity;
use loxwalk::{Session, SessionOptions};

const PROMPT_HELP: &str = "\
Enter declarations, statements or expressions. A trailing ';' is optional,
and a bare expression without one prints its value.
  exit    leave the prompt
  ?       show this help";

/// Tree-walking interpreter for Lox
#[derive(Parser, Debug)]
#[command(name = "loxwalk")]
#[command(about = "Run Lox scripts or an interactive prompt", long_about = None)]
struct Args {
    /// Print the parsed syntax tree before running
    #[arg(long)]
    print_ast: bool,

    /// Treat locals that are never read as errors instead of warnings
    #[arg(long)]
    strict_unused: bool,

    /// Script to run (if not provided, starts a prompt)
    script: Option<PathBuf>,
}

fn init_tracing() -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt};

    // LOXWALK_LOG takes precedence over RUST_LOG; warnings only by default.
    let filter = EnvFilter::try_from_env("LOXWALK_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .or_else(|_| EnvFilter::try_new("warn"))
        .context("Building log filter")?;

    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
    Ok(())
}

fn report_warnings(session: &mut Session) {
    for warning in session.take_warnings() {
        eprintln!("{}", warning.render_warning());
    }
}

fn run_file(path: &Path, options: SessionOptions, print_ast: bool) -> i32 {
    let source = match fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))
    {
        Ok(source) => source,
        Err(error) => {
            eprintln!("{error:#}");
            return EXIT_IO_ERROR;
        }
    };
    debug!(path = %path.display(), bytes = source.len(), "running script");

    let mut session = Session::new(options);
    let compiled = session.compile(&source);
    report_warnings(&mut session);
    let result = compiled.and_then(|statements| {
        if print_ast {
            println!("{}", printer::print_program(&statements));
        }
        session.execute(&statements)
    });

    match result {
        Ok(_) => 0,
        Err(error) => {
            eprintln!("{error}");
            error.exit_code()
        }
    }
}

fn run_prompt(options: SessionOptions, print_ast: bool) -> Result<()> {
    let mut session = Session::new(options);
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush().context("Flushing prompt")?;

        line.clear();
        // Read without holding the stdin lock so `input()` can read too.
        if stdin.read_line(&mut line).context("Reading prompt input")? == 0 {
            println!();
            return Ok(());
        }

        match line.trim() {
            "" => continue,
            "exit" => return Ok(()),
            "?" => {
                println!("{PROMPT_HELP}");
                continue;
            }
            _ => {}
        }

        if print_ast {
            let parsed = parser::parse(lexer::scan(&line).tokens, 0);
            println!("{}", printer::print_program(&parsed.statements));
        }

        let result = session.run_line(&line);
        report_warnings(&mut session);
        match result {
            Ok(Some(value)) => println!("{value}"),
            Ok(None) => {}
            Err(error) => eprintln!("{error}"),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing()?;

    let options = SessionOptions {
        unused_variables: if args.strict_unused {
            Severity::Error
        } else {
            Severity::Warning
        },
    };

    match args.script {
        Some(path) => process::exit(run_file(&path, options, args.print_ast)),
        None => run_prompt(options, args.print_ast),
    }
}
