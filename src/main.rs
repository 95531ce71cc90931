use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use slug::ast_printer::AstPrinter;
use slug::error::SlugError;
use slug::interpreter::Interpreter;
use slug::parser::Parser;
use slug::resolver::Resolver;
use slug::scanner::{self, Scanner};

/// Exit code for lexical and syntax errors.
const EXIT_DATA_ERR: i32 = 65;

/// Exit code for runtime errors.
const EXIT_SOFTWARE: i32 = 70;

#[derive(ClapParser, Debug)]
#[command(version, about = "slug language front end and evaluator", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to slug.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print tokens as JSON, one object per line
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file as a single expression and prints its AST
    Parse { filename: PathBuf },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: PathBuf },
}

/// Reads a whole source file as UTF‑8 text.
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    let text = String::from_utf8(buf)
        .map_err(SlugError::from)
        .context(format!("File {:?} is not valid UTF-8", filename))?;

    Ok(text)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("slug.log").context("Failed to create slug.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("slug::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_default_env() // RUST_LOG still narrows or widens the filter
        .init();

    info!("Logger initialized, writing to slug.log");
    Ok(())
}

fn tokenize(source: &str, json: bool) -> Result<()> {
    let mut tokenized = true;

    for token in Scanner::new(source) {
        match token {
            Ok(token) if json => println!("{}", serde_json::to_string(&token)?),

            Ok(token) => println!("{}", token),

            Err(e) => {
                tokenized = false;
                debug!("Tokenization debug: {}", e);
                eprintln!("{}", e);
            }
        }
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code {}", EXIT_DATA_ERR);
        process::exit(EXIT_DATA_ERR);
    }

    Ok(())
}

fn parse(source: &str) -> Result<()> {
    let tokens = scanner::scan(source).unwrap_or_else(|e| fail(e, EXIT_DATA_ERR));
    let expr = Parser::new(&tokens)
        .parse()
        .unwrap_or_else(|e| fail(e, EXIT_DATA_ERR));

    let ast_str = AstPrinter::print(&expr);

    debug!("AST: {}", ast_str);
    println!("{}", ast_str);

    Ok(())
}

fn evaluate(source: &str) -> Result<()> {
    let tokens = scanner::scan(source).unwrap_or_else(|e| fail(e, EXIT_DATA_ERR));
    let expr = Parser::new(&tokens)
        .parse()
        .unwrap_or_else(|e| fail(e, EXIT_DATA_ERR));

    let mut resolver = Resolver::new();
    resolver.resolve(&expr);

    let mut interpreter = Interpreter::new(resolver.finish());

    let value = interpreter
        .evaluate(&expr)
        .unwrap_or_else(|e| fail(e, EXIT_SOFTWARE));

    debug!("Evaluated to: {}", value);
    println!("{}", value);

    Ok(())
}

fn fail(error: SlugError, code: i32) -> ! {
    debug!(
        "Exiting with code {} (line {:?}): {}",
        code,
        error.line(),
        error
    );
    eprintln!("{}", error);
    process::exit(code);
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => tokenize(&read_file(&filename)?, json)?,
        Commands::Parse { filename } => parse(&read_file(&filename)?)?,
        Commands::Evaluate { filename } => evaluate(&read_file(&filename)?)?,
    }

    info!("Done");

    Ok(())
}
