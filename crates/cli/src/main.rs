use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use courier_core::{
    check_files, tokenize, FileReport, FileSystemProvider, FrontendError, ParserOptions,
    SourceProvider, TokenStream, SOURCE_EXTENSION,
};
use tracing_subscriber::EnvFilter;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Courier compiler front end.
#[derive(Parser)]
#[command(name = "courierc", version, about = "Courier compiler front end")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log front-end activity to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Include the parser state stack in parse errors
    #[arg(long, global = true)]
    trace_states: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the token stream of a source file
    Lex {
        /// Path to the .cour source file
        file: PathBuf,
    },

    /// Print the syntax tree of a source file
    Parse {
        /// Path to the .cour source file
        file: PathBuf,
    },

    /// Lex and parse files, reporting the first error in each
    Check {
        /// Source files, or directories to search for .cour files
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    let options = ParserOptions {
        capture_state_stack: cli.trace_states || ParserOptions::default().capture_state_stack,
    };

    match cli.command {
        Commands::Lex { file } => cmd_lex(&file, cli.output, cli.quiet),
        Commands::Parse { file } => cmd_parse(&file, options, cli.output, cli.quiet),
        Commands::Check { paths } => cmd_check(&paths, options, cli.output, cli.quiet),
    }
}

fn cmd_lex(file: &Path, output: OutputFormat, quiet: bool) {
    let stream = match read_and_tokenize(file) {
        Ok(stream) => stream,
        Err(e) => {
            report_error(&e, output, quiet);
            process::exit(1);
        }
    };
    match output {
        OutputFormat::Text => {
            for token in stream.tokens() {
                println!(
                    "{}:{}\t{}\t{}",
                    token.location.line,
                    token.location.column,
                    token.kind,
                    stream.text(token)
                );
            }
        }
        OutputFormat::Json => {
            let tokens: Vec<serde_json::Value> = stream
                .tokens()
                .iter()
                .map(|token| {
                    serde_json::json!({
                        "kind":   token.kind,
                        "text":   stream.text(token),
                        "line":   token.location.line,
                        "column": token.location.column,
                        "offset": token.location.offset,
                    })
                })
                .collect();
            print_json(&serde_json::json!({
                "file":   stream.filename(),
                "tokens": tokens,
            }));
        }
    }
}

fn read_and_tokenize(file: &Path) -> Result<TokenStream, FrontendError> {
    let provider = FileSystemProvider;
    let text = provider
        .read_source(file)
        .map_err(|source| FrontendError::Io {
            path: file.to_path_buf(),
            source,
        })?;
    Ok(tokenize(&provider.file_name(file), text)?)
}

fn cmd_parse(file: &Path, options: ParserOptions, output: OutputFormat, quiet: bool) {
    let mut reports = check_files(&[file.to_path_buf()], &FileSystemProvider, options);
    let report = reports.remove(0);
    match report.result {
        Ok(ast) => match output {
            OutputFormat::Text => print!("{}", ast.dump()),
            OutputFormat::Json => print_json(&ast.to_json()),
        },
        Err(e) => {
            report_error(&e, output, quiet);
            process::exit(1);
        }
    }
}

fn cmd_check(paths: &[PathBuf], options: ParserOptions, output: OutputFormat, quiet: bool) {
    let files = match collect_sources(paths) {
        Ok(files) => files,
        Err(e) => {
            report_error(&e, output, quiet);
            process::exit(1);
        }
    };

    let reports = check_files(&files, &FileSystemProvider, options);
    for report in &reports {
        if let Err(e) = &report.result {
            report_error(e, output, quiet);
        }
    }
    let failed = reports.iter().filter(|r| !r.is_ok()).count();

    match output {
        OutputFormat::Text => {
            if !quiet {
                for report in reports.iter().filter(|r| r.is_ok()) {
                    println!("ok: {}", report.path.display());
                }
                println!(
                    "{} file(s) checked, {} failed",
                    reports.len(),
                    failed
                );
            }
        }
        OutputFormat::Json => {
            let files: Vec<serde_json::Value> = reports.iter().map(report_json).collect();
            print_json(&serde_json::json!({
                "checked": reports.len(),
                "failed":  failed,
                "files":   files,
            }));
        }
    }

    if failed > 0 {
        process::exit(1);
    }
}

fn report_json(report: &FileReport) -> serde_json::Value {
    match &report.result {
        Ok(ast) => serde_json::json!({
            "file":  report.path.display().to_string(),
            "ok":    true,
            "nodes": ast.len(),
        }),
        Err(e) => serde_json::json!({
            "file":  report.path.display().to_string(),
            "ok":    false,
            "error": e.to_json_value(),
        }),
    }
}

/// Expand directories into the `.cour` files below them, sorted. Files named
/// explicitly are kept whatever their extension.
fn collect_sources(paths: &[PathBuf]) -> Result<Vec<PathBuf>, FrontendError> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found = Vec::new();
            walk_dir(path, &mut found)?;
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

fn walk_dir(dir: &Path, found: &mut Vec<PathBuf>) -> Result<(), FrontendError> {
    let io_error = |source| FrontendError::Io {
        path: dir.to_path_buf(),
        source,
    };
    for entry in std::fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if path.is_dir() {
            walk_dir(&path, found)?;
        } else if path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION) {
            found.push(path);
        }
    }
    Ok(())
}

fn report_error(e: &FrontendError, output: OutputFormat, quiet: bool) {
    match output {
        OutputFormat::Json => {
            let err_json = serde_json::to_string_pretty(&e.to_json_value())
                .unwrap_or_else(|_| format!("{{\"error\": \"{}\"}}", e));
            eprintln!("{}", err_json);
        }
        OutputFormat::Text => {
            if !quiet {
                eprintln!("{}", e.render());
            }
        }
    }
}

fn print_json(value: &serde_json::Value) {
    let pretty =
        serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("serialization error: {}", e));
    println!("{}", pretty);
}
