use clap::{Parser, Subcommand, ValueEnum};
use miette::{Diagnostic, MietteHandlerOpts, NamedSource, Report, Result};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use valinfer_core::ValPatch;
use valinfer_host::{
    AstLevel, Compilation, CompileError, Compiler, HostProfile, MirrorError, ParseMode,
};

mod render;

#[derive(Parser)]
#[command(
    name = "valinfer",
    version,
    about = "Local type inference for `val` declarations",
    long_about = "Compiles sources through a host compiler patched with `val` inference and shows \
                  how placeholder declarations were rewritten."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Host variant to install the patch into
    #[arg(long, value_enum, default_value_t = HostArg::Ide, global = true)]
    host: HostArg,

    /// How the host parses: `completion` drops initializers after parsing them
    #[arg(long, value_enum, default_value_t = ModeArg::Full, global = true)]
    mode: ModeArg,

    /// Language level of the tooling AST
    #[arg(long, value_enum, default_value_t = LevelArg::Jls8, global = true)]
    ast_level: LevelArg,

    /// Log patch decisions (same as VALINFER_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show every local declaration after inference, followed by host problems
    Infer {
        /// Source files (use '-' to read from stdin)
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },
    /// Show the tooling AST modifiers and which primary node each tooling node came from
    Mirror {
        /// Source files (use '-' to read from stdin)
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum HostArg {
    Ide,
    Batch,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Full,
    Completion,
}

#[derive(Clone, Copy, ValueEnum)]
enum LevelArg {
    Jls2,
    Jls3,
    Jls8,
}

#[derive(Error, Diagnostic, Debug)]
enum CliError {
    #[error("File not found: {path}")]
    #[diagnostic(code(valinfer::cli::not_found))]
    NotFound { path: String },

    #[error("Could not read {path}")]
    #[diagnostic(code(valinfer::cli::read))]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Mirror(#[from] MirrorError),
}

impl Cli {
    fn profile(&self) -> HostProfile {
        let profile = match self.host {
            HostArg::Ide => HostProfile::ide(),
            HostArg::Batch => HostProfile::batch(),
        };
        profile
            .with_parse_mode(match self.mode {
                ModeArg::Full => ParseMode::Full,
                ModeArg::Completion => ParseMode::Completion,
            })
            .with_ast_level(match self.ast_level {
                LevelArg::Jls2 => AstLevel::Jls2,
                LevelArg::Jls3 => AstLevel::Jls3,
                LevelArg::Jls8 => AstLevel::Jls8,
            })
    }
}

fn main() {
    setup_miette_handler();

    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let success = match &cli.command {
        Some(Commands::Infer { files }) => run_files(&cli, files, infer_file),
        Some(Commands::Mirror { files }) => run_files(&cli, files, mirror_file),
        None => {
            // No subcommand provided, show help
            Cli::parse_from(["valinfer", "--help"]);
            true
        }
    };

    if !success {
        process::exit(1);
    }
}

fn setup_miette_handler() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .tab_width(4)
                .with_cause_chain()
                .build(),
        )
    }))
    .ok();
}

/// Log filter from VALINFER_LOG, `warn` by default and `debug` with `-v`
fn setup_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("VALINFER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

type FileHandler = fn(&Cli, &str, &str) -> Result<bool>;

/// Run `handler` on every file, reporting failures as they happen
fn run_files(cli: &Cli, files: &[PathBuf], handler: FileHandler) -> bool {
    let mut success = true;
    let multiple_files = files.len() > 1;

    for file_path in files {
        let outcome = read_source(file_path)
            .map_err(Report::new)
            .and_then(|(source, name)| {
                if multiple_files {
                    println!(";; {name}");
                }
                handler(cli, &source, &name)
            });

        match outcome {
            Ok(clean) => success &= clean,
            Err(report) => {
                eprintln!("{report:?}");
                success = false;
            }
        }
    }

    success
}

fn read_source(file_path: &Path) -> std::result::Result<(String, String), CliError> {
    if file_path.to_str() == Some("-") {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|source| CliError::Read {
                path: "<stdin>".to_string(),
                source,
            })?;
        return Ok((buffer, "<stdin>".to_string()));
    }

    let path = file_path.display().to_string();
    if !file_path.exists() {
        return Err(CliError::NotFound { path });
    }
    let source = fs::read_to_string(file_path).map_err(|source| CliError::Read {
        path: path.clone(),
        source,
    })?;
    Ok((source, path))
}

/// Print rewritten locals, then host problems. Returns whether there were no problems.
fn infer_file(cli: &Cli, source: &str, name: &str) -> Result<bool> {
    let mut profile = cli.profile();
    let patch = ValPatch::install(&mut profile);
    let compiler = Compiler::new(profile, &patch);
    let compilation = compiler
        .compile(source, Some(name.to_string()))
        .map_err(CliError::from)?;

    println!("{}", render::format_locals(&compilation));
    report_problems(&compilation, name);
    Ok(compilation.problems().is_empty())
}

/// Print the tooling tree's declarations and node correspondence
fn mirror_file(cli: &Cli, source: &str, name: &str) -> Result<bool> {
    let mut profile = cli.profile();
    let patch = ValPatch::install(&mut profile);
    let compiler = Compiler::new(profile, &patch);
    let compilation = compiler
        .compile(source, Some(name.to_string()))
        .map_err(CliError::from)?;
    let conversion = compiler
        .convert(&compilation)
        .map_err(CliError::from)?;

    println!("{}", render::format_mirror(&conversion));
    report_problems(&compilation, name);
    Ok(compilation.problems().is_empty())
}

fn report_problems(compilation: &Compilation, name: &str) {
    for problem in compilation.problems() {
        let report = Report::new(problem.clone())
            .with_source_code(NamedSource::new(name, compilation.source.clone()));
        eprintln!("{report:?}");
    }
}
