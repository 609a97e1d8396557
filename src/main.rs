use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context};
use banglac::compiler::{CompileError, Compiler, Options};
use banglac::demos;
use banglac::error::SourceMetadata;
use banglac::ir::Listing;
use banglac::semantic::Scoping;
use itertools::Itertools;
use simplelog::{ColorChoice, TermLogger, TerminalMode};
use structopt::StructOpt;
use tracing_subscriber::fmt;

fn main() {
    if let Err(ref e) = run() {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), anyhow::Error> {
    let opt = Opt::from_args();
    init_logging(opt.verbose)?;

    if opt.list_demos {
        for name in demos::names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let (source, file) = match (&opt.demo, &opt.file) {
        (Some(name), _) => {
            let source = demos::find(name)
                .ok_or_else(|| anyhow!("there is no demo called {:?} (see --list-demos)", name))?;
            (source.to_string(), None)
        }
        (None, Some(path)) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("could not read {}", path.display()))?;
            (source, Some(path.clone()))
        }
        (None, None) => bail!("nothing to compile: pass a file or --demo NAME"),
    };
    let meta = match file {
        Some(file) => SourceMetadata::new(&source).with_file(file),
        None => SourceMetadata::new(&source),
    };

    let compiler = Compiler::new(Options {
        scoping: if opt.lexical_scopes {
            Scoping::Lexical
        } else {
            Scoping::Flat
        },
        optimize: !opt.no_optimize,
    });
    log::debug!("compiling with {:?}", compiler.options());

    let result = match compiler.try_compile_with(&meta) {
        Ok(result) => result,
        Err(CompileError::Semantic { result }) => {
            for error in &result.errors {
                log::error!("{}", error);
            }
            for warning in &result.warnings {
                log::warn!("{}", warning);
            }
            bail!("compilation failed with {} semantic errors", result.errors.len());
        }
        Err(e) => return Err(e.into()),
    };

    for warning in &result.semantic.warnings {
        log::warn!("{}", warning);
    }
    for report in &result.report {
        log::info!("{}", report);
    }
    log::info!("summary:\n{}", result.summary());

    let mut text = match opt.emit {
        Emit::Tokens => result.tokens.iter().join("\n"),
        Emit::Ast => result.ast.to_string(),
        Emit::Symbols => result.semantic.symbol_table.to_string(),
        Emit::Ir => Listing(&result.intermediate).to_string(),
        Emit::Optimized => Listing(&result.optimized).to_string(),
        Emit::Js => result.generated,
    };
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }

    match opt.output {
        Some(path) => {
            fs::write(&path, text).with_context(|| format!("could not write {}", path.display()))?
        }
        None => std::io::stdout().write_all(text.as_bytes())?,
    }

    Ok(())
}

fn init_logging(verbose: bool) -> Result<(), anyhow::Error> {
    if let Some((_, filter)) = std::env::vars().find(|x| x.0 == "BANGLAC_TRACE") {
        let subscriber = fmt::Subscriber::builder()
            .with_ansi(true)
            .pretty()
            .with_env_filter(filter)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
        tracing_log::LogTracer::init()?;
    } else {
        TermLogger::init(
            if verbose {
                log::LevelFilter::Debug
            } else {
                log::LevelFilter::Info
            },
            Default::default(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        )?;
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Emit {
    Tokens,
    Ast,
    Symbols,
    Ir,
    Optimized,
    Js,
}

impl FromStr for Emit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "tokens" => Self::Tokens,
            "ast" => Self::Ast,
            "symbols" => Self::Symbols,
            "ir" => Self::Ir,
            "optimized" => Self::Optimized,
            "js" => Self::Js,
            other => return Err(format!("unknown output kind {:?}", other)),
        })
    }
}

#[derive(Debug, StructOpt)]
#[structopt(name = "banglac", about = "Compiles BanglaScript into JavaScript")]
struct Opt {
    /// The file to compile
    #[structopt(parse(from_os_str))]
    file: Option<PathBuf>,
    /// Compile one of the bundled demo programs instead of a file
    #[structopt(long)]
    demo: Option<String>,
    /// Print the names of the bundled demo programs
    #[structopt(long)]
    list_demos: bool,
    /// The (optional) output file, stdout when missing
    #[structopt(short = "o", long = "output", parse(from_os_str))]
    output: Option<PathBuf>,
    /// What to write out
    #[structopt(
        long,
        default_value = "js",
        possible_values = &["tokens", "ast", "symbols", "ir", "optimized", "js"]
    )]
    emit: Emit,
    /// Give blocks and functions their own scopes
    #[structopt(long)]
    lexical_scopes: bool,
    /// Skip the optimizer
    #[structopt(long)]
    no_optimize: bool,
    /// Log the compiler's progress
    #[structopt(short, long)]
    verbose: bool,
}
