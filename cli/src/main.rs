mod error;
mod manifest;
mod test_runner;

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing::info;
use tracing_subscriber::EnvFilter;

use literate::namer::FallbackNamer;
use literate::protocol::{self, BlockKind};
use literate::scope::Outline;
use literate::{ParseError, filter};

use crate::error::CliError;
use crate::manifest::{DEFAULT_MANIFEST, Manifest};

const SUBCOMMANDS: &[&str] = &["build", "test", "help"];

#[derive(Parser)]
#[command(
    name = "literate",
    version,
    about = "Compile literate Markdown projects into a virtual filesystem"
)]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log pipeline decisions to stderr (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile Markdown documents into a filesystem and startup script
    Build(BuildArgs),

    /// Run .test.md fixture files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct BuildArgs {
    /// Markdown documents, merged in order. Read from the manifest when empty.
    files: Vec<PathBuf>,

    /// Only include code blocks selected by this id. Repeatable.
    #[arg(short, long = "id")]
    ids: Vec<String>,

    /// Project manifest listing documents and ids
    #[arg(long, default_value = DEFAULT_MANIFEST)]
    manifest: PathBuf,

    /// Print the filesystem as an indented tree instead of JSON
    #[arg(long, conflicts_with = "blocks")]
    tree: bool,

    /// List every code block with its headings and resolved target
    #[arg(long)]
    blocks: bool,

    /// Only report diagnostics; exit 1 if there are any
    #[arg(long)]
    check: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.md file or directory containing them
    path: PathBuf,

    /// Run only fixtures in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    // `literate file.md` is shorthand for `literate build file.md`.
    let mut args: Vec<String> = std::env::args().collect();
    if let Some(pos) = args
        .iter()
        .skip(1)
        .position(|a| !a.starts_with('-'))
        .map(|p| p + 1)
    {
        if !SUBCOMMANDS.contains(&args[pos].as_str()) {
            args.insert(pos, "build".to_string());
        }
    }

    let cli = Cli::parse_from(&args);
    init_tracing(cli.verbose);

    match cli.command {
        Command::Build(build_args) => match do_build(build_args, cli.no_color) {
            Ok(code) => process::exit(code),
            Err(e) => {
                eprintln!("error: {}", e);
                process::exit(1);
            }
        },
        Command::Test(test_args) => {
            if test_args.list_categories {
                test_runner::list_categories(&test_args.path);
                return;
            }
            let exit_code =
                test_runner::run_tests(&test_args.path, cli.no_color, &test_args.category);
            process::exit(exit_code);
        }
    }
}

fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn do_build(args: BuildArgs, no_color: bool) -> Result<i32, CliError> {
    let (paths, mut ids) = if args.files.is_empty() {
        let manifest = Manifest::load(&args.manifest)?;
        (manifest.document_paths(), manifest.ids)
    } else {
        (args.files, Vec::new())
    };
    ids.extend(args.ids);

    if paths.is_empty() {
        return Err(CliError::NoDocuments(args.manifest));
    }

    // File ids handed out by SimpleFiles match document positions.
    let mut files = SimpleFiles::new();
    let mut sources = Vec::with_capacity(paths.len());
    for path in &paths {
        let source = std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.clone(),
            source,
        })?;
        files.add(path.display().to_string(), source.clone());
        sources.push(source);
    }

    let ids: Vec<&str> = ids.iter().map(String::as_str).collect();

    if args.blocks {
        print_blocks(&paths, &sources, &ids);
        return Ok(0);
    }

    let documents: Vec<&str> = sources.iter().map(String::as_str).collect();
    let result = literate::multiparse(&documents, &ids);
    info!(
        documents = documents.len(),
        files = result.filesystem.files().len(),
        errors = result.errors.len(),
        "build finished"
    );

    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    emit_diagnostics(color_choice, &files, &result.errors);

    if args.check {
        return Ok(if result.has_errors() { 1 } else { 0 });
    }

    if args.tree {
        print!("{}", result.filesystem.render_tree());
        if let Some(startup) = &result.startup {
            println!();
            println!("startup:");
            for line in startup.lines() {
                println!("  {}", line);
            }
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    Ok(0)
}

fn emit_diagnostics(
    color_choice: ColorChoice,
    files: &SimpleFiles<String, String>,
    errors: &[ParseError],
) {
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();
    for error in errors {
        let diagnostic = error.to_diagnostic();
        let _ = term::emit_to_write_style(&mut writer.lock(), &config, files, &diagnostic);
    }
}

/// One line per code block: included (`+`) or not (`-`), source line,
/// where it goes, and the headings above it.
fn print_blocks(paths: &[PathBuf], sources: &[String], ids: &[&str]) {
    for (file_id, (path, source)) in paths.iter().zip(sources).enumerate() {
        println!("{}", path.display());

        let document = literate::Parser::new(source.as_str(), file_id).document();
        let outline = Outline::of(&document);
        let mut namer = FallbackNamer::new();

        for block in outline.blocks() {
            let included = filter::is_included(&outline, block, ids);
            let target = match protocol::resolve(block.code.meta.as_deref()) {
                Ok(BlockKind::File { path: Some(path) }) => path,
                // Only included blocks advance the naming counters.
                Ok(BlockKind::File { path: None }) if included => namer.name(&outline, block),
                Ok(BlockKind::File { path: None }) => "(unnamed)".to_string(),
                Ok(BlockKind::Directive(directive)) => format!("rmsm://{}", directive),
                Err(err) => format!("error: {}", err),
            };
            let trail = outline
                .ancestors(block)
                .map(|heading| heading.to_string())
                .collect::<Vec<_>>()
                .join(" > ");

            println!(
                "  {} {:>5}  {}  [{}]",
                if included { "+" } else { "-" },
                line_of(source, block.span.start),
                target,
                trail
            );
        }
    }
}

/// 1-based line of a byte offset.
fn line_of(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count()
        + 1
}
