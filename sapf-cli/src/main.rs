//! Command-line interface for sapf tooling
//! This binary formats sapf sources, shows what the evaluation commands would send, and
//! builds or queries function catalogs outside the editor.
//!
//! Usage:
//!   sapf-tool format `<path>` [--write] [--indent `<n>`]            - Re-indent a source file
//!   sapf-tool locate `<path>` --offset `<n>` [--brackets `<kind>`]   - Print the block at a byte offset
//!   sapf-tool catalog parse `<HELP>` [--output `<file>`]            - Build a catalog from help text
//!   sapf-tool catalog generate [--output `<file>`]                - Capture help text from the REPL
//!   sapf-tool catalog lookup `<catalog>` `<name>`                   - Print one catalog entry
//!
//! Settings come from the built-in defaults, then `sapf.toml` in the current directory, then
//! the file passed with `--config`, then command-line flags.

use anyhow::{bail, Context};
use clap::{Arg, ArgAction, ArgMatches, Command};
use sapf_config::{Loader, SapfConfig};
use sapf_lsp::generation::CatalogGenerator;
use sapf_parser::sapf::catalog::{file, parse_help, LISTING_MARKER};
use sapf_parser::sapf::locating::selection_or_line;
use sapf_parser::sapf::{format_source, locate, Catalog, KeywordIndex};
use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

fn cli() -> Command {
    Command::new("sapf-tool")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Formatting, block location and function catalogs for sapf")
        .arg_required_else_help(true)
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .help("Extra configuration file layered over sapf.toml"),
        )
        .subcommand(
            Command::new("format")
                .about("Re-indent a sapf file by bracket depth")
                .arg(Arg::new("path").help("Source file").required(true).index(1))
                .arg(
                    Arg::new("write")
                        .long("write")
                        .short('w')
                        .help("Rewrite the file in place instead of printing")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("indent")
                        .long("indent")
                        .help("Spaces per nesting level")
                        .value_parser(clap::value_parser!(u32)),
                ),
        )
        .subcommand(
            Command::new("locate")
                .about("Print the text an evaluation at a byte offset would send, as JSON")
                .arg(Arg::new("path").help("Source file").required(true).index(1))
                .arg(
                    Arg::new("offset")
                        .long("offset")
                        .help("Cursor byte offset")
                        .required(true)
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("brackets")
                        .long("brackets")
                        .help("Bracket pair: round, square or curly"),
                )
                .arg(
                    Arg::new("policy")
                        .long("policy")
                        .help("Block policy: outermost or innermost"),
                )
                .arg(
                    Arg::new("line")
                        .long("line")
                        .help("Send the current line instead of a block")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("catalog")
                .about("Build and query function catalogs")
                .subcommand_required(true)
                .subcommand(
                    Command::new("parse")
                        .about("Parse captured help text ('-' reads stdin)")
                        .arg(
                            Arg::new("input")
                                .value_name("HELP")
                                .help("Help text file")
                                .required(true)
                                .index(1),
                        )
                        .arg(output_arg()),
                )
                .subcommand(
                    Command::new("generate")
                        .about("Run the REPL's help command and build a catalog from its output")
                        .arg(output_arg())
                        .arg(
                            Arg::new("binary")
                                .long("binary")
                                .help("sapf executable to run"),
                        )
                        .arg(
                            Arg::new("timeout")
                                .long("timeout")
                                .help("Seconds to wait for the REPL")
                                .value_parser(clap::value_parser!(u64)),
                        ),
                )
                .subcommand(
                    Command::new("lookup")
                        .about("Print a catalog entry as JSON")
                        .arg(
                            Arg::new("catalog")
                                .help("Catalog JSON file")
                                .required(true)
                                .index(1),
                        )
                        .arg(Arg::new("name").help("Function name").required(true).index(2)),
                ),
        )
}

fn output_arg() -> Arg {
    Arg::new("output")
        .long("output")
        .short('o')
        .help("Write the catalog here instead of stdout")
}

fn main() {
    env_logger::init();
    let matches = cli().get_matches();
    if let Err(err) = run(&matches) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    match matches.subcommand() {
        Some(("format", sub)) => handle_format_command(sub),
        Some(("locate", sub)) => handle_locate_command(sub),
        Some(("catalog", sub)) => match sub.subcommand() {
            Some(("parse", args)) => handle_catalog_parse_command(args),
            Some(("generate", args)) => handle_catalog_generate_command(args),
            Some(("lookup", args)) => handle_catalog_lookup_command(args),
            _ => unreachable!("clap requires a catalog subcommand"),
        },
        _ => unreachable!("clap requires a subcommand"),
    }
}

/// Defaults, then `./sapf.toml`, then `--config`. Command flags are applied by the caller.
///
/// `matches` is the leaf subcommand's; `--config` is global and propagated to it.
fn load_config(matches: &ArgMatches) -> anyhow::Result<SapfConfig> {
    let mut loader = Loader::new();
    if let Ok(cwd) = std::env::current_dir() {
        loader = loader.with_project(cwd);
    }
    if let Some(path) = matches.get_one::<String>("config") {
        loader = loader.with_file(path);
    }
    loader.build().context("failed to load configuration")
}

fn read_source(path: &str) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("cannot read {path}"))
}

fn handle_format_command(sub: &ArgMatches) -> anyhow::Result<()> {
    let mut config = load_config(sub)?;
    if let Some(indent) = sub.get_one::<u32>("indent") {
        config.formatting.indent_size = *indent as usize;
    }
    let path = required(sub, "path")?;
    let source = read_source(path)?;
    let formatted = format_source(&source, &config.formatting.format_options());

    if sub.get_flag("write") {
        if formatted == source {
            log::info!("{path} is already formatted");
        } else {
            fs::write(path, &formatted).with_context(|| format!("cannot write {path}"))?;
            log::info!("formatted {path}");
        }
    } else {
        print!("{formatted}");
    }
    Ok(())
}

fn handle_locate_command(sub: &ArgMatches) -> anyhow::Result<()> {
    let mut config = load_config(sub)?;
    if let Some(brackets) = sub.get_one::<String>("brackets") {
        config.evaluation.brackets = brackets.clone();
    }
    if let Some(policy) = sub.get_one::<String>("policy") {
        config.evaluation.policy = policy.clone();
    }
    let path = required(sub, "path")?;
    let source = read_source(path)?;
    let offset = sub.get_one::<usize>("offset").copied().unwrap_or_default();
    if offset > source.len() || !source.is_char_boundary(offset) {
        bail!("offset {offset} is not a character boundary in {path}");
    }

    let span = if sub.get_flag("line") {
        selection_or_line(&source, offset, None)
    } else {
        let (pair, bracket_warning) = config.evaluation.resolve_brackets();
        let (policy, policy_warning) = config.evaluation.resolve_policy();
        for warning in bracket_warning.into_iter().chain(policy_warning) {
            eprintln!("warning: {warning}");
        }
        // resolve_brackets falls back to round brackets, never to line mode
        locate(&source, offset, None, Some(pair), policy)
    };
    println!("{}", serde_json::to_string_pretty(&span)?);
    Ok(())
}

fn handle_catalog_parse_command(args: &ArgMatches) -> anyhow::Result<()> {
    let input = required(args, "input")?;
    let raw = if input == "-" {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("cannot read help text from stdin")?;
        raw
    } else {
        read_source(input)?
    };

    let catalog = parse_help(&raw);
    if catalog.is_empty() {
        bail!("{input} has no '{LISTING_MARKER}' listing");
    }
    log::info!(
        "parsed {} functions in {} categories",
        catalog.len(),
        catalog.categories().len()
    );
    emit_catalog(args.get_one::<String>("output").map(PathBuf::from), &catalog)
}

fn handle_catalog_generate_command(args: &ArgMatches) -> anyhow::Result<()> {
    let mut config = load_config(args)?;
    if let Some(binary) = args.get_one::<String>("binary") {
        config.repl.binary = binary.clone();
    }
    let mut generator = CatalogGenerator::new(&config.repl);
    if let Some(secs) = args.get_one::<u64>("timeout") {
        generator = generator.with_timeout(Duration::from_secs(*secs));
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("cannot start the async runtime")?;
    let catalog = runtime.block_on(generator.generate())?;
    log::info!("generated {} functions", catalog.len());

    let output = args
        .get_one::<String>("output")
        .map(PathBuf::from)
        .or_else(|| {
            let cwd = std::env::current_dir().ok();
            config.catalog.resolve_path(cwd.as_deref())
        });
    emit_catalog(output, &catalog)
}

fn handle_catalog_lookup_command(args: &ArgMatches) -> anyhow::Result<()> {
    let path = required(args, "catalog")?;
    let name = required(args, "name")?;
    let index =
        KeywordIndex::load(path).with_context(|| format!("cannot load catalog {path}"))?;
    match index.get(name) {
        Some(entry) => {
            println!("{}", serde_json::to_string_pretty(entry)?);
            Ok(())
        }
        None => bail!("no function named '{name}' in {path}"),
    }
}

fn emit_catalog(output: Option<PathBuf>, catalog: &Catalog) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            file::write(&path, catalog)
                .with_context(|| format!("cannot write {}", path.display()))?;
            log::info!("wrote catalog to {}", path.display());
        }
        None => println!("{}", file::to_json(catalog)?),
    }
    Ok(())
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> anyhow::Result<&'a str> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("missing argument '{name}'"))
}
