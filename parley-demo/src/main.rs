mod error;

use std::path::PathBuf;

use parley::{CliOptions, CommandLineBuilder, Model, Scope, Symbol, Value, validate};
use tracing::info;

use crate::error::DemoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Value)]
enum Verbosity {
    Quiet,
    Minimal,
    Normal,
    Detailed,
}

/// Connect to a server
#[derive(Debug, Model)]
struct Connect {
    #[parley(inherited)]
    verbosity: Verbosity,

    /// The server to connect to
    #[parley(short, long)]
    host: String,

    /// The account to log in as
    #[parley(short, long, alias = "--user")]
    user_id: String,

    #[parley(short, long)]
    password: Option<String>,
}

/// Export tables to files
#[derive(Debug, Model)]
struct Export {
    #[parley(inherited)]
    verbosity: Verbosity,

    /// The table to export
    #[parley(long)]
    table: String,

    #[parley(long)]
    verbose_logging: bool,

    /// Where to write the exported files
    paths: Vec<PathBuf>,
}

fn connect(args: Connect) -> Result<(), DemoError> {
    info!(host = %args.host, user = %args.user_id, "connecting");

    if args.verbosity != Verbosity::Quiet {
        println!(
            "connecting to {} as {}{}",
            args.host,
            args.user_id,
            match args.password {
                Some(_) => " (with a password)",
                None => "",
            }
        );
    }

    match args.host.starts_with("https://") {
        true => Ok(()),
        false => Err(DemoError::InsecureHost(args.host)),
    }
}

fn export(args: Export) -> anyhow::Result<()> {
    if args.paths.is_empty() {
        anyhow::bail!("nowhere to export {} to", args.table);
    }

    for path in &args.paths {
        if args.verbose_logging || args.verbosity == Verbosity::Detailed {
            println!("exporting {} to {}", args.table, path.display());
        }
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let mut options = CliOptions::new().allow_directive("debug");
    options.converters_mut().register_parsed::<Verbosity>();
    options
        .validators_mut()
        .register::<String>(validate::not_empty());

    let cli = CommandLineBuilder::new("demo")
        .with_options(options)
        .root(|root| {
            root.describe("A small client that shows off parley").symbol(
                Symbol::option::<Verbosity>("verbosity")
                    .long("verbosity")
                    .short('v')
                    .default_value(Verbosity::Minimal)
                    .scope(Scope::Descendant)
                    .group("Global options")
                    .describe("How much to print: quiet, minimal, normal, or detailed"),
            )
        })
        .command("connect", |connect| connect.model::<Connect>())
        .command("export", |export| export.alias("dump").model::<Export>())
        .handler(connect)
        .handler(export)
        .build();

    let cli = match cli {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("demo is misconfigured: {err}");
            std::process::exit(70);
        }
    };

    let site = cli.resolve(std::env::args().skip(1));

    if site.directives().contains("debug") {
        eprintln!("{site:#?}");
    }

    std::process::exit(site.invoke())
}
