#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use parley::{CliOptions, CommandLine, CommandLineBuilder, Model, Scope, Symbol, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Value)]
pub enum Verbosity {
    Quiet,
    Minimal,
    Normal,
    Detailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Model)]
pub struct Connect {
    #[parley(inherited)]
    pub verbosity: Verbosity,

    /// The server to connect to
    #[parley(short, long)]
    pub host: String,

    #[parley(short, long, alias = "--user")]
    pub user_id: String,

    #[parley(short, long)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Model)]
pub struct Export {
    #[parley(long)]
    pub table: String,

    #[parley(long)]
    pub verbose_logging: bool,

    pub paths: Vec<String>,
}

/// The last model each handler was called with
#[derive(Debug, Default, Clone)]
pub struct Calls {
    pub connect: Arc<Mutex<Option<Connect>>>,
    pub export: Arc<Mutex<Option<Export>>>,
}

impl Calls {
    pub fn connect(&self) -> Option<Connect> {
        self.connect.lock().unwrap().clone()
    }

    pub fn export(&self) -> Option<Export> {
        self.export.lock().unwrap().clone()
    }
}

/// `app`, with a descendant `--verbosity` and the `connect` and `export`
/// subcommands. The connect handler returns 42.
pub fn app(mut options: CliOptions) -> (CommandLine, Calls) {
    options.converters_mut().register_parsed::<Verbosity>();

    let calls = Calls::default();
    let connect_calls = Arc::clone(&calls.connect);
    let export_calls = Arc::clone(&calls.export);

    let cli = CommandLineBuilder::new("app")
        .with_options(options)
        .root(|root| {
            root.symbol(
                Symbol::option::<Verbosity>("verbosity")
                    .long("verbosity")
                    .default_value(Verbosity::Minimal)
                    .scope(Scope::Descendant),
            )
        })
        .command("connect", |connect| connect.model::<Connect>())
        .command("export", |export| export.model::<Export>())
        .handler(move |args: Connect| {
            *connect_calls.lock().unwrap() = Some(args);
            42
        })
        .handler(move |args: Export| {
            *export_calls.lock().unwrap() = Some(args);
        })
        .build()
        .unwrap();

    (cli, calls)
}

/// Invoke a call site, discarding its output
pub fn invoke(site: parley::CallSite) -> i32 {
    site.invoke_with(&mut Vec::new(), &mut Vec::new())
}
