mod common;

use parley::{
    CallSiteKind, CliOptions, CommandLineBuilder, Error, Model, Tag, UnknownIdentifiers,
    errors::{ArityViolation, BindError, ParseError},
    validate,
};

use common::{Connect, Export, Verbosity, app, invoke};

#[test]
fn connect_binds_every_symbol() {
    let (cli, calls) = app(CliOptions::new());
    let site = cli.resolve(["connect", "-h=https://x.com", "-u", "tester", "-p", "(secret)"]);

    assert_eq!(site.command(), "app connect");
    assert_eq!(site.kind(), CallSiteKind::Invoke);
    assert_eq!(invoke(site), 42);

    assert_eq!(
        calls.connect(),
        Some(Connect {
            verbosity: Verbosity::Minimal,
            host: "https://x.com".into(),
            user_id: "tester".into(),
            password: Some("(secret)".into()),
        })
    );
}

#[test]
fn descendant_options_are_accepted_by_subcommands() {
    let (cli, calls) = app(CliOptions::new());
    let site = cli.resolve(["connect", "--verbosity", "DETAILED", "-h", "x", "--user", "me"]);

    assert_eq!(invoke(site), 42);

    let connect = calls.connect().unwrap();
    assert_eq!(connect.verbosity, Verbosity::Detailed);
    assert_eq!(connect.user_id, "me");
    assert_eq!(connect.password, None);
}

#[test]
fn missing_user_is_exactly_one_error() {
    let (cli, calls) = app(CliOptions::new());
    let site = cli.resolve(["connect", "-h=https://x.com", "-p", "(secret)"]);

    assert_eq!(site.kind(), CallSiteKind::Failure);
    assert_eq!(site.exit_code(), Some(1));

    let failure = site.failure().unwrap();
    match failure.errors() {
        [
            Error::Parse(ParseError::Arity {
                symbol,
                violation: ArityViolation::MinimumNotMet { min: 1, found: 0 },
            }),
        ] => {
            assert_eq!(symbol.binding, "user_id");
            assert!(symbol.tags.contains(&Tag::Short('u')));
            assert!(symbol.tags.contains(&Tag::Long("user".into())));
        }
        errors => panic!("unexpected errors: {errors:?}"),
    }

    assert!(failure.to_string().contains("--user-id/-u/--user"));
    assert_ne!(invoke(site), 0);
    assert_eq!(calls.connect(), None);
}

#[test]
fn tokens_after_the_terminator_are_operands() {
    let (cli, calls) = app(CliOptions::new());
    let site = cli.resolve([
        "export",
        "--table:Logs",
        "--",
        "./var/logs",
        "-verbose-logging:true",
    ]);

    assert_eq!(invoke(site), 0);
    assert_eq!(
        calls.export(),
        Some(Export {
            table: "Logs".into(),
            verbose_logging: false,
            paths: vec!["./var/logs".into(), "-verbose-logging:true".into()],
        })
    );
}

#[test]
fn unknown_identifiers_are_rejected_by_default() {
    let (cli, calls) = app(CliOptions::new());
    let site = cli.resolve(["export", "--table", "Logs", "--frobnicate", "out"]);

    assert!(matches!(
        site.failure().unwrap().errors(),
        [Error::Parse(ParseError::UnmatchedArgument { token, .. })] if token == "--frobnicate"
    ));
    assert_eq!(calls.export(), None);
}

#[test]
fn unknown_identifiers_can_be_positional() {
    let (cli, calls) =
        app(CliOptions::new().with_unknown_identifiers(UnknownIdentifiers::Positional));
    let site = cli.resolve(["export", "--table", "Logs", "--frobnicate", "out"]);

    assert_eq!(invoke(site), 0);
    assert_eq!(calls.export().unwrap().paths, ["--frobnicate", "out"]);
}

#[derive(Debug, Model)]
struct Flags {
    #[parley(short)]
    a: bool,

    #[parley(short)]
    b: bool,

    #[parley(short)]
    c: bool,
}

#[test]
fn short_switches_cluster() {
    let cli = CommandLineBuilder::new("flags")
        .root(|root| root.model::<Flags>())
        .handler(|flags: Flags| i32::from(flags.a) + i32::from(flags.b) * 2 + i32::from(flags.c) * 4)
        .build()
        .unwrap();

    assert_eq!(invoke(cli.resolve(["-abc"])), 7);
    assert_eq!(invoke(cli.resolve(["-ac"])), 5);
    assert_eq!(invoke(cli.resolve(Vec::<String>::new())), 0);
}

#[derive(Debug, Model)]
struct Shift {
    #[parley(long)]
    offset: i32,
}

#[test]
fn options_take_negative_values() {
    let cli = CommandLineBuilder::new("shift")
        .root(|root| root.model::<Shift>())
        .handler(|shift: Shift| shift.offset + 10)
        .build()
        .unwrap();

    assert_eq!(invoke(cli.resolve(["--offset", "-5"])), 5);
    assert_eq!(invoke(cli.resolve(["--offset", "5"])), 15);
    assert_eq!(invoke(cli.resolve(["--offset=-7"])), 3);
}

#[test]
fn help_short_circuits_binding() {
    let (cli, calls) = app(CliOptions::new());
    let site = cli.resolve(["connect", "--help", "--bogus"]);

    assert_eq!(site.kind(), CallSiteKind::Help);
    assert_eq!(site.exit_code(), Some(0));

    let help = site.help_text().unwrap();
    assert!(help.contains("Usage:\n  app connect"));
    assert!(help.contains("The server to connect to"));

    let mut out = Vec::new();
    assert_eq!(site.invoke_with(&mut out, &mut Vec::new()), 0);
    assert!(String::from_utf8(out).unwrap().contains("--verbosity"));
    assert_eq!(calls.connect(), None);
}

#[test]
fn help_at_the_root_lists_commands() {
    let (cli, _) = app(CliOptions::new().with_exit_codes(3, 1, 70));
    let site = cli.resolve(["-?"]);

    assert_eq!(site.exit_code(), Some(3));
    assert!(site.help_text().unwrap().contains("Commands:\n  connect\n  export\n"));
}

#[test]
fn parse_directive_shows_a_diagram() {
    let (cli, calls) = app(CliOptions::new());
    let site = cli.resolve(["[parse]", "connect", "-h", "https://x.com", "-u", "tester"]);

    assert_eq!(site.kind(), CallSiteKind::Diagram);
    assert!(site.directives().contains("parse"));
    assert_eq!(
        site.diagram(),
        Some("[ app connect *[ --verbosity ] [ --host <https://x.com> ] [ --user-id <tester> ] ]")
    );
    assert_eq!(invoke(site), 0);
    assert_eq!(calls.connect(), None);
}

#[test]
fn unknown_directives_are_reported() {
    let (cli, _) = app(CliOptions::new());
    let site = cli.resolve(["[trace]", "connect", "-h", "x", "-u", "y"]);

    assert!(matches!(
        site.failure().unwrap().errors(),
        [Error::Syntax(parley::errors::SyntaxError::UnknownDirective { name })] if name == "trace"
    ));

    let (cli, _) = app(CliOptions::new().allow_directive("trace"));
    let site = cli.resolve(["[trace:all]", "connect", "-h", "x", "-u", "y"]);

    assert_eq!(site.kind(), CallSiteKind::Invoke);
    assert_eq!(site.directives().get("trace"), Some(Some("all")));
}

#[test]
fn validation_errors_are_aggregated() {
    let mut options = CliOptions::new();
    options
        .validators_mut()
        .register::<String>(validate::not_empty());

    let (cli, _) = app(options);
    let site = cli.resolve(["connect", "-h", " ", "-u", " ", "--verbosity", "loud"]);
    let failure = site.failure().unwrap();

    let bindings: Vec<&str> = failure
        .errors()
        .iter()
        .map(|error| match error {
            Error::Bind(BindError::Validation { symbol, .. })
            | Error::Bind(BindError::Conversion { symbol, .. }) => symbol.binding.as_str(),
            error => panic!("unexpected error: {error}"),
        })
        .collect();

    assert_eq!(bindings, ["verbosity", "host", "user_id"]);
    assert!(failure.to_string().starts_with("`app connect` failed with 3 errors:\n"));
}

#[derive(Debug, Clone, PartialEq)]
struct Explosive;

#[test]
fn panics_become_internal_errors() {
    let mut options = CliOptions::new();
    options
        .converters_mut()
        .register(|_: &str| -> Result<Explosive, String> { panic!("boom") });

    let cli = CommandLineBuilder::new("app")
        .with_options(options)
        .root(|root| root.symbol(parley::Symbol::argument::<Explosive>("fuse")).model::<()>())
        .handler(|()| 0)
        .build()
        .unwrap();

    let site = cli.resolve(["lit"]);
    assert_eq!(site.kind(), CallSiteKind::Internal);
    assert_eq!(site.internal_message(), Some("boom"));
    assert_eq!(site.exit_code(), Some(70));

    let mut err = Vec::new();
    assert_eq!(site.invoke_with(&mut Vec::new(), &mut err), 70);
    assert!(String::from_utf8(err).unwrap().contains("boom"));
}

#[test]
fn async_handlers_are_awaited() {
    let cli = CommandLineBuilder::new("app")
        .command("wait", |wait| wait.model::<()>())
        .async_handler(|()| async { 9 })
        .build()
        .unwrap();

    let site = cli.resolve(["wait"]);
    assert_eq!(site.kind(), CallSiteKind::InvokeAsync);
    assert_eq!(invoke(site), 9);
}
