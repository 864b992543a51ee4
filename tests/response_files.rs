mod common;

use std::fs;

use parley::{
    CallSiteKind, CliOptions, Error, Tokenizer,
    errors::SyntaxError,
    expand::{FileLoader, MemoryLoader, expand},
};

use common::{app, invoke};

const LOGIN_INFO: &str = "--user-id root\n--password P@ssw0rd!\n";

#[test]
fn expansion_happens_in_place() {
    let tokenizer = Tokenizer::new();
    let loader = MemoryLoader::new().with("login-info.rsp", LOGIN_INFO);

    let mut tokens = tokenizer.tokenize(["connect", "[@login-info.rsp]", "-h", "https://x.com"]);
    let (expanded, errors) = expand(&mut tokens, &tokenizer, &loader, 8);

    assert!(expanded);
    assert!(errors.is_empty());

    let texts: Vec<String> = tokens.into_vec().into_iter().map(|token| token.into_text()).collect();
    assert_eq!(
        texts,
        ["connect", "--user-id", "root", "--password", "P@ssw0rd!", "-h", "https://x.com"]
    );
}

#[test]
fn response_file_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("login-info.rsp"), LOGIN_INFO).unwrap();

    let (cli, calls) = app(CliOptions::new().with_loader(FileLoader::with_base(dir.path())));
    let site = cli.resolve(["connect", "[@login-info.rsp]", "-h", "https://x.com"]);

    assert_eq!(invoke(site), 42);

    let connect = calls.connect().unwrap();
    assert_eq!(connect.user_id, "root");
    assert_eq!(connect.password.as_deref(), Some("P@ssw0rd!"));
    assert_eq!(connect.host, "https://x.com");
}

#[test]
fn response_files_can_name_the_command() {
    let loader = MemoryLoader::new()
        .with("outer.rsp", "# the command\nconnect [@inner.rsp]\n")
        .with("inner.rsp", "-h 'https://x.com' -u \"tester two\"");

    let (cli, calls) = app(CliOptions::new().with_loader(loader));
    assert_eq!(invoke(cli.resolve(["[@outer.rsp]"])), 42);
    assert_eq!(calls.connect().unwrap().user_id, "tester two");
}

#[test]
fn missing_response_file() {
    let dir = tempfile::tempdir().unwrap();
    let (cli, _) = app(CliOptions::new().with_loader(FileLoader::with_base(dir.path())));
    let site = cli.resolve(["connect", "[@nope.rsp]", "-h", "x", "-u", "y"]);

    assert!(matches!(
        site.failure().unwrap().errors(),
        [Error::Syntax(SyntaxError::Resource { name, .. })] if name == "nope.rsp"
    ));
}

#[test]
fn expansion_depth_is_limited() {
    let loader = MemoryLoader::new().with("loop.rsp", "[@loop.rsp]");
    let (cli, _) = app(CliOptions::new().with_loader(loader).with_max_expansion_depth(3));
    let site = cli.resolve(["connect", "-h", "x", "-u", "y", "[@loop.rsp]"]);

    assert_eq!(site.kind(), CallSiteKind::Failure);
    assert!(matches!(
        site.failure().unwrap().errors(),
        [Error::Syntax(SyntaxError::DepthExceeded { max_depth: 3, .. })]
    ));
}

#[test]
fn unterminated_quotes_report_their_position() {
    let loader = MemoryLoader::new().with("bad.rsp", "-u tester\n-p 'secret\n");
    let (cli, _) = app(CliOptions::new().with_loader(loader));
    let site = cli.resolve(["connect", "-h", "x", "[@bad.rsp]"]);

    assert!(site.failure().unwrap().errors().iter().any(|error| matches!(
        error,
        Error::Syntax(SyntaxError::UnterminatedQuote { resource, line: 2, quote: '\'', .. })
            if resource == "bad.rsp"
    )));
}

#[test]
fn terminators_are_rejected_in_response_files() {
    let loader = MemoryLoader::new().with("t.rsp", "-u tester -- extra");
    let (cli, _) = app(CliOptions::new().with_loader(loader));
    let site = cli.resolve(["connect", "-h", "x", "[@t.rsp]"]);

    assert!(site.failure().unwrap().errors().iter().any(|error| matches!(
        error,
        Error::Syntax(SyntaxError::TerminatorInResponseFile { line: 1, .. })
    )));
}

#[test]
fn response_files_can_be_disabled() {
    let (cli, calls) = app(CliOptions::new().without_response_files());
    let site = cli.resolve(["export", "--table", "t", "[@files.rsp]"]);

    assert!(matches!(
        site.failure().unwrap().errors(),
        [Error::Syntax(SyntaxError::UnknownDirective { name })] if name == "@files.rsp"
    ));
    assert_eq!(calls.export(), None);
}

#[test]
fn quoted_terminators_are_values() {
    let loader = MemoryLoader::new().with("rows.rsp", "--table '--' ./var/logs");
    let (cli, calls) = app(CliOptions::new().with_loader(loader));

    assert_eq!(invoke(cli.resolve(["export", "[@rows.rsp]", "./out"])), 0);

    let export = calls.export().unwrap();
    assert_eq!(export.table, "--");
    assert_eq!(export.paths, ["./var/logs", "./out"]);
}
