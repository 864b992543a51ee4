mod common;

use parley::{
    CallSiteKind, CliOptions, CommandLineBuilder, Error, RouteMatching, RoutePath,
    errors::{ConfigError, ResolutionError},
};

use common::{app, invoke};

#[test]
fn route_path_relations() {
    let a = RoutePath::new("a");
    let ab = RoutePath::new("a b");
    let abc = RoutePath::new("a b c");

    assert!(ab.is_child_of(&a));
    assert!(!abc.is_child_of(&a));
    assert!(abc.is_descendant_of(&a));
    assert!(abc.is_descendant_of(&ab));
    assert!(!a.is_descendant_of(&ab));
    assert_eq!(abc.parent(), Some(ab));
    assert!(a.is_child_of(&RoutePath::root()));
}

fn remote_app(matching: RouteMatching) -> parley::CommandLine {
    CommandLineBuilder::new("git")
        .with_options(CliOptions::new().with_route_matching(matching))
        .command("remote", |remote| {
            remote
                .command("add", |add| add.alias("new").model::<()>())
                .command("remove", |remove| remove.route_pattern("remote (remove|rm)").model::<()>())
        })
        .command("status", |status| status.alias("st").model::<()>())
        .handler(|()| 0)
        .build()
        .unwrap()
}

#[test]
fn tree_walking_uses_names_and_aliases() {
    let cli = remote_app(RouteMatching::Tree);

    assert_eq!(cli.resolve(["remote", "new"]).command(), "git remote add");
    assert_eq!(cli.resolve(["st"]).command(), "git status");

    let site = cli.resolve(["remote", "rm"]);
    assert!(matches!(
        site.failure().unwrap().errors(),
        [Error::Resolution(ResolutionError::UnknownCommand { unexpected, .. })] if unexpected == "rm"
    ));
}

#[test]
fn pattern_routes_take_the_longest_match() {
    let cli = remote_app(RouteMatching::Pattern);

    let site = cli.resolve(["remote", "rm"]);
    assert_eq!(site.command(), "git remote remove");
    assert_eq!(site.kind(), CallSiteKind::Invoke);

    assert_eq!(cli.resolve(["remote", "add"]).command(), "git remote add");

    let site = cli.resolve(["remote"]);
    assert!(matches!(
        site.failure().unwrap().errors(),
        [Error::Resolution(ResolutionError::MissingSubcommand { .. })]
    ));
}

#[test]
fn ambiguous_pattern_routes_fail() {
    let cli = CommandLineBuilder::new("app")
        .with_options(CliOptions::new().with_route_matching(RouteMatching::Pattern))
        .command("start", |start| start.route_pattern("st.*").model::<()>())
        .command("stop", |stop| stop.route_pattern("st.*").model::<()>())
        .handler(|()| 0)
        .build()
        .unwrap();

    let site = cli.resolve(["stop"]);
    assert_eq!(site.command(), "app");
    assert!(matches!(
        site.failure().unwrap().errors(),
        [Error::Resolution(ResolutionError::Ambiguous { candidates, .. })] if candidates.len() == 2
    ));
}

#[test]
fn invalid_route_patterns_are_config_errors() {
    let error = CommandLineBuilder::new("app")
        .with_options(CliOptions::new().with_route_matching(RouteMatching::Pattern))
        .command("bad", |bad| bad.route_pattern("(").model::<()>())
        .handler(|()| 0)
        .build()
        .unwrap_err();

    assert!(matches!(error, ConfigError::RoutePattern { ref pattern, .. } if pattern == "(?:()"));
}

#[test]
fn duplicate_siblings_are_config_errors() {
    let error = CommandLineBuilder::new("app")
        .command("status", |status| status.model::<()>())
        .command("stat", |stat| stat.alias("status").model::<()>())
        .handler(|()| 0)
        .build()
        .unwrap_err();

    assert!(matches!(error, ConfigError::DuplicateCommand { ref name, .. } if name == "status"));
}

#[test]
fn routing_nodes_report_their_subcommands() {
    let (cli, _) = app(CliOptions::new());
    let site = cli.resolve(Vec::<String>::new());

    assert_eq!(site.command(), "app");
    assert!(matches!(
        site.failure().unwrap().errors(),
        [Error::Resolution(ResolutionError::MissingSubcommand { available, .. })]
            if available == &["connect", "export"]
    ));
    assert_eq!(invoke(site), 1);
}
