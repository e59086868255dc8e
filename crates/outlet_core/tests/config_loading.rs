mod common;

use common::{new_log, node, page, root, route};
use outlet_core::{ConfigError, EventKind, RouteReuseStrategy, Router, RouterConfig, StaticInjector};
use std::io::Write;

#[test]
fn loads_config_file_and_builds_a_caching_router() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"log_level":"debug","reuse":{{"detach_paths":["/list"],"capacity":3}}}}"#
    )
    .unwrap();

    let config = RouterConfig::from_path(file.path()).unwrap();
    assert_eq!(config.log_level(), "debug");
    assert_eq!(config.reuse.capacity, 3);

    let log = new_log();
    let list = route("list", &page("List", &log));
    let mut router = Router::from_config(&config, StaticInjector::new().shared());
    router.navigate(&root(vec![node(&list)])).unwrap();
    let report = router.navigate(&root(vec![])).unwrap();

    assert_eq!(report.paths(EventKind::Detached), vec!["primary"]);
    assert!(router.strategy().should_attach(&node(&list).value));
}

#[test]
fn missing_file_reports_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = RouterConfig::from_path(dir.path().join("absent.json")).unwrap_err();

    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("absent.json"));
}

#[test]
fn malformed_json_reports_parse_error() {
    let err = RouterConfig::from_json_str("{\"reuse\":").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}
