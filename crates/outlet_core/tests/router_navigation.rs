mod common;

use common::{entries, new_log, node, page, root, route};
use outlet_core::{EventKind, NavigationError, OutletPath, Router};

#[test]
fn newer_ticket_supersedes_older_one() {
    let log = new_log();
    let a = route("a", &page("A", &log));
    let b = route("b", &page("B", &log));
    let mut router = Router::new();

    let first = router.begin_navigation();
    let second = router.begin_navigation();
    assert!(second > first);

    let err = router
        .complete_navigation(first, &root(vec![node(&a)]))
        .unwrap_err();
    assert_eq!(
        err,
        NavigationError::Superseded {
            ticket: first,
            latest: second
        }
    );
    assert!(router.contexts().is_empty());
    assert!(entries(&log).is_empty());

    let report = router
        .complete_navigation(second, &root(vec![node(&b)]))
        .unwrap();
    assert_eq!(report.paths(EventKind::Created), vec!["primary"]);
    assert_eq!(entries(&log), vec!["create:B"]);
}

#[test]
fn cancelled_ticket_never_mutates_the_store() {
    let log = new_log();
    let a = route("a", &page("A", &log));
    let mut router = Router::new();

    let ticket = router.begin_navigation();
    router.cancel(ticket).unwrap();

    let err = router
        .complete_navigation(ticket, &root(vec![node(&a)]))
        .unwrap_err();
    assert_eq!(err, NavigationError::Cancelled(ticket));
    assert_eq!(router.cancel(ticket), Err(NavigationError::Cancelled(ticket)));
    assert!(router.contexts().is_empty());
}

#[test]
fn completed_ticket_cannot_be_replayed() {
    let log = new_log();
    let a = route("a", &page("A", &log));
    let mut router = Router::new();

    let ticket = router.begin_navigation();
    router.complete_navigation(ticket, &root(vec![node(&a)])).unwrap();

    let err = router
        .complete_navigation(ticket, &root(vec![]))
        .unwrap_err();
    assert_eq!(err, NavigationError::UnknownTicket(ticket));
    assert_eq!(
        router.contexts().mounted_paths(),
        vec![OutletPath::parse("primary")]
    );
}

#[test]
fn current_tree_mirrors_mounted_contexts() {
    let log = new_log();
    let shell = route("shell", &page("Shell", &log));
    let child = route("child/:id", &page("Child", &log));
    let mut router = Router::new();

    router
        .navigate(&root(vec![node(&shell).with_child(node(&child))]))
        .unwrap();
    let tree = router.current_tree();

    assert!(tree.value.is_root());
    assert_eq!(tree.node_count(), 3);
    let shell_node = tree.child_for_outlet("primary").unwrap();
    assert!(shell_node.value.same_config(&node(&shell).value));
    assert_eq!(shell_node.children[0].value.route_config().unwrap().path(), "child/:id");
}

#[test]
fn dropping_the_router_destroys_mounted_components() {
    let log = new_log();
    let a = route("a", &page("A", &log));
    let mut router = Router::new();

    router.navigate(&root(vec![node(&a)])).unwrap();
    let mounted = std::sync::Arc::clone(
        router
            .contexts()
            .component_at(&OutletPath::parse("primary"))
            .unwrap(),
    );
    drop(router);

    assert!(mounted.is_destroyed());
}
