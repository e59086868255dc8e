//! CLI smoke entry point.
//!
//! # Responsibility
//! - Run a scripted navigation sequence against `outlet_core`.
//! - Print every lifecycle report as JSON for quick local sanity checks.
//!
//! Usage: `outlet_cli [config.json] [absolute-log-dir]`

use log::error;
use outlet_core::{
    ComponentFactory, ComponentType, RouteConfig, RouteSnapshot, Router, RouterConfig,
    StaticInjector, TreeNode, ViewComponentFactory,
};
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let config_path = args.next();
    let log_dir = args.next();

    let config = match load_config(config_path.as_deref()) {
        Ok(config) => config,
        Err(message) => return fail(&message),
    };
    // Without a log dir no logger is installed and only stderr reports failures.
    if let Some(log_dir) = &log_dir {
        if let Err(err) = outlet_core::init_logging(config.log_level(), log_dir) {
            return fail(&err.to_string());
        }
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            if log_dir.is_some() {
                error!("event=cli_failed module=cli status=error detail={}", message);
            }
            fail(&message)
        }
    }
}

fn fail(message: &str) -> ExitCode {
    eprintln!("outlet_cli: {message}");
    ExitCode::FAILURE
}

fn load_config(path: Option<&str>) -> Result<RouterConfig, String> {
    let loaded = match path {
        Some(path) => RouterConfig::from_path(path),
        None => RouterConfig::from_json_str(r#"{"reuse":{"detach_paths":["inbox"]}}"#),
    };
    loaded.map_err(|err| err.to_string())
}

fn run(config: &RouterConfig) -> Result<(), String> {
    println!("outlet_core version={}", outlet_core::core_version());

    let shell = route("", "Shell")?;
    let inbox = route("inbox", "Inbox")?;
    let message = route("inbox/:id", "Message")?;
    let settings = route("settings", "Settings")?;

    let script = [
        ("/inbox/1", tree(&shell, vec![node(&message).with_param("id", "1")])),
        ("/inbox/2", tree(&shell, vec![node(&message).with_param("id", "2")])),
        ("/inbox", tree(&shell, vec![node(&inbox)])),
        ("/settings", tree(&shell, vec![node(&settings)])),
        ("/inbox", tree(&shell, vec![node(&inbox)])),
    ];

    let mut router = Router::from_config(config, StaticInjector::new().shared());
    for (url, future) in &script {
        let report = router.navigate(future).map_err(|err| err.to_string())?;
        let json = serde_json::to_string_pretty(&report).map_err(|err| err.to_string())?;
        println!("navigate {url}\n{json}");
    }
    Ok(())
}

fn route(path: &str, component: &str) -> Result<Arc<RouteConfig>, String> {
    let selector = format!("app-{}", component.to_ascii_lowercase());
    let name = component.to_string();
    let factory: Arc<dyn ComponentFactory> =
        ViewComponentFactory::new(&selector, ComponentType::new(component), move |_| {
            Ok(Arc::new(name.clone()))
        })
        .map_err(|err| err.to_string())?
        .shared();
    Ok(RouteConfig::new(path)
        .map_err(|err| err.to_string())?
        .component(factory)
        .shared())
}

fn node(config: &Arc<RouteConfig>) -> RouteSnapshot {
    RouteSnapshot::for_config(config)
}

fn tree(shell: &Arc<RouteConfig>, children: Vec<RouteSnapshot>) -> TreeNode<RouteSnapshot> {
    TreeNode::new(RouteSnapshot::root())
        .with_child(TreeNode::new(node(shell)).with_children(children.into_iter().map(TreeNode::new)))
}
