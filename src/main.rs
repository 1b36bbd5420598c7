mod cli;

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use omnisearch::{
    ManifestDiscovery, QueryController, RemoteTransport, SearchSettings, ThreadTimer,
    TransportFactory, app_dirs, logging,
};
use omnisearch_providers_apps::AppIndexProvider;

/// The demo binary carries no IPC layer; manifest providers without a
/// reachable transport are reported absent by discovery.
struct NoTransports;

impl TransportFactory for NoTransports {
    fn connect(&self, _provider_id: &str) -> Option<Arc<dyn RemoteTransport>> {
        None
    }
}

fn main() -> Result<()> {
    logging::initialize();
    let cli = cli::parse_cli();

    let raw = fs::read_to_string(&cli.index)
        .with_context(|| format!("failed to read app index {}", cli.index.display()))?;
    let provider = AppIndexProvider::from_json(&raw).context("failed to parse app index")?;
    let settings = SearchSettings::load(cli.config.as_deref())?;

    let mut controller = QueryController::new(Arc::new(provider), Box::new(ThreadTimer::new()));
    let manifest_dirs =
        cli::resolve_manifest_dirs(&cli.manifest_dirs, app_dirs::get_data_dir().ok());
    let discovery = ManifestDiscovery::new(manifest_dirs, Arc::new(NoTransports));
    controller.reload_external(&discovery, &settings);
    controller.pump();

    controller.set_terms(&cli.terms);
    if !controller.pump_until_settled(Duration::from_millis(cli.timeout_ms)) {
        eprintln!("warning: some providers did not settle in time");
    }

    print_sections(&controller);
    Ok(())
}

/// Print each visible provider section in registration order, then the
/// default result.
fn print_sections(controller: &QueryController) {
    let mut any = false;
    for (id, session) in controller.registry().iter() {
        if !session.is_visible() {
            continue;
        }
        any = true;
        println!("[{id}]");
        for result_id in session.displayed() {
            match session.meta(result_id) {
                Some(meta) => match &meta.description {
                    Some(description) => println!("  {}: {description}", meta.name),
                    None => println!("  {}", meta.name),
                },
                None => println!("  {result_id}"),
            }
        }
        if session.more_count() > 0 {
            println!("  ({} more)", session.more_count());
        }
    }

    if !any {
        println!("no results");
        return;
    }
    if let Some(default) = controller.top_result() {
        println!("top result: {}/{}", default.provider_id, default.result_id);
    }
}
