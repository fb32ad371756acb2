use std::sync::Arc;

use clap::Parser;
use trellis_admin::cli::{Cli, Command, OutputFormat};
use trellis_admin::config::{AppConfig, LogFormat};
use trellis_admin::seed::SeedDocument;
use trellis_admin::service::AdminServices;
use trellis_core::access::SystemClock;
use trellis_core::describe;
use trellis_storage::InMemoryCatalog;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

type Services = AdminServices<InMemoryCatalog>;

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    // Logs go to stderr so command output on stdout stays parseable.
    let registry = tracing_subscriber::registry().with(filter);

    match config.log.format {
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr);
            registry.with(fmt_layer).init();
        }
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(std::io::stderr);
            registry.with(fmt_layer).init();
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?;
    init_logging(&config);

    let services = AdminServices::build(
        &config,
        Arc::new(SystemClock),
        Arc::new(InMemoryCatalog::new()),
    )?;

    let seed_path = cli.seed.clone().or_else(|| config.seed.path.clone());
    if let Some(path) = seed_path {
        let root = services
            .access
            .login(&config.bootstrap.login, &config.bootstrap.password)?;
        let summary = SeedDocument::load(&path)?.apply(&services, &root)?;
        tracing::info!(path = %path.display(), %summary, "seed imported");
    }

    match cli.command {
        Some(Command::Inventory { format }) => run_inventory(&services, format),
        Some(Command::Search { text }) => run_search(&services, &text),
        Some(Command::Contents { collection }) => run_contents(&services, collection.as_deref()),
        Some(Command::Check {
            login,
            password,
            permission,
        }) => run_check(&services, &login, &password, &permission),
        Some(Command::Stats) => {
            print!("{}", services.metrics.render_prometheus());
            Ok(())
        }
        None => run_inventory(&services, OutputFormat::Text),
    }
}

fn run_inventory(services: &Services, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let access = services.access.inventory();
    let collections = services.collections.inventory();

    match format {
        OutputFormat::Json => {
            let doc = serde_json::json!({
                "services": access.services,
                "entitlements": access.entitlements,
                "principals": access.principals,
                "collections": collections,
            });
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        OutputFormat::Text => {
            println!("Services:");
            for service in &access.services {
                println!(
                    "  {} \"{}\" -> [{}]",
                    service.id,
                    service.name,
                    service.entitlements.join(", ")
                );
            }
            println!("Entitlements:");
            print!("{}", describe::format_records(&access.entitlements, 2));
            println!("Principals:");
            for principal in &access.principals {
                println!(
                    "  {} \"{}\" entitlements=[{}] logins=[{}] active_tokens={}",
                    principal.id,
                    principal.name,
                    principal.entitlements.join(", "),
                    principal.logins.join(", "),
                    principal.active_tokens
                );
            }
            println!("Collections:");
            print!("{}", describe::format_records(&collections, 2));
        }
    }
    Ok(())
}

fn run_search(services: &Services, text: &str) -> Result<(), Box<dyn std::error::Error>> {
    let hits = services.collections.search(text);
    if hits.is_empty() {
        println!("no matching collections");
    } else {
        print!("{}", describe::format_records(&hits, 0));
    }
    Ok(())
}

fn run_contents(
    services: &Services,
    collection: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    match services.collections.contents(collection)? {
        Some(records) => print!("{}", describe::format_records(&records, 0)),
        None => println!("no contents"),
    }
    Ok(())
}

fn run_check(
    services: &Services,
    login: &str,
    password: &str,
    permission: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let token = services.access.login(login, password)?;
    match services.access.check_access(&token, permission) {
        Ok(decision) => {
            println!(
                "granted: {} holds {} via {:?}",
                decision.principal_id, permission, decision.granted_by
            );
            Ok(())
        }
        Err(e) => {
            println!("denied: {e}");
            std::process::exit(2);
        }
    }
}
