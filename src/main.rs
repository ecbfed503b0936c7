// Main CLI entry point for chainprobe
// Uses clap for argument parsing

use chainprobe::catalog::load_catalog;
use chainprobe::config::{
    LifecycleTarget, ScanConfig, DEFAULT_CREATE_PATH, DEFAULT_ITEM_PATH, DEFAULT_TENANT_HEADER,
};
use chainprobe::reporting::{export_csv, export_json};
use chainprobe::scan::Scanner;
use chainprobe::spec::SpecStore;
use clap::{Arg, ArgAction, Command};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: bool) {
    let default = if verbose { "chainprobe=debug" } else { "chainprobe=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn parse_secs(matches: &clap::ArgMatches, id: &str) -> Duration {
    Duration::from_secs(matches.get_one::<u64>(id).copied().unwrap_or(5))
}

#[tokio::main]
async fn main() {
    let matches = Command::new("chainprobe")
        .version(clap::crate_version!())
        .about("Dependency-aware REST API probe and lifecycle security tester")
        .after_help("EXAMPLES:\n  chainprobe --openapi openapi.json --base-url https://bank.example --token TOKEN --tenant team1\n  chainprobe -o openapi.json -b http://localhost:8080 --endpoint-data data.json --no-broken-auth --csv-report")
        .arg(Arg::new("openapi")
            .short('o')
            .long("openapi")
            .required(true)
            .num_args(1)
            .help("OpenAPI document whose 'paths' section lists the endpoints to probe"))
        .arg(Arg::new("endpoint_data")
            .short('d')
            .long("endpoint-data")
            .num_args(1)
            .default_value("endpoint-data.json")
            .help("Endpoint input specs (literal and referenced parameters, sources)"))
        .arg(Arg::new("base_url")
            .short('b')
            .long("base-url")
            .required(true)
            .num_args(1)
            .help("Base URL of the target API"))
        .arg(Arg::new("token")
            .short('t')
            .long("token")
            .num_args(1)
            .help("Bearer token; a token captured from a source endpoint takes precedence"))
        .arg(Arg::new("tenant")
            .long("tenant")
            .num_args(1)
            .help("Tenant id for the battery and lifecycle test (omit to skip both)"))
        .arg(Arg::new("create_path")
            .long("create-path")
            .num_args(1)
            .default_value(DEFAULT_CREATE_PATH)
            .help("Create endpoint targeted by the battery and lifecycle test"))
        .arg(Arg::new("item_path")
            .long("item-path")
            .num_args(1)
            .default_value(DEFAULT_ITEM_PATH)
            .help("Item endpoint; {id} is replaced by the created identifier"))
        .arg(Arg::new("tenant_header")
            .long("tenant-header")
            .num_args(1)
            .default_value(DEFAULT_TENANT_HEADER)
            .help("Header carrying the tenant id"))
        .arg(Arg::new("probe_timeout")
            .long("probe-timeout-secs")
            .num_args(1)
            .default_value("5")
            .value_parser(clap::value_parser!(u64))
            .help("Timeout for sources and generic probes"))
        .arg(Arg::new("test_timeout")
            .long("test-timeout-secs")
            .num_args(1)
            .default_value("8")
            .value_parser(clap::value_parser!(u64))
            .help("Timeout for battery and lifecycle calls"))
        .arg(Arg::new("no_battery")
            .long("no-battery")
            .action(ArgAction::SetTrue)
            .help("Skip the adversarial battery"))
        .arg(Arg::new("no_lifecycle")
            .long("no-lifecycle")
            .action(ArgAction::SetTrue)
            .help("Skip the create/get/delete/get lifecycle test"))
        .arg(Arg::new("no_broken_auth")
            .long("no-broken-auth")
            .action(ArgAction::SetTrue)
            .help("Skip the unauthenticated GET probe"))
        .arg(Arg::new("json_report")
            .long("json-report")
            .action(ArgAction::SetTrue)
            .help("Write a JSON report (default: on)"))
        .arg(Arg::new("csv_report")
            .long("csv-report")
            .action(ArgAction::SetTrue)
            .help("Write a CSV report"))
        .arg(Arg::new("verbose")
            .short('v')
            .long("verbose")
            .action(ArgAction::SetTrue)
            .help("Debug logging (RUST_LOG overrides)"))
        .get_matches();

    init_logging(matches.get_flag("verbose"));

    let openapi = matches.get_one::<String>("openapi").expect("openapi is required");
    let endpoint_data = matches.get_one::<String>("endpoint_data").expect("endpoint_data has a default");
    let base_url = matches.get_one::<String>("base_url").expect("base_url is required");
    let csv_report = matches.get_flag("csv_report");
    let json_report = matches.get_flag("json_report") || !csv_report;

    let mut config = ScanConfig::new(base_url.as_str());
    if let Some(token) = matches.get_one::<String>("token") {
        config = config.with_token(token.as_str());
    }
    config.probe_timeout = parse_secs(&matches, "probe_timeout");
    config.test_timeout = parse_secs(&matches, "test_timeout");
    config.run_battery = !matches.get_flag("no_battery");
    config.run_lifecycle = !matches.get_flag("no_lifecycle");
    config.run_broken_auth = !matches.get_flag("no_broken_auth");
    if let Some(tenant) = matches.get_one::<String>("tenant") {
        let mut target = LifecycleTarget::new(tenant.as_str());
        if let Some(path) = matches.get_one::<String>("create_path") {
            target.create_path = path.clone();
        }
        if let Some(path) = matches.get_one::<String>("item_path") {
            target.item_path = path.clone();
        }
        if let Some(header) = matches.get_one::<String>("tenant_header") {
            target.tenant_header = header.clone();
        }
        config = config.with_lifecycle(target);
    }

    // configuration errors stop the run before any request is sent
    let catalog = load_catalog(openapi).unwrap_or_else(|e| {
        tracing::error!("{}", e);
        std::process::exit(1);
    });
    let specs = SpecStore::load(endpoint_data).unwrap_or_else(|e| {
        tracing::error!("{}", e);
        std::process::exit(1);
    });
    let scanner = Scanner::new(config).unwrap_or_else(|e| {
        tracing::error!("{}", e);
        std::process::exit(2);
    });

    let report = scanner.run(&catalog, &specs).await;

    for finding in &report.broken_auth {
        println!("{}", finding);
    }
    let elapsed = report.finished_at - report.started_at;
    println!(
        "Finished in {} ms: {} passed, {} failed, {} total",
        elapsed.num_milliseconds(),
        report.passed(),
        report.failed(),
        report.total()
    );

    if json_report {
        match export_json(&report) {
            Ok(path) => println!("JSON report: {}", path.display()),
            Err(e) => tracing::error!("failed to write JSON report: {}", e),
        }
    }
    if csv_report {
        match export_csv(&report) {
            Ok(path) => println!("CSV report: {}", path.display()),
            Err(e) => tracing::error!("failed to write CSV report: {}", e),
        }
    }
}
