// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod listing;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use followup_app::DashboardState;
use followup_client::Client;
use followup_tui::UiOptions;
use listing::ListFilters;
use runtime::HttpRuntime;
use std::env;
use std::io;
use std::path::PathBuf;
use tracing::info;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `followup --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let interactive = !options.check_only && options.list.is_none();
    logging::init(&config, interactive);

    let client = Client::new(config.base_url(), config.timeout()?).with_context(|| {
        format!(
            "invalid [service] config in {}; fix base_url/timeout values",
            options.config_path.display()
        )
    })?;
    info!(base_url = client.base_url(), timeout = ?client.timeout(), "records service configured");

    if options.check_only {
        return listing::check(&client, client.base_url(), &mut io::stdout().lock());
    }

    if let Some(filters) = &options.list {
        return listing::list(&client, filters, &mut io::stdout().lock());
    }

    let ui_options = UiOptions {
        title: format!("followup | {}", client.base_url()),
        statuses: config.statuses(),
        categories: config.categories(),
        status_clear: config.status_clear()?,
    };
    let mut dashboard = DashboardState::default();
    let mut runtime = HttpRuntime::new(client);
    followup_tui::run_app(&mut dashboard, &mut runtime, &ui_options)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    list: Option<ListFilters>,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        check_only: false,
        list: None,
        show_help: false,
    };
    let mut list = false;
    let mut filters = ListFilters::default();
    let mut filter_given = false;

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        let arg = arg.as_ref();
        match arg {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--search" | "--status" | "--category" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("{arg} requires a value"))?;
                let value = value.as_ref().to_owned();
                match arg {
                    "--search" => filters.search = value,
                    "--status" => filters.status = Some(value),
                    _ => filters.category = Some(value),
                }
                filter_given = true;
            }
            "--list" => {
                list = true;
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                bail!("unknown argument {unknown:?}; run with --help to see supported options");
            }
        }
    }

    if filter_given && !list {
        bail!("--search, --status, and --category only apply with --list");
    }
    if list {
        options.list = Some(filters);
    }
    Ok(options)
}

fn print_help() {
    println!("followup");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --check                  Validate config and load records once");
    println!("  --list                   Print records as tab-separated text and exit");
    println!("  --search <text>          With --list: match name or phone");
    println!("  --status <status>        With --list: match status");
    println!("  --category <category>    With --list: match category");
    println!("  --help                   Show this help");
}
