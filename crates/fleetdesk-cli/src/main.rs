// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow};
use config::Config;
use fleetdesk_app::AppState;
use runtime::{DataSource, FleetStore};
use std::env;
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
            "load config {}; run `fleetdesk --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;
    let settings = config.table_settings()?;
    let source = data_source(&options, &config)?;

    let log_file = config.log_file()?;
    logging::init(&log_file, config.log_level())?;
    info!(config = %options.config_path.display(), "fleetdesk starting");

    let mut store = FleetStore::open(source.clone()).with_context(|| match &source {
        DataSource::Demo => "load demo fleet".to_owned(),
        DataSource::Dir(dir) => format!("load records from {}", dir.display()),
    })?;
    if options.check_only {
        println!("config and records ok ({:?})", store.source());
        return Ok(());
    }

    let mut state = AppState::default();
    fleetdesk_tui::run_app(&mut state, &mut store, &settings)
}

/// `--demo` wins, then `--data`, then `[data].dir`.
fn data_source(options: &CliOptions, config: &Config) -> Result<DataSource> {
    if options.demo {
        return Ok(DataSource::Demo);
    }
    options
        .data_dir
        .clone()
        .or_else(|| config.data_dir())
        .map(DataSource::Dir)
        .ok_or_else(|| {
            anyhow!(
                "no data directory; pass --data <dir>, set [data].dir in {}, or run with --demo",
                options.config_path.display()
            )
        })
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    data_dir: Option<PathBuf>,
    print_config_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        data_dir: None,
        print_config_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--data" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--data requires a directory path"))?;
                options.data_dir = Some(PathBuf::from(value.as_ref()));
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("fleetdesk");
    println!("  --config <path>          Use a specific config path");
    println!("  --data <dir>             Load drivers/buses/routes/trips JSON from <dir>");
    println!("  --demo                   Launch with generated demo records (in-memory)");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --check                  Validate config and records, then exit");
    println!("  --help                   Show this help");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, data_source, parse_cli_args};
    use crate::config::Config;
    use crate::runtime::DataSource;
    use anyhow::Result;
    use std::path::PathBuf;

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/fleetdesk-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                data_dir: None,
                print_config_path: false,
                demo: false,
                print_example: false,
                check_only: false,
                show_help: false,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_config_and_data_paths() -> Result<()> {
        let options = parse_cli_args(
            vec!["--config", "/custom/config.toml", "--data", "/srv/fleet"],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        assert_eq!(options.data_dir, Some(PathBuf::from("/srv/fleet")));
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_values() {
        let error = parse_cli_args(vec!["--config"], default_options_path())
            .expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a file path"));

        let error = parse_cli_args(vec!["--data"], default_options_path())
            .expect_err("missing data value should fail");
        assert!(error.to_string().contains("--data requires a directory path"));
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--wat"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_sets_print_and_check_flags() -> Result<()> {
        let options = parse_cli_args(
            vec!["--print-config-path", "--print-example-config", "--check"],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(!options.demo);
        assert!(options.print_example);
        assert!(options.check_only);
        assert!(!options.show_help);
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_help_flag_for_long_and_short_variants() -> Result<()> {
        let long = parse_cli_args(vec!["--help"], default_options_path())?;
        assert!(long.show_help);

        let short = parse_cli_args(vec!["-h"], default_options_path())?;
        assert!(short.show_help);
        Ok(())
    }

    #[test]
    fn data_source_prefers_demo_then_flag_then_config() -> Result<()> {
        let mut config = Config::default();
        config.data.dir = Some("/from/config".to_owned());

        let demo = parse_cli_args(vec!["--demo", "--data", "/x"], default_options_path())?;
        assert_eq!(data_source(&demo, &config)?, DataSource::Demo);

        let flagged = parse_cli_args(vec!["--data", "/from/flag"], default_options_path())?;
        assert_eq!(
            data_source(&flagged, &config)?,
            DataSource::Dir(PathBuf::from("/from/flag"))
        );

        let plain = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            data_source(&plain, &config)?,
            DataSource::Dir(PathBuf::from("/from/config"))
        );
        Ok(())
    }

    #[test]
    fn data_source_without_any_directory_explains_options() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        let error = data_source(&options, &Config::default()).expect_err("no source");
        assert!(error.to_string().contains("--demo"));
        Ok(())
    }
}
