use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::{Path, PathBuf};
use storytest_core::{plan, StorytestConfig, TransformService, CONFIG_FILE};
use storytest_csf::resolve_title;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let config_arg = Arg::new("config")
        .long("config")
        .short('c')
        .value_parser(value_parser!(PathBuf))
        .help("Path to storytest.toml (defaults to ./storytest.toml when present)");

    Command::new("storytest")
        .version(storytest_core::VERSION)
        .about("Transform story modules into browser tests")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines on stderr"),
        )
        .subcommand(
            Command::new("transform")
                .about("Transform a story file and print the test module")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Story file to transform"),
                )
                .arg(config_arg.clone())
                .arg(
                    Arg::new("keep-body")
                        .long("keep-body")
                        .action(ArgAction::SetTrue)
                        .help("Keep original story declarations in the output"),
                )
                .arg(
                    Arg::new("no-empty-test")
                        .long("no-empty-test")
                        .action(ArgAction::SetTrue)
                        .help("Do not insert a placeholder test when no story is emitted"),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .short('o')
                        .value_parser(value_parser!(PathBuf))
                        .help("Write the output to a file instead of stdout"),
                ),
        )
        .subcommand(
            Command::new("title")
                .about("Resolve the display title for a story file path")
                .arg(
                    Arg::new("path")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Story file path"),
                )
                .arg(config_arg.clone())
                .arg(
                    Arg::new("title")
                        .long("title")
                        .help("Explicit title declared by the module"),
                ),
        )
        .subcommand(
            Command::new("plan")
                .about("Show per-story tag decisions for a story file")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Story file to plan"),
                )
                .arg(config_arg)
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
}

async fn load_config(args: &ArgMatches) -> Result<StorytestConfig> {
    let explicit = args.get_one::<PathBuf>("config");
    let default = Path::new(CONFIG_FILE);

    let config = match explicit {
        Some(path) => StorytestConfig::load(path).await?,
        None if default.exists() => StorytestConfig::load(default).await?,
        None => StorytestConfig::new(),
    };
    Ok(config.with_env_overrides())
}

fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().context("failed to determine working directory")
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(current_dir()?.join(path))
    }
}

async fn run_transform(args: &ArgMatches) -> Result<()> {
    let Some(file) = args.get_one::<PathBuf>("file") else {
        bail!("missing story file");
    };
    let mut config = load_config(args).await?;
    if args.get_flag("keep-body") {
        config.transform.clear_original_body = false;
    }
    if args.get_flag("no-empty-test") {
        config.transform.insert_test_if_empty = false;
    }

    let service = TransformService::from_config(&config, &current_dir()?)?;
    let file = absolute(file)?;
    if !service.is_story_file(&file) && !config.stories.is_empty() {
        tracing::warn!(file = %file.display(), "file is not matched by any story location");
    }

    let result = service.transform_file(&file).await?;
    for warning in &result.report.warnings {
        tracing::warn!(%warning, "story excluded");
    }

    match args.get_one::<PathBuf>("out") {
        Some(out) => tokio::fs::write(out, &result.code)
            .await
            .with_context(|| format!("failed to write {}", out.display()))?,
        None => print!("{}", result.code),
    }
    Ok(())
}

async fn run_title(args: &ArgMatches) -> Result<()> {
    let Some(path) = args.get_one::<PathBuf>("path") else {
        bail!("missing story path");
    };
    let config = load_config(args).await?;
    let layout = config.layout(&current_dir()?)?;

    let relative = layout.relative_path(&absolute(path)?);
    let explicit = args.get_one::<String>("title").map(String::as_str);
    println!("{}", resolve_title(&relative, layout.rules(), explicit));
    Ok(())
}

async fn run_plan(args: &ArgMatches) -> Result<()> {
    let Some(file) = args.get_one::<PathBuf>("file") else {
        bail!("missing story file");
    };
    let config = load_config(args).await?;
    let service = TransformService::from_config(&config, &current_dir()?)?;

    let file = absolute(file)?;
    let source = tokio::fs::read_to_string(&file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let (module_plan, warnings) = plan(&source, &file, &service.options_for(&file))?;

    if args.get_flag("json") {
        let report = serde_json::json!({
            "plan": module_plan,
            "warnings": warnings,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", module_plan.title);
    for story in &module_plan.stories {
        println!("  {:<40} {:?}", story.id.as_str(), story.decision);
    }
    for warning in &warnings {
        println!("  excluded: {warning}");
    }
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    match matches.subcommand() {
        Some(("transform", args)) => run_transform(args).await,
        Some(("title", args)) => run_title(args).await,
        Some(("plan", args)) => run_plan(args).await,
        _ => bail!("unknown command"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn transform_flags_parse() {
        let matches = cli()
            .try_get_matches_from(["storytest", "transform", "a.stories.tsx", "--keep-body", "--out", "a.test.js"])
            .unwrap();
        let Some(("transform", args)) = matches.subcommand() else {
            panic!("expected transform subcommand");
        };
        assert!(args.get_flag("keep-body"));
        assert!(!args.get_flag("no-empty-test"));
        assert_eq!(args.get_one::<PathBuf>("out"), Some(&PathBuf::from("a.test.js")));
    }
}
