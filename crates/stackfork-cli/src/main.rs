//! `stackfork` command line entry point

use std::path::PathBuf;

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use stackfork_cli::{
    randomize_into, rename_file, write_file, CliConfig, LogFormat, OutputFormat, RenameRequest,
};
use stackfork_model::ResourceKind;
use stackfork_rename::{new_token, Suffix};
use tracing_subscriber::EnvFilter;

fn suffix_arg() -> Arg {
    Arg::new("suffix")
        .long("suffix")
        .value_parser(|s: &str| s.parse::<Suffix>())
        .help("Suffix to append (random 8-character token if omitted)")
}

fn preserve_network_arg() -> Arg {
    Arg::new("preserve-network")
        .long("preserve-network")
        .action(ArgAction::Append)
        .help("Network name to keep unrenamed (repeatable)")
}

fn file_arg() -> Arg {
    Arg::new("file")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Compose file (.json for JSON, YAML otherwise)")
}

fn cli() -> Command {
    Command::new("stackfork")
        .version(stackfork_rename::VERSION)
        .about("Collision-free renaming of compose documents")
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .subcommand(Command::new("token").about("Print a fresh random suffix"))
        .subcommand(
            Command::new("rename")
                .about("Rename every identifier in a compose file")
                .arg(file_arg())
                .arg(suffix_arg())
                .arg(
                    Arg::new("kind")
                        .long("kind")
                        .value_parser(|s: &str| s.parse::<ResourceKind>())
                        .help("Rename only volumes, networks, configs or secrets"),
                )
                .arg(preserve_network_arg())
                .arg(
                    Arg::new("format")
                        .long("format")
                        .value_parser(["yaml", "json"])
                        .help("Output format [default: from config, else yaml]"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_parser(value_parser!(PathBuf))
                        .help("Write here instead of stdout"),
                ),
        )
        .subcommand(
            Command::new("randomize")
                .about("Write a renamed compose file and its env file into a directory")
                .arg(file_arg())
                .arg(suffix_arg())
                .arg(
                    Arg::new("env-file")
                        .long("env-file")
                        .value_parser(value_parser!(PathBuf))
                        .help("Env file to extend with the suffix variable"),
                )
                .arg(preserve_network_arg())
                .arg(
                    Arg::new("shared-volumes")
                        .long("shared-volumes")
                        .action(ArgAction::SetTrue)
                        .help("Keep named volume names so instances share data"),
                )
                .arg(
                    Arg::new("out-dir")
                        .long("out-dir")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory receiving docker-compose.yml and .env"),
                ),
        )
}

fn init_tracing(config: &CliConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match config.log_format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Text => subscriber.init(),
    }
}

fn suffix_of(args: &ArgMatches) -> Suffix {
    args.get_one::<Suffix>("suffix")
        .cloned()
        .unwrap_or_else(new_token)
}

fn preserved_of(args: &ArgMatches) -> Vec<&str> {
    args.get_many::<String>("preserve-network")
        .map(|names| names.map(String::as_str).collect())
        .unwrap_or_default()
}

fn file_of(args: &ArgMatches) -> anyhow::Result<&PathBuf> {
    args.get_one::<PathBuf>("file")
        .context("missing compose file argument")
}

fn rename(args: &ArgMatches, config: &CliConfig) -> anyhow::Result<()> {
    let input = file_of(args)?;
    let format = match args.get_one::<String>("format") {
        Some(name) => name.parse::<OutputFormat>()?,
        None => config.format,
    };
    let request = RenameRequest {
        suffix: suffix_of(args),
        kind: args.get_one::<ResourceKind>("kind").copied(),
        options: config.rename_options(&preserved_of(args)),
        format,
    };

    let text = rename_file(input, &request)
        .with_context(|| format!("renaming {}", input.display()))?;

    match args.get_one::<PathBuf>("output") {
        Some(output) => {
            write_file(output, &text)?;
            tracing::info!(
                "Renamed {} with suffix '{}' into {}",
                input.display(),
                request.suffix,
                output.display()
            );
        }
        None => print!("{text}"),
    }
    Ok(())
}

fn randomize(args: &ArgMatches, config: &CliConfig) -> anyhow::Result<()> {
    let input = file_of(args)?;
    let out_dir = args
        .get_one::<PathBuf>("out-dir")
        .context("missing --out-dir")?;
    let env_file = args.get_one::<PathBuf>("env-file").map(PathBuf::as_path);
    let mut options = config.deployable_options(&preserved_of(args));
    if args.get_flag("shared-volumes") {
        options.isolate_volumes = false;
    }

    let deployable = randomize_into(input, env_file, out_dir, &suffix_of(args), &options)
        .with_context(|| format!("randomizing {}", input.display()))?;

    println!("{}", deployable.suffix);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();

    let config = CliConfig::load_or_default(
        matches.get_one::<PathBuf>("config").map(PathBuf::as_path),
    )?;
    init_tracing(&config);

    match matches.subcommand() {
        Some(("token", _)) => println!("{}", new_token()),
        Some(("rename", args)) => rename(args, &config)?,
        Some(("randomize", args)) => randomize(args, &config)?,
        _ => {}
    }
    Ok(())
}
