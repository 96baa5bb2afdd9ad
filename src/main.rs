use std::path::{Path, PathBuf};

use ff::{
    api_defaults::{CONFIG_PATH, DEFAULT_STORAGE_LOCATION},
    cli::{parse_cli, CliOptions},
    cmds::{self, request::Format},
    config::{domain_of, read_config},
    error, logging, Result,
};

fn main() -> Result<()> {
    let option_args = parse_cli();
    let cli_args = option_args.cli_args;
    logging::init(cli_args.verbose);

    let home_dir = std::env::var("HOME")
        .map_err(|_| error::gen("HOME is not set. Cannot locate config and storage."))?;
    let config_file = cli_args
        .config
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(&home_dir).join(CONFIG_PATH));
    let default_storage_location = Path::new(&home_dir).join(DEFAULT_STORAGE_LOCATION);
    let default_storage_location = default_storage_location.to_string_lossy();

    match option_args.cli_options {
        CliOptions::Text(args) => {
            let config = read_config(&config_file, domain_of(&args.url), &default_storage_location)?;
            cmds::request::execute(Format::Text, args, config)
        }
        CliOptions::Json(args) => {
            let config = read_config(&config_file, domain_of(&args.url), &default_storage_location)?;
            cmds::request::execute(Format::Json, args, config)
        }
        CliOptions::Storage(options) => {
            let config = read_config(&config_file, "", &default_storage_location)?;
            cmds::storage::execute(options, config)
        }
    }
}
