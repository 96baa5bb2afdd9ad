pub mod request;
pub mod storage;

use clap::Parser;

use self::request::{RequestCliArgs, RequestCommand};
use self::storage::{StorageCommand, StorageOptions};

#[derive(Parser)]
#[command(about = "Fetch HTTP resources and keep fresh copies in local storage")]
struct Args {
    #[clap(subcommand)]
    pub command: Command,
    /// Verbose mode. Log cache hits, misses and transport details to STDERR
    #[clap(long, short, global = true)]
    pub verbose: bool,
    /// Path to the config file. Defaults to ~/.config/fresh-fetch/config
    #[clap(long, global = true, value_name = "PATH")]
    pub config: Option<String>,
}

#[derive(Parser)]
enum Command {
    #[clap(about = "Fetch a resource and print its body as text")]
    Text(RequestCommand),
    #[clap(about = "Fetch a resource and pretty print its body as JSON")]
    Json(RequestCommand),
    #[clap(about = "Inspect the local storage")]
    Storage(StorageCommand),
}

/// Flags that apply to every subcommand.
pub struct CliArgs {
    pub verbose: bool,
    pub config: Option<String>,
}

pub struct OptionArgs {
    pub cli_options: CliOptions,
    pub cli_args: CliArgs,
}

pub enum CliOptions {
    Text(RequestCliArgs),
    Json(RequestCliArgs),
    Storage(StorageOptions),
}

pub fn parse_cli() -> OptionArgs {
    let args = Args::parse();
    let cli_args = CliArgs {
        verbose: args.verbose,
        config: args.config,
    };
    let cli_options = match args.command {
        Command::Text(sub_matches) => CliOptions::Text(sub_matches.into()),
        Command::Json(sub_matches) => CliOptions::Json(sub_matches.into()),
        Command::Storage(sub_matches) => CliOptions::Storage(sub_matches.into()),
    };
    OptionArgs {
        cli_options,
        cli_args,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::http::Method;

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::parse_from(["ff", "text", "https://example.com", "-v"]);
        assert!(args.verbose);
        assert!(args.config.is_none());
    }

    #[test]
    fn test_text_command_maps_to_request_args() {
        let args = Args::parse_from([
            "ff",
            "--config",
            "/tmp/ff.conf",
            "text",
            "https://example.com",
            "--key",
            "home",
            "-X",
            "post",
        ]);
        assert_eq!(Some("/tmp/ff.conf".to_string()), args.config);
        match args.command {
            Command::Text(command) => {
                let request: RequestCliArgs = command.into();
                assert_eq!("https://example.com", request.url);
                assert_eq!(Some("home".to_string()), request.options.storage_key);
                assert_eq!(Some(Method::POST), request.options.method);
            }
            _ => panic!("Expected text command"),
        }
    }

    #[test]
    fn test_storage_show_command() {
        let args = Args::parse_from(["ff", "storage", "show", "home"]);
        match args.command {
            Command::Storage(command) => match StorageOptions::from(command) {
                StorageOptions::Show { key } => assert_eq!("home", key),
                _ => panic!("Expected show"),
            },
            _ => panic!("Expected storage command"),
        }
    }
}
