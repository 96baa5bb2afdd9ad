use crate::cli::request::RequestCliArgs;
use crate::config::{Config, ConfigProperties};
use crate::http::{Client, RequestOptions, UreqRunner};
use crate::io::HttpRunner;
use crate::log_info;
use crate::storage::{FileStorage, Storage};
use crate::time::Clock;
use crate::Result;
use std::io::Write;
use std::sync::Arc;

/// How the fetched content is decoded and printed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Format {
    Text,
    Json,
}

pub fn execute(format: Format, args: RequestCliArgs, config: Arc<Config>) -> Result<()> {
    let storage = FileStorage::new(config.clone());
    storage.ensure_storage_location()?;
    let runner = UreqRunner::new(config.clone());
    let client = Client::new(storage, runner);
    let options = with_config_defaults(args.options, &config);
    match format {
        Format::Text => print_text(&client, &args.url, &options, std::io::stdout()),
        Format::Json => print_json(&client, &args.url, &options, std::io::stdout()),
    }
}

/// The configured time to live applies unless given on the command line.
fn with_config_defaults<D: ConfigProperties>(
    mut options: RequestOptions,
    config: &D,
) -> RequestOptions {
    if options.storage_expires.is_none() {
        options.storage_expires = Some(config.storage_expires());
    }
    options
}

fn print_text<S: Storage, R: HttpRunner, K: Clock, W: Write>(
    client: &Client<S, R, K>,
    url: &str,
    options: &RequestOptions,
    mut writer: W,
) -> Result<()> {
    match client.text_request(url, options)? {
        Some(text) => writer.write_all(text.as_bytes())?,
        None => log_info!("No content for {}", url),
    }
    Ok(())
}

fn print_json<S: Storage, R: HttpRunner, K: Clock, W: Write>(
    client: &Client<S, R, K>,
    url: &str,
    options: &RequestOptions,
    mut writer: W,
) -> Result<()> {
    match client.json_request::<serde_json::Value>(url, options)? {
        Some(value) => writeln!(writer, "{}", serde_json::to_string_pretty(&value)?)?,
        None => log_info!("No content for {}", url),
    }
    Ok(())
}
