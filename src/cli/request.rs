use clap::{Parser, ValueEnum};

use crate::http::{
    AbortSignal, CacheMode, Credentials, Headers, Method, Redirect, RequestOptions,
};
use crate::time::Seconds;

#[derive(Parser)]
pub struct RequestCommand {
    /// URL of the resource
    #[clap()]
    pub url: String,
    #[clap(flatten)]
    pub storage_args: StorageArgs,
    #[clap(flatten)]
    pub fetch_args: FetchArgs,
}

#[derive(Clone, Parser)]
#[clap(next_help_heading = "Storage options")]
pub struct StorageArgs {
    /// Storage key for the response. Defaults to the URL
    #[clap(long)]
    pub key: Option<String>,
    /// How long a stored response stays fresh, e.g. 30s, 5m, 1h. Defaults to
    /// the storage_expires config value
    #[clap(long, value_parser = parse_time, value_name = "TIME")]
    pub expires: Option<Seconds>,
    /// Reserved storage list name. Accepted but has no effect
    #[clap(long)]
    pub list: Option<String>,
}

#[derive(Clone, Parser)]
#[clap(next_help_heading = "Fetch options")]
pub struct FetchArgs {
    /// HTTP method
    #[clap(long, short = 'X', ignore_case = true)]
    pub method: Option<MethodCli>,
    /// Request header as "Name: value". Can be repeated
    #[clap(long = "header", short = 'H', value_parser = parse_header, value_name = "HEADER")]
    pub headers: Vec<(String, String)>,
    /// Request body
    #[clap(long, short = 'd')]
    pub data: Option<String>,
    /// Redirect handling
    #[clap(long)]
    pub redirect: Option<RedirectCli>,
    /// Cache mode sent to the server
    #[clap(long)]
    pub cache: Option<CacheModeCli>,
    /// Credentials mode. omit strips Authorization and Cookie headers
    #[clap(long)]
    pub credentials: Option<CredentialsCli>,
    /// Referrer URL sent as the Referer header
    #[clap(long)]
    pub referrer: Option<String>,
    /// Subresource integrity metadata, e.g. sha256-<base64 digest>
    #[clap(long)]
    pub integrity: Option<String>,
    /// Abort the request after the given time, e.g. 10s. Defaults to the
    /// timeout config value
    #[clap(long, value_parser = parse_time, value_name = "TIME")]
    pub timeout: Option<Seconds>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum MethodCli {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl From<MethodCli> for Method {
    fn from(method: MethodCli) -> Self {
        match method {
            MethodCli::Get => Method::GET,
            MethodCli::Head => Method::HEAD,
            MethodCli::Post => Method::POST,
            MethodCli::Put => Method::PUT,
            MethodCli::Patch => Method::PATCH,
            MethodCli::Delete => Method::DELETE,
            MethodCli::Options => Method::OPTIONS,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum RedirectCli {
    Follow,
    Error,
    Manual,
}

impl From<RedirectCli> for Redirect {
    fn from(redirect: RedirectCli) -> Self {
        match redirect {
            RedirectCli::Follow => Redirect::Follow,
            RedirectCli::Error => Redirect::Error,
            RedirectCli::Manual => Redirect::Manual,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum CacheModeCli {
    Default,
    NoStore,
    Reload,
    NoCache,
    ForceCache,
    OnlyIfCached,
}

impl From<CacheModeCli> for CacheMode {
    fn from(cache: CacheModeCli) -> Self {
        match cache {
            CacheModeCli::Default => CacheMode::Default,
            CacheModeCli::NoStore => CacheMode::NoStore,
            CacheModeCli::Reload => CacheMode::Reload,
            CacheModeCli::NoCache => CacheMode::NoCache,
            CacheModeCli::ForceCache => CacheMode::ForceCache,
            CacheModeCli::OnlyIfCached => CacheMode::OnlyIfCached,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum CredentialsCli {
    Omit,
    SameOrigin,
    Include,
}

impl From<CredentialsCli> for Credentials {
    fn from(credentials: CredentialsCli) -> Self {
        match credentials {
            CredentialsCli::Omit => Credentials::Omit,
            CredentialsCli::SameOrigin => Credentials::SameOrigin,
            CredentialsCli::Include => Credentials::Include,
        }
    }
}

/// A request as given on the command line.
#[derive(Debug)]
pub struct RequestCliArgs {
    pub url: String,
    pub options: RequestOptions,
}

impl From<RequestCommand> for RequestCliArgs {
    fn from(command: RequestCommand) -> Self {
        let storage_args = command.storage_args;
        let fetch_args = command.fetch_args;
        let headers = if fetch_args.headers.is_empty() {
            None
        } else {
            Some(fetch_args.headers.into_iter().collect::<Headers>())
        };
        let options = RequestOptions {
            method: fetch_args.method.map(Method::from),
            headers,
            body: fetch_args.data,
            credentials: fetch_args.credentials.map(Credentials::from),
            cache: fetch_args.cache.map(CacheMode::from),
            redirect: fetch_args.redirect.map(Redirect::from),
            referrer: fetch_args.referrer,
            integrity: fetch_args.integrity,
            signal: fetch_args.timeout.map(AbortSignal::timeout),
            storage_expires: storage_args.expires,
            storage_key: Some(storage_args.key.unwrap_or_else(|| command.url.clone())),
            storage_list: storage_args.list,
            ..RequestOptions::default()
        };
        RequestCliArgs {
            url: command.url,
            options,
        }
    }
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    let Some((name, value)) = s.split_once(':') else {
        return Err(String::from("Header must be in the format \"Name: value\""));
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(String::from("Header name cannot be empty"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn parse_time(s: &str) -> Result<Seconds, String> {
    Seconds::try_from(s).map_err(|err| err.to_string())
}
