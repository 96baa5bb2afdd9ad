pub mod integrity;

use crate::api_defaults::DEFAULT_STORAGE_EXPIRES;
use crate::config::ConfigProperties;
use crate::error::FFError;
use crate::freshness::{Slot, StoredContent};
use crate::io::{HttpResponse, HttpRunner};
use crate::storage::Storage;
use crate::time::{Clock, Seconds, SystemClock};
use crate::Result;
use crate::{log_debug, log_error, log_info};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::collections::{hash_map, HashMap};
use std::fmt::{self, Display, Formatter};
use ureq::typestate::{WithBody, WithoutBody};
use ureq::{Agent, Body, RequestBuilder};

/// Requests are served from storage while fresh and go to the network
/// otherwise. Successful network responses are stored back under the
/// request's storage key.
pub struct Client<S, R, K = SystemClock> {
    storage: S,
    runner: R,
    clock: K,
}

impl<S, R> Client<S, R> {
    pub fn new(storage: S, runner: R) -> Self {
        Client {
            storage,
            runner,
            clock: SystemClock,
        }
    }
}

impl<S, R, K> Client<S, R, K> {
    pub fn with_clock<C>(self, clock: C) -> Client<S, R, C> {
        Client {
            storage: self.storage,
            runner: self.runner,
            clock,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

impl<S: Storage, R: HttpRunner, K: Clock> Client<S, R, K> {
    /// Fetch `target` and decode its content as JSON.
    ///
    /// A stored entry is only served if it has content. Entries stored with
    /// null content go to the network again.
    pub fn json_request<T: DeserializeOwned>(
        &self,
        target: &str,
        options: &RequestOptions,
    ) -> Result<Option<T>> {
        let current_date = self.clock.now();
        let slot = self.slot(options, current_date);
        if let Some(StoredContent {
            content: Some(content),
            ..
        }) = slot.read(&self.storage)?
        {
            log_info!("Serving {} from storage", target);
            return json_loads(&content).map(Some);
        }
        let stored_content = self.fetch(target, options, &slot)?;
        stored_content
            .content
            .as_deref()
            .map(json_loads::<T>)
            .transpose()
    }

    /// Fetch `target` and return its content as text.
    ///
    /// Unlike [`Client::json_request`], any fresh stored entry is final, even
    /// one with null content: `None` is returned without contacting the
    /// network.
    pub fn text_request(&self, target: &str, options: &RequestOptions) -> Result<Option<String>> {
        let current_date = self.clock.now();
        let slot = self.slot(options, current_date);
        if let Some(stored_content) = slot.read(&self.storage)? {
            log_info!("Serving {} from storage", target);
            return Ok(stored_content.content);
        }
        Ok(self.fetch(target, options, &slot)?.content)
    }

    fn slot<'a>(&self, options: &'a RequestOptions, current_date: DateTime<Utc>) -> Slot<'a> {
        let storage_expires = options
            .storage_expires
            .unwrap_or(Seconds::new(DEFAULT_STORAGE_EXPIRES));
        Slot::new(options.storage_key.as_deref(), current_date, storage_expires)
    }

    fn fetch(&self, target: &str, options: &RequestOptions, slot: &Slot) -> Result<StoredContent> {
        if let Some(storage_list) = &options.storage_list {
            log_debug!("storage_list {} is reserved and has no effect", storage_list);
        }
        let fetch_options = filter_options(options);
        log_info!("Fetching {}", target);
        let response = self.runner.run(target, &fetch_options).map_err(|err| {
            log_error!("Fetching {} failed: {}", target, err);
            err
        })?;
        slot.write(&self.storage, &response)
    }
}

fn json_loads<T: DeserializeOwned>(data: &str) -> Result<T> {
    serde_json::from_str(data).map_err(|err| FFError::JsonParseError(err.to_string()).into())
}

/// Copy the options the transport understands. Storage control fields and
/// anything else never reach the runner.
pub fn filter_options(options: &RequestOptions) -> FetchOptions {
    FetchOptions {
        method: options.method,
        headers: options.headers.clone(),
        body: options.body.clone(),
        mode: options.mode,
        credentials: options.credentials,
        cache: options.cache,
        redirect: options.redirect,
        referrer: options.referrer.clone(),
        referrer_policy: options.referrer_policy,
        integrity: options.integrity.clone(),
        keepalive: options.keepalive,
        signal: options.signal,
    }
}

/// Options accepted by the request operations: the transport fields plus the
/// storage control fields.
#[derive(Builder, Clone, Debug, Default, PartialEq)]
#[builder(pattern = "owned", default, setter(into, strip_option))]
pub struct RequestOptions {
    pub method: Option<Method>,
    pub headers: Option<Headers>,
    pub body: Option<String>,
    pub mode: Option<RequestMode>,
    pub credentials: Option<Credentials>,
    pub cache: Option<CacheMode>,
    pub redirect: Option<Redirect>,
    pub referrer: Option<String>,
    pub referrer_policy: Option<ReferrerPolicy>,
    pub integrity: Option<String>,
    pub keepalive: Option<bool>,
    pub signal: Option<AbortSignal>,
    /// Seconds a stored response stays fresh. Defaults to 300.
    pub storage_expires: Option<Seconds>,
    /// Storage slot for this request. Without it nothing is read or stored
    /// and requests resolve to `None`.
    pub storage_key: Option<String>,
    /// Reserved. Accepted but has no effect.
    pub storage_list: Option<String>,
}

impl RequestOptions {
    pub fn builder() -> RequestOptionsBuilder {
        RequestOptionsBuilder::default()
    }
}

/// What the transport gets to see of a request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FetchOptions {
    pub method: Option<Method>,
    pub headers: Option<Headers>,
    pub body: Option<String>,
    pub mode: Option<RequestMode>,
    pub credentials: Option<Credentials>,
    pub cache: Option<CacheMode>,
    pub redirect: Option<Redirect>,
    pub referrer: Option<String>,
    pub referrer_policy: Option<ReferrerPolicy>,
    pub integrity: Option<String>,
    pub keepalive: Option<bool>,
    pub signal: Option<AbortSignal>,
}

/// HTTP headers. Names are case-insensitive and kept in lowercase.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Headers(HashMap<String, String>);

impl Headers {
    pub fn new() -> Self {
        Headers(HashMap::new())
    }

    pub fn set<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.0.insert(key.into().to_lowercase(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.0.get(&key.to_lowercase())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(&key.to_lowercase())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(&key.to_lowercase())
    }

    pub fn iter(&self) -> hash_map::Iter<String, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (key, value) in iter {
            headers.set(key, value);
        }
        headers
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Method {
    #[default]
    GET,
    HEAD,
    POST,
    PUT,
    PATCH,
    DELETE,
    OPTIONS,
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let method = match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::PATCH => "PATCH",
            Method::DELETE => "DELETE",
            Method::OPTIONS => "OPTIONS",
        };
        write!(f, "{method}")
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum RequestMode {
    #[default]
    Cors,
    NoCors,
    SameOrigin,
    Navigate,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Credentials {
    Omit,
    #[default]
    SameOrigin,
    Include,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum CacheMode {
    #[default]
    Default,
    NoStore,
    Reload,
    NoCache,
    ForceCache,
    OnlyIfCached,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Redirect {
    #[default]
    Follow,
    Error,
    Manual,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum ReferrerPolicy {
    NoReferrer,
    NoReferrerWhenDowngrade,
    Origin,
    OriginWhenCrossOrigin,
    SameOrigin,
    StrictOrigin,
    #[default]
    StrictOriginWhenCrossOrigin,
    UnsafeUrl,
}

/// Bounds the time a transport call may take.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AbortSignal {
    timeout: Seconds,
}

impl AbortSignal {
    pub fn timeout(timeout: Seconds) -> Self {
        AbortSignal { timeout }
    }

    pub fn duration(&self) -> Seconds {
        self.timeout
    }
}

// Maximum number of redirects followed with Redirect::Follow
const MAX_REDIRECTS: u32 = 20;

/// Blocking transport backed by ureq.
pub struct UreqRunner<D> {
    config: D,
}

impl<D: ConfigProperties> UreqRunner<D> {
    pub fn new(config: D) -> Self {
        UreqRunner { config }
    }

    fn agent(&self, options: &FetchOptions) -> Agent {
        let max_redirects = match options.redirect.unwrap_or_default() {
            Redirect::Follow => MAX_REDIRECTS,
            Redirect::Error | Redirect::Manual => 0,
        };
        let timeout = options
            .signal
            .map(|signal| signal.duration())
            .or(self.config.timeout())
            .map(Seconds::to_duration);
        let config = Agent::config_builder()
            .http_status_as_error(false)
            .max_redirects(max_redirects)
            .max_redirects_will_error(false)
            .timeout_global(timeout)
            .build();
        Agent::new_with_config(config)
    }

    fn request_headers(&self, options: &FetchOptions) -> Headers {
        let mut headers = options.headers.clone().unwrap_or_default();
        if !headers.contains("user-agent") {
            headers.set("user-agent", self.config.user_agent());
        }
        if let Some(referrer) = &options.referrer {
            if !referrer.is_empty() {
                headers.set("referer", referrer.as_str());
            }
        }
        if options.credentials == Some(Credentials::Omit) {
            headers.remove("authorization");
            headers.remove("cookie");
        }
        if let Some(CacheMode::NoStore | CacheMode::NoCache | CacheMode::Reload) = options.cache {
            if !headers.contains("cache-control") {
                headers.set("cache-control", "no-cache");
            }
        }
        headers
    }
}

fn log_browser_only_options(options: &FetchOptions) {
    if let Some(mode) = options.mode {
        log_debug!("Request mode {:?} has no effect outside a browser", mode);
    }
    if let Some(referrer_policy) = options.referrer_policy {
        log_debug!(
            "Referrer policy {:?} has no effect outside a browser",
            referrer_policy
        );
    }
    if let Some(keepalive) = options.keepalive {
        log_debug!("keepalive {} has no effect, connections are pooled", keepalive);
    }
    if let Some(cache @ (CacheMode::ForceCache | CacheMode::OnlyIfCached)) = options.cache {
        log_debug!("Cache mode {:?} has no effect outside a browser", cache);
    }
}

fn with_headers<B>(request: RequestBuilder<B>, headers: &Headers) -> RequestBuilder<B> {
    headers
        .iter()
        .fold(request, |req, (key, value)| req.header(key.as_str(), value.as_str()))
}

fn call(
    request: RequestBuilder<WithoutBody>,
    headers: &Headers,
) -> std::result::Result<ureq::http::Response<Body>, ureq::Error> {
    with_headers(request, headers).call()
}

fn send(
    request: RequestBuilder<WithBody>,
    headers: &Headers,
    body: Option<&str>,
) -> std::result::Result<ureq::http::Response<Body>, ureq::Error> {
    let request = with_headers(request, headers);
    match body {
        Some(body) => request.send(body),
        None => request.send_empty(),
    }
}

impl<D: ConfigProperties> HttpRunner for UreqRunner<D> {
    fn run(&self, target: &str, options: &FetchOptions) -> Result<HttpResponse> {
        let method = options.method.unwrap_or_default();
        let body = options.body.as_deref();
        if body.is_some() && matches!(method, Method::GET | Method::HEAD) {
            return Err(FFError::HttpTransportError(format!(
                "Request with {method} method cannot have a body"
            ))
            .into());
        }
        log_browser_only_options(options);
        let headers = self.request_headers(options);
        let agent = self.agent(options);
        log_debug!("{} {}", method, target);
        let result = match method {
            Method::GET => call(agent.get(target), &headers),
            Method::HEAD => call(agent.head(target), &headers),
            Method::DELETE => call(agent.delete(target), &headers),
            Method::OPTIONS => call(agent.options(target), &headers),
            Method::POST => send(agent.post(target), &headers, body),
            Method::PUT => send(agent.put(target), &headers, body),
            Method::PATCH => send(agent.patch(target), &headers, body),
        };
        let mut response =
            result.map_err(|err| FFError::HttpTransportError(format!("{target}: {err}")))?;

        let status = response.status().as_u16();
        if options.redirect == Some(Redirect::Error) && (300..400).contains(&status) {
            return Err(FFError::RedirectError(format!(
                "{target} redirected with status {status}"
            ))
            .into());
        }
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| Some((name.as_str(), value.to_str().ok()?)))
            .collect::<Headers>();
        // Whole body, no size cap. Invalid UTF-8 is replaced, not an error.
        let bytes = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(|err| FFError::HttpTransportError(format!("{target}: {err}")))?;
        if let Some(integrity) = &options.integrity {
            integrity::verify(integrity, &bytes)?;
        }
        let body = String::from_utf8_lossy(&bytes).into_owned();
        let response = HttpResponse::builder()
            .status(status)
            .body(body)
            .headers(headers)
            .build()?;
        log_debug!("{} {} -> {}", method, target, response.status);
        Ok(response)
    }
}
