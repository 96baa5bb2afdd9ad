use crate::http::{FetchOptions, Headers};
use crate::Result;

/// A trait for the HTTP protocol. Implementors receive the request target and
/// the transport options that survived filtering, and hand back the response.
/// Clients can potentially do HTTP calls against a remote server or mock the
/// responses for testing purposes.
///
/// Non-2xx statuses are responses, not errors. Errors are reserved for
/// failures where no response could be obtained.
pub trait HttpRunner {
    fn run(&self, target: &str, options: &FetchOptions) -> Result<HttpResponse>;
}

impl<R: HttpRunner + ?Sized> HttpRunner for &R {
    fn run(&self, target: &str, options: &FetchOptions) -> Result<HttpResponse> {
        (**self).run(target, options)
    }
}

/// Adapts lower level HTTP transport outputs to a common Response.
#[derive(Clone, Debug, Builder)]
pub struct HttpResponse {
    #[builder(default = "200")]
    pub status: u16,
    #[builder(setter(into), default)]
    pub body: String,
    #[builder(default)]
    pub headers: Headers,
}

impl HttpResponse {
    pub fn builder() -> HttpResponseBuilder {
        HttpResponseBuilder::default()
    }

    /// Status in the 200-299 range.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(|s| s.as_str())
    }

    pub fn text(&self) -> &str {
        &self.body
    }
}
