/// Content-Format values
pub mod content_format;
pub use content_format::ContentFormat;

macro_rules! opt {
  (rfc7252($section:literal) $name:ident = $n:literal) => {
    #[doc = ::toad_macros::rfc_7252_doc!($section)]
    #[allow(clippy::zero_prefixed_literal)]
    pub const $name: crate::OptNumber = crate::OptNumber($n);
  };
  (#[doc = $doc:expr] $name:ident = $n:literal) => {
    #[doc = $doc]
    #[allow(clippy::zero_prefixed_literal)]
    pub const $name: crate::OptNumber = crate::OptNumber($n);
  };
}

opt!(rfc7252("5.10.8.1") IF_MATCH = 1);
opt!(rfc7252("5.10.1") URI_HOST = 3);
opt!(rfc7252("5.10.6") ETAG = 4);
opt!(rfc7252("5.10.8.2") IF_NONE_MATCH = 5);
opt!(#[doc = "See [`URI_HOST`]"]
     URI_PORT = 7);
opt!(rfc7252("5.10.7") LOCATION_PATH = 8);
opt!(#[doc = "See [`URI_HOST`]"]
     URI_PATH = 11);
opt!(rfc7252("5.10.3") CONTENT_FORMAT = 12);
opt!(rfc7252("5.10.5") MAX_AGE = 14);
opt!(#[doc = "See [`URI_HOST`]"]
     URI_QUERY = 15);
opt!(rfc7252("5.10.4") ACCEPT = 16);
opt!(#[doc = "See [`LOCATION_PATH`]"]
     LOCATION_QUERY = 20);
opt!(rfc7252("5.10.2") PROXY_URI = 35);
opt!(#[doc = "See [`PROXY_URI`]"]
     PROXY_SCHEME = 39);

/// Human-readable name of a known option number
///
/// ```
/// use iopi_msg::opt::known::{name, URI_PATH};
/// use iopi_msg::OptNumber;
///
/// assert_eq!(name(URI_PATH), Some("Uri-Path"));
/// assert_eq!(name(OptNumber(2)), None);
/// ```
pub fn name(n: crate::OptNumber) -> Option<&'static str> {
  match n {
    | IF_MATCH => Some("If-Match"),
    | URI_HOST => Some("Uri-Host"),
    | ETAG => Some("ETag"),
    | IF_NONE_MATCH => Some("If-None-Match"),
    | URI_PORT => Some("Uri-Port"),
    | LOCATION_PATH => Some("Location-Path"),
    | URI_PATH => Some("Uri-Path"),
    | CONTENT_FORMAT => Some("Content-Format"),
    | MAX_AGE => Some("Max-Age"),
    | URI_QUERY => Some("Uri-Query"),
    | ACCEPT => Some("Accept"),
    | LOCATION_QUERY => Some("Location-Query"),
    | PROXY_URI => Some("Proxy-Uri"),
    | PROXY_SCHEME => Some("Proxy-Scheme"),
    | _ => None,
  }
}
