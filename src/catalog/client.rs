//! Listing API client
//!
//! Wraps a [`RateLimitedFetcher`] with the remote API's request and response
//! conventions: identity and paging query parameters, the `{code, message,
//! data}` envelope, and the location of the item list inside `data`.

use super::identity::Identity;
use crate::config::ApiConfig;
use crate::error::Result;
use crate::http::{FailureKind, FetchFailure, FetchOutcome, FetchRequest, RateLimitedFetcher};
use crate::pagination::PageSource;
use crate::types::OptionStringExt;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};
use url::Url;

/// Public account information
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub identity: Identity,
    /// Display name
    pub name: Option<String>,
    /// Self description
    pub sign: Option<String>,
}

/// Client for the paginated listing API
#[derive(Debug)]
pub struct CatalogClient {
    fetcher: RateLimitedFetcher,
    api: ApiConfig,
    listing_url: Url,
    profile_url: Url,
}

impl CatalogClient {
    /// Create a client; fails if the configured URLs do not parse
    pub fn new(fetcher: RateLimitedFetcher, api: ApiConfig) -> Result<Self> {
        let base = Url::parse(&api.base_url)?;
        let listing_url = base.join(&api.listing_path)?;
        let profile_url = base.join(&api.profile_path)?;

        Ok(Self {
            fetcher,
            api,
            listing_url,
            profile_url,
        })
    }

    /// Get the underlying fetcher
    pub fn fetcher(&self) -> &RateLimitedFetcher {
        &self.fetcher
    }

    /// Get the API description
    pub fn api(&self) -> &ApiConfig {
        &self.api
    }

    /// Fetch public account information
    pub async fn profile(&self, identity: &Identity) -> FetchOutcome<Profile> {
        let request = FetchRequest::new(self.profile_url.as_str())
            .param(&self.api.identity_param, identity);

        let payload = self.fetcher.fetch(&request).await?;
        let data = unwrap_envelope(payload, "profile")?;

        let field = |key: &str| {
            data.get(key)
                .and_then(Value::as_str)
                .map(ToString::to_string)
                .none_if_empty()
        };

        Ok(Profile {
            identity: identity.clone(),
            name: field("name"),
            sign: field("sign"),
        })
    }

    /// Build the listing request for one page
    pub fn listing_request(
        &self,
        identity: &Identity,
        page: u32,
        page_size: u32,
    ) -> FetchRequest {
        FetchRequest::new(self.listing_url.as_str())
            .params(&self.api.extra_params)
            .param(&self.api.identity_param, identity)
            .param(&self.api.page_param, page)
            .param(&self.api.page_size_param, page_size)
    }
}

#[async_trait]
impl PageSource for CatalogClient {
    async fn fetch_page(
        &self,
        identity: &Identity,
        page: u32,
        page_size: u32,
    ) -> FetchOutcome<Vec<Value>> {
        let request = self.listing_request(identity, page, page_size);
        let payload = self.fetcher.fetch(&request).await?;
        let mut data = unwrap_envelope(payload, "listing")?;

        match lookup_mut(&mut data, &self.api.items_path).map(Value::take) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items),
            Some(other) => {
                error!(
                    "Expected an item list at '{}', found {}",
                    self.api.items_path,
                    type_name(&other)
                );
                Err(FetchFailure::new(FailureKind::Decode, 1))
            }
        }
    }
}

/// Check the API status code and take the `data` object
fn unwrap_envelope(payload: Value, what: &str) -> FetchOutcome<Value> {
    let Some(code) = payload.get("code").and_then(Value::as_i64) else {
        error!("{what} response has no status code");
        return Err(FetchFailure::new(FailureKind::Decode, 1));
    };

    if code != 0 {
        let message = payload
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        error!(code, "{what} request rejected: {message}");
        return Err(FetchFailure::new(FailureKind::ApiRejected(code), 1));
    }

    let mut payload = payload;
    let data = payload
        .get_mut("data")
        .map(Value::take)
        .unwrap_or(Value::Null);
    debug!("{what} response accepted");
    Ok(data)
}

/// Follow a dotted path through nested objects
fn lookup_mut<'a>(value: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    if path.is_empty() {
        return Some(value);
    }
    path.split('.')
        .try_fold(value, |current, part| current.as_object_mut()?.get_mut(part))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
