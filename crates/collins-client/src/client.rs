//! HTTP client for the Collins API.
//!
//! One method per API operation, each performing a single blocking HTTP
//! round-trip: build the path, encode the params, send with Basic auth,
//! decode the `{status, data}` envelope. The `ensure_*` helpers layer
//! idempotent-create semantics on top by recovering HTTP 409, and
//! `soft_update` diffs against the server-side value to avoid redundant
//! writes.

use reqwest::blocking::Request;
use reqwest::Method;
use serde_json::Value;

use crate::config::CollinsConfig;
use crate::encoding::encode_path_segment;
use crate::params::Params;
use crate::response::Envelope;

/// Blocking client for the Collins asset management API.
///
/// Holds the configured credentials and a connection-pooling HTTP client;
/// carries no other state between calls.
#[derive(Debug)]
pub struct CollinsClient {
    http: reqwest::blocking::Client,
    config: CollinsConfig,
}

/// HTTP verbs used by the Collins API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    /// POST and PUT carry params in a form body; GET and DELETE carry them
    /// in the query string.
    fn sends_body(self) -> bool {
        matches!(self, Verb::Post | Verb::Put)
    }

    fn method(self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
            Verb::Put => Method::PUT,
            Verb::Delete => Method::DELETE,
        }
    }
}

/// Severity levels accepted by the asset log endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum LogSeverity {
    Emergency,
    Alert,
    Critical,
    Error,
    Warning,
    Notice,
    Informational,
    Debug,
    Note,
}

impl LogSeverity {
    /// The wire name Collins expects in the `type` field.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Emergency => "EMERGENCY",
            Self::Alert => "ALERT",
            Self::Critical => "CRITICAL",
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Notice => "NOTICE",
            Self::Informational => "INFORMATIONAL",
            Self::Debug => "DEBUG",
            Self::Note => "NOTE",
        }
    }
}

impl CollinsClient {
    /// Create a client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Init`] if the underlying HTTP client cannot
    /// be constructed.
    pub fn new(mut config: CollinsConfig) -> Result<Self, ClientError> {
        config.base_url = config.base_url.trim_end_matches('/').to_string();

        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Init(e.to_string()))?;

        Ok(Self { http, config })
    }

    /// Liveness check against `GET /api/ping`.
    ///
    /// # Errors
    ///
    /// Returns error on transport, API, or parse failure.
    pub fn ping(&self) -> Result<Envelope, ClientError> {
        self.call(Verb::Get, "/api/ping", &Params::new())
    }

    /// Find assets matching the given filters (`GET /api/assets`).
    ///
    /// Supported filters include `attribute` (as `KEY;VALUE`, repeatable),
    /// `type`, `status`, and the `created`/`updated` date ranges; see
    /// [`crate::AssetSearch`] for a typed builder.
    ///
    /// # Errors
    ///
    /// Returns error on transport, API, or parse failure.
    pub fn find_assets(&self, params: &Params) -> Result<Envelope, ClientError> {
        self.call(Verb::Get, "/api/assets", params)
    }

    /// Fetch a single asset by tag (`GET /api/asset/{tag}`).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] with status 404 if the tag is unknown.
    pub fn asset_info(&self, tag: &str, params: &Params) -> Result<Envelope, ClientError> {
        self.call(Verb::Get, &asset_path(tag), params)
    }

    /// Create an asset (`PUT /api/asset/{tag}`).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] with status 409 if the tag already
    /// exists; see [`Self::ensure_asset`] for the idempotent variant.
    pub fn create_asset(&self, tag: &str, params: &Params) -> Result<Envelope, ClientError> {
        self.call(Verb::Put, &asset_path(tag), params)
    }

    /// Partially update an asset (`POST /api/asset/{tag}`).
    ///
    /// Attributes are addressed with the `attribute` key as `"NAME;VALUE"`.
    ///
    /// # Errors
    ///
    /// Returns error on transport, API, or parse failure.
    pub fn update_asset(&self, tag: &str, params: &Params) -> Result<Envelope, ClientError> {
        self.call(Verb::Post, &asset_path(tag), params)
    }

    /// Delete an asset (`DELETE /api/asset/{tag}`).
    ///
    /// # Errors
    ///
    /// Returns error on transport, API, or parse failure.
    pub fn delete_asset(&self, tag: &str, params: &Params) -> Result<Envelope, ClientError> {
        self.call(Verb::Delete, &asset_path(tag), params)
    }

    /// Delete a single attribute from an asset
    /// (`DELETE /api/asset/{tag}/attribute/{name}`).
    ///
    /// # Errors
    ///
    /// Returns error on transport, API, or parse failure.
    pub fn delete_asset_attribute(
        &self,
        tag: &str,
        attribute: &str,
    ) -> Result<Envelope, ClientError> {
        let path = format!(
            "{}/attribute/{}",
            asset_path(tag),
            encode_path_segment(attribute)
        );
        self.call(Verb::Delete, &path, &Params::new())
    }

    /// Fetch the log entries for an asset (`GET /api/asset/{tag}/logs`).
    ///
    /// # Errors
    ///
    /// Returns error on transport, API, or parse failure.
    pub fn asset_logs(&self, tag: &str, params: &Params) -> Result<Envelope, ClientError> {
        self.call(Verb::Get, &format!("{}/logs", asset_path(tag)), params)
    }

    /// Append a log entry to an asset (`PUT /api/asset/{tag}/log`).
    ///
    /// # Errors
    ///
    /// Returns error on transport, API, or parse failure.
    pub fn create_asset_log(
        &self,
        tag: &str,
        message: &str,
        severity: Option<LogSeverity>,
    ) -> Result<Envelope, ClientError> {
        let mut params = Params::new();
        params.insert("message", message);
        if let Some(severity) = severity {
            params.insert("type", severity.as_str());
        }
        self.call(Verb::Put, &format!("{}/log", asset_path(tag)), &params)
    }

    /// Create an asset type (`PUT /api/assettype/{name}`).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] with status 409 if the name already
    /// exists; see [`Self::ensure_asset_type`] for the idempotent variant.
    pub fn create_asset_type(&self, name: &str, label: &str) -> Result<Envelope, ClientError> {
        let mut params = Params::new();
        params.insert("label", label);
        self.call(Verb::Put, &asset_type_path(name), &params)
    }

    /// Update an asset type (`POST /api/assettype/{name}`), sending only
    /// the provided fields.
    ///
    /// # Errors
    ///
    /// Returns error on transport, API, or parse failure.
    pub fn update_asset_type(
        &self,
        name: &str,
        label: Option<&str>,
        new_name: Option<&str>,
    ) -> Result<Envelope, ClientError> {
        let mut params = Params::new();
        if let Some(label) = label {
            params.insert("label", label);
        }
        if let Some(new_name) = new_name {
            params.insert("name", new_name);
        }
        self.call(Verb::Post, &asset_type_path(name), &params)
    }

    /// Fetch an asset type by name (`GET /api/assettype/{name}`).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] with status 404 if the name is unknown.
    pub fn get_asset_type(&self, name: &str) -> Result<Envelope, ClientError> {
        self.call(Verb::Get, &asset_type_path(name), &Params::new())
    }

    /// Delete an asset type (`DELETE /api/assettype/{name}`).
    ///
    /// # Errors
    ///
    /// Returns error on transport, API, or parse failure; system asset
    /// types answer 409.
    pub fn delete_asset_type(&self, name: &str) -> Result<Envelope, ClientError> {
        self.call(Verb::Delete, &asset_type_path(name), &Params::new())
    }

    /// Create an asset type if it does not already exist.
    ///
    /// HTTP 409 from the create is converted into a synthesized
    /// `success:exists` envelope, so calling this twice with the same
    /// arguments succeeds both times.
    ///
    /// # Errors
    ///
    /// Any error other than the 409 case propagates unchanged.
    pub fn ensure_asset_type(&self, name: &str, label: &str) -> Result<Envelope, ClientError> {
        match self.create_asset_type(name, label) {
            Ok(envelope) => Ok(envelope),
            Err(ClientError::Api { status: 409, .. }) => Ok(Envelope::exists()),
            Err(other) => Err(other),
        }
    }

    /// Create an asset if it does not already exist.
    ///
    /// HTTP 409 becomes a synthesized `success:exists` envelope; any other
    /// API error becomes a synthesized `failure:<code>` envelope and is
    /// logged as a warning rather than returned as `Err`. Callers must
    /// check [`Envelope::is_success`].
    ///
    /// # Errors
    ///
    /// Transport and parse failures still propagate as `Err`.
    pub fn ensure_asset(&self, tag: &str, params: &Params) -> Result<Envelope, ClientError> {
        let envelope = match self.create_asset(tag, params) {
            Ok(envelope) => envelope,
            Err(ClientError::Api { status: 409, .. }) => Envelope::exists(),
            Err(ClientError::Api { status, .. }) => Envelope::failure(status),
            Err(other) => return Err(other),
        };

        if !envelope.is_success() {
            tracing::warn!(tag, status = %envelope.status, "ensure_asset did not succeed");
        }

        Ok(envelope)
    }

    /// Update a single attribute only if it would actually change.
    ///
    /// Fetches the asset and compares `value` against the current
    /// server-side attribute (`ATTRIBS["0"]`, key uppercased). The write is
    /// skipped when the value is unchanged, and always skipped for `""` or
    /// `"None"` so this path can never erase an attribute.
    ///
    /// Returns `true` if an update request was issued.
    ///
    /// # Errors
    ///
    /// Returns error if the fetch or the update fails.
    pub fn soft_update(&self, tag: &str, key: &str, value: &str) -> Result<bool, ClientError> {
        // Never erase an attribute through this path.
        if value.is_empty() || value == "None" {
            tracing::debug!(tag, key, "blank value, skipping update");
            return Ok(false);
        }

        let info = self.asset_info(tag, &Params::new())?;
        let current = current_attribute(&info.data, key);
        if current.as_deref() == Some(value) {
            tracing::debug!(tag, key, "value unchanged, skipping update");
            return Ok(false);
        }

        tracing::debug!(tag, key, old = ?current, new = value, "updating attribute");
        let mut params = Params::new();
        params.insert("attribute", format!("{key};{value}"));
        self.update_asset(tag, &params)?;
        Ok(true)
    }

    /// Build an update request (`POST /api/asset/{tag}`) without sending
    /// it. Dispatch via [`Self::execute`] is up to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Request`] if the request cannot be built.
    pub fn prepare_update_asset(&self, tag: &str, params: &Params) -> Result<Request, ClientError> {
        self.prepare(Verb::Post, &asset_path(tag), params)
    }

    /// Build a find request (`GET /api/assets`) without sending it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Request`] if the request cannot be built.
    pub fn prepare_find_assets(&self, params: &Params) -> Result<Request, ClientError> {
        self.prepare(Verb::Get, "/api/assets", params)
    }

    /// Send a previously prepared request and decode the envelope.
    ///
    /// # Errors
    ///
    /// Returns error on transport, API, or parse failure.
    pub fn execute(&self, request: Request) -> Result<Envelope, ClientError> {
        let response = self
            .http
            .execute(request)
            .map_err(|e| ClientError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| ClientError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        serde_json::from_str(&body).map_err(|e| ClientError::Parse(e.to_string()))
    }

    fn call(&self, verb: Verb, path: &str, params: &Params) -> Result<Envelope, ClientError> {
        let request = self.prepare(verb, path, params)?;
        self.execute(request)
    }

    fn prepare(&self, verb: Verb, path: &str, params: &Params) -> Result<Request, ClientError> {
        let mut url = format!("{}{}", self.config.base_url, path);
        if !verb.sends_body() && !params.is_empty() {
            url.push('?');
            url.push_str(&params.to_query_string());
        }

        tracing::debug!(method = ?verb, url, "preparing request");

        let mut builder = self
            .http
            .request(verb.method(), url.as_str())
            .basic_auth(&self.config.username, Some(&self.config.password));

        if verb.sends_body() {
            builder = builder.form(params.pairs());
        }

        builder
            .build()
            .map_err(|e| ClientError::Request(e.to_string()))
    }
}

fn asset_path(tag: &str) -> String {
    format!("/api/asset/{}", encode_path_segment(tag))
}

fn asset_type_path(name: &str) -> String {
    format!("/api/assettype/{}", encode_path_segment(name))
}

/// Read the current value of `key` from an asset-info payload, if any.
///
/// Collins reports attributes under `ATTRIBS["0"]` with uppercased keys.
/// Assets that have never had an attribute set omit the `"0"` group
/// entirely. Non-string JSON values are stringified, since everything
/// round-trips through the API as a string.
fn current_attribute(data: &Value, key: &str) -> Option<String> {
    let attribs = data.get("ATTRIBS")?.get("0")?;
    match attribs.get(key.to_uppercase())? {
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Errors that can occur talking to Collins.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// Client initialization failed
    #[error("client init error: {0}")]
    Init(String),
    /// Building or sending the HTTP request failed
    #[error("request error: {0}")]
    Request(String),
    /// The API answered with a non-2xx status
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body, if any
        message: String,
    },
    /// Decoding the response envelope failed
    #[error("parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde_json::json;

    fn client() -> CollinsClient {
        CollinsClient::new(CollinsConfig::new(
            "http://localhost:9000",
            "blake",
            "admin:first",
        ))
        .unwrap()
    }

    fn body_str(request: &Request) -> &str {
        std::str::from_utf8(request.body().unwrap().as_bytes().unwrap()).unwrap()
    }

    #[test]
    fn find_request_has_repeated_attribute_params() {
        let mut params = Params::new();
        params.append_all("attribute", ["HOSTNAME;example.net", "PRIMARY_ROLE;APP"]);

        let request = client().prepare_find_assets(&params).unwrap();
        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.url().path(), "/api/assets");

        let attributes: Vec<_> = request
            .url()
            .query_pairs()
            .filter(|(k, _)| k == "attribute")
            .map(|(_, v)| v.into_owned())
            .collect();
        assert_eq!(attributes, vec!["HOSTNAME;example.net", "PRIMARY_ROLE;APP"]);
    }

    #[test]
    fn find_request_without_params_has_no_query() {
        let request = client().prepare_find_assets(&Params::new()).unwrap();
        assert_eq!(request.url().query(), None);
    }

    #[test]
    fn update_request_is_form_encoded_post() {
        let mut params = Params::new();
        params.insert("attribute", "hostname;web-01.example.net");

        let request = client().prepare_update_asset("web-01", &params).unwrap();
        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.url().path(), "/api/asset/web-01");
        assert_eq!(request.url().query(), None);
        assert_eq!(
            request.headers()["content-type"],
            "application/x-www-form-urlencoded"
        );
        assert_eq!(body_str(&request), "attribute=hostname%3Bweb-01.example.net");
    }

    #[test]
    fn every_request_carries_basic_auth() {
        let request = client().prepare_find_assets(&Params::new()).unwrap();
        let expected = format!("Basic {}", STANDARD.encode("blake:admin:first"));
        assert_eq!(request.headers()["authorization"], expected.as_str());
    }

    #[test]
    fn tag_is_escaped_in_path() {
        let request = client()
            .prepare_update_asset("bad tag", &Params::new())
            .unwrap();
        assert_eq!(request.url().path(), "/api/asset/bad%20tag");
    }

    #[test]
    fn trailing_slash_in_base_url_is_stripped() {
        let client = CollinsClient::new(CollinsConfig::new(
            "http://localhost:9000/",
            "blake",
            "admin:first",
        ))
        .unwrap();
        let request = client.prepare_find_assets(&Params::new()).unwrap();
        assert_eq!(request.url().as_str(), "http://localhost:9000/api/assets");
    }

    #[test]
    fn verb_body_rules() {
        assert!(Verb::Post.sends_body());
        assert!(Verb::Put.sends_body());
        assert!(!Verb::Get.sends_body());
        assert!(!Verb::Delete.sends_body());
    }

    #[test]
    fn current_attribute_reads_uppercased_key() {
        let data = json!({"ATTRIBS": {"0": {"HOSTNAME": "web-01.example.net"}}});
        assert_eq!(
            current_attribute(&data, "hostname").as_deref(),
            Some("web-01.example.net")
        );
    }

    #[test]
    fn current_attribute_absent_when_never_set() {
        // Assets with no attributes omit the "0" group entirely.
        assert_eq!(current_attribute(&json!({"ATTRIBS": {}}), "hostname"), None);
        assert_eq!(current_attribute(&json!({}), "hostname"), None);
    }

    #[test]
    fn current_attribute_stringifies_non_strings() {
        let data = json!({"ATTRIBS": {"0": {"DISK_COUNT": 4}}});
        assert_eq!(current_attribute(&data, "disk_count").as_deref(), Some("4"));
    }

    #[test]
    fn log_severity_wire_names() {
        assert_eq!(LogSeverity::Informational.as_str(), "INFORMATIONAL");
        assert_eq!(LogSeverity::Critical.as_str(), "CRITICAL");
    }
}
