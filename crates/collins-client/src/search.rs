//! Typed builder for asset find queries.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::params::Params;

/// Builder for the filters accepted by `GET /api/assets`.
///
/// Attribute filters may repeat; each becomes its own `attribute=KEY;VALUE`
/// query pair. Date filters are serialized as ISO 8601 in UTC.
///
/// # Examples
///
/// ```
/// use collins_client::AssetSearch;
///
/// let params = AssetSearch::new()
///     .attribute("HOSTNAME", "db-01.example.net")
///     .asset_type("SERVER_NODE")
///     .status("Allocated")
///     .into_params();
/// assert_eq!(params.get_all("attribute"), vec!["HOSTNAME;db-01.example.net"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct AssetSearch {
    params: Params,
}

impl AssetSearch {
    /// Start an empty search.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter on an attribute, addressed as `KEY;VALUE`. Repeatable.
    #[must_use]
    pub fn attribute(mut self, key: &str, value: &str) -> Self {
        self.params.insert("attribute", format!("{key};{value}"));
        self
    }

    /// Filter on asset type (e.g. `SERVER_NODE`).
    #[must_use]
    pub fn asset_type(mut self, asset_type: &str) -> Self {
        self.params.insert("type", asset_type);
        self
    }

    /// Filter on asset status (e.g. `New`, `Allocated`).
    #[must_use]
    pub fn status(mut self, status: &str) -> Self {
        self.params.insert("status", status);
        self
    }

    /// Only assets created after the given instant.
    #[must_use]
    pub fn created_after(self, when: DateTime<Utc>) -> Self {
        self.date("createdAfter", when)
    }

    /// Only assets created before the given instant.
    #[must_use]
    pub fn created_before(self, when: DateTime<Utc>) -> Self {
        self.date("createdBefore", when)
    }

    /// Only assets updated after the given instant.
    #[must_use]
    pub fn updated_after(self, when: DateTime<Utc>) -> Self {
        self.date("updatedAfter", when)
    }

    /// Only assets updated before the given instant.
    #[must_use]
    pub fn updated_before(self, when: DateTime<Utc>) -> Self {
        self.date("updatedBefore", when)
    }

    fn date(mut self, key: &str, when: DateTime<Utc>) -> Self {
        self.params
            .insert(key, when.to_rfc3339_opts(SecondsFormat::Secs, true));
        self
    }

    /// Finish the builder, yielding params for
    /// [`crate::CollinsClient::find_assets`].
    #[must_use]
    pub fn into_params(self) -> Params {
        self.params
    }
}
