use serde::{Deserialize, Serialize};

/// A managed page the authenticated account controls. Replaced wholesale on
/// re-authentication; never partially updated within a session.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Page {
    pub id: String,
    pub name: String,
    pub category: String,
    pub followers_count: i64,
    pub fan_count: i64,
    /// Credential scoped to this page only, narrower than the session token.
    pub access_token: String,
    /// Cached profile picture URL; empty when the lookup failed.
    pub picture: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PagePost {
    pub id: String,
    pub message: String,
    pub story: Option<String>,
    pub created_time: String,
    pub post_type: String,
    pub reactions: i64,
    pub comments: i64,
    pub shares: Option<i64>,
    pub image_url: Option<String>,
    pub permalink_url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// One geographic targeting circle. Overlapping circles are passed through
/// verbatim; the platform owns that semantics.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct GeoTarget {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
    pub exclude: bool,
}

#[derive(Debug, Clone)]
pub struct ProvisioningRequest {
    pub page_id: String,
    /// Page-scoped access token.
    pub access_token: String,
    /// Free text, may be empty; not validated here.
    pub ad_text: String,
    /// Major currency units, e.g. "100.00". Assumed validated by the caller.
    pub budget: String,
    /// Empty means no caller-supplied targeting; a default is used instead.
    pub geo_targets: Vec<GeoTarget>,
    /// Destination link for the creative; a default is derived when absent.
    pub link: Option<String>,
}

/// Identifiers of the four remote objects, present only on full success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningResult {
    pub campaign_id: String,
    pub ad_set_id: String,
    pub creative_id: String,
    pub ad_id: String,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MetricValues {
    pub day: Option<Vec<f64>>,
    pub week: Option<Vec<f64>>,
    pub days_28: Option<Vec<f64>>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct PageInsights {
    pub page_impressions_unique: MetricValues,
    pub page_impressions_paid: MetricValues,
    pub page_reach: MetricValues,
    pub page_engaged_users: MetricValues,
}
