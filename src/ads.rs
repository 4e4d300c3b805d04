use crate::constants::{
    ADSET_BID_STRATEGY, ADSET_BILLING_EVENT, ADSET_OPTIMIZATION_GOAL, AD_STATUS_PAUSED,
    CAMPAIGN_OBJECTIVE, DEFAULT_TARGET_COUNTRY, SCHEDULE_LEAD_MINUTES, SCHEDULE_RUN_DAYS,
};
use crate::graph::{GraphClient, GraphError};
use crate::models::{GeoTarget, ProvisioningRequest, ProvisioningResult};
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{json, Value};
use thiserror::Error;

/// Failure of one provisioning step. Later variants carry the identifiers
/// of the remote objects already created before the step failed; those
/// objects are left in place, there is no rollback.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Invalid budget amount: {0}")]
    Budget(String),
    #[error("Campaign Error: {source}")]
    Campaign {
        #[source]
        source: GraphError,
    },
    #[error("Ad Set Error: {source}")]
    AdSet {
        campaign_id: String,
        #[source]
        source: GraphError,
    },
    #[error("Creative Error: {source}")]
    Creative {
        campaign_id: String,
        ad_set_id: String,
        #[source]
        source: GraphError,
    },
    #[error("Ad Error: {source}")]
    Ad {
        campaign_id: String,
        ad_set_id: String,
        creative_id: String,
        #[source]
        source: GraphError,
    },
}

impl ProvisionError {
    /// Identifiers of remote objects orphaned by this failure.
    pub fn orphans(&self) -> Vec<&str> {
        match self {
            Self::Budget(_) | Self::Campaign { .. } => Vec::new(),
            Self::AdSet { campaign_id, .. } => vec![campaign_id.as_str()],
            Self::Creative {
                campaign_id,
                ad_set_id,
                ..
            } => vec![campaign_id.as_str(), ad_set_id.as_str()],
            Self::Ad {
                campaign_id,
                ad_set_id,
                creative_id,
                ..
            } => vec![
                campaign_id.as_str(),
                ad_set_id.as_str(),
                creative_id.as_str(),
            ],
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdSetSpec {
    pub name: String,
    pub campaign_id: String,
    /// Lifetime budget in the platform's minor currency units.
    pub lifetime_budget: i64,
    pub targeting: Value,
    pub start_time: String,
    pub end_time: String,
}

/// The four creation calls the workflow depends on. `GraphClient` is the
/// production implementation.
#[async_trait]
pub trait AdsApi: Send + Sync {
    async fn create_campaign(&self, name: &str, access_token: &str) -> Result<String, GraphError>;
    async fn create_ad_set(&self, spec: &AdSetSpec, access_token: &str)
        -> Result<String, GraphError>;
    async fn create_creative(
        &self,
        page_id: &str,
        message: &str,
        link: &str,
        access_token: &str,
    ) -> Result<String, GraphError>;
    async fn create_ad(
        &self,
        name: &str,
        ad_set_id: &str,
        creative_id: &str,
        access_token: &str,
    ) -> Result<String, GraphError>;
}

/// Runs the four-step creation chain: campaign, ad set, creative, ad. Steps
/// are strictly sequential; the first failure aborts the chain and later
/// steps are never attempted. Everything is created PAUSED. Not idempotent:
/// each invocation creates four brand-new objects, distinguished by the
/// timestamp embedded in the campaign name.
pub async fn provision<A: AdsApi + ?Sized>(
    api: &A,
    request: &ProvisioningRequest,
) -> Result<ProvisioningResult, ProvisionError> {
    let budget = minor_units(&request.budget)
        .ok_or_else(|| ProvisionError::Budget(request.budget.clone()))?;
    let now = Utc::now();
    let token = &request.access_token;

    let campaign_id = api
        .create_campaign(&campaign_name(now), token)
        .await
        .map_err(|source| ProvisionError::Campaign { source })?;
    tracing::debug!(%campaign_id, "campaign created");

    let targeting = if request.geo_targets.is_empty() {
        default_targeting()
    } else {
        build_targeting(&request.geo_targets)
    };
    let (start_time, end_time) = schedule(now);
    let spec = AdSetSpec {
        name: ad_set_name(now),
        campaign_id: campaign_id.clone(),
        lifetime_budget: budget,
        targeting,
        start_time,
        end_time,
    };
    let ad_set_id = api
        .create_ad_set(&spec, token)
        .await
        .map_err(|source| ProvisionError::AdSet {
            campaign_id: campaign_id.clone(),
            source,
        })?;
    tracing::debug!(%ad_set_id, "ad set created");

    let link = request
        .link
        .clone()
        .unwrap_or_else(|| default_link(&request.page_id));
    let creative_id = api
        .create_creative(&request.page_id, &request.ad_text, &link, token)
        .await
        .map_err(|source| ProvisionError::Creative {
            campaign_id: campaign_id.clone(),
            ad_set_id: ad_set_id.clone(),
            source,
        })?;
    tracing::debug!(%creative_id, "creative created");

    let ad_id = api
        .create_ad(&ad_name(now), &ad_set_id, &creative_id, token)
        .await
        .map_err(|source| ProvisionError::Ad {
            campaign_id: campaign_id.clone(),
            ad_set_id: ad_set_id.clone(),
            creative_id: creative_id.clone(),
            source,
        })?;
    tracing::debug!(%ad_id, "ad created");

    Ok(ProvisioningResult {
        campaign_id,
        ad_set_id,
        creative_id,
        ad_id,
    })
}

/// Converts a major-unit amount ("100.00") to minor units (10000),
/// rounding half-up at the third fractional digit. Digits-and-dot input
/// only; anything else is rejected.
pub fn minor_units(amount: &str) -> Option<i64> {
    let amount = amount.trim();
    let (major, fraction) = match amount.split_once('.') {
        Some((major, fraction)) => (major, fraction),
        None => (amount, ""),
    };
    if major.is_empty() && fraction.is_empty() {
        return None;
    }
    if !major.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let major: i64 = if major.is_empty() {
        0
    } else {
        major.parse().ok()?
    };
    let mut digits = fraction.chars().map(|c| i64::from(c as u8 - b'0'));
    let cents = digits.next().unwrap_or(0) * 10 + digits.next().unwrap_or(0);
    let round_up = i64::from(digits.next().map_or(false, |d| d >= 5));

    major.checked_mul(100)?.checked_add(cents + round_up)
}

/// Partitions the circles into include/exclude lists. Empty partitions are
/// omitted from the JSON rather than sent as empty arrays; overlaps pass
/// through untouched.
pub fn build_targeting(targets: &[GeoTarget]) -> Value {
    let entry = |t: &GeoTarget| {
        json!({
            "latitude": t.latitude,
            "longitude": t.longitude,
            "radius": t.radius_km,
            "distance_unit": "kilometer",
            "type": "home",
        })
    };
    let include: Vec<Value> = targets.iter().filter(|t| !t.exclude).map(entry).collect();
    let exclude: Vec<Value> = targets.iter().filter(|t| t.exclude).map(entry).collect();

    let mut geo = serde_json::Map::new();
    if !include.is_empty() {
        geo.insert("custom_locations".to_string(), Value::Array(include));
    }
    if !exclude.is_empty() {
        geo.insert("excluded_custom_locations".to_string(), Value::Array(exclude));
    }
    json!({ "geo_locations": geo })
}

pub fn default_targeting() -> Value {
    json!({
        "geo_locations": { "countries": [DEFAULT_TARGET_COUNTRY] },
        "publisher_platforms": ["facebook"],
        "facebook_positions": ["feed"],
    })
}

// The embedded timestamp is what keeps repeated invocations against the
// same ad account from colliding on the unique campaign name.
pub fn campaign_name(now: DateTime<Utc>) -> String {
    format!("Campaign {}", now.timestamp_millis())
}

fn ad_set_name(now: DateTime<Utc>) -> String {
    format!("Ad Set {}", now.timestamp_millis())
}

fn ad_name(now: DateTime<Utc>) -> String {
    format!("Ad {}", now.timestamp_millis())
}

fn default_link(page_id: &str) -> String {
    format!("https://www.facebook.com/{}", page_id)
}

/// Flight window: starts a fixed lead after submission, ends one day later.
pub fn schedule(now: DateTime<Utc>) -> (String, String) {
    let start = now + Duration::minutes(SCHEDULE_LEAD_MINUTES);
    let end = start + Duration::days(SCHEDULE_RUN_DAYS);
    (
        start.to_rfc3339_opts(SecondsFormat::Secs, true),
        end.to_rfc3339_opts(SecondsFormat::Secs, true),
    )
}

#[async_trait]
impl AdsApi for GraphClient {
    async fn create_campaign(&self, name: &str, access_token: &str) -> Result<String, GraphError> {
        let form = [
            ("name", name.to_string()),
            ("objective", CAMPAIGN_OBJECTIVE.to_string()),
            ("status", AD_STATUS_PAUSED.to_string()),
            ("special_ad_categories", "[]".to_string()),
            ("access_token", access_token.to_string()),
        ];
        let reply = self
            .post_form(&format!("act_{}/campaigns", self.ad_account_id()), &form)
            .await?;
        object_id(&reply)
    }

    async fn create_ad_set(
        &self,
        spec: &AdSetSpec,
        access_token: &str,
    ) -> Result<String, GraphError> {
        let form = [
            ("name", spec.name.clone()),
            ("campaign_id", spec.campaign_id.clone()),
            ("lifetime_budget", spec.lifetime_budget.to_string()),
            ("billing_event", ADSET_BILLING_EVENT.to_string()),
            ("optimization_goal", ADSET_OPTIMIZATION_GOAL.to_string()),
            ("bid_strategy", ADSET_BID_STRATEGY.to_string()),
            ("targeting", spec.targeting.to_string()),
            ("start_time", spec.start_time.clone()),
            ("end_time", spec.end_time.clone()),
            ("status", AD_STATUS_PAUSED.to_string()),
            ("access_token", access_token.to_string()),
        ];
        let reply = self
            .post_form(&format!("act_{}/adsets", self.ad_account_id()), &form)
            .await?;
        object_id(&reply)
    }

    async fn create_creative(
        &self,
        page_id: &str,
        message: &str,
        link: &str,
        access_token: &str,
    ) -> Result<String, GraphError> {
        let story = json!({
            "page_id": page_id,
            "link_data": { "link": link, "message": message },
        });
        let form = [
            ("object_story_spec", story.to_string()),
            ("access_token", access_token.to_string()),
        ];
        let reply = self
            .post_form(&format!("act_{}/adcreatives", self.ad_account_id()), &form)
            .await?;
        object_id(&reply)
    }

    async fn create_ad(
        &self,
        name: &str,
        ad_set_id: &str,
        creative_id: &str,
        access_token: &str,
    ) -> Result<String, GraphError> {
        let form = [
            ("name", name.to_string()),
            ("adset_id", ad_set_id.to_string()),
            ("creative", json!({ "creative_id": creative_id }).to_string()),
            ("status", AD_STATUS_PAUSED.to_string()),
            ("access_token", access_token.to_string()),
        ];
        let reply = self
            .post_form(&format!("act_{}/ads", self.ad_account_id()), &form)
            .await?;
        object_id(&reply)
    }
}

fn object_id(reply: &Value) -> Result<String, GraphError> {
    reply["id"]
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| GraphError::InvalidResponse("creation reply without an id".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockAdsApi {
        calls: Mutex<Vec<String>>,
        ad_set_specs: Mutex<Vec<AdSetSpec>>,
        fail_at: Option<&'static str>,
        next_id: AtomicUsize,
    }

    impl MockAdsApi {
        fn failing_at(step: &'static str) -> Self {
            Self {
                fail_at: Some(step),
                ..Self::default()
            }
        }

        fn step(&self, name: &'static str) -> Result<String, GraphError> {
            self.calls.lock().unwrap().push(name.to_string());
            if self.fail_at == Some(name) {
                return Err(GraphError::Rejected {
                    code: 100,
                    message: "Invalid parameter".to_string(),
                });
            }
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("{}-{}", name, id))
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AdsApi for MockAdsApi {
        async fn create_campaign(
            &self,
            _name: &str,
            _access_token: &str,
        ) -> Result<String, GraphError> {
            self.step("campaign")
        }

        async fn create_ad_set(
            &self,
            spec: &AdSetSpec,
            _access_token: &str,
        ) -> Result<String, GraphError> {
            self.ad_set_specs.lock().unwrap().push(spec.clone());
            self.step("adset")
        }

        async fn create_creative(
            &self,
            _page_id: &str,
            _message: &str,
            _link: &str,
            _access_token: &str,
        ) -> Result<String, GraphError> {
            self.step("creative")
        }

        async fn create_ad(
            &self,
            _name: &str,
            _ad_set_id: &str,
            _creative_id: &str,
            _access_token: &str,
        ) -> Result<String, GraphError> {
            self.step("ad")
        }
    }

    fn request() -> ProvisioningRequest {
        ProvisioningRequest {
            page_id: "1234567890".to_string(),
            access_token: "PAGE_TOKEN".to_string(),
            ad_text: "Visit us this weekend".to_string(),
            budget: "100.00".to_string(),
            geo_targets: Vec::new(),
            link: None,
        }
    }

    #[tokio::test]
    async fn provisions_four_objects_in_order() {
        let api = MockAdsApi::default();

        let result = provision(&api, &request()).await.unwrap();

        assert_eq!(api.calls(), vec!["campaign", "adset", "creative", "ad"]);
        assert_eq!(result.campaign_id, "campaign-1");
        assert_eq!(result.ad_set_id, "adset-2");
        assert_eq!(result.creative_id, "creative-3");
        assert_eq!(result.ad_id, "ad-4");
    }

    #[tokio::test]
    async fn budget_reaches_the_ad_set_in_minor_units() {
        let api = MockAdsApi::default();

        provision(&api, &request()).await.unwrap();

        let specs = api.ad_set_specs.lock().unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].lifetime_budget, 10_000);
    }

    #[tokio::test]
    async fn campaign_failure_stops_the_chain() {
        let api = MockAdsApi::failing_at("campaign");

        let err = provision(&api, &request()).await.unwrap_err();

        assert_eq!(api.calls(), vec!["campaign"]);
        assert!(err.to_string().starts_with("Campaign Error:"));
        assert!(err.to_string().contains("Invalid parameter"));
        assert!(err.orphans().is_empty());
    }

    #[tokio::test]
    async fn ad_set_failure_reports_the_orphaned_campaign() {
        let api = MockAdsApi::failing_at("adset");

        let err = provision(&api, &request()).await.unwrap_err();

        assert_eq!(api.calls(), vec!["campaign", "adset"]);
        assert!(err.to_string().starts_with("Ad Set Error:"));
        assert_eq!(err.orphans(), vec!["campaign-1"]);
    }

    #[tokio::test]
    async fn creative_failure_reports_campaign_and_ad_set() {
        let api = MockAdsApi::failing_at("creative");

        let err = provision(&api, &request()).await.unwrap_err();

        assert!(err.to_string().starts_with("Creative Error:"));
        assert_eq!(err.orphans(), vec!["campaign-1", "adset-2"]);
    }

    #[tokio::test]
    async fn ad_failure_reports_all_three_orphans() {
        let api = MockAdsApi::failing_at("ad");

        let err = provision(&api, &request()).await.unwrap_err();

        assert!(err.to_string().starts_with("Ad Error:"));
        assert_eq!(err.orphans(), vec!["campaign-1", "adset-2", "creative-3"]);
    }

    #[tokio::test]
    async fn invalid_budget_fails_before_any_remote_call() {
        let api = MockAdsApi::default();
        let mut req = request();
        req.budget = "hundred".to_string();

        let err = provision(&api, &req).await.unwrap_err();

        assert!(matches!(err, ProvisionError::Budget(_)));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn repeated_invocations_create_distinct_objects() {
        let api = MockAdsApi::default();

        let first = provision(&api, &request()).await.unwrap();
        let second = provision(&api, &request()).await.unwrap();

        assert_ne!(first.campaign_id, second.campaign_id);
        assert_ne!(first.ad_set_id, second.ad_set_id);
        assert_ne!(first.creative_id, second.creative_id);
        assert_ne!(first.ad_id, second.ad_id);
        assert_eq!(api.calls().len(), 8);
    }

    #[test]
    fn minor_units_converts_two_decimal_amounts() {
        assert_eq!(minor_units("100.00"), Some(10_000));
        assert_eq!(minor_units("100"), Some(10_000));
        assert_eq!(minor_units("99.99"), Some(9_999));
        assert_eq!(minor_units("0.29"), Some(29));
        assert_eq!(minor_units(".50"), Some(50));
    }

    #[test]
    fn minor_units_rounds_half_up_at_the_third_digit() {
        assert_eq!(minor_units("19.995"), Some(2_000));
        assert_eq!(minor_units("19.994"), Some(1_999));
        assert_eq!(minor_units("19.9949"), Some(1_999));
        assert_eq!(minor_units("0.005"), Some(1));
        assert_eq!(minor_units("0.004"), Some(0));
    }

    #[test]
    fn minor_units_rejects_non_numeric_input() {
        assert_eq!(minor_units(""), None);
        assert_eq!(minor_units("."), None);
        assert_eq!(minor_units("-5"), None);
        assert_eq!(minor_units("1,000"), None);
        assert_eq!(minor_units("12.5x"), None);
    }

    #[test]
    fn targeting_partitions_include_and_exclude_circles() {
        let targets = vec![
            GeoTarget {
                latitude: 19.0,
                longitude: 72.8,
                radius_km: 5.0,
                exclude: false,
            },
            GeoTarget {
                latitude: 19.1,
                longitude: 72.9,
                radius_km: 3.0,
                exclude: true,
            },
        ];

        let targeting = build_targeting(&targets);
        let geo = &targeting["geo_locations"];

        let include = geo["custom_locations"].as_array().unwrap();
        assert_eq!(include.len(), 1);
        assert_eq!(include[0]["latitude"], 19.0);
        assert_eq!(include[0]["radius"], 5.0);
        assert_eq!(include[0]["distance_unit"], "kilometer");

        let exclude = geo["excluded_custom_locations"].as_array().unwrap();
        assert_eq!(exclude.len(), 1);
        assert_eq!(exclude[0]["longitude"], 72.9);
        assert_eq!(exclude[0]["radius"], 3.0);
    }

    #[test]
    fn targeting_omits_empty_partitions() {
        let targets = vec![GeoTarget {
            latitude: 19.0,
            longitude: 72.8,
            radius_km: 5.0,
            exclude: false,
        }];

        let targeting = build_targeting(&targets);
        let geo = targeting["geo_locations"].as_object().unwrap();

        assert!(geo.contains_key("custom_locations"));
        assert!(!geo.contains_key("excluded_custom_locations"));
    }

    #[test]
    fn default_targeting_pins_country_and_placement() {
        let targeting = default_targeting();
        assert_eq!(targeting["geo_locations"]["countries"][0], "IN");
        assert_eq!(targeting["publisher_platforms"][0], "facebook");
        assert_eq!(targeting["facebook_positions"][0], "feed");
    }

    #[test]
    fn campaign_names_embed_the_creation_instant() {
        let earlier = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 1).unwrap();

        assert_ne!(campaign_name(earlier), campaign_name(later));
        assert!(campaign_name(earlier).contains(&earlier.timestamp_millis().to_string()));
    }

    #[test]
    fn schedule_runs_for_one_day_after_the_lead() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let (start, end) = schedule(now);

        assert_eq!(start, "2025-06-01T12:15:00Z");
        assert_eq!(end, "2025-06-02T12:15:00Z");
    }
}
