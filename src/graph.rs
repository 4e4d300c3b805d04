use crate::constants::{
    FB_INSIGHT_METRICS, FB_PAGE_FIELDS, FB_POST_FIELDS, FB_USER_FIELDS, GRAPH_API_VERSION,
    GRAPH_BASE_URL, PAGE_PICTURE_SIZE, POST_FEED_LIMIT, REQUEST_TIMEOUT_SECS,
};
use crate::insights::MetricRow;
use crate::models::{AuthUser, Page, PageInsights, PagePost};
use crate::paging::{self, Batch, PagedSource};
use crate::session::UserApi;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("API request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Graph API error {code}: {message}")]
    Rejected { code: i64, message: String },
}

/// Error descriptor the platform embeds in a well-formed rejection body.
#[derive(Debug, Deserialize)]
pub struct ErrorDescriptor {
    pub message: String,
    #[serde(default)]
    pub code: i64,
}

/// Every remote reply is decoded into one of these two variants immediately
/// after the call returns; nothing downstream inspects an open-ended shape.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GraphReply {
    Failure { error: ErrorDescriptor },
    Success(Value),
}

impl GraphReply {
    fn into_result(self) -> Result<Value, GraphError> {
        match self {
            GraphReply::Failure { error } => Err(GraphError::Rejected {
                code: error.code,
                message: error.message,
            }),
            GraphReply::Success(payload) => Ok(payload),
        }
    }
}

pub struct GraphClient {
    client: Client,
    base_url: String,
    ad_account_id: String,
}

impl GraphClient {
    pub fn new(ad_account_id: String) -> Self {
        Self::with_base_url(GRAPH_BASE_URL, ad_account_id)
    }

    pub fn with_base_url(base_url: &str, ad_account_id: String) -> Self {
        Self {
            client: Client::new(),
            base_url: format!("{}/{}", base_url.trim_end_matches('/'), GRAPH_API_VERSION),
            ad_account_id,
        }
    }

    pub fn ad_account_id(&self) -> &str {
        &self.ad_account_id
    }

    pub(crate) async fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Value, GraphError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| GraphError::RequestFailed(e.to_string()))?;
        Self::decode(response).await
    }

    /// Follows a pagination cursor, which the platform hands out as a
    /// complete pre-signed URL.
    pub(crate) async fn get_url(&self, url: &str) -> Result<Value, GraphError> {
        let response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| GraphError::RequestFailed(e.to_string()))?;
        Self::decode(response).await
    }

    pub(crate) async fn post_form(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<Value, GraphError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .form(form)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| GraphError::RequestFailed(e.to_string()))?;
        Self::decode(response).await
    }

    async fn delete(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, GraphError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .delete(&url)
            .query(query)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| GraphError::RequestFailed(e.to_string()))?;
        Self::decode(response).await
    }

    async fn decode(response: reqwest::Response) -> Result<Value, GraphError> {
        let reply: GraphReply = response
            .json()
            .await
            .map_err(|e| GraphError::InvalidResponse(e.to_string()))?;
        reply.into_result()
    }

    /// All managed pages of the authenticated account, across every
    /// pagination cursor, each decorated with its profile picture URL.
    pub async fn user_pages(&self, access_token: &str) -> Result<Vec<Page>, GraphError> {
        let source = PageListSource {
            client: self,
            access_token,
        };
        paging::collect_all(&source).await
    }

    pub async fn page_picture(
        &self,
        page_id: &str,
        access_token: &str,
    ) -> Result<String, GraphError> {
        let reply = self
            .get(
                &format!("{}/picture", page_id),
                &[
                    ("access_token", access_token),
                    ("type", PAGE_PICTURE_SIZE),
                    ("redirect", "false"),
                ],
            )
            .await?;
        reply["data"]["url"]
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| GraphError::InvalidResponse("picture reply without a url".to_string()))
    }

    pub async fn page_posts(
        &self,
        page_id: &str,
        access_token: &str,
    ) -> Result<Vec<PagePost>, GraphError> {
        let limit = POST_FEED_LIMIT.to_string();
        let reply = self
            .get(
                &format!("{}/posts", page_id),
                &[
                    ("access_token", access_token),
                    ("fields", FB_POST_FIELDS),
                    ("limit", &limit),
                ],
            )
            .await?;
        let data = reply["data"]
            .as_array()
            .ok_or_else(|| GraphError::InvalidResponse("post feed without a data array".to_string()))?;
        Ok(data.iter().map(parse_post).collect())
    }

    pub async fn page_insights(
        &self,
        page_id: &str,
        access_token: &str,
    ) -> Result<PageInsights, GraphError> {
        let reply = self
            .get(
                &format!("{}/insights", page_id),
                &[
                    ("access_token", access_token),
                    ("metric", FB_INSIGHT_METRICS),
                ],
            )
            .await?;
        let rows = parse_metric_rows(&reply)?;
        Ok(crate::insights::fold_metrics(rows))
    }
}

#[async_trait]
impl UserApi for GraphClient {
    async fn current_user(&self, access_token: &str) -> Result<AuthUser, GraphError> {
        let reply = self
            .get(
                "me",
                &[("access_token", access_token), ("fields", FB_USER_FIELDS)],
            )
            .await?;
        let id = reply["id"]
            .as_str()
            .ok_or_else(|| GraphError::InvalidResponse("user reply without an id".to_string()))?
            .to_string();
        Ok(AuthUser {
            id,
            name: reply["name"].as_str().unwrap_or("").to_string(),
            email: reply["email"].as_str().unwrap_or("").to_string(),
        })
    }

    async fn revoke_access(&self, access_token: &str) -> Result<(), GraphError> {
        self.delete("me/permissions", &[("access_token", access_token)])
            .await?;
        Ok(())
    }
}

/// Adapter binding the generic fetcher to the managed-pages listing, with
/// the picture lookup as the per-item decoration.
struct PageListSource<'a> {
    client: &'a GraphClient,
    access_token: &'a str,
}

#[async_trait]
impl PagedSource for PageListSource<'_> {
    type Raw = Value;
    type Item = Page;

    async fn list(&self, cursor: Option<&str>) -> Result<Batch<Value>, GraphError> {
        let reply = match cursor {
            Some(next) => self.client.get_url(next).await?,
            None => {
                self.client
                    .get(
                        "me/accounts",
                        &[
                            ("access_token", self.access_token),
                            ("fields", FB_PAGE_FIELDS),
                        ],
                    )
                    .await?
            }
        };
        parse_page_batch(reply)
    }

    async fn decorate(&self, raw: Value) -> Result<Page, GraphError> {
        let mut page = base_page(&raw);
        page.picture = self
            .client
            .page_picture(&page.id, self.access_token)
            .await?;
        Ok(page)
    }

    fn fallback(&self, raw: Value) -> Page {
        base_page(&raw)
    }
}

pub(crate) fn parse_page_batch(reply: Value) -> Result<Batch<Value>, GraphError> {
    let items = reply["data"]
        .as_array()
        .cloned()
        .ok_or_else(|| GraphError::InvalidResponse("page listing without a data array".to_string()))?;
    let next_cursor = reply["paging"]["next"].as_str().map(str::to_owned);
    Ok(Batch { items, next_cursor })
}

fn base_page(raw: &Value) -> Page {
    let fan_count = raw["fan_count"].as_i64().unwrap_or(0);
    Page {
        id: raw["id"].as_str().unwrap_or("").to_string(),
        name: raw["name"].as_str().unwrap_or("").to_string(),
        category: raw["category"].as_str().unwrap_or("").to_string(),
        followers_count: raw["followers_count"].as_i64().unwrap_or(fan_count),
        fan_count,
        access_token: raw["access_token"].as_str().unwrap_or("").to_string(),
        picture: String::new(),
    }
}

pub(crate) fn parse_post(raw: &Value) -> PagePost {
    let message = raw["message"]
        .as_str()
        .or_else(|| raw["story"].as_str())
        .unwrap_or("")
        .to_string();
    PagePost {
        id: raw["id"].as_str().unwrap_or("").to_string(),
        message,
        story: raw["story"].as_str().map(str::to_owned),
        created_time: raw["created_time"].as_str().unwrap_or("").to_string(),
        post_type: raw["type"].as_str().unwrap_or("status").to_string(),
        reactions: raw["reactions"]["summary"]["total_count"].as_i64().unwrap_or(0),
        comments: raw["comments"]["summary"]["total_count"].as_i64().unwrap_or(0),
        shares: raw["shares"]["count"].as_i64(),
        image_url: raw["attachments"]["data"][0]["media"]["image"]["src"]
            .as_str()
            .map(str::to_owned),
        permalink_url: raw["permalink_url"].as_str().unwrap_or("").to_string(),
    }
}

pub(crate) fn parse_metric_rows(reply: &Value) -> Result<Vec<MetricRow>, GraphError> {
    let data = reply["data"]
        .as_array()
        .ok_or_else(|| GraphError::InvalidResponse("insights reply without a data array".to_string()))?;
    Ok(data
        .iter()
        .map(|row| MetricRow {
            name: row["name"].as_str().unwrap_or("").to_string(),
            period: row["period"].as_str().unwrap_or("").to_string(),
            values: row["values"]
                .as_array()
                .map(|values| {
                    values
                        .iter()
                        .map(|v| v["value"].as_f64().unwrap_or(0.0))
                        .collect()
                })
                .unwrap_or_default(),
        })
        .collect())
}
