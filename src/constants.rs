// API Versions
pub const GRAPH_API_VERSION: &str = "v18.0";

// API Base URLs
pub const GRAPH_BASE_URL: &str = "https://graph.facebook.com";

// Request Settings
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

// Graph API Fields
pub const FB_PAGE_FIELDS: &str = "id,name,category,followers_count,fan_count,access_token";
pub const FB_POST_FIELDS: &str = "id,message,story,created_time,type,reactions.summary(total_count),comments.summary(total_count),shares,attachments{media,media_type,url,type,title,target},permalink_url";
pub const FB_USER_FIELDS: &str = "id,name,email";
pub const FB_INSIGHT_METRICS: &str = "page_impressions_unique,page_impressions_paid,page_reach,page_engaged_users";

// Listing Settings
pub const POST_FEED_LIMIT: u32 = 10;
pub const PAGE_PICTURE_SIZE: &str = "large";

// Ad Provisioning Settings
pub const CAMPAIGN_OBJECTIVE: &str = "OUTCOME_TRAFFIC";
pub const ADSET_BILLING_EVENT: &str = "IMPRESSIONS";
pub const ADSET_OPTIMIZATION_GOAL: &str = "LINK_CLICKS";
pub const ADSET_BID_STRATEGY: &str = "LOWEST_COST_WITHOUT_CAP";
pub const AD_STATUS_PAUSED: &str = "PAUSED";
pub const DEFAULT_TARGET_COUNTRY: &str = "IN";

// The platform rejects ad sets starting in the past; give the schedule
// a fixed lead over submission time.
pub const SCHEDULE_LEAD_MINUTES: i64 = 15;
pub const SCHEDULE_RUN_DAYS: i64 = 1;
