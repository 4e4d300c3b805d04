//! Graph API integration core for a page-marketing front end: managed-page
//! listing with cursor pagination, engagement insights, and the four-step
//! ad provisioning chain.

pub mod ads;
pub mod config;
pub mod constants;
pub mod graph;
pub mod insights;
pub mod models;
pub mod paging;
pub mod session;

pub use ads::{provision, AdSetSpec, AdsApi, ProvisionError};
pub use config::{Config, ConfigError};
pub use graph::{GraphClient, GraphError};
pub use models::{
    AuthUser, GeoTarget, Page, PageInsights, PagePost, ProvisioningRequest, ProvisioningResult,
};
pub use paging::{collect_all, Batch, PagedSource};
pub use session::{Session, UserApi};
