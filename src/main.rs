use page_marketing_service::config::Config;
use page_marketing_service::graph::GraphClient;
use page_marketing_service::insights::{self, InsightPeriod};
use page_marketing_service::session::Session;
use std::error::Error;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::from_env()?;

    let client = match &config.graph_base_url {
        Some(base) => GraphClient::with_base_url(base, config.ad_account_id.clone()),
        None => GraphClient::new(config.ad_account_id.clone()),
    };
    let session = Session::new(client, config.access_token.clone());

    let user = session.login().await?;
    info!(user = %user.name, "logged in");

    let pages = session.api().user_pages(session.access_token()).await?;
    info!(count = pages.len(), "managed pages fetched");

    for page in &pages {
        info!(
            page = %page.name,
            category = %page.category,
            followers = page.followers_count,
            "page"
        );
    }

    if let Some(page) = pages.first() {
        let posts = session.api().page_posts(&page.id, &page.access_token).await?;
        info!(page = %page.name, posts = posts.len(), "recent posts fetched");

        let page_insights = session
            .api()
            .page_insights(&page.id, &page.access_token)
            .await?;
        let (current, previous) =
            insights::comparison_values(page_insights.page_reach.for_period(InsightPeriod::Day));
        info!(
            page = %page.name,
            reach = current,
            change = %insights::calculate_change(current, previous),
            "daily reach"
        );
    }

    Ok(())
}
