use reqwest::Client;

use crate::config::GithubConfig;
use crate::sources::{
    github::{fetch_contributions, ContributionCalendar},
    SourceError,
};

pub async fn load_contributions(
    client: Client,
    config: Option<GithubConfig>,
) -> Result<ContributionCalendar, SourceError> {
    let config = config.ok_or(SourceError::NotConfigured("GitHub"))?;
    let calendar = fetch_contributions(&client, &config).await?;
    tracing::info!(
        user = %config.username,
        total = calendar.total_contributions,
        "GitHub contributions loaded"
    );
    Ok(calendar)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_rt::test]
    async fn test_unconfigured_github_fails_without_network() {
        let client = Client::new();
        let result = load_contributions(client, None).await;
        assert_eq!(result, Err(SourceError::NotConfigured("GitHub")));
    }
}
