use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{http::ensure_success, SourceError};
use crate::config::GithubConfig;

const GRAPHQL_URL: &str = "https://api.github.com/graphql";

const CONTRIBUTIONS_QUERY: &str = r#"
query($login: String!) {
  user(login: $login) {
    contributionsCollection {
      contributionCalendar {
        totalContributions
        weeks {
          contributionDays {
            date
            contributionCount
            color
          }
        }
      }
    }
  }
}"#;

/// Contribution calendar as served to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionCalendar {
    pub total_contributions: u32,
    pub weeks: Vec<ContributionWeek>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionWeek {
    pub contribution_days: Vec<ContributionDay>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionDay {
    pub date: String,
    pub contribution_count: u32,
    pub color: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<ResponseData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    user: Option<UserNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserNode {
    contributions_collection: ContributionsCollection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContributionsCollection {
    contribution_calendar: ContributionCalendar,
}

pub async fn fetch_contributions(
    client: &Client,
    config: &GithubConfig,
) -> Result<ContributionCalendar, SourceError> {
    let response = client
        .post(GRAPHQL_URL)
        .bearer_auth(&config.token)
        .json(&json!({
            "query": CONTRIBUTIONS_QUERY,
            "variables": { "login": config.username },
        }))
        .send()
        .await?;

    let body = ensure_success(response)?.text().await?;
    calendar_from_response(&body)
}

fn calendar_from_response(body: &str) -> Result<ContributionCalendar, SourceError> {
    let response: GraphQlResponse = serde_json::from_str(body)?;

    if let Some(error) = response.errors.first() {
        return Err(SourceError::Parse(format!("GraphQL error: {}", error.message)));
    }

    response
        .data
        .and_then(|data| data.user)
        .map(|user| user.contributions_collection.contribution_calendar)
        .ok_or_else(|| SourceError::Parse("user not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calendar_from_response() {
        let body = r##"{
          "data": {
            "user": {
              "contributionsCollection": {
                "contributionCalendar": {
                  "totalContributions": 3,
                  "weeks": [
                    { "contributionDays": [
                      { "date": "2024-01-01", "contributionCount": 1, "color": "#9be9a8" },
                      { "date": "2024-01-02", "contributionCount": 2, "color": "#40c463" }
                    ] }
                  ]
                }
              }
            }
          }
        }"##;

        let calendar = calendar_from_response(body).unwrap();
        assert_eq!(calendar.total_contributions, 3);
        assert_eq!(calendar.weeks[0].contribution_days.len(), 2);
        assert_eq!(calendar.weeks[0].contribution_days[1].contribution_count, 2);
    }

    #[test]
    fn test_graphql_errors_and_unknown_user() {
        let errors = r#"{"data": null, "errors": [{"message": "Bad credentials"}]}"#;
        assert_eq!(
            calendar_from_response(errors),
            Err(SourceError::Parse("GraphQL error: Bad credentials".to_string()))
        );

        let missing = r#"{"data": {"user": null}}"#;
        assert!(matches!(calendar_from_response(missing), Err(SourceError::Parse(_))));

        assert!(matches!(calendar_from_response("<html>"), Err(SourceError::Parse(_))));
    }
}
