//! Google Calendar and Google Tasks.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{http::ensure_success, SourceError};

const EVENTS_URL: &str = "https://www.googleapis.com/calendar/v3/calendars/primary/events";
const TASKS_URL: &str = "https://tasks.googleapis.com/tasks/v1/lists/@default/tasks";

pub const CALENDAR_DAYS_AHEAD: i64 = 7;
pub const CALENDAR_MAX_EVENTS: u32 = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: String,
    pub end: Option<String>,
    pub all_day: bool,
    pub location: Option<String>,
    pub link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<EventItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventItem {
    id: String,
    summary: Option<String>,
    location: Option<String>,
    html_link: Option<String>,
    start: Option<EventTime>,
    end: Option<EventTime>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventTime {
    date_time: Option<String>,
    date: Option<String>,
}

impl EventTime {
    fn value(self) -> Option<String> {
        self.date_time.or(self.date)
    }
}

impl EventItem {
    fn into_event(self) -> Option<CalendarEvent> {
        let start = self.start?;
        let all_day = start.date_time.is_none();
        Some(CalendarEvent {
            id: self.id,
            title: self.summary.unwrap_or_else(|| "(No title)".to_string()),
            start: start.value()?,
            end: self.end.and_then(EventTime::value),
            all_day,
            location: self.location,
            link: self.html_link,
        })
    }
}

/// Primary-calendar events between `now` and a week ahead, soonest first.
pub async fn upcoming_events(
    client: &Client,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Vec<CalendarEvent>, SourceError> {
    let time_max = now + Duration::days(CALENDAR_DAYS_AHEAD);
    let response = client
        .get(EVENTS_URL)
        .bearer_auth(token)
        .query(&[
            ("timeMin", now.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("timeMax", time_max.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
            ("maxResults", CALENDAR_MAX_EVENTS.to_string()),
        ])
        .send()
        .await?;

    let list: EventList = ensure_success(response)?.json().await?;
    Ok(list.items.into_iter().filter_map(EventItem::into_event).collect())
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GoogleTask {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub status: Option<String>,
    pub due: Option<String>,
    #[serde(default)]
    pub deleted: bool,
}

impl GoogleTask {
    pub fn is_completed(&self) -> bool {
        self.status.as_deref() == Some("completed")
    }

    /// `due` as a `YYYY-MM-DD` date. Google stores due dates at midnight UTC.
    pub fn due_date(&self) -> Option<String> {
        self.due.as_deref().and_then(|due| due.get(..10)).map(str::to_string)
    }
}

/// Fields written to Google Tasks. Unset fields are left alone by `patch`.
#[derive(Debug, Default, Serialize)]
pub struct TaskPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
}

impl TaskPayload {
    pub fn status_for(completed: bool) -> &'static str {
        if completed {
            "completed"
        } else {
            "needsAction"
        }
    }

    pub fn due_from_date(date: &str) -> String {
        format!("{date}T00:00:00.000Z")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskPage {
    #[serde(default)]
    items: Vec<GoogleTask>,
    next_page_token: Option<String>,
}

pub async fn list_tasks(client: &Client, token: &str) -> Result<Vec<GoogleTask>, SourceError> {
    let mut tasks = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let mut query = vec![
            ("showCompleted", "true".to_string()),
            ("showHidden", "true".to_string()),
            ("maxResults", "100".to_string()),
        ];
        if let Some(page) = page_token.take() {
            query.push(("pageToken", page));
        }

        let response = client.get(TASKS_URL).bearer_auth(token).query(&query).send().await?;
        let page: TaskPage = ensure_success(response)?.json().await?;
        tasks.extend(page.items.into_iter().filter(|task| !task.deleted));

        match page.next_page_token {
            Some(next) => page_token = Some(next),
            None => break,
        }
    }

    Ok(tasks)
}

pub async fn insert_task(
    client: &Client,
    token: &str,
    payload: &TaskPayload,
) -> Result<GoogleTask, SourceError> {
    let response = client.post(TASKS_URL).bearer_auth(token).json(payload).send().await?;
    Ok(ensure_success(response)?.json().await?)
}

pub async fn patch_task(
    client: &Client,
    token: &str,
    task_id: &str,
    payload: &TaskPayload,
) -> Result<GoogleTask, SourceError> {
    let response = client
        .patch(format!("{TASKS_URL}/{task_id}"))
        .bearer_auth(token)
        .json(payload)
        .send()
        .await?;
    Ok(ensure_success(response)?.json().await?)
}

pub async fn delete_task(client: &Client, token: &str, task_id: &str) -> Result<(), SourceError> {
    let response = client
        .delete(format!("{TASKS_URL}/{task_id}"))
        .bearer_auth(token)
        .send()
        .await?;

    // Already gone upstream.
    if response.status() == reqwest::StatusCode::NOT_FOUND {
        return Ok(());
    }
    ensure_success(response).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_conversion() {
        let body = r#"{
          "kind": "calendar#events",
          "items": [
            { "id": "a", "summary": "Standup", "htmlLink": "https://calendar.google.com/a",
              "start": {"dateTime": "2024-01-01T09:00:00+01:00"},
              "end": {"dateTime": "2024-01-01T09:15:00+01:00"} },
            { "id": "b", "start": {"date": "2024-01-02"}, "end": {"date": "2024-01-03"} },
            { "id": "c", "status": "cancelled" }
          ]
        }"#;

        let list: EventList = serde_json::from_str(body).unwrap();
        let events: Vec<CalendarEvent> =
            list.items.into_iter().filter_map(EventItem::into_event).collect();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].title, "Standup");
        assert!(!events[0].all_day);
        assert_eq!(events[1].title, "(No title)");
        assert!(events[1].all_day);
        assert_eq!(events[1].start, "2024-01-02");
    }

    #[test]
    fn test_task_fields() {
        let task: GoogleTask = serde_json::from_str(
            r#"{"id": "t1", "title": "Buy milk", "status": "completed", "due": "2024-03-05T00:00:00.000Z"}"#,
        )
        .unwrap();

        assert!(task.is_completed());
        assert_eq!(task.due_date().as_deref(), Some("2024-03-05"));
        assert_eq!(TaskPayload::due_from_date("2024-03-05"), "2024-03-05T00:00:00.000Z");
    }

    #[test]
    fn test_patch_payload_skips_unset_fields() {
        let payload = TaskPayload {
            status: Some(TaskPayload::status_for(true)),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({"status": "completed"})
        );
    }
}
