use crate::core::client::ApiClient;
use crate::core::documents::DocumentService;
use crate::core::tasks::TaskService;
use crate::core::works::WorkService;
use crate::domain::model::{Document, Task, TaskStatus, Work};
use crate::utils::error::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

const COMPLETED_CODES: [&str; 3] = ["done", "completed", "completado"];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub high_priority: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkStats {
    pub total: usize,
    pub estimated_cost: f64,
    pub real_cost: f64,
    pub planned: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentStats {
    pub total: usize,
    pub expired: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub tasks: TaskStats,
    pub works: WorkStats,
    pub documents: DocumentStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Task,
    Work,
    ExpiredDocument,
    DocumentRenewal,
}

impl EventKind {
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Task => "Task",
            EventKind::Work => "Work",
            EventKind::ExpiredDocument => "Expired",
            EventKind::DocumentRenewal => "Renew",
        }
    }
}

/// 日曆上的一個事件
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarEvent {
    pub id: Uuid,
    pub kind: EventKind,
    pub date: DateTime<Utc>,
    pub title: String,
    pub color: &'static str,
    pub meta: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub events: Vec<CalendarEvent>,
}

impl Dashboard {
    pub fn build(tasks: &[Task], works: &[Work], documents: &[Document], now: DateTime<Utc>) -> Self {
        Self {
            stats: summarize(tasks, works, documents, now),
            events: calendar_events(tasks, works, documents, now),
        }
    }

    /// 依日期分組（日曆格子）
    pub fn events_by_date(&self) -> BTreeMap<NaiveDate, Vec<&CalendarEvent>> {
        let mut days: BTreeMap<NaiveDate, Vec<&CalendarEvent>> = BTreeMap::new();
        for event in &self.events {
            days.entry(event.date.date_naive()).or_default().push(event);
        }
        days
    }
}

fn is_expired(document: &Document, now: DateTime<Utc>) -> bool {
    !document.no_expiration && document.expiration_date.is_some_and(|d| d < now)
}

pub fn summarize(tasks: &[Task], works: &[Work], documents: &[Document], now: DateTime<Utc>) -> DashboardStats {
    let tasks_stats = TaskStats {
        total: tasks.len(),
        completed: tasks
            .iter()
            .filter(|t| t.status_code().is_some_and(|c| COMPLETED_CODES.contains(&c)))
            .count(),
        high_priority: tasks
            .iter()
            .filter(|t| t.priority.as_deref() == Some("high"))
            .count(),
    };

    let mut works_stats = WorkStats {
        total: works.len(),
        ..Default::default()
    };
    for work in works {
        works_stats.estimated_cost += work.cost_estimate.unwrap_or(0.0);
        // 實際成本只算已完成的工作
        if work.status_code() == Some("done") {
            works_stats.real_cost += work.cost_final.unwrap_or(0.0);
        }
        if work.status_code() == Some("planned") {
            works_stats.planned += 1;
        }
    }

    DashboardStats {
        tasks: tasks_stats,
        works: works_stats,
        documents: DocumentStats {
            total: documents.len(),
            expired: documents.iter().filter(|d| is_expired(d, now)).count(),
        },
    }
}

pub fn calendar_events(
    tasks: &[Task],
    works: &[Work],
    documents: &[Document],
    now: DateTime<Utc>,
) -> Vec<CalendarEvent> {
    let mut events = Vec::new();

    for task in tasks {
        if let Some(date) = task.due_date {
            let high = task.priority.as_deref() == Some("high");
            events.push(CalendarEvent {
                id: task.id,
                kind: EventKind::Task,
                date,
                title: task.title.clone(),
                color: if high { "#ef4444" } else { "#3b82f6" },
                meta: task.status_details.as_ref().map(|s| s.name.clone()),
            });
        }
    }

    for work in works {
        if let Some(date) = work.start_date {
            let status = work
                .status_details
                .as_ref()
                .map(|s| s.name.as_str())
                .unwrap_or("-");
            events.push(CalendarEvent {
                id: work.id,
                kind: EventKind::Work,
                date,
                title: work.title.clone(),
                color: "#f59e0b",
                meta: Some(format!("{} ({:.2}€)", status, work.cost_estimate.unwrap_or(0.0))),
            });
        }
    }

    for document in documents.iter().filter(|d| !d.no_expiration) {
        let Some(date) = document.expiration_date else {
            continue;
        };
        let expired = date < now;
        events.push(CalendarEvent {
            id: document.id,
            kind: if expired {
                EventKind::ExpiredDocument
            } else {
                EventKind::DocumentRenewal
            },
            date,
            title: document.name.clone(),
            color: if expired { "#ef4444" } else { "#10b981" },
            meta: Some(if expired { "Needs attention" } else { "Renew" }.to_string()),
        });
    }

    events
}

/// 新增任務/工作時預設的狀態：找 pending / planned，否則第一個
pub fn default_status<'a>(statuses: &'a [TaskStatus], codes: &[&str]) -> Option<&'a TaskStatus> {
    statuses
        .iter()
        .find(|s| codes.contains(&s.code.as_str()))
        .or_else(|| statuses.first())
}

pub async fn fetch_dashboard(client: &ApiClient, boat_id: Uuid) -> Result<Dashboard> {
    let tasks = TaskService::new(client.clone());
    let works = WorkService::new(client.clone());
    let documents = DocumentService::new(client.clone());

    let (tasks, works, documents) = tokio::try_join!(
        tasks.list(boat_id),
        works.list(boat_id),
        documents.list(boat_id)
    )?;

    let dashboard = Dashboard::build(&tasks, &works, &documents, Utc::now());
    tracing::info!(
        "📊 Dashboard for boat {}: {} tasks, {} works, {} documents ({} expired)",
        boat_id,
        dashboard.stats.tasks.total,
        dashboard.stats.works.total,
        dashboard.stats.documents.total,
        dashboard.stats.documents.expired
    );
    Ok(dashboard)
}
