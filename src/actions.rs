use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::course::CourseFilter;

// ============================================================================
// Client Actions - descriptors returned to the UI layer
// ============================================================================
//
// Serialized in the shape the client expects:
//   {"type": "ir.actions.client", "tag": "display_notification", "params": {...}}
//   {"type": "ir.actions.act_window", "name": "Courses", ...}
//
// ============================================================================

pub const COURSE_MODEL: &str = "online_course.course";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientAction {
    #[serde(rename = "ir.actions.client")]
    Client {
        tag: ClientTag,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        params: Option<NotificationParams>,
    },
    #[serde(rename = "ir.actions.act_window")]
    Window(WindowAction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientTag {
    DisplayNotification,
    SoftReload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationParams {
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Action the client runs once the notification is shown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Box<ClientAction>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    List,
    Kanban,
    Form,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::List => "list",
            ViewMode::Kanban => "kanban",
            ViewMode::Form => "form",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "list" => Some(ViewMode::List),
            "kanban" => Some(ViewMode::Kanban),
            "form" => Some(ViewMode::Form),
            _ => None,
        }
    }
}

/// View modes travel as one comma-separated string, e.g. "list,kanban,form"
mod view_modes {
    use super::*;

    pub fn serialize<S: Serializer>(modes: &[ViewMode], serializer: S) -> Result<S::Ok, S::Error> {
        let joined: Vec<&str> = modes.iter().map(ViewMode::as_str).collect();
        serializer.serialize_str(&joined.join(","))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<ViewMode>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.split(',')
            .map(|mode| {
                ViewMode::parse(mode)
                    .ok_or_else(|| serde::de::Error::custom(format!("unknown view mode: {}", mode)))
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowAction {
    pub name: String,
    pub res_model: String,
    pub domain: CourseFilter,
    #[serde(with = "view_modes")]
    pub view_mode: Vec<ViewMode>,
    pub context: WindowContext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowContext {
    pub create: bool,
}

impl ClientAction {
    pub fn soft_reload() -> Self {
        ClientAction::Client {
            tag: ClientTag::SoftReload,
            params: None,
        }
    }

    /// Success toast followed by a soft reload of the current view
    pub fn success_notification(title: impl Into<String>, message: impl Into<String>) -> Self {
        ClientAction::Client {
            tag: ClientTag::DisplayNotification,
            params: Some(NotificationParams {
                title: title.into(),
                message: message.into(),
                kind: NotificationKind::Success,
                next: Some(Box::new(Self::soft_reload())),
            }),
        }
    }

    /// Read-only course list restricted to `filter`
    pub fn course_list(filter: CourseFilter) -> Self {
        ClientAction::Window(WindowAction {
            name: "Courses".to_string(),
            res_model: COURSE_MODEL.to_string(),
            domain: filter,
            view_mode: vec![ViewMode::List, ViewMode::Kanban, ViewMode::Form],
            context: WindowContext { create: false },
        })
    }

    pub fn notification(&self) -> Option<&NotificationParams> {
        match self {
            ClientAction::Client { params, .. } => params.as_ref(),
            ClientAction::Window(_) => None,
        }
    }
}
