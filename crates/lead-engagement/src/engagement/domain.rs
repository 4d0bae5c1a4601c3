use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! record_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(FollowupId);
record_id!(BusinessId);
record_id!(ActivityId);
record_id!(MeetingId);

/// Entity kinds that may own activities and meetings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentKind {
    Followup,
    Business,
}

impl ParentKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Followup => "followup",
            Self::Business => "business",
        }
    }
}

/// Tagged reference to the owner of an interaction. A record belongs to exactly one parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParentRef {
    pub kind: ParentKind,
    pub id: i64,
}

impl ParentRef {
    pub const fn followup(id: FollowupId) -> Self {
        Self {
            kind: ParentKind::Followup,
            id: id.0,
        }
    }

    pub const fn business(id: BusinessId) -> Self {
        Self {
            kind: ParentKind::Business,
            id: id.0,
        }
    }

    pub fn as_followup(&self) -> Option<FollowupId> {
        match self.kind {
            ParentKind::Followup => Some(FollowupId(self.id)),
            ParentKind::Business => None,
        }
    }
}

impl fmt::Display for ParentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.label(), self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Critical,
    Important,
    High,
    Medium,
    Low,
}

/// Temperature bucket derived from a followup's lead score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FollowupStatus {
    Hot,
    Warm,
    #[default]
    Cold,
}

impl FollowupStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Hot => "Hot",
            Self::Warm => "Warm",
            Self::Cold => "Cold",
        }
    }
}

impl fmt::Display for FollowupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Activity,
    Meeting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InteractionStatus {
    #[default]
    Pending,
    NotStarted,
    InProgress,
    WaitingFeedback,
    Completed,
}

impl InteractionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::NotStarted => "Not Started",
            Self::InProgress => "In Progress",
            Self::WaitingFeedback => "Waiting Feedback",
            Self::Completed => "Completed",
        }
    }

    pub const fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Sales pursuit being scored. Only `lead_score` and `followup_status` are engine-owned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Followup {
    pub id: FollowupId,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub outcome: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub lead_score: i32,
    #[serde(default)]
    pub followup_status: FollowupStatus,
    #[serde(default)]
    pub next_action_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub archived: bool,
}

impl Followup {
    pub fn new(id: FollowupId) -> Self {
        Self {
            id,
            start_date: None,
            outcome: None,
            notes: None,
            status: None,
            priority: None,
            lead_score: 0,
            followup_status: FollowupStatus::Cold,
            next_action_date: None,
            archived: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub parent: ParentRef,
    #[serde(default)]
    pub status: InteractionStatus,
    pub created_at: DateTime<Utc>,
    /// End date of the activity; the fallback due date when no next action is scheduled.
    #[serde(default, alias = "end_date")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub action_detail: Option<String>,
    #[serde(default)]
    pub next_action: Option<String>,
    #[serde(default)]
    pub next_action_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub archived: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: MeetingId,
    pub parent: ParentRef,
    #[serde(default)]
    pub status: InteractionStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub next_action: Option<String>,
    #[serde(default)]
    pub next_action_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub archived: bool,
}

/// Shared view over the two interaction record kinds.
pub trait Interaction {
    fn parent(&self) -> ParentRef;
    fn status(&self) -> InteractionStatus;
    fn created_at(&self) -> DateTime<Utc>;
    fn due_date(&self) -> Option<DateTime<Utc>>;
    fn next_action_date(&self) -> Option<DateTime<Utc>>;
    fn archived(&self) -> bool;

    /// Date an interaction is judged overdue against: the scheduled next action when
    /// present, otherwise the record's own due date.
    fn effective_due_date(&self) -> Option<DateTime<Utc>> {
        self.next_action_date().or_else(|| self.due_date())
    }
}

impl Interaction for Activity {
    fn parent(&self) -> ParentRef {
        self.parent
    }

    fn status(&self) -> InteractionStatus {
        self.status
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    fn next_action_date(&self) -> Option<DateTime<Utc>> {
        self.next_action_date
    }

    fn archived(&self) -> bool {
        self.archived
    }
}

impl Interaction for Meeting {
    fn parent(&self) -> ParentRef {
        self.parent
    }

    fn status(&self) -> InteractionStatus {
        self.status
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    fn next_action_date(&self) -> Option<DateTime<Utc>> {
        self.next_action_date
    }

    fn archived(&self) -> bool {
        self.archived
    }
}
