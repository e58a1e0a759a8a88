//! Counter records and the mutation kinds that affect cached state.

use crate::QuestionId;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// The two counters tracked per question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterKind {
    Views,
    Likes,
}

impl CounterKind {
    /// All counter kinds.
    pub const ALL: [Self; 2] = [Self::Views, Self::Likes];

    /// Key segment used in the fast store.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Views => "views",
            Self::Likes => "likes",
        }
    }

    /// Column of the `questions` table holding the durable value.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Views => "view_count",
            Self::Likes => "like_count",
        }
    }
}

impl Display for CounterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// View and like counts for one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionCounters {
    pub question_id: QuestionId,
    pub view_count: i64,
    pub like_count: i64,
}

impl QuestionCounters {
    /// Creates a zeroed record.
    #[must_use]
    pub const fn zero(question_id: QuestionId) -> Self {
        Self {
            question_id,
            view_count: 0,
            like_count: 0,
        }
    }

    /// Returns the value of one counter.
    #[must_use]
    pub const fn get(&self, kind: CounterKind) -> i64 {
        match kind {
            CounterKind::Views => self.view_count,
            CounterKind::Likes => self.like_count,
        }
    }

    /// Sets the value of one counter.
    pub fn set(&mut self, kind: CounterKind, value: i64) {
        match kind {
            CounterKind::Views => self.view_count = value,
            CounterKind::Likes => self.like_count = value,
        }
    }
}

/// Mutations that make cached payloads stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    NewComment,
    NewLike,
    QuestionEdited,
    NewQuestion,
}

impl MutationKind {
    /// Returns the metric/log label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NewComment => "new_comment",
            Self::NewLike => "new_like",
            Self::QuestionEdited => "question_edited",
            Self::NewQuestion => "new_question",
        }
    }

    /// Whether the mutation targets an existing question's detail entry.
    #[must_use]
    pub const fn is_per_question(self) -> bool {
        !matches!(self, Self::NewQuestion)
    }

    /// Whether the mutation changes what the recent list shows.
    ///
    /// List rows carry no comments and read counts fresh, so only new and
    /// edited questions make the list stale.
    #[must_use]
    pub const fn affects_list(self) -> bool {
        matches!(self, Self::NewQuestion | Self::QuestionEdited)
    }
}

impl Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
