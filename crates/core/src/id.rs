//! Identifiers for course entities.
//!
//! Modules and lessons are numbered from 1 in course order. Quiz questions are
//! identified by their 1-based position in the quiz.

use serde::{Deserialize, Serialize};

/// Error returned when an identifier cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} id: {input:?}")]
pub struct ParseIdError {
    kind: &'static str,
    input: String,
}

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident, $repr:ty, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name($repr);

        impl $name {
            /// Wrap a raw number.
            pub const fn new(value: $repr) -> Self {
                Self(value)
            }

            /// The raw number.
            pub const fn get(self) -> $repr {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self).map_err(|_| ParseIdError {
                    kind: $kind,
                    input: s.to_string(),
                })
            }
        }

        impl From<$repr> for $name {
            fn from(value: $repr) -> Self {
                Self(value)
            }
        }
    };
}

numeric_id!(
    /// Identifier of a course module (1..=14).
    ModuleId,
    u8,
    "module"
);

numeric_id!(
    /// Identifier of a lesson within its module (1..=lesson count).
    LessonId,
    u8,
    "lesson"
);

numeric_id!(
    /// Identifier of a quiz question: its 1-based position in the quiz.
    QuestionId,
    usize,
    "question"
);

impl QuestionId {
    /// Question id for a 0-based position.
    pub const fn from_index(index: usize) -> Self {
        Self(index + 1)
    }

    /// 0-based position of this question, if the id is valid.
    pub fn index(self) -> Option<usize> {
        self.0.checked_sub(1)
    }
}
