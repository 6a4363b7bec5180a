//! Result feedback shown after a submission.

use serde::Serialize;

/// Performance tier of a submitted quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    /// 90% and above
    Outstanding,
    /// 70% and above, a pass
    WellDone,
    /// 50% and above
    NotBad,
    /// Below 50%
    KeepTrying,
}

impl Feedback {
    /// Tier for a rounded percentage.
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            90.. => Feedback::Outstanding,
            70..=89 => Feedback::WellDone,
            50..=69 => Feedback::NotBad,
            _ => Feedback::KeepTrying,
        }
    }

    /// Headline.
    pub fn title(self) -> &'static str {
        match self {
            Feedback::Outstanding => "Outstanding! 🎉",
            Feedback::WellDone => "Well Done! 👏",
            Feedback::NotBad => "Not Bad! 💪",
            Feedback::KeepTrying => "Keep Trying! 🎯",
        }
    }

    /// Result icon.
    pub fn icon(self) -> &'static str {
        match self {
            Feedback::Outstanding => "🌟",
            Feedback::WellDone => "✅",
            Feedback::NotBad => "📚",
            Feedback::KeepTrying => "📖",
        }
    }

    /// Encouragement line.
    pub fn message(self) -> &'static str {
        match self {
            Feedback::Outstanding => {
                "Excellent work! You have a strong grasp of this module's concepts."
            }
            Feedback::WellDone => {
                "Great job! You passed the quiz and can move on to the next module."
            }
            Feedback::NotBad => {
                "You're getting there! Review the lessons and try again to improve your score."
            }
            Feedback::KeepTrying => {
                "Don't give up! Review the lessons carefully and retake the quiz."
            }
        }
    }
}
