//! Achievement badges.

use serde::Serialize;

/// A badge unlocked by aggregate progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Achievement {
    /// At least one lesson done
    FirstSteps,
    /// At least one module done
    ModuleMaster,
    /// Half the course done
    HalfwayThere,
    /// The whole course done
    FullStackDeveloper,
    /// Ten quizzes passed
    QuizMaster,
    /// Five perfect quiz scores
    PerfectScholar,
}

impl Achievement {
    /// Every badge, in display order.
    pub const ALL: [Achievement; 6] = [
        Achievement::FirstSteps,
        Achievement::ModuleMaster,
        Achievement::HalfwayThere,
        Achievement::FullStackDeveloper,
        Achievement::QuizMaster,
        Achievement::PerfectScholar,
    ];

    /// Display title.
    pub fn title(self) -> &'static str {
        match self {
            Achievement::FirstSteps => "First Steps",
            Achievement::ModuleMaster => "Module Master",
            Achievement::HalfwayThere => "Halfway There",
            Achievement::FullStackDeveloper => "Full Stack Developer",
            Achievement::QuizMaster => "Quiz Master",
            Achievement::PerfectScholar => "Perfect Scholar",
        }
    }

    /// One-line description.
    pub fn description(self) -> &'static str {
        match self {
            Achievement::FirstSteps => "Completed your first lesson",
            Achievement::ModuleMaster => "Completed your first module",
            Achievement::HalfwayThere => "Completed 50% of the course",
            Achievement::FullStackDeveloper => "Completed the entire course!",
            Achievement::QuizMaster => "Passed 10 module quizzes",
            Achievement::PerfectScholar => "Scored 100% on 5 quizzes",
        }
    }

    /// Badge icon.
    pub fn icon(self) -> &'static str {
        match self {
            Achievement::FirstSteps => "🎯",
            Achievement::ModuleMaster => "🏆",
            Achievement::HalfwayThere => "⚡",
            Achievement::FullStackDeveloper => "🚀",
            Achievement::QuizMaster => "📝",
            Achievement::PerfectScholar => "💯",
        }
    }
}

impl std::fmt::Display for Achievement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} - {}", self.icon(), self.title(), self.description())
    }
}
