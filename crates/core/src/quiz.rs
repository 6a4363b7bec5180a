//! Quiz definitions as shipped with the course content.

use serde::{Deserialize, Serialize};

use crate::id::QuestionId;

/// A module quiz: metadata plus an ordered list of questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizDefinition {
    /// Quiz title
    pub title: String,

    /// Short description
    #[serde(default)]
    pub description: Option<String>,

    /// Human-readable duration hint, e.g. "10 minutes"
    #[serde(default)]
    pub estimated_time: Option<String>,

    /// Declared passing score, informational only
    #[serde(default)]
    pub passing_score: Option<u32>,

    /// Time limit in minutes; enables the countdown timer
    #[serde(default)]
    pub time_limit: Option<u32>,

    /// Questions in presentation order
    pub questions: Vec<Question>,
}

/// Kind of question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// Pick one option by index
    MultipleChoice,
    /// "true" or "false"
    TrueFalse,
    /// Predict what a code snippet prints
    CodeOutput,
    /// Anything else the content uses
    #[serde(other)]
    Other,
}

/// One quiz question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Prompt text
    pub question: String,

    /// Question kind
    #[serde(rename = "type")]
    pub kind: QuestionType,

    /// Choices for multiple-choice questions
    #[serde(default)]
    pub options: Vec<String>,

    /// Expected answer: an option index, a boolean or a string
    pub correct_answer: serde_json::Value,

    /// Shown during review
    #[serde(default)]
    pub explanation: Option<String>,

    /// Snippet for code-output questions
    #[serde(default)]
    pub code: Option<String>,
}

impl Question {
    /// The correct answer as the string a learner submits.
    pub fn answer_key(&self) -> String {
        answer_string(&self.correct_answer)
    }

    /// Case-sensitive comparison against the answer key.
    pub fn is_correct(&self, answer: &str) -> bool {
        answer == self.answer_key()
    }

    /// The submittable values of this question's choices.
    ///
    /// Multiple-choice options are submitted by index, true/false by literal.
    pub fn option_values(&self) -> Vec<String> {
        match self.kind {
            QuestionType::TrueFalse => vec!["true".to_string(), "false".to_string()],
            _ => (0..self.options.len()).map(|i| i.to_string()).collect(),
        }
    }

    /// Display label of a choice value: the option text, or the value itself.
    pub fn option_label(&self, value: &str) -> String {
        match self.kind {
            QuestionType::TrueFalse => match value {
                "true" => "True".to_string(),
                "false" => "False".to_string(),
                other => other.to_string(),
            },
            _ => value
                .parse::<usize>()
                .ok()
                .and_then(|i| self.options.get(i).cloned())
                .unwrap_or_else(|| value.to_string()),
        }
    }
}

impl QuizDefinition {
    /// Parse a quiz from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Question by id.
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.get(id.index()?)
    }

    /// Question ids in order.
    pub fn question_ids(&self) -> impl Iterator<Item = QuestionId> + '_ {
        (0..self.questions.len()).map(QuestionId::from_index)
    }
}

/// String form of a JSON scalar: strings verbatim, everything else as JSON text.
pub fn answer_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> QuizDefinition {
        QuizDefinition::from_json(
            r#"{
                "title": "Module 1 Quiz",
                "time_limit": 5,
                "questions": [
                    {"question": "Pick", "type": "multiple_choice", "options": ["a", "b"], "correct_answer": 1},
                    {"question": "Truth", "type": "true_false", "correct_answer": true},
                    {"question": "Out", "type": "code_output", "correct_answer": "Hello", "code": "print('Hello')"},
                    {"question": "Fill", "type": "fill_blank", "correct_answer": "x"}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_definition() {
        let quiz = sample();
        assert_eq!(quiz.questions.len(), 4);
        assert_eq!(quiz.time_limit, Some(5));
        assert_eq!(quiz.questions[0].kind, QuestionType::MultipleChoice);
        assert_eq!(quiz.questions[3].kind, QuestionType::Other);
        assert_eq!(quiz.question(QuestionId::new(3)).unwrap().code.as_deref(), Some("print('Hello')"));
        assert!(quiz.question(QuestionId::new(5)).is_none());
    }

    #[test]
    fn test_answer_keys() {
        let quiz = sample();
        assert_eq!(quiz.questions[0].answer_key(), "1");
        assert_eq!(quiz.questions[1].answer_key(), "true");
        assert_eq!(quiz.questions[2].answer_key(), "Hello");
        assert_eq!(answer_string(&json!(2.5)), "2.5");
    }

    #[test]
    fn test_comparison_is_case_sensitive() {
        let quiz = sample();
        assert!(quiz.questions[2].is_correct("Hello"));
        assert!(!quiz.questions[2].is_correct("hello"));
        assert!(!quiz.questions[1].is_correct("True"));
    }

    #[test]
    fn test_option_values() {
        let quiz = sample();
        assert_eq!(quiz.questions[0].option_values(), vec!["0", "1"]);
        assert_eq!(quiz.questions[1].option_values(), vec!["true", "false"]);
        assert_eq!(quiz.questions[0].option_label("1"), "b");
        assert_eq!(quiz.questions[1].option_label("false"), "False");
    }
}
