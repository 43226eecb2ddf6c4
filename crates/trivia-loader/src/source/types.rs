//! Open Trivia DB request and response types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Question difficulty filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{}'", other)),
        }
    }
}

/// Question type filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    /// Multiple choice.
    Multiple,
    /// True / false.
    Boolean,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Multiple => "multiple",
            QuestionType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "multiple" => Ok(QuestionType::Multiple),
            "boolean" => Ok(QuestionType::Boolean),
            other => Err(format!("unknown question type '{}'", other)),
        }
    }
}

/// Parameters of an `api.php` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriviaQuery {
    /// Number of questions (1-50).
    pub amount: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub question_type: Option<QuestionType>,
}

impl TriviaQuery {
    pub fn new(amount: u32) -> Self {
        Self {
            amount,
            category: None,
            difficulty: None,
            question_type: None,
        }
    }

    /// Request URL under `base_url`. Unset filters are left out.
    pub fn url(&self, base_url: &str) -> String {
        let mut url = format!("{}/api.php?amount={}", base_url.trim_end_matches('/'), self.amount);
        if let Some(category) = self.category {
            url.push_str(&format!("&category={}", category));
        }
        if let Some(difficulty) = self.difficulty {
            url.push_str(&format!("&difficulty={}", difficulty));
        }
        if let Some(question_type) = self.question_type {
            url.push_str(&format!("&type={}", question_type));
        }
        url
    }
}

/// A trivia category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionsResponse {
    pub response_code: i64,
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoriesResponse {
    pub trivia_categories: Vec<Category>,
}

/// Meaning of an Open Trivia DB `response_code`. `None` for success.
pub fn response_code_message(code: i64) -> Option<&'static str> {
    match code {
        0 => None,
        1 => Some("no results: not enough questions for the query"),
        2 => Some("invalid parameter"),
        3 => Some("session token not found"),
        4 => Some("session token has returned all questions"),
        5 => Some("rate limited: too many requests"),
        _ => Some("unknown response code"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_amount_only() {
        let query = TriviaQuery::new(20);
        assert_eq!(
            query.url("https://opentdb.com"),
            "https://opentdb.com/api.php?amount=20"
        );
    }

    #[test]
    fn test_url_with_filters() {
        let query = TriviaQuery {
            amount: 20,
            category: Some(18),
            difficulty: Some(Difficulty::Medium),
            question_type: Some(QuestionType::Boolean),
        };
        assert_eq!(
            query.url("https://opentdb.com/"),
            "https://opentdb.com/api.php?amount=20&category=18&difficulty=medium&type=boolean"
        );
    }

    #[test]
    fn test_parse_filters() {
        assert_eq!("Hard".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert!("extreme".parse::<Difficulty>().is_err());
        assert_eq!("boolean".parse::<QuestionType>(), Ok(QuestionType::Boolean));
    }

    #[test]
    fn test_response_codes() {
        assert_eq!(response_code_message(0), None);
        assert!(response_code_message(5).unwrap().contains("rate limited"));
        assert!(response_code_message(42).is_some());
    }

    #[test]
    fn test_decode_questions_response() {
        let body = r#"{"response_code":0,"results":[{"type":"boolean","difficulty":"medium",
            "category":"Science: Computers","question":"HTML stands for Hypertext Markup Language.",
            "correct_answer":"True","incorrect_answers":["False"]}]}"#;
        let response: QuestionsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.response_code, 0);
        assert_eq!(response.results.len(), 1);

        let empty: QuestionsResponse = serde_json::from_str(r#"{"response_code":1}"#).unwrap();
        assert!(empty.results.is_empty());
    }
}
