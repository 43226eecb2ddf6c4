//! Open Trivia DB HTTP client.
//!
//! Fetches questions and turns the JSON `results` array into a
//! [`Dataset`]. Question text is stored as returned by the API, HTML
//! entities included.

mod types;

pub use types::{response_code_message, Category, Difficulty, QuestionType, TriviaQuery};

use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::error::{LoadError, Result};
use types::{CategoriesResponse, QuestionsResponse};

/// Public Open Trivia DB endpoint.
pub const DEFAULT_BASE_URL: &str = "https://opentdb.com";

/// HTTP client for the trivia API.
#[derive(Debug, Clone)]
pub struct TriviaClient {
    base_url: String,
    client: reqwest::Client,
}

impl TriviaClient {
    /// Create a client for `base_url` (e.g. [`DEFAULT_BASE_URL`]).
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("trivia-loader/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL that [`fetch_questions`](Self::fetch_questions) requests.
    pub fn questions_url(&self, query: &TriviaQuery) -> String {
        query.url(&self.base_url)
    }

    /// Fetch questions matching `query` as a dataset, one row per question.
    pub async fn fetch_questions(&self, query: &TriviaQuery) -> Result<Dataset> {
        let url = self.questions_url(query);
        debug!("GET {}", url);

        let response: QuestionsResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(message) = response_code_message(response.response_code) {
            return Err(LoadError::Api {
                code: response.response_code,
                message: message.to_string(),
            });
        }

        let dataset = Dataset::from_records(&response.results)?;
        info!("Fetched {} trivia questions", dataset.row_count());
        Ok(dataset)
    }

    /// List the available categories.
    pub async fn fetch_categories(&self) -> Result<Vec<Category>> {
        let url = format!("{}/api_category.php", self.base_url);
        debug!("GET {}", url);

        let response: CategoriesResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.trivia_categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_questions_url_uses_base() {
        let client = TriviaClient::new("http://localhost:8080/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(
            client.questions_url(&TriviaQuery::new(5)),
            "http://localhost:8080/api.php?amount=5"
        );
    }
}
