/*
 * Oracle Module
 *
 * Natural-language search through an external AI service. The service
 * receives a compact view of the catalog and the user's query and answers
 * with a short reasoning string and the ids of matching entries.
 *
 * Requests run on a background thread and are polled from the frame loop,
 * so rendering never waits on the network. Every failure is turned into the
 * fallback recommendation: callers never see an error state.
 */

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::catalog::Dapp;
use crate::error::{Result, ShowcaseError};
use crate::params::OracleParams;

pub const FALLBACK_REASONING: &str = "Interference detected. Showing all viable nodes.";
pub const PENDING_MESSAGE: &str = "INITIALIZING NEURAL LINK...";

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub reasoning: String,
    #[serde(default)]
    pub recommended_app_ids: Vec<String>,
    #[serde(default)]
    pub search_keywords: Vec<String>,
}

impl Recommendation {
    pub fn fallback() -> Self {
        Self {
            reasoning: FALLBACK_REASONING.to_string(),
            recommended_app_ids: Vec::new(),
            search_keywords: Vec::new(),
        }
    }
}

// Compact entry sent as context to keep the prompt small
#[derive(Debug, Serialize)]
struct ContextEntry<'a> {
    id: &'a str,
    name: &'a str,
    tags: &'a [String],
    info: &'a str,
}

pub fn build_prompt(query: &str, entries: &[Dapp]) -> String {
    let context: Vec<ContextEntry> = entries
        .iter()
        .map(|d| ContextEntry {
            id: &d.id,
            name: &d.name,
            tags: &d.tags,
            info: &d.description,
        })
        .collect();
    let context = serde_json::to_string(&context).unwrap_or_else(|_| "[]".to_string());

    format!(
        "You are the Oracle of the Monad Tunnel.\n\n\
         Context: a list of dapps on Monad:\n{context}\n\n\
         User query: \"{query}\"\n\n\
         Task:\n\
         1. Identify every dapp that matches the user's intent.\n\
         2. A question about trading means DEXs, a question about gaming means games.\n\
         3. Return the matching ids as recommendedAppIds.\n\
         4. Return general keywords related to the query as searchKeywords.\n\
         5. Provide a reasoning string of at most 30 words.\n\n\
         Return JSON."
    )
}

/// Anything that can answer a natural-language query over the catalog.
pub trait RecommendationSource: Send + Sync {
    fn recommend(&self, query: &str, entries: &[Dapp]) -> Result<Recommendation>;
}

/// Ask the source, turning any failure into the fallback recommendation.
pub fn recommend_or_fallback(
    source: &dyn RecommendationSource,
    query: &str,
    entries: &[Dapp],
) -> Recommendation {
    match source.recommend(query, entries) {
        Ok(recommendation) => recommendation,
        Err(e) => {
            log::error!("Oracle error: {}", e);
            Recommendation::fallback()
        }
    }
}

// Gemini generateContent response, only the parts we read
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

// Pull the JSON answer out of a generateContent response body
pub fn parse_generate_response(body: &str) -> Result<Recommendation> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| ShowcaseError::OracleResponse(format!("invalid envelope: {e}")))?;
    let text = response
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .find_map(|p| p.text)
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ShowcaseError::OracleResponse("no response from AI".to_string()))?;
    serde_json::from_str(&text)
        .map_err(|e| ShowcaseError::OracleResponse(format!("invalid answer: {e}")))
}

/// Gemini-backed recommendation source.
pub struct GeminiOracle {
    params: OracleParams,
}

impl GeminiOracle {
    pub fn new(params: OracleParams) -> Self {
        Self { params }
    }

    fn api_key(&self) -> Result<String> {
        std::env::var(&self.params.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ShowcaseError::MissingApiKey(self.params.api_key_env.clone()))
    }

    fn request_body(query: &str, entries: &[Dapp]) -> serde_json::Value {
        json!({
            "contents": [{ "parts": [{ "text": build_prompt(query, entries) }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "reasoning": { "type": "STRING" },
                        "recommendedAppIds": { "type": "ARRAY", "items": { "type": "STRING" } },
                        "searchKeywords": { "type": "ARRAY", "items": { "type": "STRING" } }
                    },
                    "required": ["reasoning", "recommendedAppIds"]
                }
            }
        })
    }
}

impl RecommendationSource for GeminiOracle {
    fn recommend(&self, query: &str, entries: &[Dapp]) -> Result<Recommendation> {
        let api_key = self.api_key()?;
        let url = format!(
            "{}/{}:generateContent",
            self.params.endpoint.trim_end_matches('/'),
            self.params.model
        );

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(self.params.timeout_secs))
            .build()?;
        let body = client
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&Self::request_body(query, entries))
            .send()?
            .error_for_status()?
            .text()?;

        parse_generate_response(&body)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OracleStatus {
    Idle,
    Pending,
    Answered(Recommendation),
}

/// Runs one query at a time in the background and hands the answer back
/// to the frame loop.
pub struct OracleClient {
    source: Arc<dyn RecommendationSource>,
    pending: Option<mpsc::Receiver<Recommendation>>,
}

impl OracleClient {
    pub fn new(source: Arc<dyn RecommendationSource>) -> Self {
        Self { source, pending: None }
    }

    /// Start a query. Blank queries and queries made while another is in
    /// flight are ignored; returns whether a request was started.
    pub fn submit(&mut self, query: &str, entries: &[Dapp]) -> bool {
        let query = query.trim();
        if query.is_empty() || self.pending.is_some() {
            return false;
        }

        let (tx, rx) = mpsc::channel();
        let source = Arc::clone(&self.source);
        let query = query.to_string();
        let entries = entries.to_vec();

        std::thread::spawn(move || {
            let recommendation = recommend_or_fallback(source.as_ref(), &query, &entries);
            let _ = tx.send(recommendation);
        });

        log::info!("Oracle query submitted");
        self.pending = Some(rx);
        true
    }

    // Poll for a finished query. Call every frame.
    pub fn poll(&mut self) -> OracleStatus {
        let Some(rx) = &self.pending else {
            return OracleStatus::Idle;
        };
        match rx.try_recv() {
            Ok(recommendation) => {
                self.pending = None;
                OracleStatus::Answered(recommendation)
            }
            Err(mpsc::TryRecvError::Empty) => OracleStatus::Pending,
            Err(mpsc::TryRecvError::Disconnected) => {
                self.pending = None;
                OracleStatus::Answered(Recommendation::fallback())
            }
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use std::time::Instant;

    struct Failing;

    impl RecommendationSource for Failing {
        fn recommend(&self, _query: &str, _entries: &[Dapp]) -> Result<Recommendation> {
            Err(ShowcaseError::OracleResponse("boom".to_string()))
        }
    }

    struct Fixed(Vec<String>);

    impl RecommendationSource for Fixed {
        fn recommend(&self, _query: &str, _entries: &[Dapp]) -> Result<Recommendation> {
            Ok(Recommendation {
                reasoning: "Trading venues.".to_string(),
                recommended_app_ids: self.0.clone(),
                search_keywords: vec!["dex".to_string()],
            })
        }
    }

    fn entries() -> Vec<Dapp> {
        Catalog::from_json(r#"[{"NAME": "Swapper", "INFO": "A DEX", "TAGS": "DeFi"}]"#)
            .unwrap()
            .entries
    }

    fn wait(client: &mut OracleClient) -> Recommendation {
        let start = Instant::now();
        loop {
            match client.poll() {
                OracleStatus::Answered(r) => return r,
                OracleStatus::Pending => {
                    assert!(start.elapsed() < Duration::from_secs(5));
                    std::thread::sleep(Duration::from_millis(5));
                }
                OracleStatus::Idle => panic!("query was not submitted"),
            }
        }
    }

    #[test]
    fn failure_yields_fallback() {
        let answer = recommend_or_fallback(&Failing, "where to trade?", &entries());
        assert_eq!(answer, Recommendation::fallback());
        assert!(answer.recommended_app_ids.is_empty());
        assert_eq!(answer.reasoning, FALLBACK_REASONING);
    }

    #[test]
    fn missing_key_is_reported_as_error() {
        let oracle = GeminiOracle::new(OracleParams {
            api_key_env: "DAPP_TUNNEL_TEST_KEY_THAT_IS_NOT_SET".to_string(),
            ..Default::default()
        });
        let result = oracle.recommend("games", &entries());
        assert!(matches!(result, Err(ShowcaseError::MissingApiKey(_))));
    }

    #[test]
    fn parses_generate_content_envelope() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":
            "{\"reasoning\":\"DEXs\",\"recommendedAppIds\":[\"Swapper\"]}"}]}}]}"#;
        let answer = parse_generate_response(body).unwrap();
        assert_eq!(answer.reasoning, "DEXs");
        assert_eq!(answer.recommended_app_ids, vec!["Swapper".to_string()]);
        assert!(answer.search_keywords.is_empty());

        assert!(parse_generate_response(r#"{"candidates":[]}"#).is_err());
        assert!(parse_generate_response("not json").is_err());
    }

    #[test]
    fn prompt_carries_query_and_context() {
        let prompt = build_prompt("where to trade?", &entries());
        assert!(prompt.contains("\"where to trade?\""));
        assert!(prompt.contains("\"id\":\"Swapper\""));
        assert!(prompt.contains("\"info\":\"A DEX\""));
    }

    #[test]
    fn background_client_delivers_answer() {
        let mut client = OracleClient::new(Arc::new(Fixed(vec!["Swapper".to_string()])));
        assert_eq!(client.poll(), OracleStatus::Idle);
        assert!(!client.submit("   ", &entries()));
        assert!(client.submit("trade", &entries()));
        assert!(!client.submit("again", &entries()));
        let answer = wait(&mut client);
        assert_eq!(answer.recommended_app_ids, vec!["Swapper".to_string()]);
        assert!(!client.is_pending());
    }

    #[test]
    fn background_failure_is_not_an_error_state() {
        let mut client = OracleClient::new(Arc::new(Failing));
        assert!(client.submit("anything", &entries()));
        assert_eq!(wait(&mut client), Recommendation::fallback());
        assert_eq!(client.poll(), OracleStatus::Idle);
    }
}
