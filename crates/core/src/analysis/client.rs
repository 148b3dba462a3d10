use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::analysis::{AnalysisError, AnalysisRequest, AnalysisResult, AnalysisService};

const API_KEY_VAR: &str = "API_KEY";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub endpoint: String,
    pub model: String,
    /// Falls back to the `API_KEY` environment variable when unset.
    pub api_key: Option<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_owned(),
            model: "gemini-2.5-flash".to_owned(),
            api_key: None,
        }
    }
}

impl AnalysisConfig {
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_VAR).ok())
            .filter(|key| !key.trim().is_empty())
    }
}

/// `generateContent` client for the hosted text model.
pub struct GenerativeTextClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl GenerativeTextClient {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_owned(),
            model: config.model.clone(),
            api_key: config.resolved_api_key(),
        }
    }

    async fn generate(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(AnalysisError::MissingCredential)?;

        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(build_prompt(request)),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        tracing::debug!("requesting analysis for {} stations", request.station_names.len());

        let response: GenerateContentResponse = self
            .http
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let text = response
            .candidates
            .into_iter()
            .flat_map(|candidate| candidate.content.parts)
            .find_map(|part| part.text)
            .filter(|text| !text.trim().is_empty())
            .ok_or(AnalysisError::EmptyResponse)?;

        parse_result(&text)
    }
}

impl AnalysisService for GenerativeTextClient {
    fn analyze<'a>(
        &'a self,
        request: &'a AnalysisRequest,
    ) -> Pin<Box<dyn Future<Output = Result<AnalysisResult, AnalysisError>> + Send + 'a>> {
        Box::pin(self.generate(request))
    }
}

pub fn build_prompt(request: &AnalysisRequest) -> String {
    let names = request.joined_names();
    let minutes = request.max_minutes;
    let meters = minutes * 80;
    let (kind, centre, scope) = if request.is_plural() {
        ("這幾個捷運站", "這些站點", "這些區域的綜合")
    } else {
        ("站", "該站", "這個範圍內的")
    };

    format!(
        r#"我正在分析台北捷運 "{names}" {kind}周邊的可步行範圍。

請想像以{centre}為中心，步行 {minutes} 分鐘 (大約 {meters} 公尺) 的範圍。

請以繁體中文 (Traditional Chinese) 提供以下資訊：
1. 一個簡短的段落，描述{scope}生活氛圍、特色或適合的族群 (最多 100 字)。
2. 列出 3 到 5 個具體的推薦地點類別或地標 (例如：著名的咖啡廳區域、特定公園、夜市、或文化景點)，並附帶一句簡短說明。

請以 JSON 格式回傳，格式如下：
{{
  "summary": "...",
  "places": ["地標/類別 1: 說明", "地標/類別 2: 說明", "地標/類別 3: 說明"]
}}"#
    )
}

/// Parse the model's JSON answer, tolerating a surrounding ```json fence.
pub fn parse_result(text: &str) -> Result<AnalysisResult, AnalysisError> {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_end().trim_end_matches("```"))
        .unwrap_or(trimmed);

    Ok(serde_json::from_str(unfenced.trim())?)
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}
