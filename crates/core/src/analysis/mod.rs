//! Natural-language summary of the walkable area.
//!
//! The remote service is untrusted: any failure resolves to a fixed fallback
//! so the panel always has something to show.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use walkshed_transit::{StationIdentifier, TransitStation};

use crate::state::TimeThresholds;

pub mod client;

pub use client::{AnalysisConfig, GenerativeTextClient};

pub const FALLBACK_SUMMARY: &str = "暫時無法分析此區域，請稍後再試。";
pub const FALLBACK_PLACES: [&str; 2] = ["請檢查網路連線", "或 API 金鑰設定"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: String,
    pub places: Vec<String>,
}

impl AnalysisResult {
    pub fn fallback() -> Self {
        Self {
            summary: FALLBACK_SUMMARY.to_owned(),
            places: FALLBACK_PLACES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub station_names: Vec<String>,
    /// Largest configured threshold; gives the broadest context.
    pub max_minutes: u32,
}

impl AnalysisRequest {
    pub fn new(stations: &[Arc<dyn TransitStation>], thresholds: &TimeThresholds) -> Self {
        Self {
            station_names: stations.iter().map(|s| s.name().to_owned()).collect(),
            max_minutes: thresholds.max(),
        }
    }

    pub fn joined_names(&self) -> String {
        self.station_names.iter().join("、")
    }

    pub fn is_plural(&self) -> bool {
        self.station_names.len() > 1
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("no API credential configured")]
    MissingCredential,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned no text")]
    EmptyResponse,

    #[error("malformed analysis payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Remote text generation behind the analysis panel.
pub trait AnalysisService: Send + Sync {
    fn analyze<'a>(
        &'a self,
        request: &'a AnalysisRequest,
    ) -> Pin<Box<dyn Future<Output = Result<AnalysisResult, AnalysisError>> + Send + 'a>>;
}

/// Never fails: errors are logged and replaced with [`AnalysisResult::fallback`].
pub async fn analyze_or_fallback(
    service: &dyn AnalysisService,
    request: &AnalysisRequest,
) -> AnalysisResult {
    match service.analyze(request).await {
        Ok(result) => result,
        Err(error) => {
            tracing::error!("area analysis failed: {error}");
            AnalysisResult::fallback()
        }
    }
}

/// Panel state: a loading flag and the last result for the current selection.
#[derive(Clone, Debug, Default)]
pub struct AnalysisPanel {
    loading: bool,
    result: Option<AnalysisResult>,
    subject: Vec<StationIdentifier>,
}

impl AnalysisPanel {
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub(crate) fn start(&mut self) -> bool {
        if self.loading {
            return false;
        }
        self.loading = true;
        true
    }

    pub(crate) fn finish(&mut self, result: AnalysisResult) {
        self.loading = false;
        self.result = Some(result);
    }

    /// Drops the result when the selected id list differs from the last one seen.
    pub(crate) fn track_selection(&mut self, ids: &[StationIdentifier]) {
        if self.subject != ids {
            self.subject = ids.to_vec();
            self.result = None;
        }
    }
}
