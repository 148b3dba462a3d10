use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisConfig;
use crate::catchment::CatchmentParams;
use crate::locate::LocateConfig;
use crate::map::ViewportConfig;

/// Raster basemap the host draws under the overlays.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileSourceConfig {
    /// `{s}` is replaced with one of `subdomains`, `{r}` with the retina suffix.
    pub url_template: String,
    pub subdomains: String,
    pub attribution: String,
    pub max_zoom: u8,
}

impl Default for TileSourceConfig {
    fn default() -> Self {
        Self {
            url_template: "https://{s}.basemaps.cartocdn.com/rastertiles/voyager/{z}/{x}/{y}{r}.png"
                .to_owned(),
            subdomains: "abcd".to_owned(),
            attribution: "&copy; OpenStreetMap contributors &copy; CARTO".to_owned(),
            max_zoom: 20,
        }
    }
}

impl TileSourceConfig {
    /// One concrete URL template per subdomain, without the retina suffix.
    pub fn expanded_urls(&self) -> Vec<String> {
        let template = self.url_template.replace("{r}", "");
        if !template.contains("{s}") || self.subdomains.is_empty() {
            return vec![template];
        }

        self.subdomains
            .chars()
            .map(|s| template.replace("{s}", &s.to_string()))
            .collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkshedConfig {
    pub catchment: CatchmentParams,
    pub viewport: ViewportConfig,
    pub locate: LocateConfig,
    pub analysis: AnalysisConfig,
    pub tiles: TileSourceConfig,
}

impl WalkshedConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
