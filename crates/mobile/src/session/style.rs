use walkshed_core::TileSourceConfig;
use walkshed_core::map::ViewportConfig;

pub(crate) const BASE_STYLE: &str = include_str!("../../../../assets/base-style.json");

pub(crate) const OVERLAY_SOURCE: &str = "walkshed-overlays";
pub(crate) const MARKER_SOURCE: &str = "walkshed-markers";

/// Point the base style at the configured basemap and the local overlay server.
pub(crate) fn rewrite_style_sources(
    base_style: &str,
    overlay_base_url: &str,
    tiles: &TileSourceConfig,
    viewport: &ViewportConfig,
) -> Result<String, serde_json::Error> {
    let mut style: serde_json::Value = serde_json::from_str(base_style)?;

    if let Some(sources) = style.get_mut("sources").and_then(|s| s.as_object_mut()) {
        for (name, source) in sources.iter_mut() {
            let Some(obj) = source.as_object_mut() else {
                continue;
            };
            let source_type = obj.get("type").and_then(|t| t.as_str()).unwrap_or("");

            match (source_type, name.as_str()) {
                ("raster", _) => {
                    obj.remove("url");
                    obj.insert("tiles".to_string(), serde_json::json!(tiles.expanded_urls()));
                    obj.insert("maxzoom".to_string(), serde_json::json!(tiles.max_zoom));
                    obj.insert("attribution".to_string(), serde_json::json!(tiles.attribution));
                }
                ("geojson", OVERLAY_SOURCE) => {
                    obj.insert(
                        "data".to_string(),
                        serde_json::json!(format!("{overlay_base_url}/overlays.geojson")),
                    );
                }
                ("geojson", MARKER_SOURCE) => {
                    obj.insert(
                        "data".to_string(),
                        serde_json::json!(format!("{overlay_base_url}/markers.geojson")),
                    );
                }
                _ => {}
            }
        }
    }

    if let Some(root) = style.as_object_mut() {
        let center = viewport.initial_center;
        root.insert("center".to_string(), serde_json::json!([center.lng, center.lat]));
        root.insert("zoom".to_string(), serde_json::json!(viewport.initial_zoom));
    }

    serde_json::to_string(&style)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sources_point_at_basemap_and_overlay_server() {
        let json = rewrite_style_sources(
            BASE_STYLE,
            "http://127.0.0.1:4321",
            &TileSourceConfig::default(),
            &ViewportConfig::default(),
        )
        .unwrap();
        let style: serde_json::Value = serde_json::from_str(&json).unwrap();

        let basemap = &style["sources"]["basemap"];
        assert!(basemap.get("url").is_none());
        assert_eq!(basemap["tiles"].as_array().unwrap().len(), 4);
        assert_eq!(basemap["maxzoom"], 20);

        assert_eq!(
            style["sources"][OVERLAY_SOURCE]["data"],
            "http://127.0.0.1:4321/overlays.geojson"
        );
        assert_eq!(
            style["sources"][MARKER_SOURCE]["data"],
            "http://127.0.0.1:4321/markers.geojson"
        );
        assert_eq!(style["center"], serde_json::json!([121.5170, 25.0478]));
        assert_eq!(style["zoom"], 13.0);
    }

    #[test]
    fn invalid_base_style_is_an_error() {
        assert!(
            rewrite_style_sources(
                "{",
                "http://127.0.0.1:1",
                &TileSourceConfig::default(),
                &ViewportConfig::default(),
            )
            .is_err()
        );
    }
}
