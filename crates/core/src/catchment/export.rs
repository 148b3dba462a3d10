use geo::{MultiPolygon, Polygon};
use geojson::{Feature, FeatureCollection, Geometry, Value};

use crate::catchment::CatchmentLayer;
use crate::style::hex;

fn polygon_rings(poly: &Polygon) -> Vec<Vec<Vec<f64>>> {
    let exterior: Vec<Vec<f64>> = poly.exterior().0.iter().map(|c| vec![c.x, c.y]).collect();

    let mut rings = vec![exterior];

    for interior in poly.interiors() {
        let hole: Vec<Vec<f64>> = interior.0.iter().map(|c| vec![c.x, c.y]).collect();
        rings.push(hole);
    }

    rings
}

/// Convert a geo MultiPolygon to GeoJSON Value
pub fn multipolygon_to_geojson(mp: &MultiPolygon) -> Value {
    Value::MultiPolygon(mp.0.iter().map(polygon_rings).collect())
}

/// One layer as a Feature carrying its style as simplestyle-like properties.
pub fn layer_to_feature(layer: &CatchmentLayer) -> Feature {
    let border = &layer.style.border;

    let mut properties = serde_json::Map::new();
    properties.insert("minutes".to_string(), serde_json::json!(layer.minutes));
    properties.insert("radius_km".to_string(), serde_json::json!(layer.radius_km));
    properties.insert("z_rank".to_string(), serde_json::json!(layer.z_rank));
    properties.insert("stroke".to_string(), serde_json::json!(hex(border.color)));
    properties.insert(
        "stroke-opacity".to_string(),
        serde_json::json!(border.color.alpha),
    );
    properties.insert("stroke-width".to_string(), serde_json::json!(border.width_px));
    if let Some((dash, gap)) = border.dash {
        properties.insert("stroke-dasharray".to_string(), serde_json::json!([dash, gap]));
    }
    properties.insert("fill".to_string(), serde_json::json!(hex(layer.style.fill)));
    properties.insert(
        "fill-opacity".to_string(),
        serde_json::json!(layer.style.fill.alpha),
    );

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(multipolygon_to_geojson(&layer.polygon))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// All layers, in draw order.
pub fn layers_to_collection(layers: &[CatchmentLayer]) -> FeatureCollection {
    let mut ordered: Vec<&CatchmentLayer> = layers.iter().collect();
    ordered.sort_by_key(|layer| layer.z_rank);

    FeatureCollection {
        bbox: None,
        features: ordered.into_iter().map(layer_to_feature).collect(),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catchment::{compute_layers, disc};
    use std::sync::Arc;
    use walkshed_transit::{Coordinates, LineColor, StationIdentifier, StationImpl, TransitStation};

    #[test]
    fn multipolygon_keeps_rings() {
        let mp = MultiPolygon::new(vec![disc(Coordinates::new(25.0, 121.0), 0.2, 16)]);

        match multipolygon_to_geojson(&mp) {
            Value::MultiPolygon(polygons) => {
                assert_eq!(polygons.len(), 1);
                assert_eq!(polygons[0].len(), 1);
                assert_eq!(polygons[0][0].len(), 17);
            }
            _ => panic!("Expected MultiPolygon value"),
        }
    }

    #[test]
    fn collection_is_in_draw_order_with_style() {
        let station: Arc<dyn TransitStation> = Arc::new(StationImpl {
            id: StationIdentifier::new("BL15"),
            name: "忠孝復興".into(),
            line: "板南線".into(),
            color: LineColor::Blue,
            coords: Coordinates::new(25.0416, 121.5437),
        });

        let mut layers = compute_layers(&[station], &[3, 12, 7]);
        layers.reverse();
        let collection = layers_to_collection(&layers);

        let minutes: Vec<_> = collection
            .features
            .iter()
            .map(|f| f.property("minutes").and_then(|m| m.as_u64()).unwrap())
            .collect();
        assert_eq!(minutes, [12, 7, 3]);

        let outer = &collection.features[0];
        assert_eq!(outer.property("stroke").unwrap(), "#818cf8");
        assert!(outer.property("stroke-dasharray").is_some());
        assert!(collection.features[1].property("stroke-dasharray").is_none());
        assert_eq!(collection.features[2].property("fill").unwrap(), "#312e81");
    }
}
