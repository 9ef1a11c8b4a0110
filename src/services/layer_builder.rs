// src/services/layer_builder.rs
// DOCUMENTATION: Styled feature construction
// PURPOSE: Attach style, popup and value properties to municipality features,
// build the demonstration markers and compute layer extents

use crate::models::{
    FeatureStyle, GeoPoint, MunicipalityRef, Popup, Rgb, TerritoryEntity, TerritoryKind,
    ValueRange,
};
use crate::services::backend_client::MunicipalityDataset;
use crate::services::color_scale::{ColorScale, NO_DATA_COLOR};
use crate::services::legend::format_pt_br;
use geo_types::{Coord, Rect};
use geojson::{Bbox, Feature, FeatureCollection, Geometry, JsonValue, Value};
use serde::Serialize;

/// Extent of Brazil, used when a layer has no features: [min_lng, min_lat, max_lng, max_lat]
pub const BRAZIL_BOUNDS: [f64; 4] = [
    -73.98283055299,
    -33.7683777809,
    -28.84765906699,
    5.2842873834,
];

const DATA_BORDER_COLOR: &str = "#666666";
const NO_DATA_BORDER_COLOR: &str = "#cccccc";
const CHOROPLETH_WEIGHT: f64 = 0.3;
const CHOROPLETH_OPACITY: f64 = 0.8;
const TERRITORY_WEIGHT: f64 = 3.0;

/// Range the demonstration markers are colored on
pub const FALLBACK_RANGE: ValueRange = ValueRange {
    min: 10_000.0,
    max: 150_000.0,
};

/// State capitals drawn when no boundary file could be loaded
pub const FALLBACK_CAPITALS: [(&str, &str, GeoPoint); 12] = [
    ("São Paulo", "SP", GeoPoint::new(-23.5505, -46.6333)),
    ("Rio de Janeiro", "RJ", GeoPoint::new(-22.9068, -43.1729)),
    ("Brasília", "DF", GeoPoint::new(-15.7942, -47.8822)),
    ("Salvador", "BA", GeoPoint::new(-12.9714, -38.5014)),
    ("Fortaleza", "CE", GeoPoint::new(-3.7172, -38.5433)),
    ("Belo Horizonte", "MG", GeoPoint::new(-19.9167, -43.9345)),
    ("Curitiba", "PR", GeoPoint::new(-25.4244, -49.2654)),
    ("Porto Alegre", "RS", GeoPoint::new(-30.0346, -51.2177)),
    ("Manaus", "AM", GeoPoint::new(-3.1190, -60.0217)),
    ("Belém", "PA", GeoPoint::new(-1.4558, -48.5044)),
    ("Goiânia", "GO", GeoPoint::new(-16.6869, -49.2648)),
    ("Recife", "PE", GeoPoint::new(-8.0476, -34.8770)),
];

pub struct LayerBuilder;

impl LayerBuilder {
    /// Choropleth style for one municipality
    /// DOCUMENTATION: Zero, negative, NaN and absent values are drawn as "no data"
    pub fn metric_style(
        value: Option<f64>,
        range: ValueRange,
        base: Rgb,
        layer_opacity: f64,
    ) -> FeatureStyle {
        match value.filter(|v| *v > 0.0) {
            Some(v) => FeatureStyle {
                fill_color: ColorScale::color_for_value(v, range, base).to_hex(),
                fill_opacity: 0.7 * layer_opacity,
                weight: CHOROPLETH_WEIGHT,
                opacity: CHOROPLETH_OPACITY,
                color: DATA_BORDER_COLOR.to_string(),
                radius: None,
            },
            None => FeatureStyle {
                fill_color: NO_DATA_COLOR.to_string(),
                fill_opacity: 0.6 * layer_opacity,
                weight: CHOROPLETH_WEIGHT,
                opacity: CHOROPLETH_OPACITY,
                color: NO_DATA_BORDER_COLOR.to_string(),
                radius: None,
            },
        }
    }

    /// Outline-only style of a territory municipality
    pub fn territory_style(color: &str) -> FeatureStyle {
        FeatureStyle {
            fill_color: "transparent".to_string(),
            fill_opacity: 0.0,
            weight: TERRITORY_WEIGHT,
            opacity: 1.0,
            color: color.to_string(),
            radius: None,
        }
    }

    pub fn crop_popup(municipality: &MunicipalityRef, crop: &str, value: Option<f64>) -> Popup {
        let mut lines = vec![format!("Cultura: {}", crop)];
        match value.filter(|v| *v > 0.0) {
            Some(area) => {
                lines.push(format!("Área Colhida: {} hectares", format_pt_br(area, 3)));
                lines.push(format!("Código: {}", municipality.code_or_na()));
            }
            None => {
                lines.push("Dados não disponíveis".to_string());
                lines.push(format!("Código: {}", municipality.code_or_na()));
            }
        }

        Popup {
            title: municipality.title(),
            lines,
        }
    }

    pub fn metric_popup(
        municipality: &MunicipalityRef,
        layer_name: &str,
        unit: Option<&str>,
        value: Option<f64>,
    ) -> Popup {
        let first = match value.filter(|v| *v > 0.0) {
            Some(v) => format!("{}: {} {}", layer_name, format_pt_br(v, 2), unit.unwrap_or(""))
                .trim_end()
                .to_string(),
            None => format!("{}: Dados não disponíveis", layer_name),
        };

        Popup {
            title: municipality.title(),
            lines: vec![first, format!("Código: {}", municipality.code_or_na())],
        }
    }

    pub fn territory_popup(
        municipality: &MunicipalityRef,
        kind: TerritoryKind,
        entity_name: &str,
    ) -> Popup {
        Popup {
            title: municipality.title(),
            lines: vec![
                format!("{}: {}", kind.label(), entity_name),
                "Território de Atuação".to_string(),
                format!("Código IBGE: {}", municipality.code_or_na()),
            ],
        }
    }

    /// Copy of `feature` carrying the rendering properties
    pub fn styled_feature(
        feature: &Feature,
        style: &FeatureStyle,
        popup: &Popup,
        code: Option<&str>,
        value: Option<f64>,
    ) -> Feature {
        let mut styled = feature.clone();
        styled.set_property("style", to_json(style));
        styled.set_property("popup", to_json(popup));
        styled.set_property("municipality_code", code.map(str::to_string));
        styled.set_property("value", value);
        styled
    }

    /// Choropleth over `features`, values looked up by IBGE code in `data`
    pub fn choropleth<F>(
        features: &[&Feature],
        data: &MunicipalityDataset,
        range: ValueRange,
        base: Rgb,
        layer_opacity: f64,
        popup: F,
    ) -> Vec<Feature>
    where
        F: Fn(&MunicipalityRef, Option<f64>) -> Popup,
    {
        features
            .iter()
            .map(|feature| {
                let municipality = MunicipalityRef::from_feature(feature);
                let value = municipality
                    .code
                    .as_ref()
                    .and_then(|code| data.get(code))
                    .and_then(|record| record.metric());

                let style = Self::metric_style(value, range, base, layer_opacity);
                Self::styled_feature(
                    feature,
                    &style,
                    &popup(&municipality, value),
                    municipality.code.as_deref(),
                    value,
                )
            })
            .collect()
    }

    /// Outlined features of one territory entity
    pub fn territory_features(
        features: &[&Feature],
        kind: TerritoryKind,
        entity: &TerritoryEntity,
    ) -> Vec<Feature> {
        let style = Self::territory_style(&entity.color_or_default(kind));

        features
            .iter()
            .map(|feature| {
                let municipality = MunicipalityRef::from_feature(feature);
                let popup = Self::territory_popup(&municipality, kind, &entity.name);
                let mut styled = Self::styled_feature(
                    feature,
                    &style,
                    &popup,
                    municipality.code.as_deref(),
                    Some(1.0),
                );
                styled.set_property("territory_id", entity.id);
                styled
            })
            .collect()
    }

    /// Demonstration markers on the state capitals
    /// DOCUMENTATION: Values are `(i + 1) * 10000` hectares, colored on FALLBACK_RANGE
    pub fn fallback_capitals(crop: &str, base: Rgb) -> Vec<Feature> {
        FALLBACK_CAPITALS
            .iter()
            .enumerate()
            .map(|(i, (name, uf, point))| {
                let area = (i as f64 + 1.0) * 10_000.0;
                let style = FeatureStyle {
                    fill_color: ColorScale::color_for_value(area, FALLBACK_RANGE, base).to_hex(),
                    fill_opacity: 0.8,
                    weight: 2.0,
                    opacity: 1.0,
                    color: "#ffffff".to_string(),
                    radius: Some(fallback_marker_radius(area)),
                };
                let popup = Popup {
                    title: format!("{} ({})", name, uf),
                    lines: vec![
                        format!("Cultura: {}", crop),
                        format!("Área Colhida: {} hectares", format_pt_br(area, 0)),
                        "Dados de demonstração".to_string(),
                    ],
                };

                let marker = Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(Value::Point(vec![point.lng, point.lat]))),
                    id: None,
                    properties: None,
                    foreign_members: None,
                };
                let mut styled = Self::styled_feature(&marker, &style, &popup, None, Some(area));
                styled.set_property("name", *name);
                styled.set_property("state", *uf);
                styled
            })
            .collect()
    }

    /// Bounding box of every position in `features`, or BRAZIL_BOUNDS
    pub fn bounds(features: &[Feature]) -> [f64; 4] {
        let rect = features
            .iter()
            .filter_map(|feature| feature.geometry.as_ref())
            .fold(None, |acc, geometry| extend_bounds(acc, &geometry.value));

        match rect {
            Some(rect) => [rect.min().x, rect.min().y, rect.max().x, rect.max().y],
            None => BRAZIL_BOUNDS,
        }
    }

    /// FeatureCollection with its bbox set, plus the same bounds as an array
    pub fn collection(features: Vec<Feature>) -> (FeatureCollection, [f64; 4]) {
        let bounds = Self::bounds(&features);
        let bbox: Bbox = bounds.to_vec();
        (
            FeatureCollection {
                bbox: Some(bbox),
                features,
                foreign_members: None,
            },
            bounds,
        )
    }

    /// Range of a dataset's metric values
    pub fn value_range(data: &MunicipalityDataset) -> ValueRange {
        ValueRange::from_values(data.values().filter_map(|record| record.metric()))
    }
}

/// Marker radius in pixels for a demonstration value
pub fn fallback_marker_radius(value: f64) -> f64 {
    (value / 5000.0).sqrt().max(8.0)
}

fn to_json<T: Serialize>(value: &T) -> JsonValue {
    serde_json::to_value(value).unwrap_or(JsonValue::Null)
}

fn extend_bounds(acc: Option<Rect<f64>>, value: &Value) -> Option<Rect<f64>> {
    let positions: Vec<&Vec<f64>> = match value {
        Value::Point(p) => vec![p],
        Value::MultiPoint(ps) | Value::LineString(ps) => ps.iter().collect(),
        Value::MultiLineString(lines) | Value::Polygon(lines) => lines.iter().flatten().collect(),
        Value::MultiPolygon(polygons) => polygons.iter().flatten().flatten().collect(),
        Value::GeometryCollection(geometries) => {
            return geometries
                .iter()
                .fold(acc, |acc, geometry| extend_bounds(acc, &geometry.value));
        }
    };

    positions
        .into_iter()
        .filter(|position| position.len() >= 2)
        .fold(acc, |acc, position| {
            let (x, y) = (position[0], position[1]);
            Some(match acc {
                None => Rect::new(Coord { x, y }, Coord { x, y }),
                Some(rect) => Rect::new(
                    Coord {
                        x: rect.min().x.min(x),
                        y: rect.min().y.min(y),
                    },
                    Coord {
                        x: rect.max().x.max(x),
                        y: rect.max().y.max(y),
                    },
                ),
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MunicipalityRecord;
    use serde_json::json;

    const GREEN: Rgb = Rgb::new(76, 175, 80);

    fn municipality_feature(code: &str, name: &str, uf: &str, ring: Vec<Vec<f64>>) -> Feature {
        Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Polygon(vec![ring]))),
            id: None,
            properties: json!({"GEOCODIGO": code, "NOME": name, "UF": uf})
                .as_object()
                .cloned(),
            foreign_members: None,
        }
    }

    fn record(area: f64) -> MunicipalityRecord {
        MunicipalityRecord {
            harvested_area: Some(area),
            ..Default::default()
        }
    }

    #[test]
    fn test_no_data_style() {
        for value in [None, Some(0.0), Some(-3.0), Some(f64::NAN)] {
            let style = LayerBuilder::metric_style(value, ValueRange::new(1.0, 100.0), GREEN, 1.0);
            assert_eq!(style.fill_color, NO_DATA_COLOR);
            assert_eq!(style.color, "#cccccc");
            assert!((style.fill_opacity - 0.6).abs() < 1e-12);
        }
    }

    #[test]
    fn test_data_style_scales_with_layer_opacity() {
        let style = LayerBuilder::metric_style(Some(50.0), ValueRange::new(1.0, 100.0), GREEN, 0.5);
        assert_ne!(style.fill_color, NO_DATA_COLOR);
        assert_eq!(style.color, "#666666");
        assert!((style.fill_opacity - 0.35).abs() < 1e-12);
        assert_eq!(style.weight, 0.3);
    }

    #[test]
    fn test_territory_style_is_outline_only() {
        let style = LayerBuilder::territory_style("#ff5722");
        assert_eq!(style.fill_opacity, 0.0);
        assert_eq!(style.weight, 3.0);
        assert_eq!(style.color, "#ff5722");
    }

    #[test]
    fn test_crop_popups() {
        let m = MunicipalityRef {
            code: Some("5107925".to_string()),
            name: "Sorriso".to_string(),
            state: Some("MT".to_string()),
        };
        let with_data = LayerBuilder::crop_popup(&m, "Soja", Some(600000.5));
        assert_eq!(with_data.title, "Sorriso (MT)");
        assert_eq!(
            with_data.lines,
            vec!["Cultura: Soja", "Área Colhida: 600.000,5 hectares", "Código: 5107925"]
        );

        let without = LayerBuilder::crop_popup(&m, "Soja", None);
        assert_eq!(without.lines[1], "Dados não disponíveis");
    }

    #[test]
    fn test_metric_and_territory_popups() {
        let m = MunicipalityRef {
            code: None,
            name: "Sinop".to_string(),
            state: None,
        };
        let metric = LayerBuilder::metric_popup(&m, "Receita Soja", Some("R$"), Some(1234.5));
        assert_eq!(metric.lines[0], "Receita Soja: 1.234,5 R$");
        assert_eq!(metric.lines[1], "Código: N/A");

        let territory = LayerBuilder::territory_popup(&m, TerritoryKind::Vendedor, "Ana");
        assert_eq!(territory.title, "Sinop");
        assert_eq!(territory.lines[0], "Vendedor: Ana");
        assert_eq!(territory.lines[2], "Código IBGE: N/A");
    }

    #[test]
    fn test_choropleth_attaches_properties() {
        let a = municipality_feature("1", "A", "MT", vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![1.0, 1.0]]);
        let b = municipality_feature("2", "B", "MT", vec![vec![2.0, 2.0], vec![3.0, 2.0], vec![3.0, 3.0]]);
        let mut data = MunicipalityDataset::new();
        data.insert("1".to_string(), record(500.0));

        let features = LayerBuilder::choropleth(
            &[&a, &b],
            &data,
            LayerBuilder::value_range(&data),
            GREEN,
            1.0,
            |m, v| LayerBuilder::crop_popup(m, "Milho", v),
        );

        assert_eq!(features.len(), 2);
        let first = features[0].properties.as_ref().unwrap();
        assert_eq!(first["municipality_code"], "1");
        assert_eq!(first["value"], 500.0);
        assert_eq!(first["popup"]["lines"][0], "Cultura: Milho");
        assert_eq!(first["NOME"], "A");

        let second = features[1].properties.as_ref().unwrap();
        assert_eq!(second["value"], JsonValue::Null);
        assert_eq!(second["style"]["fillColor"], NO_DATA_COLOR);
    }

    #[test]
    fn test_fallback_capitals() {
        let markers = LayerBuilder::fallback_capitals("Café", GREEN);
        assert_eq!(markers.len(), 12);

        let first = markers[0].properties.as_ref().unwrap();
        assert_eq!(first["name"], "São Paulo");
        assert_eq!(first["value"], 10000.0);
        assert_eq!(first["style"]["radius"], 8.0);
        assert_eq!(first["popup"]["lines"][2], "Dados de demonstração");

        let last = markers[11].properties.as_ref().unwrap();
        assert_eq!(last["value"], 120000.0);
        assert!(last["style"]["radius"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn test_marker_radius_floor() {
        assert_eq!(fallback_marker_radius(10_000.0), 8.0);
        assert!((fallback_marker_radius(500_000.0) - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_bounds_cover_all_positions() {
        let a = municipality_feature("1", "A", "MT", vec![vec![-50.0, -10.0], vec![-49.0, -10.0], vec![-49.0, -9.0]]);
        let b = municipality_feature("2", "B", "MT", vec![vec![-47.0, -12.0], vec![-46.5, -12.0], vec![-46.5, -11.0]]);
        assert_eq!(LayerBuilder::bounds(&[a, b]), [-50.0, -12.0, -46.5, -9.0]);
    }

    #[test]
    fn test_empty_layer_uses_brazil_bounds() {
        let (collection, bounds) = LayerBuilder::collection(vec![]);
        assert_eq!(bounds, BRAZIL_BOUNDS);
        assert_eq!(collection.bbox, Some(BRAZIL_BOUNDS.to_vec()));
    }

    #[test]
    fn test_value_range_ignores_zero() {
        let mut data = MunicipalityDataset::new();
        data.insert("1".to_string(), record(0.0));
        data.insert("2".to_string(), record(40.0));
        data.insert("3".to_string(), record(900.0));
        assert_eq!(LayerBuilder::value_range(&data), ValueRange::new(40.0, 900.0));

        assert_eq!(
            LayerBuilder::value_range(&MunicipalityDataset::new()),
            ValueRange::default()
        );
    }
}
