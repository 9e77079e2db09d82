// src/services/map_cluster.rs
// DOCUMENTATION: Marker clustering for the city map
// PURPOSE: Group nearby business markers into clusters for a given zoom level
//
// Points are projected to Web-Mercator pixel space at the requested zoom and
// bucketed into square cells of `radius_px`. A cell holding two or more
// points becomes one cluster; a lone point stays a marker.

use geo_types::{Coord, Point, Rect};
use geojson::{feature::Id, Feature, FeatureCollection, Geometry, JsonObject};
use serde_json::json;
use std::collections::BTreeMap;
use std::f64::consts::PI;
use uuid::Uuid;

/// Latitude limit of the Web-Mercator projection
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

pub const DEFAULT_ZOOM: u8 = 12;
pub const MAX_ZOOM: u8 = 20;

/// A business with coordinates, ready to be placed on the map
#[derive(Debug, Clone)]
pub struct MapPoint {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub category: String,
    /// x = longitude, y = latitude
    pub location: Point<f64>,
    pub is_sponsored: bool,
}

impl MapPoint {
    pub fn lat(&self) -> f64 {
        self.location.y()
    }

    pub fn lng(&self) -> f64 {
        self.location.x()
    }

    fn is_valid(&self) -> bool {
        let (lat, lng) = (self.lat(), self.lng());
        lat.is_finite()
            && lng.is_finite()
            && lat.abs() <= MAX_MERCATOR_LAT
            && lng.abs() <= 180.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ClusterOptions {
    /// Cell edge in screen pixels
    pub radius_px: f64,
    /// From this zoom on every point is its own marker
    pub disable_at_zoom: u8,
    pub tile_size: f64,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        ClusterOptions {
            radius_px: 80.0,
            disable_at_zoom: 18,
            tile_size: 256.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cluster {
    /// Stable within one zoom level: "{zoom}/{row}/{col}"
    pub key: String,
    /// Mean position of the members
    pub center: Point<f64>,
    pub point_count: usize,
    pub sponsored_count: usize,
    pub bbox: Rect<f64>,
    /// Zoom at which the cluster starts to split
    pub expansion_zoom: u8,
}

#[derive(Debug, Clone)]
pub enum MapFeature {
    Marker(MapPoint),
    Cluster(Cluster),
}

/// Web-Mercator pixel coordinates of a lat/lng at `zoom`
pub fn project(lat: f64, lng: f64, zoom: u8, tile_size: f64) -> (f64, f64) {
    let world = tile_size * f64::powi(2.0, i32::from(zoom));
    let x = (lng + 180.0) / 360.0 * world;
    let sin_lat = lat.to_radians().sin();
    let y = (0.5 - ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / (4.0 * PI)) * world;
    (x, y)
}

/// Cluster `points` for display at `zoom`
///
/// Invalid coordinates are dropped, as are points outside `viewport`
/// (edges inclusive). Output is ordered by cell row, then column; points
/// within a cell keep their input order.
pub fn cluster_points(
    points: &[MapPoint],
    zoom: u8,
    viewport: Option<Rect<f64>>,
    options: &ClusterOptions,
) -> Vec<MapFeature> {
    let zoom = zoom.min(MAX_ZOOM);
    let visible: Vec<&MapPoint> = points
        .iter()
        .filter(|p| p.is_valid())
        .filter(|p| viewport.map_or(true, |rect| rect_contains(&rect, &p.location)))
        .collect();

    if zoom >= options.disable_at_zoom {
        return visible
            .into_iter()
            .map(|p| MapFeature::Marker(p.clone()))
            .collect();
    }

    let cell_size = options.radius_px.max(1.0);
    let mut cells: BTreeMap<(i64, i64), Vec<&MapPoint>> = BTreeMap::new();
    for point in visible {
        let (x, y) = project(point.lat(), point.lng(), zoom, options.tile_size);
        let key = ((y / cell_size).floor() as i64, (x / cell_size).floor() as i64);
        cells.entry(key).or_default().push(point);
    }

    let expansion_zoom = (zoom + 1).min(options.disable_at_zoom);
    cells
        .into_iter()
        .map(|((row, col), members)| {
            if members.len() == 1 {
                MapFeature::Marker(members[0].clone())
            } else {
                MapFeature::Cluster(build_cluster(
                    format!("{}/{}/{}", zoom, row, col),
                    &members,
                    expansion_zoom,
                ))
            }
        })
        .collect()
}

fn build_cluster(key: String, members: &[&MapPoint], expansion_zoom: u8) -> Cluster {
    let count = members.len() as f64;
    let (sum_lat, sum_lng) = members
        .iter()
        .fold((0.0, 0.0), |(lat, lng), p| (lat + p.lat(), lng + p.lng()));

    let bbox = members
        .iter()
        .skip(1)
        .fold(point_rect(&members[0].location), |rect, p| {
            extend_rect(rect, &p.location)
        });

    Cluster {
        key,
        center: Point::new(sum_lng / count, sum_lat / count),
        point_count: members.len(),
        sponsored_count: members.iter().filter(|p| p.is_sponsored).count(),
        bbox,
        expansion_zoom,
    }
}

/// Rectangle covering every valid point
pub fn bounds(points: &[MapPoint]) -> Option<Rect<f64>> {
    let mut valid = points.iter().filter(|p| p.is_valid());
    let first = valid.next()?;
    Some(valid.fold(point_rect(&first.location), |rect, p| {
        extend_rect(rect, &p.location)
    }))
}

/// [lat, lng] the map opens on: bounds centre, else the city, else the origin
pub fn map_center(bounds: Option<&Rect<f64>>, city: Option<(f64, f64)>) -> [f64; 2] {
    if let Some(rect) = bounds {
        let center = rect.center();
        return [center.y, center.x];
    }
    match city {
        Some((lat, lng)) => [lat, lng],
        None => [0.0, 0.0],
    }
}

/// [min_lat, min_lng, max_lat, max_lng]
pub fn rect_to_lat_lng_array(rect: &Rect<f64>) -> [f64; 4] {
    [rect.min().y, rect.min().x, rect.max().y, rect.max().x]
}

/// Build a viewport rectangle from a lat/lng box
pub fn viewport(min_lat: f64, min_lng: f64, max_lat: f64, max_lng: f64) -> Rect<f64> {
    Rect::new(
        Coord { x: min_lng, y: min_lat },
        Coord { x: max_lng, y: max_lat },
    )
}

fn rect_contains(rect: &Rect<f64>, point: &Point<f64>) -> bool {
    let (min, max) = (rect.min(), rect.max());
    point.x() >= min.x && point.x() <= max.x && point.y() >= min.y && point.y() <= max.y
}

fn point_rect(point: &Point<f64>) -> Rect<f64> {
    Rect::new(point.0, point.0)
}

fn extend_rect(rect: Rect<f64>, point: &Point<f64>) -> Rect<f64> {
    let (min, max) = (rect.min(), rect.max());
    Rect::new(
        Coord {
            x: min.x.min(point.x()),
            y: min.y.min(point.y()),
        },
        Coord {
            x: max.x.max(point.x()),
            y: max.y.max(point.y()),
        },
    )
}

/// Render clustered features as GeoJSON
pub fn to_feature_collection(features: &[MapFeature]) -> FeatureCollection {
    let features = features
        .iter()
        .map(|feature| match feature {
            MapFeature::Marker(point) => {
                let mut properties = JsonObject::new();
                properties.insert("cluster".to_string(), json!(false));
                properties.insert("id".to_string(), json!(point.id));
                properties.insert("name".to_string(), json!(point.name));
                properties.insert("slug".to_string(), json!(point.slug));
                properties.insert("category".to_string(), json!(point.category));
                properties.insert("is_sponsored".to_string(), json!(point.is_sponsored));
                geo_feature(point.location, Id::String(point.id.to_string()), properties)
            }
            MapFeature::Cluster(cluster) => {
                let mut properties = JsonObject::new();
                properties.insert("cluster".to_string(), json!(true));
                properties.insert("point_count".to_string(), json!(cluster.point_count));
                properties.insert(
                    "sponsored_count".to_string(),
                    json!(cluster.sponsored_count),
                );
                properties.insert("expansion_zoom".to_string(), json!(cluster.expansion_zoom));
                properties.insert(
                    "bbox".to_string(),
                    json!(rect_to_lat_lng_array(&cluster.bbox)),
                );
                geo_feature(
                    cluster.center,
                    Id::String(format!("cluster:{}", cluster.key)),
                    properties,
                )
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn geo_feature(location: Point<f64>, id: Id, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geojson::Value::Point(vec![
            location.x(),
            location.y(),
        ]))),
        id: Some(id),
        properties: Some(properties),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(name: &str, lat: f64, lng: f64, sponsored: bool) -> MapPoint {
        MapPoint {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: name.to_lowercase(),
            category: "Cafes".to_string(),
            location: Point::new(lng, lat),
            is_sponsored: sponsored,
        }
    }

    fn casablanca_points() -> Vec<MapPoint> {
        vec![
            point("A", 33.5731, -7.5898, false),
            point("B", 33.5733, -7.5895, true),
            point("C", 33.5729, -7.5901, false),
            // Across town
            point("D", 33.6100, -7.5000, false),
        ]
    }

    #[test]
    fn test_projection_origin_and_corners() {
        let (x, y) = project(0.0, 0.0, 0, 256.0);
        assert!((x - 128.0).abs() < 1e-9);
        assert!((y - 128.0).abs() < 1e-9);

        let (x, _) = project(0.0, 180.0, 1, 256.0);
        assert!((x - 512.0).abs() < 1e-9);

        let (_, y) = project(MAX_MERCATOR_LAT, 0.0, 0, 256.0);
        assert!(y.abs() < 1e-3);
    }

    #[test]
    fn test_nearby_points_cluster_at_city_zoom() {
        let features = cluster_points(&casablanca_points(), 12, None, &ClusterOptions::default());

        let clusters: Vec<&Cluster> = features
            .iter()
            .filter_map(|f| match f {
                MapFeature::Cluster(c) => Some(c),
                _ => None,
            })
            .collect();
        let markers = features
            .iter()
            .filter(|f| matches!(f, MapFeature::Marker(_)))
            .count();

        assert_eq!(clusters.len(), 1);
        assert_eq!(markers, 1);

        let cluster = clusters[0];
        assert_eq!(cluster.point_count, 3);
        assert_eq!(cluster.sponsored_count, 1);
        assert_eq!(cluster.expansion_zoom, 13);
        assert!((cluster.center.y() - 33.5731).abs() < 1e-4);
        assert!((cluster.center.x() - (-7.5898)).abs() < 1e-4);
        assert!((cluster.bbox.min().y - 33.5729).abs() < 1e-9);
        assert!((cluster.bbox.max().x - (-7.5895)).abs() < 1e-9);
    }

    #[test]
    fn test_high_zoom_disables_clustering() {
        let features = cluster_points(&casablanca_points(), 18, None, &ClusterOptions::default());
        assert_eq!(features.len(), 4);
        assert!(features.iter().all(|f| matches!(f, MapFeature::Marker(_))));
    }

    #[test]
    fn test_invalid_coordinates_dropped() {
        let mut points = casablanca_points();
        points.push(point("Nowhere", f64::NAN, 0.0, false));
        points.push(point("Pole", 89.9, 0.0, false));
        points.push(point("Off-world", 10.0, 190.0, false));

        let features = cluster_points(&points, 18, None, &ClusterOptions::default());
        assert_eq!(features.len(), 4);
        assert!(bounds(&points).is_some());
    }

    #[test]
    fn test_viewport_filter_is_inclusive() {
        let points = casablanca_points();
        let rect = viewport(33.5729, -7.5901, 33.5731, -7.5898);
        let features = cluster_points(&points, 18, Some(rect), &ClusterOptions::default());

        let names: Vec<String> = features
            .iter()
            .map(|f| match f {
                MapFeature::Marker(p) => p.name.clone(),
                MapFeature::Cluster(_) => String::new(),
            })
            .collect();
        assert_eq!(names, vec!["A", "C"]);
    }

    #[test]
    fn test_output_is_deterministic() {
        let points = casablanca_points();
        let first = to_feature_collection(&cluster_points(&points, 10, None, &ClusterOptions::default()));
        let second = to_feature_collection(&cluster_points(&points, 10, None, &ClusterOptions::default()));
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(cluster_points(&[], 12, None, &ClusterOptions::default()).is_empty());
        assert!(bounds(&[]).is_none());
        assert_eq!(map_center(None, Some((33.57, -7.59))), [33.57, -7.59]);
        assert_eq!(map_center(None, None), [0.0, 0.0]);
    }

    #[test]
    fn test_center_uses_bounds() {
        let rect = bounds(&casablanca_points()).unwrap();
        let [lat, lng] = map_center(Some(&rect), Some((0.0, 0.0)));
        assert!((lat - (33.5729 + 33.6100) / 2.0).abs() < 1e-9);
        assert!((lng - (-7.5901 + -7.5000) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_geojson_properties() {
        let features = cluster_points(&casablanca_points(), 12, None, &ClusterOptions::default());
        let collection = to_feature_collection(&features);
        let json = serde_json::to_value(&collection).unwrap();

        assert_eq!(json["type"], "FeatureCollection");
        let features = json["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);

        let cluster = features
            .iter()
            .find(|f| f["properties"]["cluster"] == true)
            .unwrap();
        assert_eq!(cluster["properties"]["point_count"], 3);
        assert_eq!(cluster["geometry"]["type"], "Point");

        let marker = features
            .iter()
            .find(|f| f["properties"]["cluster"] == false)
            .unwrap();
        assert_eq!(marker["properties"]["name"], "D");
    }
}
