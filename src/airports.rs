use serde::Serialize;
use strum_macros::Display;
use utoipa::ToSchema;

use crate::tracking::geo::haversine_km;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AirportKind {
    International,
    Domestic,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct Airport {
    pub icao: &'static str,
    pub name: &'static str,
    pub city: &'static str,
    pub lat: f64,
    pub lon: f64,
    pub elevation_ft: i32,
    #[serde(rename = "type")]
    pub kind: AirportKind,
}

const fn airport(
    icao: &'static str,
    name: &'static str,
    city: &'static str,
    lat: f64,
    lon: f64,
    elevation_ft: i32,
    kind: AirportKind,
) -> Airport {
    Airport {
        icao,
        name,
        city,
        lat,
        lon,
        elevation_ft,
        kind,
    }
}

use AirportKind::{Domestic, International};

pub static MAJOR_AIRPORTS: &[Airport] = &[
    airport("LTFM", "İstanbul Havalimanı", "İstanbul", 41.2619, 28.7419, 325, International),
    airport("LTFJ", "Sabiha Gökçen Havalimanı", "İstanbul", 40.8986, 29.3092, 312, International),
    airport("LTAC", "Esenboğa Havalimanı", "Ankara", 40.1281, 32.9951, 3125, International),
    airport("LTBJ", "Adnan Menderes Havalimanı", "İzmir", 38.2924, 27.1570, 412, International),
    airport("LTAI", "Antalya Havalimanı", "Antalya", 36.8987, 30.8005, 177, International),
    airport("LTCG", "Milas-Bodrum Havalimanı", "Muğla", 37.2506, 27.6643, 21, International),
    airport("LTFG", "Dalaman Havalimanı", "Muğla", 36.7131, 28.7925, 20, International),
    airport("LTCF", "Gazipaşa-Alanya Havalimanı", "Antalya", 36.2992, 32.3006, 86, Domestic),
    airport("LTCK", "Konya Havalimanı", "Konya", 37.9790, 32.5619, 3392, Domestic),
    airport("LTCE", "Adana Şakirpaşa Havalimanı", "Adana", 36.9822, 35.2804, 65, International),
    airport("LTCN", "Hatay Havalimanı", "Hatay", 36.3628, 36.2824, 246, International),
    airport("LTCL", "Çukurova Havalimanı", "Adana", 36.9822, 35.2806, 20, Domestic),
    airport("LTAZ", "Trabzon Havalimanı", "Trabzon", 40.9951, 39.7897, 104, International),
];

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub properties: FeatureProperties,
    pub geometry: PointGeometry,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FeatureProperties {
    pub icao: &'static str,
    pub name: &'static str,
    pub city: &'static str,
    pub elevation: i32,
    #[serde(rename = "type")]
    pub kind: AirportKind,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PointGeometry {
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// `[lon, lat]`, GeoJSON axis order.
    pub coordinates: [f64; 2],
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NearestAirport {
    #[serde(flatten)]
    pub airport: Airport,
    pub distance_km: f64,
}

pub fn geojson() -> FeatureCollection {
    FeatureCollection {
        kind: "FeatureCollection",
        features: MAJOR_AIRPORTS
            .iter()
            .map(|a| Feature {
                kind: "Feature",
                properties: FeatureProperties {
                    icao: a.icao,
                    name: a.name,
                    city: a.city,
                    elevation: a.elevation_ft,
                    kind: a.kind,
                },
                geometry: PointGeometry {
                    kind: "Point",
                    coordinates: [a.lon, a.lat],
                },
            })
            .collect(),
    }
}

pub fn nearest(lat: f64, lon: f64) -> Option<NearestAirport> {
    MAJOR_AIRPORTS
        .iter()
        .map(|a| NearestAirport {
            airport: *a,
            distance_km: haversine_km(lat, lon, a.lat, a.lon),
        })
        .min_by(|a, b| a.distance_km.total_cmp(&b.distance_km))
}
