use askama::Template;
use askama_web::WebTemplate;

use crate::web::config::MapConfig;

#[derive(Template, WebTemplate)]
#[template(path = "map.html")]
pub struct MapTemplate {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: u8,
    pub tile_url: String,
}

impl From<&MapConfig> for MapTemplate {
    fn from(map: &MapConfig) -> Self {
        Self {
            center_lat: map.center_lat,
            center_lon: map.center_lon,
            zoom: map.zoom,
            tile_url: map.tile_url.clone(),
        }
    }
}
