pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const KM_PER_NM: f64 = 1.852;
pub const MS_PER_KT: f64 = 0.514444;
pub const KM_PER_DEG_LAT: f64 = 111.32;

pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    if lat1 == lat2 && lon1 == lon2 {
        return 0.0;
    }

    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * a.min(1.0).sqrt().asin()
}

/// Initial great-circle bearing in degrees, north = 0. `None` for identical points.
pub fn bearing_deg(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Option<f64> {
    if lat1 == lat2 && lon1 == lon2 {
        return None;
    }

    let lat1 = lat1.to_radians();
    let lat2 = lat2.to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();

    Some(normalize_angle(y.atan2(x).to_degrees()))
}

pub fn normalize_angle(angle: f64) -> f64 {
    angle.rem_euclid(360.0)
}

/// Shortest signed turn from `from` to `to`, in [-180, 180].
pub fn angle_difference(from: f64, to: f64) -> f64 {
    let diff = normalize_angle(to) - normalize_angle(from);
    if diff > 180.0 {
        diff - 360.0
    } else if diff < -180.0 {
        diff + 360.0
    } else {
        diff
    }
}

/// Exponential smoothing on the circle. Changes below `min_change` degrees are ignored.
pub fn smooth_angle(current: f64, target: f64, alpha: f64, min_change: f64) -> f64 {
    let diff = angle_difference(current, target);
    if diff.abs() < min_change {
        return current;
    }
    normalize_angle(current + diff * alpha)
}

pub fn implied_speed_kts(lat1: f64, lon1: f64, ts1: f64, lat2: f64, lon2: f64, ts2: f64) -> f64 {
    let dt = ts2 - ts1;
    if dt <= 0.0 {
        return f64::INFINITY;
    }

    let km_per_hour = haversine_km(lat1, lon1, lat2, lon2) * 3600.0 / dt;
    km_per_hour / KM_PER_NM
}
