use super::report::AircraftReport;

const LINE_BREAK: &str = "<br>";

/// Tooltip text: identifier always, altitude and speed when reported.
pub fn marker_label(report: &AircraftReport) -> String {
    let mut lines = vec![format!("HEX: {}", report.id)];
    if let Some(altitude) = &report.altitude {
        lines.push(format!("Alt: {}", altitude));
    }
    if let Some(speed) = report.ground_speed {
        lines.push(format!("Speed: {} kt", speed));
    }
    lines.join(LINE_BREAK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::report::Altitude;

    #[test]
    fn identifier_only() {
        let report = AircraftReport::new("4ba9c1");
        assert_eq!(marker_label(&report), "HEX: 4ba9c1");
    }

    #[test]
    fn altitude_and_speed_when_present() {
        let mut report = AircraftReport::new("4ba9c1");
        report.altitude = Some(Altitude::Feet(35000.0));
        report.ground_speed = Some(451.5);
        assert_eq!(
            marker_label(&report),
            "HEX: 4ba9c1<br>Alt: 35000 ft<br>Speed: 451.5 kt"
        );
    }

    #[test]
    fn speed_without_altitude() {
        let mut report = AircraftReport::new("abc");
        report.ground_speed = Some(0.0);
        assert_eq!(marker_label(&report), "HEX: abc<br>Speed: 0 kt");
    }

    #[test]
    fn text_altitude_is_rendered_as_is() {
        let mut report = AircraftReport::new("abc");
        report.altitude = Some(Altitude::Text("ground".into()));
        assert_eq!(marker_label(&report), "HEX: abc<br>Alt: ground");
    }
}
