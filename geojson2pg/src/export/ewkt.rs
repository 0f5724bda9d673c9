//! Encodage des géométries GeoJSON en EWKT (`SRID=4326;POINT(...)`) avec geozero

use anyhow::{Context, Result};
use geozero::wkt::WktWriter;
use geozero::GeozeroGeometry;

/// SRID unique des tables générées (WGS84, celui de GeoJSON)
pub const SRID: u32 = 4326;

/// Préfixe EWKT pour un SRID
pub fn ewkt_prefix(srid: u32) -> Vec<u8> {
    format!("SRID={};", srid).into_bytes()
}

/// Écrit le WKT d'une géométrie GeoJSON dans `wkt_buf` (vidé au préalable)
pub fn write_wkt(geometry: &geojson::Geometry, wkt_buf: &mut Vec<u8>) -> Result<()> {
    let geom = geo::Geometry::<f64>::try_from(&geometry.value)
        .context("Failed to convert GeoJSON geometry")?;

    if !geometry_ok_for_postgis(&geom) {
        anyhow::bail!("Geometry not valid for PostGIS ingestion (too few points)");
    }

    wkt_buf.clear();
    let mut writer = WktWriter::new(&mut *wkt_buf);
    geom.process_geom(&mut writer)
        .context("Failed to encode geometry to WKT")?;

    Ok(())
}

/// Nombre de points suffisant pour que PostGIS accepte la géométrie
fn geometry_ok_for_postgis(geom: &geo::Geometry) -> bool {
    use geo::{Geometry, LineString, Polygon};

    fn ring_ok(r: &LineString) -> bool {
        // LinearRing: >= 4 points, first == last
        r.0.len() >= 4 && r.0.first() == r.0.last()
    }

    fn polygon_ok(p: &Polygon) -> bool {
        ring_ok(p.exterior()) && p.interiors().iter().all(ring_ok)
    }

    match geom {
        Geometry::LineString(ls) => ls.0.len() >= 2,
        Geometry::MultiLineString(mls) => mls.0.iter().all(|ls| ls.0.len() >= 2),
        Geometry::Polygon(p) => polygon_ok(p),
        Geometry::MultiPolygon(mp) => mp.0.iter().all(polygon_ok),
        Geometry::GeometryCollection(gc) => gc.0.iter().all(geometry_ok_for_postgis),
        _ => true,
    }
}

/// EWKT complet d'une géométrie
pub fn to_ewkt(geometry: &geojson::Geometry, srid: u32) -> Result<String> {
    let mut wkt_buf = Vec::new();
    write_wkt(geometry, &mut wkt_buf)?;

    let mut ewkt = ewkt_prefix(srid);
    ewkt.extend_from_slice(&wkt_buf);
    String::from_utf8(ewkt).context("WKT output is not UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use geojson::{Geometry, Value};

    #[test]
    fn test_point_to_ewkt() {
        let geometry = Geometry::new(Value::Point(vec![5.72, 45.18]));
        let ewkt = to_ewkt(&geometry, SRID).unwrap();
        assert!(ewkt.starts_with("SRID=4326;POINT"));
        assert!(ewkt.contains("5.72"));
        assert!(ewkt.contains("45.18"));
    }

    #[test]
    fn test_polygon_to_ewkt() {
        let ring = vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
            vec![0.0, 0.0],
        ];
        let geometry = Geometry::new(Value::Polygon(vec![ring]));
        let ewkt = to_ewkt(&geometry, SRID).unwrap();
        assert!(ewkt.starts_with("SRID=4326;POLYGON"));
    }

    #[test]
    fn test_too_few_points_rejected() {
        let line = Geometry::new(Value::LineString(vec![vec![0.0, 0.0]]));
        assert!(to_ewkt(&line, SRID).is_err());

        // Anneau fermé de 3 positions
        let ring = vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 0.0]];
        let polygon = Geometry::new(Value::Polygon(vec![ring.clone()]));
        assert!(to_ewkt(&polygon, SRID).is_err());

        let good = vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![1.0, 1.0], vec![0.0, 0.0]];
        let multi = Geometry::new(Value::MultiPolygon(vec![vec![good.clone()], vec![ring]]));
        assert!(to_ewkt(&multi, SRID).is_err());

        let collection = Geometry::new(Value::GeometryCollection(vec![
            Geometry::new(Value::Point(vec![0.0, 0.0])),
            Geometry::new(Value::LineString(vec![vec![0.0, 0.0]])),
        ]));
        assert!(to_ewkt(&collection, SRID).is_err());

        let line = Geometry::new(Value::LineString(vec![vec![0.0, 0.0], vec![1.0, 1.0]]));
        assert!(to_ewkt(&line, SRID).is_ok());
        let polygon = Geometry::new(Value::Polygon(vec![good]));
        assert!(to_ewkt(&polygon, SRID).is_ok());
    }

    #[test]
    fn test_ewkt_prefix() {
        assert_eq!(ewkt_prefix(4326), b"SRID=4326;".to_vec());
    }
}
