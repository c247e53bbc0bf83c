//! Two-column `Pulgadas,Galones` dataset exchange.
//!
//! Import is forgiving: field data often comes from spreadsheets with a stray
//! header, blank lines or half-typed rows, so anything that does not parse as a
//! pair of finite numbers is dropped.

use std::fs;
use std::path::Path;

use tc_core::clamp_to;
use tracing::debug;

use crate::{StoreError, StoreResult, write_atomic};

pub const CSV_HEADER: [&str; 2] = ["Pulgadas", "Galones"];

/// Read `(height, volume)` rows, clamping heights into `[0, max_height]`.
pub fn import_csv(path: &Path, max_height: f64) -> StoreResult<Vec<(f64, f64)>> {
    if !path.exists() {
        return Err(StoreError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = fs::read_to_string(path)?;
    let points = parse_csv(&content, max_height);
    debug!(path = %path.display(), rows = points.len(), "imported calibration csv");
    Ok(points)
}

/// Parse CSV text. The first non-empty row is skipped when its first field is
/// not numeric; later rows that fail to parse are skipped silently.
pub fn parse_csv(content: &str, max_height: f64) -> Vec<(f64, f64)> {
    let mut points = Vec::new();
    let mut first_row = true;

    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split(',').map(clean_field);
        let first = fields.next().unwrap_or_default();

        if first_row {
            first_row = false;
            if parse_number(first).is_none() {
                continue;
            }
        }

        let second = fields.next().unwrap_or_default();
        if let (Some(h), Some(v)) = (parse_number(first), parse_number(second)) {
            points.push((clamp_to(h, 0.0, max_height), v));
        }
    }

    points
}

fn clean_field(field: &str) -> &str {
    let field = field.trim();
    field
        .strip_prefix('"')
        .and_then(|f| f.strip_suffix('"'))
        .map(str::trim)
        .unwrap_or(field)
}

fn parse_number(field: &str) -> Option<f64> {
    field.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Header plus one row per sample, in dataset order.
pub fn render_csv(heights: &[f64], volumes: &[f64]) -> String {
    let mut csv = format!("{},{}\n", CSV_HEADER[0], CSV_HEADER[1]);
    for (h, v) in heights.iter().zip(volumes) {
        csv.push_str(&format!("{},{}\n", h, v));
    }
    csv
}

/// Write the dataset to `path`; returns the number of data rows.
pub fn export_csv(path: &Path, heights: &[f64], volumes: &[f64]) -> StoreResult<usize> {
    let csv = render_csv(heights, volumes);
    write_atomic(path, csv.as_bytes())?;
    Ok(heights.len().min(volumes.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_skipped() {
        let pts = parse_csv("Pulgadas,Galones\n1.5,10\n3,20.25\n", 45.0);
        assert_eq!(pts, vec![(1.5, 10.0), (3.0, 20.25)]);
    }

    #[test]
    fn numeric_first_row_is_data() {
        let pts = parse_csv("0,0\n22.5,244.4\n", 45.0);
        assert_eq!(pts, vec![(0.0, 0.0), (22.5, 244.4)]);
    }

    #[test]
    fn garbled_rows_are_dropped() {
        let text = "h;g\n1,2\nabc,3\n4,\n,5\n6\n\n7,8,extra\n9,nan\n10,inf\n";
        let pts = parse_csv(text, 45.0);
        assert_eq!(pts, vec![(1.0, 2.0), (7.0, 8.0)]);
    }

    #[test]
    fn heights_are_clamped() {
        let pts = parse_csv("-2,0\n50,500\n", 45.0);
        assert_eq!(pts, vec![(0.0, 0.0), (45.0, 500.0)]);
    }

    #[test]
    fn quotes_whitespace_and_crlf_are_tolerated() {
        let pts = parse_csv("\"Pulgadas\",\"Galones\"\r\n \"2.5\" , 7 \r\n", 45.0);
        assert_eq!(pts, vec![(2.5, 7.0)]);
    }

    #[test]
    fn render_has_fixed_header() {
        let csv = render_csv(&[0.0, 0.125], &[0.0, 1.5]);
        assert_eq!(csv, "Pulgadas,Galones\n0,0\n0.125,1.5\n");
    }

    #[test]
    fn export_then_import() {
        let path = std::env::temp_dir().join(format!("tc_store_csv_{}.csv", std::process::id()));
        let heights = [0.0, 11.25, 45.0];
        let volumes = [0.0, 88.123456789, 488.8338568938015];
        assert_eq!(export_csv(&path, &heights, &volumes).unwrap(), 3);
        let back = import_csv(&path, 45.0).unwrap();
        let expected: Vec<(f64, f64)> = heights.iter().copied().zip(volumes).collect();
        assert_eq!(back, expected);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn missing_file_is_reported() {
        let path = std::env::temp_dir().join("tc_store_no_such_file.csv");
        assert!(matches!(
            import_csv(&path, 45.0),
            Err(StoreError::FileNotFound { .. })
        ));
    }
}
