use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::parser::normalize::normalize;

/// One recognized text box on a page image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    pub text: String,
    #[serde(default)]
    pub confidence: f64,
}

impl Detection {
    fn area(&self) -> f64 {
        (self.x1 - self.x0).max(0.0) * (self.y1 - self.y0).max(0.0)
    }

    fn y_center(&self) -> f64 {
        (self.y0 + self.y1) / 2.0
    }

    fn key(&self) -> String {
        normalize(&self.text).to_lowercase()
    }
}

pub fn iou(a: &Detection, b: &Detection) -> f64 {
    let w = (a.x1.min(b.x1) - a.x0.max(b.x0)).max(0.0);
    let h = (a.y1.min(b.y1) - a.y0.max(b.y0)).max(0.0);
    let inter = w * h;
    let union = a.area() + b.area() - inter;
    if union <= 0.0 {
        0.0
    } else {
        inter / union
    }
}

/// Drop blank boxes and collapse near-identical overlapping ones, keeping
/// the most confident reading.
pub fn dedupe(detections: Vec<Detection>, iou_threshold: f64) -> Vec<Detection> {
    let mut sorted: Vec<Detection> = detections
        .into_iter()
        .filter(|d| !d.key().is_empty())
        .collect();
    sorted.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<Detection> = Vec::with_capacity(sorted.len());
    for d in sorted {
        let duplicate = kept
            .iter()
            .any(|k| k.key() == d.key() && iou(k, &d) > iou_threshold);
        if !duplicate {
            kept.push(d);
        }
    }
    kept
}

struct RowCluster {
    center: f64,
    members: Vec<Detection>,
}

/// Group detections into reading rows by vertical centre and render each
/// row as `|`-joined text, top to bottom.
pub fn cluster_rows(detections: Vec<Detection>, y_tolerance: f64) -> Vec<String> {
    let mut ordered = detections;
    ordered.sort_by(|a, b| a.y_center().total_cmp(&b.y_center()).then(a.x0.total_cmp(&b.x0)));

    let mut rows: Vec<RowCluster> = Vec::new();
    for d in ordered {
        let cy = d.y_center();
        let nearest = rows
            .iter_mut()
            .map(|r| ((r.center - cy).abs(), r))
            .filter(|(dist, _)| *dist <= y_tolerance)
            .min_by(|a, b| a.0.total_cmp(&b.0));
        match nearest {
            Some((_, row)) => {
                row.members.push(d);
                row.center = row.members.iter().map(Detection::y_center).sum::<f64>()
                    / row.members.len() as f64;
            }
            None => rows.push(RowCluster {
                center: cy,
                members: vec![d],
            }),
        }
    }

    rows.sort_by(|a, b| a.center.total_cmp(&b.center));
    debug!(rows = rows.len(), "clustered detections");
    rows.into_iter()
        .map(|mut r| {
            r.members.sort_by(|a, b| a.x0.total_cmp(&b.x0));
            r.members
                .iter()
                .map(|d| normalize(&d.text))
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .collect()
}

/// A JSON array of detections, as written by the OCR step.
pub fn read_detections(path: &Path) -> Result<Vec<Detection>> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    serde_json::from_str(&text).with_context(|| format!("parsing detections in {:?}", path))
}

/// Detections of one page to row texts.
pub fn page_rows(detections: Vec<Detection>, iou_threshold: f64, y_tolerance: f64) -> Vec<String> {
    cluster_rows(dedupe(detections, iou_threshold), y_tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x0: f64, y0: f64, text: &str, confidence: f64) -> Detection {
        Detection {
            x0,
            y0,
            x1: x0 + 40.0,
            y1: y0 + 10.0,
            text: text.to_string(),
            confidence,
        }
    }

    #[test]
    fn iou_bounds() {
        let a = det(0.0, 0.0, "a", 1.0);
        assert_eq!(iou(&a, &a), 1.0);
        assert_eq!(iou(&a, &det(100.0, 0.0, "a", 1.0)), 0.0);
    }

    #[test]
    fn dedupe_keeps_most_confident_overlap() {
        let out = dedupe(
            vec![
                det(0.0, 0.0, "Acme", 0.6),
                det(2.0, 0.0, "acme", 0.9),
                det(200.0, 0.0, "Acme", 0.5),
                det(0.0, 40.0, "  ", 0.99),
            ],
            0.45,
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].text, "acme");
        assert_eq!(out[1].x0, 200.0);
    }

    #[test]
    fn rows_cluster_by_center_and_sort_left_to_right() {
        let rows = cluster_rows(
            vec![
                det(100.0, 52.0, "robots", 1.0),
                det(0.0, 50.0, "Acme", 1.0),
                det(0.0, 0.0, "Header", 1.0),
                det(200.0, 48.0, "acme.io", 1.0),
            ],
            18.0,
        );
        assert_eq!(rows, vec!["Header", "Acme | robots | acme.io"]);
    }

    #[test]
    fn detections_parse_without_confidence() {
        let json = r#"[{"x0": 1, "y0": 2, "x1": 3, "y1": 4, "text": "Acme"}]"#;
        let parsed: Vec<Detection> = serde_json::from_str(json).unwrap();
        assert_eq!(parsed[0].confidence, 0.0);
        assert_eq!(parsed[0].text, "Acme");
    }

    #[test]
    fn page_rows_with_no_detections() {
        assert!(page_rows(Vec::new(), 0.45, 18.0).is_empty());
    }
}
