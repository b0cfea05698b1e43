//! Classifier boundary
//!
//! The model itself runs out of process. This module owns everything on our
//! side of the boundary: the ordered label set, image payload decoding and
//! preparation, and turning a probability vector into a [`Prediction`].

use crate::{Error, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use image::imageops::FilterType;
use image::DynamicImage;
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

/// Labels used when no class-name file is configured or it cannot be read
pub const DEFAULT_CLASS_NAMES: [&str; 6] = ["Cardboard", "Glass", "Metal", "Paper", "Plastic", "Trash"];

/// Model input edge length in pixels
pub const INPUT_SIZE: u32 = 224;

/// Ordered class names; index `i` names output `i` of the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LabelSet {
    names: Vec<String>,
}

impl LabelSet {
    pub fn default_set() -> Self {
        Self {
            names: DEFAULT_CLASS_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Build from explicit names; an empty list or a blank name is rejected
    pub fn from_names(names: Vec<String>) -> Result<Self> {
        if names.is_empty() {
            return Err(Error::Config("class name list is empty".to_string()));
        }
        if let Some(index) = names.iter().position(|name| name.trim().is_empty()) {
            return Err(Error::Config(format!("class name {} is blank", index)));
        }
        Ok(Self { names })
    }

    /// Parse a JSON array of strings
    pub fn from_json_str(content: &str) -> Result<Self> {
        let names: Vec<String> = serde_json::from_str(content)
            .map_err(|e| Error::Config(format!("class names must be a JSON array of strings: {}", e)))?;
        Self::from_names(names)
    }

    /// Load class names from `path`, falling back to the defaults.
    ///
    /// Missing or malformed files are not fatal; a warning is logged.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default_set();
        };

        let loaded = std::fs::read_to_string(path)
            .map_err(Error::from)
            .and_then(|content| Self::from_json_str(&content));

        match loaded {
            Ok(labels) => {
                info!("Loaded {} class names from {}", labels.len(), path.display());
                labels
            }
            Err(e) => {
                warn!(
                    "Could not load class names from {}: {}; using defaults",
                    path.display(),
                    e
                );
                Self::default_set()
            }
        }
    }

    /// Label for a model output index; `Class_<i>` when out of range
    pub fn label_for(&self, index: usize) -> String {
        self.names
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("Class_{}", index))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for LabelSet {
    fn default() -> Self {
        Self::default_set()
    }
}

/// Top-1 prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: f64,
    pub index: usize,
}

impl Prediction {
    /// Argmax over `probabilities`; ties go to the lowest index
    pub fn from_probabilities(probabilities: &[f32], labels: &LabelSet) -> Result<Self> {
        if probabilities.iter().any(|p| !p.is_finite()) {
            return Err(Error::Classifier(
                "probability vector contains non-finite values".to_string(),
            ));
        }

        let (index, best) = probabilities
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best: Option<(usize, f32)>, (i, p)| match best {
                Some((_, b)) if b >= p => best,
                _ => Some((i, p)),
            })
            .ok_or_else(|| Error::Classifier("empty probability vector".to_string()))?;

        Ok(Self {
            label: labels.label_for(index),
            confidence: f64::from(best).clamp(0.0, 1.0),
            index,
        })
    }
}

/// Image classifier returning per-class probabilities
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Identifier used in logs
    fn name(&self) -> &str;

    /// Class probabilities for an image already passed through [`prepare_image`]
    async fn predict(&self, image: &DynamicImage) -> Result<Vec<f32>>;
}

/// Decode an uploaded image.
///
/// Accepts bare base64 or a data URL (`data:image/png;base64,...`).
pub fn decode_image_payload(payload: &str) -> Result<DynamicImage> {
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(Error::InvalidInput("No image data provided.".to_string()));
    }

    let encoded = match payload.split_once(',') {
        Some((_, rest)) => rest,
        None => payload,
    };

    let bytes = general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| Error::InvalidInput(format!("Invalid image data: {}", e)))?;

    image::load_from_memory(&bytes).map_err(|e| Error::InvalidInput(format!("Invalid image data: {}", e)))
}

/// Convert to RGB and resize to the model input size
pub fn prepare_image(image: &DynamicImage) -> DynamicImage {
    let resized = image.resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);
    DynamicImage::ImageRgb8(resized.to_rgb8())
}

/// Human-readable confidence
pub fn confidence_text(confidence: f64, abstained: bool) -> String {
    if abstained {
        format!("{:.1} % (low)", confidence * 100.0)
    } else {
        format!("{:.1} % Confidence Score", confidence * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png_base64(width: u32, height: u32) -> String {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([10, 200, 30])));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        general_purpose::STANDARD.encode(bytes)
    }

    #[test]
    fn test_label_for_out_of_range() {
        let labels = LabelSet::default_set();
        assert_eq!(labels.label_for(0), "Cardboard");
        assert_eq!(labels.label_for(5), "Trash");
        assert_eq!(labels.label_for(6), "Class_6");
    }

    #[test]
    fn test_from_probabilities_argmax() {
        let labels = LabelSet::default_set();
        let p = Prediction::from_probabilities(&[0.05, 0.1, 0.05, 0.0, 0.8, 0.0], &labels).unwrap();
        assert_eq!(p.label, "Plastic");
        assert_eq!(p.index, 4);
        assert!((p.confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_from_probabilities_ties_and_overflow() {
        let labels = LabelSet::from_names(vec!["A".into(), "B".into()]).unwrap();
        let tie = Prediction::from_probabilities(&[0.5, 0.5], &labels).unwrap();
        assert_eq!(tie.label, "A");

        // model has more outputs than known labels
        let extra = Prediction::from_probabilities(&[0.1, 0.1, 0.8], &labels).unwrap();
        assert_eq!(extra.label, "Class_2");
    }

    #[test]
    fn test_from_probabilities_rejects_bad_vectors() {
        let labels = LabelSet::default_set();
        assert!(matches!(
            Prediction::from_probabilities(&[], &labels),
            Err(Error::Classifier(_))
        ));
        assert!(Prediction::from_probabilities(&[0.5, f32::NAN], &labels).is_err());
    }

    #[test]
    fn test_label_set_json() {
        let labels = LabelSet::from_json_str(r#"["Glass", "Metal"]"#).unwrap();
        assert_eq!(labels.len(), 2);
        assert!(LabelSet::from_json_str("[]").is_err());
        assert!(matches!(
            LabelSet::from_json_str(r#"["Glass", "  "]"#),
            Err(Error::Config(_))
        ));
        assert!(LabelSet::from_json_str(r#"{"a": 1}"#).is_err());
    }

    #[test]
    fn test_load_or_default_falls_back() {
        let dir = tempfile::TempDir::new().unwrap();
        let bad = dir.path().join("class_names.json");
        std::fs::write(&bad, "not json").unwrap();

        assert_eq!(LabelSet::load_or_default(Some(&bad)), LabelSet::default_set());
        assert_eq!(
            LabelSet::load_or_default(Some(&dir.path().join("missing.json"))),
            LabelSet::default_set()
        );
        assert_eq!(LabelSet::load_or_default(None), LabelSet::default_set());

        std::fs::write(&bad, r#"["", "Glass"]"#).unwrap();
        assert_eq!(LabelSet::load_or_default(Some(&bad)), LabelSet::default_set());

        std::fs::write(&bad, r#"["Compostable", "Glass"]"#).unwrap();
        assert_eq!(LabelSet::load_or_default(Some(&bad)).names()[0], "Compostable");
    }

    #[test]
    fn test_decode_bare_and_data_url() {
        let encoded = png_base64(4, 3);
        let img = decode_image_payload(&encoded).unwrap();
        assert_eq!((img.width(), img.height()), (4, 3));

        let url = format!("data:image/png;base64,{}", encoded);
        assert!(decode_image_payload(&url).is_ok());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode_image_payload(""), Err(Error::InvalidInput(_))));
        assert!(matches!(decode_image_payload("!!!"), Err(Error::InvalidInput(_))));
        // valid base64, not an image
        let text = general_purpose::STANDARD.encode(b"hello world");
        assert!(matches!(decode_image_payload(&text), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_prepare_image() {
        let img = decode_image_payload(&png_base64(40, 10)).unwrap();
        let prepared = prepare_image(&img);
        assert_eq!((prepared.width(), prepared.height()), (INPUT_SIZE, INPUT_SIZE));
        assert!(matches!(prepared, DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn test_confidence_text() {
        assert_eq!(confidence_text(0.8761, false), "87.6 % Confidence Score");
        assert_eq!(confidence_text(0.5, true), "50.0 % (low)");
    }
}
