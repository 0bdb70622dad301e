use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub detection: DetectionConfig,
    pub recognition: RecognitionConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub classifier_path: PathBuf,
    pub landmark_path: PathBuf,
    pub intra_threads: usize,
}

/// Hand tracker thresholds. Only the first hand is ever used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub max_num_hands: usize,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// A live gesture counts in the speed gesture quiz above this confidence.
    pub quiz_pass_confidence: f32,
    pub stability_confidence: f32,
    pub pacing_confidence: f32,
    pub max_consecutive_failures: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub mirror_mode: bool,
    pub landmark_dot_size: u32,
    pub landmark_color_hex: String,
    pub connection_color_hex: String,
    pub text_color_hex: String,
    pub text_scale: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            classifier_path: PathBuf::from("gesture_recognition_model.onnx"),
            landmark_path: PathBuf::from("hand_landmark.onnx"),
            intra_threads: 4,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            max_num_hands: 1,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
        }
    }
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            quiz_pass_confidence: 0.8,
            stability_confidence: 0.8,
            pacing_confidence: 0.7,
            max_consecutive_failures: 30,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            mirror_mode: false,
            landmark_dot_size: 3,
            landmark_color_hex: "#FF0000".to_string(),
            connection_color_hex: "#FFFFFF".to_string(),
            text_color_hex: "#00FF00".to_string(),
            text_scale: 3,
        }
    }
}

impl DetectionConfig {
    /// Forces `max_num_hands` to 1, warning when the file asked for something else.
    pub fn single_hand(mut self) -> Self {
        if self.max_num_hands != 1 {
            warn!(requested = self.max_num_hands, "only one hand is tracked, using max_num_hands = 1");
            self.max_num_hands = 1;
        }
        self
    }
}

impl AppConfig {
    /// Missing or unparsable files fall back to defaults; the file is then rewritten
    /// so new fields show up for editing.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            match serde_json::from_str::<AppConfig>(&content) {
                Ok(c) => {
                    info!(path = %path.display(), "loaded configuration");
                    c
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "error parsing config, loading defaults");
                    Self::default()
                }
            }
        } else {
            info!(path = %path.display(), "configuration file not found, creating default");
            Self::default()
        };

        config.detection = config.detection.single_hand();
        config.save_to(path)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

/// Parses `#RRGGBB`; anything else falls back to white.
pub fn parse_hex(hex: &str) -> [u8; 3] {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return [255, 255, 255];
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(255);
    [channel(0), channel(2), channel(4)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("signsight-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir.join("config.json")
    }

    #[test]
    fn partial_files_keep_defaults() {
        let cfg: AppConfig = serde_json::from_str(r#"{ "detection": { "min_detection_confidence": 0.7 } }"#).unwrap();
        assert_eq!(cfg.detection.min_detection_confidence, 0.7);
        assert_eq!(cfg.detection.min_tracking_confidence, 0.5);
        assert_eq!(cfg.detection.max_num_hands, 1);
        assert_eq!(cfg.recognition.quiz_pass_confidence, 0.8);
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let path = scratch("missing");
        let _ = fs::remove_file(&path);
        let cfg = AppConfig::load_from(&path).unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn garbage_file_falls_back_to_defaults() {
        let path = scratch("garbage");
        fs::write(&path, "{ not json").unwrap();
        let cfg = AppConfig::load_from(&path).unwrap();
        assert_eq!(cfg, AppConfig::default());
        let rewritten: AppConfig = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(rewritten, cfg);
    }

    #[test]
    fn extra_hands_are_clamped_to_one() {
        let path = scratch("hands");
        fs::write(&path, r#"{ "detection": { "max_num_hands": 2 } }"#).unwrap();
        let cfg = AppConfig::load_from(&path).unwrap();
        assert_eq!(cfg.detection.max_num_hands, 1);
        let rewritten: AppConfig = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(rewritten.detection.max_num_hands, 1);

        let zero = DetectionConfig {
            max_num_hands: 0,
            ..DetectionConfig::default()
        };
        assert_eq!(zero.single_hand(), DetectionConfig::default());
    }

    #[test]
    fn hex_colors() {
        assert_eq!(parse_hex("#FF0000"), [255, 0, 0]);
        assert_eq!(parse_hex("00ff9d"), [0, 255, 157]);
        assert_eq!(parse_hex("#abc"), [255, 255, 255]);
    }
}
