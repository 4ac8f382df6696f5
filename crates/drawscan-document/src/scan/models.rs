// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Local OCR model file locations.
//
// The ocrs engine needs two `.rten` model files. They can be obtained by
// running the `ocrs-cli` tool once:
//   ```sh
//   cargo install ocrs-cli
//   ocrs some-image.png  # downloads models to ~/.cache/ocrs/
//   ```
//
// Lookup does not depend on the `ocr` feature so hosts can report whether
// the local engine would be usable.

use std::path::{Path, PathBuf};

use drawscan_core::config::LocalOcrSettings;
use drawscan_core::error::ScanError;
use drawscan_core::types::ProviderKind;

pub const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
pub const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// `$XDG_CACHE_HOME/ocrs`, falling back to `~/.cache/ocrs`.
pub fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Paths of the detection and recognition models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrModelPaths {
    pub detection: PathBuf,
    pub recognition: PathBuf,
}

impl Default for OcrModelPaths {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrModelPaths {
    /// Expects `dir` to contain `text-detection.rten` and `text-recognition.rten`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection: dir.join(DETECTION_MODEL_FILENAME),
            recognition: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    pub fn from_settings(settings: &LocalOcrSettings) -> Self {
        match &settings.model_dir {
            Some(dir) => Self::from_dir(dir),
            None => Self::default(),
        }
    }

    /// Both files present on disk.
    pub fn available(&self) -> bool {
        self.detection.is_file() && self.recognition.is_file()
    }

    pub fn validate(&self) -> Result<(), ScanError> {
        for (role, path) in [("detection", &self.detection), ("recognition", &self.recognition)] {
            if !path.is_file() {
                return Err(ScanError::recognition(
                    ProviderKind::Local,
                    format!(
                        "{role} model not found at {}; run `ocrs-cli` once to download models",
                        path.display()
                    ),
                ));
            }
        }
        Ok(())
    }
}
