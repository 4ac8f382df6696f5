// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Operator diagnostics.
//
// Every extraction failure is mapped to a short message plus a suggestion an
// operator can act on. Severity decides whether the hosting service should
// simply let the user try again or whether someone must fix the deployment.

use crate::error::ScanError;
use crate::types::ProviderKind;

/// Who is expected to act on a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Retrying the upload may work.
    Transient,
    /// Deployment problem such as missing credentials or model files.
    Configuration,
    /// The uploaded document itself is the problem.
    Input,
}

/// A failure rendered for logs and status endpoints.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub message: String,
    pub suggestion: String,
    pub severity: Severity,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.message, self.suggestion)
    }
}

/// Convert a [`ScanError`] into a [`Diagnostic`].
pub fn diagnose(err: &ScanError) -> Diagnostic {
    match err {
        ScanError::Configuration(detail) => Diagnostic {
            message: format!("No recognition engine is configured ({detail})."),
            suggestion: "Set QWEN_API_KEY or GEMINI_API_KEY, or install the ocrs models and build with the `ocr` feature.".into(),
            severity: Severity::Configuration,
        },

        ScanError::Conversion(detail) => diagnose_conversion(detail),

        ScanError::UnsupportedMedia(detail) => Diagnostic {
            message: format!("Unsupported media type: {detail}."),
            suggestion: "Upload a PDF or a PNG, JPEG, TIFF, BMP, or WebP image.".into(),
            severity: Severity::Input,
        },

        ScanError::Recognition { provider, message } => diagnose_provider(*provider, message),

        ScanError::Parse { provider, .. } => Diagnostic {
            message: format!("{provider} answered with something that is not a JSON record list."),
            suggestion: "Usually transient. If it persists, check that the configured model supports image input.".into(),
            severity: Severity::Transient,
        },

        ScanError::Timeout { provider, seconds } => Diagnostic {
            message: format!("{provider} did not answer within {seconds}s."),
            suggestion: "Raise DRAWSCAN_CALL_TIMEOUT_SECS for very large drawings, or check provider status.".into(),
            severity: Severity::Transient,
        },

        ScanError::Enrichment(detail) => Diagnostic {
            message: format!("Tolerance limits were not computed ({detail})."),
            suggestion: "The record is kept as extracted; add the ISO class to the table if it is common.".into(),
            severity: Severity::Input,
        },

        ScanError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                Diagnostic {
                    message: "The uploaded file could not be found.".into(),
                    suggestion: "The upload handler may have removed it before extraction finished.".into(),
                    severity: Severity::Input,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                Diagnostic {
                    message: "The extractor lacks permission to read the file.".into(),
                    suggestion: "Check the permissions of the upload directory.".into(),
                    severity: Severity::Configuration,
                }
            } else {
                Diagnostic {
                    message: format!("File I/O failed: {io_err}."),
                    suggestion: "Retry; if it keeps happening the disk may be full.".into(),
                    severity: Severity::Transient,
                }
            }
        }

        ScanError::Serialization(_) => Diagnostic {
            message: "Configuration or response JSON could not be read.".into(),
            suggestion: "Validate the configuration file against the documented fields.".into(),
            severity: Severity::Configuration,
        },
    }
}

fn diagnose_conversion(detail: &str) -> Diagnostic {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("pdfium") {
        Diagnostic {
            message: "PDF pages cannot be rendered on this host.".into(),
            suggestion: "Install the PDFium shared library next to the service or in a system library path.".into(),
            severity: Severity::Configuration,
        }
    } else {
        Diagnostic {
            message: format!("The document could not be read ({detail})."),
            suggestion: "The file may be corrupt or password protected. Re-export it from the source application.".into(),
            severity: Severity::Input,
        }
    }
}

fn diagnose_provider(provider: ProviderKind, detail: &str) -> Diagnostic {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("401") || lower.contains("403") || lower.contains("api key") {
        Diagnostic {
            message: format!("{provider} rejected the credentials."),
            suggestion: "Check the API key and that the account has access to the configured model.".into(),
            severity: Severity::Configuration,
        }
    } else if lower.contains("429") || lower.contains("quota") || lower.contains("rate") {
        Diagnostic {
            message: format!("{provider} is rate limiting requests."),
            suggestion: "Wait and retry, or configure a second provider as fallback.".into(),
            severity: Severity::Transient,
        }
    } else if lower.contains("model not found") || lower.contains("models not found") {
        Diagnostic {
            message: format!("{provider} model files are missing."),
            suggestion: "Run `ocrs-cli` once to download the models, or set DRAWSCAN_OCR_MODEL_DIR.".into(),
            severity: Severity::Configuration,
        }
    } else {
        Diagnostic {
            message: format!("{provider} failed: {detail}."),
            suggestion: "The next configured provider was tried; retry the upload if every provider failed.".into(),
            severity: Severity::Transient,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_engine_is_configuration() {
        let diag = diagnose(&ScanError::Configuration("no credentials".into()));
        assert_eq!(diag.severity, Severity::Configuration);
    }

    #[test]
    fn unauthorized_provider_is_configuration() {
        let err = ScanError::recognition(ProviderKind::CloudA, "HTTP 401 Unauthorized");
        assert_eq!(diagnose(&err).severity, Severity::Configuration);
    }

    #[test]
    fn rate_limit_is_transient() {
        let err = ScanError::recognition(ProviderKind::CloudB, "HTTP 429: quota exceeded");
        assert_eq!(diagnose(&err).severity, Severity::Transient);
    }

    #[test]
    fn corrupt_pdf_is_input() {
        let diag = diagnose(&ScanError::Conversion("invalid file header".into()));
        assert_eq!(diag.severity, Severity::Input);
    }

    #[test]
    fn missing_pdfium_is_configuration() {
        let diag = diagnose(&ScanError::Conversion("could not bind PDFium library".into()));
        assert_eq!(diag.severity, Severity::Configuration);
    }
}
