//! Export of generated code as a downloadable artifact.

use core::fmt;
use core::str::FromStr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::config::DEFAULT_EXPORT_FILENAME;
use crate::error::{AppError, AppResult};

/// Export targets. `Yaml` and `Json` are reserved and always rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Py,
    Ipynb,
    Yaml,
    Json,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Py,
        ExportFormat::Ipynb,
        ExportFormat::Yaml,
        ExportFormat::Json,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Py => "py",
            ExportFormat::Ipynb => "ipynb",
            ExportFormat::Yaml => "yaml",
            ExportFormat::Json => "json",
        }
    }

    pub fn is_implemented(self) -> bool {
        matches!(self, ExportFormat::Py | ExportFormat::Ipynb)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_start_matches('.');
        ExportFormat::ALL
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| AppError::UnsupportedFormat { format: s.to_string() })
    }
}

/// A packaged export, ready to be written or served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub filename: String,
    pub content_type: &'static str,
    pub contents: String,
}

impl ExportedFile {
    /// Write into `dir`, returning the full path.
    ///
    /// `filename` must be a single plain path component.
    pub fn write_to(&self, dir: &Path) -> AppResult<PathBuf> {
        if !is_plain_file_name(&self.filename) {
            return Err(AppError::InvalidFilename {
                filename: self.filename.clone(),
            });
        }
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.filename);
        std::fs::write(&path, &self.contents)?;
        debug!(path = %path.display(), bytes = self.contents.len(), "wrote export");
        Ok(path)
    }
}

fn is_plain_file_name(name: &str) -> bool {
    let path = Path::new(name);
    !name.contains(['/', '\\']) && path.file_name().is_some_and(|f| f == path.as_os_str())
}

/// Reduce a requested file stem to `[A-Za-z0-9_-]`.
fn sanitize_stem(stem: &str) -> String {
    stem.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Package `code` in `format`. A blank `filename` falls back to the default;
/// any other stem is reduced to letters, digits, `-` and `_`.
pub fn export(code: &str, format: ExportFormat, filename: Option<&str>) -> AppResult<ExportedFile> {
    let stem = filename
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(sanitize_stem)
        .unwrap_or_else(|| DEFAULT_EXPORT_FILENAME.to_string());
    let (content_type, contents) = match format {
        ExportFormat::Py => ("text/x-python", code.to_string()),
        ExportFormat::Ipynb => (
            "application/x-ipynb+json",
            serde_json::to_string_pretty(&notebook(code))
                .map_err(|e| AppError::Generation { message: e.to_string() })?,
        ),
        ExportFormat::Yaml | ExportFormat::Json => {
            return Err(AppError::ExportFormatNotImplemented {
                format: format.to_string(),
            });
        }
    };
    Ok(ExportedFile {
        filename: format!("{stem}.{}", format.extension()),
        content_type,
        contents,
    })
}

/// nbformat 4 notebook wrapping `code` with a header and a training stub.
pub fn notebook(code: &str) -> Value {
    let lines: Vec<&str> = code.split('\n').collect();
    let last = lines.len().saturating_sub(1);
    let source: Vec<String> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| if i < last { format!("{line}\n") } else { (*line).to_string() })
        .collect();

    json!({
        "cells": [
            markdown_cell(&["# Neural Network Architecture\n", "\n", "Generated by Neuro-Canvas"]),
            code_cell(json!(["# Install dependencies if needed\n", "# !pip install torch"])),
            code_cell(json!(source)),
            markdown_cell(&["## Training Loop\n", "\n", "Add your training code below:"]),
            code_cell(json!([
                "# Example training loop\n",
                "# optimizer = torch.optim.Adam(model.parameters(), lr=1e-3)\n",
                "# criterion = nn.CrossEntropyLoss()\n",
                "#\n",
                "# for epoch in range(num_epochs):\n",
                "#     for batch in dataloader:\n",
                "#         optimizer.zero_grad()\n",
                "#         outputs = model(batch)\n",
                "#         loss = criterion(outputs, targets)\n",
                "#         loss.backward()\n",
                "#         optimizer.step()\n"
            ])),
        ],
        "metadata": {
            "kernelspec": {
                "display_name": "Python 3",
                "language": "python",
                "name": "python3"
            },
            "language_info": {
                "name": "python",
                "version": "3.10.0"
            }
        },
        "nbformat": 4,
        "nbformat_minor": 5
    })
}

fn markdown_cell(source: &[&str]) -> Value {
    json!({ "cell_type": "markdown", "metadata": {}, "source": source })
}

fn code_cell(source: Value) -> Value {
    json!({
        "cell_type": "code",
        "execution_count": null,
        "metadata": {},
        "outputs": [],
        "source": source
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn py_is_passthrough_with_default_name() {
        let file = export("print(1)", ExportFormat::Py, None).unwrap();
        assert_eq!(file.filename, "neural_network.py");
        assert_eq!(file.contents, "print(1)");

        let named = export("x", ExportFormat::Py, Some("  ")).unwrap();
        assert_eq!(named.filename, "neural_network.py");
    }

    #[test]
    fn notebook_layout() {
        let file = export("a = 1\nb = 2", ExportFormat::Ipynb, Some("model")).unwrap();
        assert_eq!(file.filename, "model.ipynb");

        let nb: Value = serde_json::from_str(&file.contents).unwrap();
        assert_eq!(nb["nbformat"], 4);
        assert_eq!(nb["nbformat_minor"], 5);
        assert_eq!(nb["metadata"]["kernelspec"]["name"], "python3");

        let cells = nb["cells"].as_array().unwrap();
        assert_eq!(cells.len(), 5);
        assert_eq!(cells[0]["cell_type"], "markdown");
        assert_eq!(cells[2]["source"], json!(["a = 1\n", "b = 2"]));
        assert!(cells[2]["execution_count"].is_null());
        assert_eq!(cells[2]["outputs"], json!([]));
    }

    #[test]
    fn reserved_formats_are_rejected() {
        for format in [ExportFormat::Yaml, ExportFormat::Json] {
            let err = export("x", format, None).unwrap_err();
            assert!(err.to_string().starts_with("Format not yet implemented"));
        }
        assert!("docx".parse::<ExportFormat>().is_err());
        assert_eq!(".IPYNB".parse::<ExportFormat>().unwrap(), ExportFormat::Ipynb);
    }

    #[test]
    fn filename_cannot_leave_the_export_directory() {
        for requested in ["../../x", "/etc/passwd", "a/b", "..\\evil", ".."] {
            let file = export("x = 1", ExportFormat::Py, Some(requested)).unwrap();
            assert!(!file.filename.contains(['/', '\\']), "{}", file.filename);
            assert!(!file.filename.contains(".."), "{}", file.filename);
        }
        assert_eq!(export("x", ExportFormat::Py, Some("../../x")).unwrap().filename, "______x.py");

        let dir = std::env::temp_dir().join("nc_app_export_traversal");
        let file = export("x = 1", ExportFormat::Py, Some("../escape")).unwrap();
        let path = file.write_to(&dir).unwrap();
        assert_eq!(path.parent(), Some(dir.as_path()));

        let forged = ExportedFile {
            filename: "../escape.py".into(),
            content_type: "text/x-python",
            contents: "x".into(),
        };
        assert!(matches!(forged.write_to(&dir), Err(AppError::InvalidFilename { .. })));
    }

    #[test]
    fn writes_into_directory() {
        let dir = std::env::temp_dir().join("nc_app_export_test");
        let file = export("x = 1", ExportFormat::Py, Some("net")).unwrap();
        let path = file.write_to(&dir).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "x = 1");
    }
}
