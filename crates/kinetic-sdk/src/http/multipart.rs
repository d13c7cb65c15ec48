//! multipart/form-data encoding.

use std::path::Path;

use reqwest::multipart::{Form, Part};

use crate::error::Result;
use crate::http::request::{FieldValue, FormField};

/// MIME type used when the extension lookup has no answer.
pub const DEFAULT_MIME_TYPE: &str = "text/plain";

/// Best-effort MIME type from a file extension.
pub fn mime_type_from_extension(extension: &str) -> Option<&'static str> {
    let mime = match extension.to_ascii_lowercase().as_str() {
        "json" => "application/json",
        "xml" => "application/xml",
        "zip" => "application/zip",
        "gz" | "tgz" => "application/gzip",
        "pdf" => "application/pdf",
        "js" => "application/javascript",
        "jar" => "application/java-archive",
        "csv" => "text/csv",
        "txt" | "log" => "text/plain",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "md" => "text/markdown",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => return None,
    };
    Some(mime)
}

/// MIME type for a file name, defaulting to [`DEFAULT_MIME_TYPE`].
pub fn mime_type_for(file_name: &str) -> &'static str {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(mime_type_from_extension)
        .unwrap_or(DEFAULT_MIME_TYPE)
}

/// Build a form from field descriptions. Files are read here, once per
/// attempt, since a reqwest form cannot be replayed.
pub(crate) async fn build_form(fields: &[FormField]) -> Result<Form> {
    let mut form = Form::new();
    for field in fields {
        let part = match &field.value {
            FieldValue::Text(text) => Part::text(text.clone()),
            FieldValue::File(path) => {
                let data = tokio::fs::read(path).await?;
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| field.name.clone());
                let mime = mime_type_for(&file_name);
                Part::bytes(data).file_name(file_name).mime_str(mime)?
            }
            FieldValue::Bytes {
                file_name,
                data,
                content_type,
            } => {
                let mime = content_type
                    .as_deref()
                    .unwrap_or_else(|| mime_type_for(file_name));
                Part::bytes(data.to_vec())
                    .file_name(file_name.clone())
                    .mime_str(mime)?
            }
        };
        form = form.part(field.name.clone(), part);
    }
    Ok(form)
}
