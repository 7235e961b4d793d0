use std::path::Path;

use axum::{
    async_trait,
    extract::{multipart::Field, FromRequest, Multipart, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::{ai::ReviewMode, error::AppError};

pub const ALLOWED_EXTENSIONS: [&str; 8] = ["js", "py", "cpp", "java", "ts", "dart", "html", "css"];

/// Per-field cap for uploaded files and text fields.
pub const MAX_FIELD_BYTES: usize = 2 * 1024 * 1024;

/// Whole-body cap for the code routes.
pub const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

pub const MAX_CODE_CHARS: usize = 50_000;

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub content: String,
}

/// Code sent for analysis, as JSON `{code, reviewType}` or as multipart form
/// data with `code`, `reviewType` and a single `file`.
#[derive(Debug, Default)]
pub struct CodeSubmission {
    pub code: Option<String>,
    pub file: Option<UploadedFile>,
    pub review_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CodeBody {
    #[serde(default)]
    code: Option<Value>,
    #[serde(default)]
    review_type: Option<String>,
}

pub fn has_allowed_extension(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|e| ALLOWED_EXTENSIONS.contains(&e.as_str()))
}

fn too_large(status: StatusCode) -> bool {
    status == StatusCode::PAYLOAD_TOO_LARGE
}

async fn read_field(mut field: Field<'_>) -> Result<Vec<u8>, AppError> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(|e| {
        if too_large(e.status()) {
            AppError::FieldTooLarge
        } else {
            AppError::validation(e.body_text())
        }
    })? {
        if buf.len() + chunk.len() > MAX_FIELD_BYTES {
            return Err(AppError::FieldTooLarge);
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

async fn read_text(field: Field<'_>) -> Result<String, AppError> {
    let bytes = read_field(field).await?;
    String::from_utf8(bytes).map_err(|_| AppError::validation("Form fields must be UTF-8 text"))
}

impl CodeSubmission {
    async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut submission = CodeSubmission::default();
        loop {
            let field = multipart.next_field().await.map_err(|e| {
                if too_large(e.status()) {
                    AppError::FieldTooLarge
                } else {
                    AppError::validation(e.body_text())
                }
            })?;
            let Some(field) = field else { break };

            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" => {
                    if submission.file.is_some() {
                        return Err(AppError::validation("Only one file may be uploaded"));
                    }
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    if !has_allowed_extension(&file_name) {
                        return Err(AppError::UnsupportedFileType);
                    }
                    let bytes = read_field(field).await?;
                    let content = String::from_utf8(bytes)
                        .map_err(|_| AppError::validation("Uploaded file must be UTF-8 text"))?;
                    submission.file = Some(UploadedFile {
                        name: file_name,
                        content,
                    });
                }
                "code" => submission.code = Some(read_text(field).await?),
                "reviewType" => submission.review_type = Some(read_text(field).await?),
                _ => {}
            }
        }
        Ok(submission)
    }

    /// Validated source text sent to the model.
    pub fn source(&self) -> Result<String, AppError> {
        let code = self.code.as_deref().filter(|c| !c.is_empty());

        if code.is_none() && self.file.is_none() {
            return Err(AppError::validation("Code is required and must be a string"));
        }
        if code.is_some_and(|c| c.chars().count() > MAX_CODE_CHARS) {
            return Err(AppError::validation(
                "Code exceeds maximum length of 50,000 characters",
            ));
        }

        let Some(file) = &self.file else {
            return Ok(code.unwrap_or_default().to_string());
        };
        let mut combined = format!("// --- File: {} ---\n{}\n", file.name, file.content);
        if let Some(code) = code {
            combined.push_str("\n// --- Additional Code Snippet ---\n");
            combined.push_str(code);
        }
        Ok(combined)
    }

    pub fn mode(&self) -> Result<ReviewMode, AppError> {
        ReviewMode::parse(self.review_type.as_deref()).map_err(|e| AppError::validation(e.to_string()))
    }
}

#[async_trait]
impl<S> FromRequest<S> for CodeSubmission
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::validation(e.body_text()))?;
            return Self::from_multipart(multipart).await;
        }

        if content_type.starts_with("application/json") {
            let Json(body) = Json::<CodeBody>::from_request(req, state).await.map_err(|e| {
                if too_large(e.status()) {
                    AppError::FieldTooLarge
                } else {
                    AppError::validation(e.body_text())
                }
            })?;
            let code = match body.code {
                Some(Value::String(s)) => Some(s),
                _ => None,
            };
            return Ok(CodeSubmission {
                code,
                file: None,
                review_type: body.review_type,
            });
        }

        Ok(CodeSubmission::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http};

    fn file(name: &str, content: &str) -> Option<UploadedFile> {
        Some(UploadedFile {
            name: name.into(),
            content: content.into(),
        })
    }

    #[test]
    fn extension_allow_list_is_case_insensitive() {
        for ok in ["a.js", "b.PY", "c.cpp", "d.java", "e.ts", "f.dart", "g.html", "h.Css"] {
            assert!(has_allowed_extension(ok), "{ok}");
        }
        for bad in ["a.rs", "b.exe", "noext", "archive.js.zip", ""] {
            assert!(!has_allowed_extension(bad), "{bad}");
        }
    }

    #[test]
    fn requires_code_or_file() {
        let err = CodeSubmission::default().source().unwrap_err();
        assert_eq!(err.to_string(), "Code is required and must be a string");

        let empty = CodeSubmission {
            code: Some(String::new()),
            ..Default::default()
        };
        assert!(empty.source().is_err());
    }

    #[test]
    fn rejects_oversized_code() {
        let sub = CodeSubmission {
            code: Some("x".repeat(MAX_CODE_CHARS + 1)),
            ..Default::default()
        };
        assert_eq!(
            sub.source().unwrap_err().to_string(),
            "Code exceeds maximum length of 50,000 characters"
        );
    }

    #[test]
    fn combines_file_and_snippet() {
        let only_file = CodeSubmission {
            file: file("main.py", "print(1)"),
            ..Default::default()
        };
        assert_eq!(only_file.source().unwrap(), "// --- File: main.py ---\nprint(1)\n");

        let both = CodeSubmission {
            code: Some("print(2)".into()),
            file: file("main.py", "print(1)"),
            ..Default::default()
        };
        assert_eq!(
            both.source().unwrap(),
            "// --- File: main.py ---\nprint(1)\n\n// --- Additional Code Snippet ---\nprint(2)"
        );
    }

    #[test]
    fn unknown_review_type_is_a_validation_error() {
        let sub = CodeSubmission {
            review_type: Some("style".into()),
            ..Default::default()
        };
        assert!(matches!(sub.mode(), Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn json_body_with_non_string_code_counts_as_missing() {
        let req = http::Request::builder()
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"code": 42, "reviewType": "security"}"#))
            .unwrap();
        let sub = CodeSubmission::from_request(req, &()).await.unwrap();
        assert!(sub.code.is_none());
        assert_eq!(sub.review_type.as_deref(), Some("security"));
    }

    #[tokio::test]
    async fn multipart_rejects_disallowed_extension() {
        let body = "--XBOUND\r\n\
            Content-Disposition: form-data; name=\"file\"; filename=\"evil.exe\"\r\n\
            Content-Type: application/octet-stream\r\n\r\n\
            MZ\r\n\
            --XBOUND--\r\n";
        let req = http::Request::builder()
            .header(CONTENT_TYPE, "multipart/form-data; boundary=XBOUND")
            .body(Body::from(body))
            .unwrap();
        let err = CodeSubmission::from_request(req, &()).await.unwrap_err();
        assert!(matches!(err, AppError::UnsupportedFileType));
    }

    #[tokio::test]
    async fn multipart_reads_file_and_fields() {
        let body = "--XBOUND\r\n\
            Content-Disposition: form-data; name=\"code\"\r\n\r\n\
            let y = 2;\r\n\
            --XBOUND\r\n\
            Content-Disposition: form-data; name=\"file\"; filename=\"app.ts\"\r\n\
            Content-Type: text/plain\r\n\r\n\
            let x = 1;\r\n\
            --XBOUND--\r\n";
        let req = http::Request::builder()
            .header(CONTENT_TYPE, "multipart/form-data; boundary=XBOUND")
            .body(Body::from(body))
            .unwrap();
        let sub = CodeSubmission::from_request(req, &()).await.unwrap();
        assert_eq!(sub.code.as_deref(), Some("let y = 2;"));
        let file = sub.file.unwrap();
        assert_eq!(file.name, "app.ts");
        assert_eq!(file.content, "let x = 1;");
    }
}
