use std::path::Path;

use async_trait::async_trait;

/// An image file submitted with a form, before it is stored.
#[derive(Debug, Clone)]
pub(crate) struct PhotoUpload {
    pub(crate) filename: String,
    pub(crate) content_type: String,
    pub(crate) bytes: Vec<u8>,
}

impl PhotoUpload {
    /// Returns the lowercased extension when the file is an allowed image under `max_bytes`.
    pub(crate) fn checked_extension(
        &self,
        allowed_extensions: &[String],
        max_bytes: usize,
    ) -> Result<String, String> {
        if self.bytes.is_empty() {
            return Err("Uploaded photo is empty".to_string());
        }
        if self.bytes.len() > max_bytes {
            return Err(format!("Photo must not exceed {} MB", max_bytes / (1024 * 1024)));
        }

        let extension = Path::new(&self.filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .ok_or_else(|| "File must have an extension".to_string())?;

        if !allowed_extensions.iter().any(|allowed| allowed == &extension) {
            return Err(format!("File extension '{extension}' is not allowed"));
        }

        let mime = self.content_type.trim().to_ascii_lowercase();
        if mime_allowed_for_extension(&mime, &extension) {
            Ok(extension)
        } else {
            Err(format!("MIME type '{mime}' does not match extension '.{extension}'"))
        }
    }
}

fn mime_allowed_for_extension(mime: &str, extension: &str) -> bool {
    match extension {
        "jpg" | "jpeg" => matches!(mime, "image/jpeg" | "image/jpg"),
        "png" => mime == "image/png",
        "webp" => mime == "image/webp",
        "gif" => mime == "image/gif",
        _ => false,
    }
}

pub(crate) fn photo_key(extension: &str) -> String {
    format!("students/photos/{}.{extension}", uuid::Uuid::new_v4())
}

/// Where student photos are kept. The returned key is stored on the student record.
#[async_trait]
pub(crate) trait PhotoStore: Send + Sync {
    async fn put(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> anyhow::Result<()>;

    async fn remove(&self, key: &str) -> anyhow::Result<()>;
}
