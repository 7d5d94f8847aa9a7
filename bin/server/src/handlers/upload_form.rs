use crate::constants::{MAX_TEXT_FIELD_SIZE, SPOOL_FILE_PREFIX};
use actix_multipart::{Field, Multipart, MultipartError};
use actix_web::error::PayloadError;
use actix_web::http::header::HeaderMap;
use actix_web::web::{self, Bytes};
use common::{FILE_FIELD, PASSWORD_FIELD};
use futures_util::{stream, StreamExt};
use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Errors raised while receiving the multipart upload body
#[derive(Debug, Error)]
pub enum FormError {
    #[error("Upload failed: request body exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },

    #[error("Upload failed: field \"{name}\" exceeds {limit} bytes")]
    FieldTooLarge { name: String, limit: usize },

    #[error("Upload failed: malformed multipart body: {0}")]
    Malformed(String),

    #[error("Failed to buffer uploaded file: {0}")]
    Spool(#[from] std::io::Error),
}

/// Raw body size ceiling shared between the payload stream and the field readers
struct BodyLimit {
    limit: u64,
    exceeded: Rc<Cell<bool>>,
}

impl BodyLimit {
    fn classify(&self, e: MultipartError) -> FormError {
        if self.exceeded.get() {
            return FormError::TooLarge { limit: self.limit };
        }
        match e {
            MultipartError::Payload(PayloadError::Overflow) => {
                FormError::TooLarge { limit: self.limit }
            }
            other => FormError::Malformed(other.to_string()),
        }
    }
}

/// The `file` part of an upload, buffered in a spool file until it is validated
pub struct SpooledFile {
    /// Filename exactly as supplied by the client
    pub filename: String,
    /// Number of bytes received
    pub size: u64,
    spool: NamedTempFile,
}

impl SpooledFile {
    /// Open the buffered content for reading
    pub async fn open(&self) -> std::io::Result<tokio::fs::File> {
        tokio::fs::File::open(self.spool.path()).await
    }
}

/// Fields of an upload request that the handler cares about
pub struct UploadForm {
    /// First part named `file` that carries a filename
    pub file: Option<SpooledFile>,
    /// First part named `password`
    pub password: Option<String>,
    /// Why reading stopped early, if it did
    error: Option<FormError>,
}

impl UploadForm {
    /// Stream the request body, enforcing `limit` on the raw body size.
    ///
    /// The file part is written to a spool file in `spool_dir`; it is deleted
    /// when the returned form is dropped. Other parts are drained and ignored.
    /// Fields read before a failure are kept so the secret can still be
    /// checked; the failure itself surfaces through [`UploadForm::into_result`].
    pub async fn receive(
        headers: &HeaderMap,
        payload: web::Payload,
        limit: u64,
        spool_dir: &Path,
    ) -> Self {
        let body_limit = BodyLimit {
            limit,
            exceeded: Rc::new(Cell::new(false)),
        };
        let exceeded = Rc::clone(&body_limit.exceeded);
        let mut received: u64 = 0;
        // The part of a chunk that still fits is passed on before the overflow
        let limited = payload
            .map(move |chunk| {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => return stream::iter(vec![Err(e)]),
                };
                let remaining = limit.saturating_sub(received);
                received = received.saturating_add(chunk.len() as u64);
                if chunk.len() as u64 <= remaining {
                    return stream::iter(vec![Ok(chunk)]);
                }

                exceeded.set(true);
                let mut items = Vec::with_capacity(2);
                if remaining > 0 {
                    items.push(Ok(chunk.slice(..remaining as usize)));
                }
                items.push(Err(PayloadError::Overflow));
                stream::iter(items)
            })
            .flatten();

        let mut multipart = Multipart::new(headers, limited);
        let mut form = UploadForm {
            file: None,
            password: None,
            error: None,
        };

        if let Err(e) = form.read_fields(&mut multipart, &body_limit, spool_dir).await {
            form.error = Some(e);
        }
        form
    }

    /// The form, or the error that cut reading short
    pub fn into_result(mut self) -> Result<Self, FormError> {
        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(self),
        }
    }

    async fn read_fields(
        &mut self,
        multipart: &mut Multipart,
        body_limit: &BodyLimit,
        spool_dir: &Path,
    ) -> Result<(), FormError> {
        while let Some(field) = multipart.next().await {
            let mut field = field.map_err(|e| body_limit.classify(e))?;
            let name = field.name().map(str::to_owned);
            let filename = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .map(str::to_owned);

            match (name.as_deref(), filename) {
                (Some(FILE_FIELD), Some(filename)) if self.file.is_none() => {
                    let spooled = spool_field(&mut field, filename, body_limit, spool_dir).await?;
                    self.file = Some(spooled);
                }
                (Some(PASSWORD_FIELD), None) if self.password.is_none() => {
                    let password = read_text_field(&mut field, PASSWORD_FIELD, body_limit).await?;
                    self.password = Some(password);
                }
                _ => drain_field(&mut field, body_limit).await?,
            }
        }
        Ok(())
    }
}

async fn next_chunk(
    field: &mut Field,
    body_limit: &BodyLimit,
) -> Result<Option<Bytes>, FormError> {
    match field.next().await {
        Some(chunk) => chunk.map(Some).map_err(|e| body_limit.classify(e)),
        None => Ok(None),
    }
}

async fn spool_field(
    field: &mut Field,
    filename: String,
    body_limit: &BodyLimit,
    spool_dir: &Path,
) -> Result<SpooledFile, FormError> {
    let spool = tempfile::Builder::new()
        .prefix(SPOOL_FILE_PREFIX)
        .tempfile_in(spool_dir)?;
    let mut out = tokio::fs::File::from_std(spool.as_file().try_clone()?);

    let mut size: u64 = 0;
    while let Some(chunk) = next_chunk(field, body_limit).await? {
        out.write_all(&chunk).await?;
        size += chunk.len() as u64;
    }
    out.flush().await?;

    debug!(filename = ?filename, size, "Spooled upload to {:?}", spool.path());
    Ok(SpooledFile {
        filename,
        size,
        spool,
    })
}

async fn read_text_field(
    field: &mut Field,
    name: &str,
    body_limit: &BodyLimit,
) -> Result<String, FormError> {
    let mut value = Vec::new();
    while let Some(chunk) = next_chunk(field, body_limit).await? {
        if value.len() + chunk.len() > MAX_TEXT_FIELD_SIZE {
            return Err(FormError::FieldTooLarge {
                name: name.to_string(),
                limit: MAX_TEXT_FIELD_SIZE,
            });
        }
        value.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&value).into_owned())
}

async fn drain_field(field: &mut Field, body_limit: &BodyLimit) -> Result<(), FormError> {
    while next_chunk(field, body_limit).await?.is_some() {}
    Ok(())
}
