//! Temporary on-disk staging for uploaded documents.
//!
//! A staged file lives exactly as long as its [`StagedUpload`] (or the
//! [`UploadWriter`] still filling it); dropping either removes the file.

use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::debug;

use crate::error::ServiceResult;

/// Where uploads are staged. `None` means the system temp directory.
#[derive(Clone, Debug, Default)]
pub struct StagingArea {
    dir: Option<PathBuf>,
}

impl StagingArea {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Start a new staged file for an upload named `original_name`.
    pub fn writer(&self, original_name: impl Into<String>) -> ServiceResult<UploadWriter> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("upload-");
        let file = match &self.dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                builder.tempfile_in(dir)?
            }
            None => builder.tempfile()?,
        };
        let writer = tokio::fs::File::from_std(file.reopen()?);
        Ok(UploadWriter {
            file,
            writer,
            original_name: original_name.into(),
            size: 0,
        })
    }

    /// Stage everything `reader` yields.
    pub async fn stage<R: AsyncRead + Unpin>(
        &self,
        original_name: impl Into<String>,
        mut reader: R,
    ) -> ServiceResult<StagedUpload> {
        let mut writer = self.writer(original_name)?;
        let copied = tokio::io::copy(&mut reader, &mut writer.writer).await?;
        writer.size = copied;
        writer.finish().await
    }
}

/// A staged file still being written.
pub struct UploadWriter {
    file: NamedTempFile,
    writer: tokio::fs::File,
    original_name: String,
    size: u64,
}

impl UploadWriter {
    pub async fn write(&mut self, chunk: &[u8]) -> ServiceResult<()> {
        self.writer.write_all(chunk).await?;
        self.size += chunk.len() as u64;
        Ok(())
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub async fn finish(mut self) -> ServiceResult<StagedUpload> {
        self.writer.flush().await?;
        debug!(path = %self.file.path().display(), size = self.size, "staged upload");
        Ok(StagedUpload {
            file: self.file,
            original_name: self.original_name,
            size: self.size,
        })
    }
}

/// A fully written staged upload.
pub struct StagedUpload {
    file: NamedTempFile,
    original_name: String,
    size: u64,
}

impl StagedUpload {
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Open a fresh read handle positioned at the start.
    pub async fn reader(&self) -> ServiceResult<tokio::fs::File> {
        Ok(tokio::fs::File::open(self.file.path()).await?)
    }
}
