//! Rate-limited, idempotent report downloads
//!
//! A file name already present in the download directory is never fetched
//! again; presence is the only signal, content is not compared. New files
//! are written to a temporary file in the same directory and then persisted
//! under their final name with create-or-fail semantics, so a concurrent
//! presence check never sees a partial file.

use crate::crawler::{DownloadedFile, PageFetcher, RateLimiter, ReportLink};
use crate::HarvestError;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::{self, JoinSet};
use url::Url;

/// A download that did not produce a file
#[derive(Debug)]
pub struct DownloadFailure {
    pub link: ReportLink,
    pub error: HarvestError,
}

/// Outcome of a batch of downloads
#[derive(Debug, Default)]
pub struct DownloadBatch {
    /// Files on disk, in the order of the input links
    pub files: Vec<DownloadedFile>,

    /// One entry per failed link
    pub failures: Vec<DownloadFailure>,
}

/// Downloads report files into a local directory
#[derive(Clone)]
pub struct FileDownloader {
    directory: PathBuf,
    fetcher: PageFetcher,
    limiter: Arc<RateLimiter>,
}

impl FileDownloader {
    /// Creates a downloader
    ///
    /// # Arguments
    ///
    /// * `directory` - Storage area for downloaded files, created on demand
    /// * `fetcher` - Shared page fetcher
    /// * `limiter` - Rate limiter shared by every download
    pub fn new(directory: impl Into<PathBuf>, fetcher: PageFetcher, limiter: Arc<RateLimiter>) -> Self {
        Self {
            directory: directory.into(),
            fetcher,
            limiter,
        }
    }

    /// Downloads `url` into the directory as `file_name`
    ///
    /// Returns the existing path without network access if the file is
    /// already present.
    pub async fn download(&self, url: &str, file_name: &str) -> Result<PathBuf, HarvestError> {
        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|e| HarvestError::File {
                path: self.directory.clone(),
                source: e,
            })?;

        let path = self.directory.join(file_name);

        if tokio::fs::try_exists(&path)
            .await
            .map_err(|e| HarvestError::File {
                path: path.clone(),
                source: e,
            })?
        {
            tracing::debug!("File {} already exists, skipping download", file_name);
            return Ok(path);
        }

        self.limiter.acquire().await;

        let page = self.fetcher.fetch(url).await?;
        let body = page.bytes().await?;

        let directory = self.directory.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || persist_atomically(&directory, &target, &body))
            .await??;

        tracing::info!("Downloaded {} -> {}", url, path.display());
        Ok(path)
    }

    /// Downloads every link concurrently and waits for all of them
    ///
    /// Each link is an independent task: a failure is recorded for that
    /// link and never cancels the others.
    pub async fn download_all(&self, links: &[ReportLink]) -> DownloadBatch {
        let mut tasks = JoinSet::new();
        let mut pending = HashMap::with_capacity(links.len());

        for (index, link) in links.iter().cloned().enumerate() {
            let downloader = self.clone();
            let task_link = link.clone();
            let handle = tasks.spawn(async move {
                let result = match file_name_from_url(&task_link.url) {
                    Ok(file_name) => downloader.download(&task_link.url, &file_name).await,
                    Err(e) => Err(e),
                };
                (index, task_link, result)
            });
            pending.insert(handle.id(), link);
        }

        gather_downloads(tasks, pending).await
    }
}

type DownloadOutcome = (usize, ReportLink, Result<PathBuf, HarvestError>);

/// Waits for every download task and sorts the outcomes
///
/// `pending` maps each task to its link, so a task that panicked is still
/// reported as a failure of that link.
async fn gather_downloads(
    mut tasks: JoinSet<DownloadOutcome>,
    mut pending: HashMap<task::Id, ReportLink>,
) -> DownloadBatch {
    let mut succeeded = Vec::with_capacity(pending.len());
    let mut batch = DownloadBatch::default();

    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((id, (index, link, Ok(path)))) => {
                pending.remove(&id);
                succeeded.push((
                    index,
                    DownloadedFile {
                        path,
                        published_date: link.published_date,
                    },
                ));
            }
            Ok((id, (_, link, Err(error)))) => {
                pending.remove(&id);
                tracing::warn!("Download of {} failed: {}", link.url, error);
                batch.failures.push(DownloadFailure { link, error });
            }
            Err(e) => {
                let id = e.id();
                let error = HarvestError::from(e);
                match pending.remove(&id) {
                    Some(link) => {
                        tracing::error!("Download task for {} failed: {}", link.url, error);
                        batch.failures.push(DownloadFailure { link, error });
                    }
                    None => tracing::error!("Download task failed to complete: {}", error),
                }
            }
        }
    }

    succeeded.sort_by_key(|(index, _)| *index);
    batch.files = succeeded.into_iter().map(|(_, file)| file).collect();
    batch
}

/// Derives the local file name from the last path segment of a URL
pub fn file_name_from_url(url: &str) -> Result<String, HarvestError> {
    let parsed = Url::parse(url)?;
    parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .map(str::to_string)
        .ok_or_else(|| HarvestError::FileName {
            url: url.to_string(),
        })
}

/// Writes `body` to a temporary file and persists it as `target`
///
/// Persisting fails if `target` appeared meanwhile; the file that is
/// already there is kept.
fn persist_atomically(directory: &Path, target: &Path, body: &[u8]) -> Result<(), HarvestError> {
    let io_err = |source: std::io::Error| HarvestError::File {
        path: target.to_path_buf(),
        source,
    };

    let mut temp = tempfile::Builder::new()
        .prefix(".download-")
        .suffix(".part")
        .tempfile_in(directory)
        .map_err(io_err)?;
    temp.write_all(body).map_err(io_err)?;
    temp.as_file().sync_all().map_err(io_err)?;

    match temp.persist_noclobber(target) {
        Ok(_) => Ok(()),
        Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
            tracing::debug!(
                "{} was written concurrently, keeping the existing file",
                target.display()
            );
            Ok(())
        }
        Err(e) => Err(io_err(e.error)),
    }
}
