use crate::client::http_client;
use anyhow::{anyhow, Context, Result};
use futures::future::join_all;
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;
use tokio::time::{sleep, Duration};

/// One remote table to fetch: where it lives and where it lands.
#[derive(Debug, Clone)]
pub struct FetchJob {
    pub url: String,
    pub dest: PathBuf,
    pub label: String,
}

impl FetchJob {
    pub fn new(url: String, dest: PathBuf, label: String) -> Self {
        Self { url, dest, label }
    }
}

/// A file counts as already downloaded only if it exists and is nonempty.
pub fn is_present(path: &Path) -> bool {
    path.is_file() && path.metadata().map(|m| m.len() > 0).unwrap_or(false)
}

async fn fetch_once(url: &str, dest: &Path) -> Result<()> {
    let client = http_client();

    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("request failed: {}", url))?;
    if !response.status().is_success() {
        return Err(anyhow!("{} answered {}", url, response.status()));
    }

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(dest)
        .await
        .with_context(|| format!("cannot open {:?}", dest))?;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.with_context(|| format!("read failed: {}", url))?;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    Ok(())
}

/// Download with an outer retry loop on top of the client middleware.
/// A partial file from a failed attempt is removed before the next try.
pub async fn fetch_with_retry(url: &str, dest: &Path, attempts: u32) -> Result<()> {
    let mut last = anyhow!("download failed: {}", url);
    for round in 0..attempts {
        if round > 0 {
            sleep(Duration::from_secs(3)).await;
        }
        match fetch_once(url, dest).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                let _ = fs::remove_file(dest).await;
                last = e;
            }
        }
    }
    Err(last)
}

/// Run the given jobs with bounded concurrency, skipping files that are
/// already on disk. Returns the number of files actually transferred;
/// any failed job fails the whole batch after the others finish.
pub async fn download_all(jobs: Vec<FetchJob>, parallel: usize) -> Result<usize> {
    let semaphore = Arc::new(Semaphore::new(parallel.max(1)));
    let fetched = Arc::new(AtomicUsize::new(0));
    let mut handles = vec![];

    for job in jobs {
        if is_present(&job.dest) {
            log::info!("{}: {:?} already exists", job.label, job.dest);
            continue;
        }
        let permit = semaphore.clone().acquire_owned().await?;
        let fetched = fetched.clone();

        handles.push(tokio::spawn(async move {
            log::info!("{}: {} -> {:?}", job.label, job.url, job.dest);
            let result = fetch_with_retry(&job.url, &job.dest, 3).await;
            drop(permit);
            if result.is_ok() {
                fetched.fetch_add(1, Ordering::SeqCst);
                log::info!("{}: done", job.label);
            }
            result.map_err(|e| (job.label, e))
        }));
    }

    let mut failures = vec![];
    for joined in join_all(handles).await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err((label, e))) => {
                log::error!("{}: {}", label, e);
                failures.push(label);
            }
            Err(e) => return Err(anyhow!("download task panicked: {}", e)),
        }
    }

    if failures.is_empty() {
        Ok(fetched.load(Ordering::SeqCst))
    } else {
        Err(anyhow!("{} download(s) failed: {}", failures.len(), failures.join(", ")))
    }
}
