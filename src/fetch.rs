use crate::data::TransferError;
use std::{
    fs::File,
    io::{Read, Write},
    path::{Path, PathBuf},
};
use tracing::info;

const FALLBACK_FILE_NAME: &str = "download.csv";

/// Name of the local copy: last path segment of `url`, without query or fragment.
pub(crate) fn local_file_name(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let path = path.split_once("://").map_or(path, |(_, rest)| rest);
    match path.split_once('/') {
        Some((_host, path)) => match path.rsplit('/').next() {
            Some(name) if !name.is_empty() => name,
            _ => FALLBACK_FILE_NAME,
        },
        None => FALLBACK_FILE_NAME,
    }
}

/// Download `url` into `dir`, replacing whatever file of the same name was there,
/// and return the path of the local copy.
pub(crate) fn download_file(url: &str, dir: &Path) -> Result<PathBuf, TransferError> {
    let target = dir.join(local_file_name(url));
    info!("downloading {url} -> {}", target.display());

    // Connect first so that a dead URL doesn't leave an empty file behind.
    let response = ureq::get(url)
        .call()
        .map_err(|err| TransferError::Request {
            url: url.to_owned(),
            reason: err.to_string(),
        })?;
    let mut reader = response.into_body().into_reader();
    let mut file = File::create(&target).map_err(|source| TransferError::Create {
        path: target.clone(),
        source,
    })?;

    let mut total_bytes = 0u64;
    let mut buffer = vec![0u8; 64 * 1024];
    loop {
        let read = reader
            .read(&mut buffer)
            .map_err(|err| TransferError::Request {
                url: url.to_owned(),
                reason: format!("failed reading response body: {err}"),
            })?;
        if read == 0 {
            break;
        }
        file.write_all(&buffer[..read])
            .map_err(|source| TransferError::Write {
                path: target.clone(),
                source,
            })?;
        total_bytes += read as u64;
    }
    file.flush().map_err(|source| TransferError::Write {
        path: target.clone(),
        source,
    })?;
    info!("downloaded {total_bytes} bytes");
    Ok(target)
}
