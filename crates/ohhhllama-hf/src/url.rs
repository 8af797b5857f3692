//! URL construction helpers for `HuggingFace` endpoints.

use crate::error::HfResult;
use url::Url;

fn join(base: &str, path: &str) -> HfResult<Url> {
    let base = base.trim_end_matches('/');
    Ok(Url::parse(&format!("{base}/{path}"))?)
}

/// Encode each path segment of a repo id or file path, keeping the slashes.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// `{base}/api/models/{repo}`: model info including the file listing.
pub fn model_info_url(base: &str, repo_id: &str) -> HfResult<Url> {
    join(base, &format!("api/models/{}", encode_path(repo_id)))
}

/// `{base}/{repo}/raw/main/config.json`: the repository's model config.
pub fn config_url(base: &str, repo_id: &str) -> HfResult<Url> {
    join(base, &format!("{}/raw/main/config.json", encode_path(repo_id)))
}

/// `{base}/{repo}/resolve/main/{file}`: direct download location for a file.
pub fn download_url(base: &str, repo_id: &str, file: &str) -> HfResult<Url> {
    join(
        base,
        &format!("{}/resolve/main/{}", encode_path(repo_id), encode_path(file)),
    )
}
