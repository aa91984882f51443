use crate::prelude::*;

/// Whether `source` names a document on the web rather than on disk.
pub fn is_url(source: &str) -> bool {
    let lower = source.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Read a document from a path or an `http(s)` URL.
pub async fn load(source: &str) -> Result<Vec<u8>> {
    if is_url(source) {
        return fetch(source).await;
    }

    tokio::fs::read(source)
        .await
        .map_err(|err| Error::Input(format!("{source}: {err}")))
        .wrap_err("Failed to read document")
}

async fn fetch(url: &str) -> Result<Vec<u8>> {
    log::info!("downloading {url}");
    let response = reqwest::Client::new()
        .get(url)
        .send()
        .await
        .map_err(|err| Error::Network(err.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(eyre!(Error::Network(format!("{url} returned {status}"))));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if !content_type.is_empty() && !content_type.contains("pdf") {
        log::warn!("{url} is served as {content_type}");
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|err| Error::Network(err.to_string()))?;
    log::debug!("downloaded {} bytes", bytes.len());
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.org/report.pdf"));
        assert!(is_url("HTTP://example.org/report.pdf"));
        assert!(!is_url("report.pdf"));
        assert!(!is_url("/tmp/https/report.pdf"));
    }

    #[tokio::test]
    async fn test_missing_file_is_an_input_error() {
        let err = load("/nonexistent/report.pdf").await.unwrap_err();
        assert!(err
            .chain()
            .any(|cause| cause.to_string().starts_with("Cannot read /nonexistent/report.pdf")));
    }
}
