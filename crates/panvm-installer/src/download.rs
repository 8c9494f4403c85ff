use std::fs;
use std::path::Path;

use panvm_core::{Error, IoContext, Result};
use reqwest::blocking::Client;
use tracing::debug;

pub trait Downloader {
    /// Writes the body at `url` to `destination`, leaving nothing at
    /// `destination` when the transfer fails.
    fn download(&self, url: &str, destination: &Path) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: Client,
    api_url: String,
    token: Option<String>,
}

impl HttpDownloader {
    /// `token` is only sent to URLs under `api_url`; release assets are
    /// public, nightly artifacts are not.
    pub fn new(api_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .user_agent(concat!("panvm/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| Error::http(&api_url, err))?;
        Ok(Self {
            client,
            api_url,
            token: token.filter(|value| !value.trim().is_empty()),
        })
    }

    fn wants_token(&self, url: &str) -> bool {
        url.starts_with(&self.api_url)
    }
}

impl Downloader for HttpDownloader {
    fn download(&self, url: &str, destination: &Path) -> Result<()> {
        let part_path = destination.with_file_name(format!(
            "{}.part",
            destination
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("bundle")
        ));

        debug!(url, destination = %destination.display(), "downloading");
        let mut request = self.client.get(url);
        if let Some(token) = self.token.as_deref().filter(|_| self.wants_token(url)) {
            request = request.bearer_auth(token);
        }
        let mut response = request
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|err| Error::http(url, err))?;

        let result = fs::File::create(&part_path)
            .io_context(|| format!("failed to create {}", part_path.display()))
            .and_then(|mut file| {
                response
                    .copy_to(&mut file)
                    .map_err(|err| Error::http(url, err))
                    .map(|_| ())
            });
        if let Err(err) = result {
            let _ = fs::remove_file(&part_path);
            return Err(err);
        }

        fs::rename(&part_path, destination).io_context(|| {
            format!(
                "failed to move downloaded bundle into cache: {}",
                destination.display()
            )
        })
    }
}
