// Transfer client: a small blocking HTTP client that moves one file or
// one clip per call. Every request carries the shared upload key.

use reqwest::blocking::{multipart, Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::StatusCode;
use serde::Serialize;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::error::{Error, Result};

pub const UPLOAD_KEY_HEADER: &str = "X-Upload-Key";
pub const FILENAME_HEADER: &str = "X-Filename";

/// Multipart field the upload endpoint reads the file from.
pub const FILE_FIELD: &str = "file";

/// Body of a clip upload: `{"clip": "..."}`.
#[derive(Serialize, Debug)]
pub struct ClipRequest<'a> {
    pub clip: &'a str,
}

/// What a successful upload sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub path: PathBuf,
    pub bytes: u64,
}

/// What a successful download wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub path: PathBuf,
    pub bytes: u64,
}

#[derive(Clone)]
pub struct TransferClient {
    client: Client,
    settings: Settings,
}

impl TransferClient {
    pub fn new(settings: Settings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("danft/", env!("CARGO_PKG_VERSION")))
            .default_headers(auth_headers(&settings)?)
            .build()?;
        Ok(TransferClient { client, settings })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Upload the file at `path` as multipart field `file`.
    pub fn upload(&self, path: &Path) -> Result<Upload> {
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                Error::validation(format!("missing or invalid path base: {}", path.display()))
            })?
            .to_string();

        let file = File::open(path).map_err(|e| Error::io("failed to open", path, e))?;
        let meta = file
            .metadata()
            .map_err(|e| Error::io("failed to read", path, e))?;
        // Directories open fine on unix but fail mid-request when read.
        if !meta.is_file() {
            let source = io::Error::new(io::ErrorKind::Other, "not a regular file");
            return Err(Error::io("failed to read", path, source));
        }
        let bytes = meta.len();

        let part = multipart::Part::reader_with_length(file, bytes)
            .file_name(file_name)
            .mime_str("application/octet-stream")?;
        let form = multipart::Form::new().part(FILE_FIELD, part);

        let url = self.settings.upload_url()?;
        log::debug!("uploading {} ({bytes} bytes) to {url}", path.display());
        let res = send(self.client.post(url).multipart(form))?;
        expect_ok(&res)?;

        Ok(Upload {
            path: path.to_path_buf(),
            bytes,
        })
    }

    /// Upload a text clip. Empty clips are refused before touching the network.
    pub fn upload_clip(&self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Err(Error::validation("your clip has no data"));
        }

        let url = self.settings.clip_upload_url()?;
        log::debug!("uploading a {} byte clip to {url}", text.len());
        // `json` sets `Content-Type: application/json`.
        let req = self.client.post(url).json(&ClipRequest { clip: text });
        let res = send(req)?;
        expect_ok(&res)
    }

    /// Download `name` (or the last upload when empty) into the current directory.
    pub fn download(&self, name: &str, new_name: Option<&str>) -> Result<Download> {
        self.download_into(Path::new("."), name, new_name)
    }

    /// Download `name` into `dir`. The file is named `new_name` when given,
    /// otherwise whatever the server reports in `X-Filename`.
    pub fn download_into(&self, dir: &Path, name: &str, new_name: Option<&str>) -> Result<Download> {
        let url = self.settings.download_url(name)?;
        log::debug!("downloading {url}");
        let mut res = send(self.client.get(url))?;
        expect_ok(&res)?;

        let server_name = res
            .headers()
            .get(FILENAME_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or(Error::MissingHeader(FILENAME_HEADER))?
            .to_string();

        let local_name = match new_name.filter(|n| !n.is_empty()) {
            Some(n) => PathBuf::from(n),
            None => PathBuf::from(base_name(&server_name)?),
        };
        let path = dir.join(local_name);

        let mut file = File::create(&path).map_err(|e| Error::io("failed to create", &path, e))?;
        let bytes = io::copy(&mut res, &mut file).map_err(|e| copy_error(e, &path))?;
        log::debug!("wrote {bytes} bytes of {} (server name {server_name:?})", path.display());

        Ok(Download { path, bytes })
    }

    /// Fetch the last clip. An empty body means there is no clip and yields `""`.
    pub fn download_clip(&self) -> Result<String> {
        let url = self.settings.clip_download_url()?;
        log::debug!("downloading clip from {url}");
        let res = send(self.client.get(url))?;
        expect_ok(&res)?;
        Ok(res.text()?)
    }
}

/// Every request carries the upload key.
fn auth_headers(settings: &Settings) -> Result<HeaderMap> {
    let mut value = HeaderValue::from_str(settings.upload_key())
        .map_err(|_| Error::validation("upload key contains characters not allowed in a header"))?;
    value.set_sensitive(true);
    let mut headers = HeaderMap::new();
    headers.insert(UPLOAD_KEY_HEADER, value);
    Ok(headers)
}

fn send(req: RequestBuilder) -> Result<Response> {
    Ok(req.send()?)
}

/// A failed copy is either the body read (network) or the file write (local).
fn copy_error(err: io::Error, path: &Path) -> Error {
    if !err.get_ref().is_some_and(|inner| inner.is::<reqwest::Error>()) {
        return Error::io("failed to write", path, err);
    }
    let kind = err.kind();
    match err.into_inner().map(|inner| inner.downcast::<reqwest::Error>()) {
        Some(Ok(e)) => Error::Transport(*e),
        Some(Err(inner)) => Error::io("failed to write", path, io::Error::new(kind, inner)),
        None => Error::io("failed to write", path, io::Error::from(kind)),
    }
}

fn expect_ok(res: &Response) -> Result<()> {
    let status = res.status();
    log::debug!("server answered {status}");
    if status != StatusCode::OK {
        return Err(Error::Status(status));
    }
    Ok(())
}

/// Reduce a server-supplied name to its final component so a download
/// always lands in the target directory.
fn base_name(server_name: &str) -> Result<&str> {
    let normalized = server_name.trim_end_matches(['/', '\\']);
    let base = normalized
        .rsplit(['/', '\\'])
        .next()
        .filter(|b| !b.is_empty() && *b != "." && *b != "..")
        .ok_or_else(|| Error::BadFilename(server_name.to_string()))?;
    Ok(base)
}
