#![allow(dead_code, unused_imports)]

use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::sync::{mpsc, Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{Multipart, OriginalUri, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;

/// Re-export some common utilities for system tests
pub use {
    assert_cmd::{prelude::*, Command},
    assert_fs::{fixture::ChildPath, prelude::*, TempDir},
    danft::{
        api::TransferClient,
        config::Settings,
        error::{Error, ErrorKind},
    },
    predicates::prelude::*,
    pretty_assertions::{assert_eq as pretty_assert_eq, assert_str_eq as pretty_assert_str_eq},
    std::{fs, path::Path},
    testresult::TestResult,
};

pub const BIN_NAME: &str = "danft";
pub const UPLOAD_KEY: &str = "Jt8iZKQaBphsnpjC-test";

const PROXY_VARS: [&str; 6] = [
    "HTTP_PROXY",
    "http_proxy",
    "HTTPS_PROXY",
    "https_proxy",
    "ALL_PROXY",
    "all_proxy",
];

/// One request as the drop box saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: &'static str,
    pub path: String,
    pub upload_key: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// One multipart part the drop box stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub field: String,
    pub name: String,
    pub contents: Vec<u8>,
}

#[derive(Default)]
struct Store {
    requests: Vec<Recorded>,
    files: Vec<StoredFile>,
    clip: String,
    fail_with: Option<StatusCode>,
    omit_filename: bool,
    served_filename: Option<String>,
}

impl Store {
    fn record(&mut self, method: &'static str, path: &str, headers: &HeaderMap, body: Vec<u8>) {
        let header_str = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.requests.push(Recorded {
            method,
            path: path.to_string(),
            upload_key: header_str("x-upload-key"),
            content_type: header_str(header::CONTENT_TYPE.as_str()),
            body,
        });
    }

    fn reject(&self, headers: &HeaderMap) -> Option<StatusCode> {
        if let Some(status) = self.fail_with {
            return Some(status);
        }
        let key = headers.get("x-upload-key").and_then(|v| v.to_str().ok());
        (key != Some(UPLOAD_KEY)).then_some(StatusCode::UNAUTHORIZED)
    }
}

#[derive(Clone, Default)]
struct Shared(Arc<Mutex<Store>>);

/// In-process stand-in for the cloud drop box, served by axum on a
/// random local port from its own runtime thread.
pub struct DropBox {
    pub base_url: String,
    shared: Shared,
}

impl DropBox {
    pub fn start() -> Self {
        // The client honours proxy variables, which would swallow loopback requests.
        for proxy in PROXY_VARS {
            std::env::remove_var(proxy);
        }

        let shared = Shared::default();
        let app = Router::new()
            .route("/uploadafile", post(upload))
            .route("/apidownload/{name}", get(download))
            .route("/pasteaclip", post(upload_clip))
            .route("/apigetclip", get(download_clip))
            .with_state(shared.clone());

        let (tx, rx) = mpsc::channel();
        std::thread::Builder::new()
            .name("mock drop box".to_string())
            .spawn(move || {
                let rt = tokio::runtime::Builder::new_multi_thread()
                    .worker_threads(1)
                    .enable_all()
                    .build()
                    .expect("Failed building tokio runtime");
                rt.block_on(async move {
                    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                        .await
                        .expect("Failed binding mock drop box");
                    tx.send(listener.local_addr().expect("local addr"))
                        .expect("Failed sending mock drop box address");
                    axum::serve(listener, app).await.expect("mock drop box died");
                });
            })
            .expect("Failed spawning mock drop box thread");

        let addr: SocketAddr = rx.recv().expect("mock drop box never started");
        DropBox {
            base_url: format!("http://{addr}"),
            shared,
        }
    }

    fn store(&self) -> std::sync::MutexGuard<'_, Store> {
        self.shared.0.lock().unwrap()
    }

    pub fn settings(&self) -> Settings {
        Settings::new(&self.base_url, UPLOAD_KEY).unwrap()
    }

    pub fn client(&self) -> TransferClient {
        TransferClient::new(self.settings()).unwrap()
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.store().requests.clone()
    }

    pub fn files(&self) -> Vec<StoredFile> {
        self.store().files.clone()
    }

    pub fn clip(&self) -> String {
        self.store().clip.clone()
    }

    pub fn set_clip(&self, clip: &str) {
        self.store().clip = clip.to_string();
    }

    pub fn add_file(&self, name: &str, contents: &[u8]) {
        self.store().files.push(StoredFile {
            field: "file".to_string(),
            name: name.to_string(),
            contents: contents.to_vec(),
        });
    }

    /// Answer every request with `status`.
    pub fn fail_with(&self, status: u16) {
        self.store().fail_with = Some(StatusCode::from_u16(status).unwrap());
    }

    /// Serve downloads without the `X-Filename` header.
    pub fn omit_filename(&self) {
        self.store().omit_filename = true;
    }

    /// Serve downloads with `name` in `X-Filename` regardless of what was stored.
    pub fn serve_filename_as(&self, name: &str) {
        self.store().served_filename = Some(name.to_string());
    }
}

async fn upload(State(shared): State<Shared>, headers: HeaderMap, mut multipart: Multipart) -> StatusCode {
    let mut parts = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let field_name = field.name().unwrap_or_default().to_string();
        let name = field.file_name().unwrap_or_default().to_string();
        let Ok(contents) = field.bytes().await else {
            return StatusCode::BAD_REQUEST;
        };
        parts.push(StoredFile {
            field: field_name,
            name,
            contents: contents.to_vec(),
        });
    }

    let mut store = shared.0.lock().unwrap();
    let body = parts.iter().flat_map(|p| p.contents.clone()).collect();
    store.record("POST", "/uploadafile", &headers, body);
    if let Some(status) = store.reject(&headers) {
        return status;
    }
    store.files.extend(parts);
    StatusCode::OK
}

async fn download(State(shared): State<Shared>, OriginalUri(uri): OriginalUri, headers: HeaderMap) -> Response {
    let raw = uri.path().trim_start_matches("/apidownload/");
    let name = url::form_urlencoded::parse(raw.as_bytes())
        .next()
        .map(|(k, _)| k.into_owned())
        .unwrap_or_default();

    let mut store = shared.0.lock().unwrap();
    store.record("GET", uri.path(), &headers, Vec::new());
    if let Some(status) = store.reject(&headers) {
        return status.into_response();
    }

    let file = match name.as_str() {
        "LAST_FILE" => store.files.last(),
        _ => store.files.iter().rev().find(|f| f.name == name),
    };
    let Some(file) = file.cloned() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if store.omit_filename {
        return (StatusCode::OK, file.contents).into_response();
    }
    let served = store.served_filename.clone().unwrap_or(file.name);
    (StatusCode::OK, [("X-Filename", served)], file.contents).into_response()
}

async fn upload_clip(State(shared): State<Shared>, headers: HeaderMap, body: Bytes) -> StatusCode {
    let mut store = shared.0.lock().unwrap();
    store.record("POST", "/pasteaclip", &headers, body.to_vec());
    if let Some(status) = store.reject(&headers) {
        return status;
    }
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(&body) else {
        return StatusCode::BAD_REQUEST;
    };
    let Some(clip) = value.get("clip").and_then(|c| c.as_str()) else {
        return StatusCode::BAD_REQUEST;
    };
    store.clip = clip.to_string();
    StatusCode::OK
}

async fn download_clip(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    let mut store = shared.0.lock().unwrap();
    store.record("GET", "/apigetclip", &headers, Vec::new());
    if let Some(status) = store.reject(&headers) {
        return status.into_response();
    }
    (StatusCode::OK, store.clip.clone()).into_response()
}

/// A base URL nothing is listening on.
pub fn dead_base_url() -> String {
    let listener = StdTcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// The binary, isolated from the user's environment and config file.
pub fn danft_cmd(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin(BIN_NAME).unwrap();
    cmd.env("DANFT_CONFIG", config_dir.child("config.json").path())
        .env_remove("DANFT_BASE_URL")
        .env_remove("DANFT_UPLOAD_KEY")
        .env_remove("DANFT_LOG");
    for proxy in PROXY_VARS {
        cmd.env_remove(proxy);
    }
    cmd
}

/// Like [`danft_cmd`], pointed at `server` with the right key.
pub fn danft_cmd_for(server: &DropBox, config_dir: &TempDir) -> Command {
    let mut cmd = danft_cmd(config_dir);
    cmd.env("DANFT_BASE_URL", &server.base_url)
        .env("DANFT_UPLOAD_KEY", UPLOAD_KEY);
    cmd
}
