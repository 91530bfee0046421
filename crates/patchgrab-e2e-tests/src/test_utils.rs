use eyre::Result;
use flate2::Compression;
use flate2::write::ZlibEncoder;
use patchgrab_lib::cli::{Command, DownloadParams, ResolvedCommand, resolve_command};
use std::io::Write;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const PATCH_LIST_PATH: &str = "/launcher/GetPatchList";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("patchgrab_lib=debug")
        .with_test_writer()
        .try_init();
}

pub fn setup_test_environment() -> Result<TempDir> {
    Ok(tempfile::tempdir()?)
}

/// Upstream URI of the incremental patch between two versions.
pub fn update_uri(server: &MockServer, from: &str, to: &str) -> String {
    format!(
        "{}/ClientUpdates/{from}-{to}/Client.{from}-{to}.update",
        server.uri()
    )
}

/// URL path the full distribution for `version` is derived to.
pub fn distrib_path(version: &str) -> String {
    format!("/ClientDistribs/{version}/Client.{version}.zip")
}

pub fn update_path(from: &str, to: &str) -> String {
    format!("/ClientUpdates/{from}-{to}/Client.{from}-{to}.update")
}

/// Zlib-compressed patch list body, the way the launcher endpoint serves it.
pub fn compressed_patch_list(body: &serde_json::Value) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(serde_json::to_string(body)?.as_bytes())?;
    Ok(encoder.finish()?)
}

pub fn patch_list(server: &MockServer, versions: &[(&str, &str)]) -> serde_json::Value {
    let data: Vec<serde_json::Value> = versions
        .iter()
        .map(|(from, to)| {
            serde_json::json!({
                "FromVersion": from,
                "Version": to,
                "DownloadUri": update_uri(server, from, to),
            })
        })
        .collect();

    serde_json::json!({ "err": false, "errmsg": null, "data": data })
}

pub async fn mount_patch_list(server: &MockServer, body: &serde_json::Value) -> Result<()> {
    Mock::given(method("GET"))
        .and(path(PATCH_LIST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(compressed_patch_list(body)?))
        .mount(server)
        .await;
    Ok(())
}

/// Serves a static file, honouring open-ended `Range: bytes=k-` requests.
#[derive(Clone)]
pub struct RangedFile {
    content: Vec<u8>,
}

impl RangedFile {
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        Self {
            content: content.into(),
        }
    }

    fn requested_offset(request: &Request) -> Option<usize> {
        request
            .headers
            .get("range")?
            .to_str()
            .ok()?
            .strip_prefix("bytes=")?
            .strip_suffix('-')?
            .parse()
            .ok()
    }
}

impl Respond for RangedFile {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        match Self::requested_offset(request) {
            Some(offset) if offset <= self.content.len() => ResponseTemplate::new(206)
                .insert_header(
                    "content-range",
                    format!(
                        "bytes {}-{}/{}",
                        offset,
                        self.content.len().saturating_sub(1),
                        self.content.len()
                    )
                    .as_str(),
                )
                .set_body_bytes(self.content[offset..].to_vec()),
            Some(_) => ResponseTemplate::new(416),
            None => ResponseTemplate::new(200).set_body_bytes(self.content.clone()),
        }
    }
}

/// Mounts HEAD and GET handlers for one downloadable resource.
pub async fn mount_resource(server: &MockServer, resource_path: &str, content: &[u8]) {
    Mock::given(method("HEAD"))
        .and(path(resource_path))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(resource_path))
        .respond_with(RangedFile::new(content))
        .mount(server)
        .await;
}

/// Download parameters for an unattended run against `server`, rooted in `dir`.
pub fn download_params(server: &MockServer, dir: &Path, versions: Vec<String>) -> DownloadParams {
    let command = Command::Download {
        config_path: Some(path_string(&dir.join("config.json"))),
        distrib_dir: Some(path_string(&dir.join("distribs"))),
        patch_dir: Some(path_string(&dir.join("patches"))),
        no_distrib: false,
        no_patch: false,
        silent: true,
        versions,
        snapshot_path: Some(path_string(&dir.join("list.json"))),
        endpoint: Some(format!("{}{}", server.uri(), PATCH_LIST_PATH)),
        pacing_ms: Some(0),
        idle_timeout_secs: Some(5),
        max_requeues: Some(3),
    };
    match resolve_command(command).expect("Failed to resolve download command") {
        ResolvedCommand::Download(params) => params,
        _ => unreachable!("Resolved command type mismatch"),
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Plain HTTP/1.1 file server whose first body response breaks off mid-stream.
///
/// The broken response advertises the full length but sends only `cut_after` bytes
/// before closing the connection. Later requests honour `Range: bytes=k-`.
pub struct TruncatingServer {
    addr: SocketAddr,
    ranges: Arc<Mutex<Vec<Option<String>>>>,
}

impl TruncatingServer {
    pub async fn start(content: Vec<u8>, cut_after: usize) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let ranges = Arc::new(Mutex::new(Vec::new()));
        let content = Arc::new(content);
        let body_requests = Arc::new(AtomicUsize::new(0));

        let recorded = ranges.clone();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let content = content.clone();
                let recorded = recorded.clone();
                let body_requests = body_requests.clone();
                tokio::spawn(async move {
                    let _ = serve_connection(socket, &content, cut_after, &recorded, &body_requests)
                        .await;
                });
            }
        });

        Ok(Self { addr, ranges })
    }

    pub fn url(&self, resource_path: &str) -> String {
        format!("http://{}{}", self.addr, resource_path)
    }

    /// `Range` headers of the GET requests received so far.
    pub fn body_ranges(&self) -> Vec<Option<String>> {
        self.ranges
            .lock()
            .map(|ranges| ranges.clone())
            .unwrap_or_default()
    }
}

async fn serve_connection(
    mut socket: TcpStream,
    content: &[u8],
    cut_after: usize,
    recorded: &Mutex<Vec<Option<String>>>,
    body_requests: &AtomicUsize,
) -> std::io::Result<()> {
    let mut request = Vec::new();
    let mut buffer = [0u8; 1024];
    while !request.windows(4).any(|window| window == b"\r\n\r\n") {
        let read = socket.read(&mut buffer).await?;
        if read == 0 {
            return Ok(());
        }
        request.extend_from_slice(&buffer[..read]);
    }

    let head = String::from_utf8_lossy(&request);
    let is_head = head.starts_with("HEAD ");
    let range = head.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.eq_ignore_ascii_case("range")
            .then(|| value.trim().to_string())
    });

    if is_head {
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            content.len()
        );
        socket.write_all(response.as_bytes()).await?;
        return socket.shutdown().await;
    }

    if let Ok(mut ranges) = recorded.lock() {
        ranges.push(range.clone());
    }
    let offset = range
        .as_deref()
        .and_then(|range| range.strip_prefix("bytes="))
        .and_then(|range| range.strip_suffix('-'))
        .and_then(|offset| offset.parse::<usize>().ok())
        .unwrap_or(0)
        .min(content.len());
    let body = &content[offset..];
    let status = if range.is_some() {
        "206 Partial Content"
    } else {
        "200 OK"
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        body.len()
    );
    socket.write_all(response.as_bytes()).await?;

    if body_requests.fetch_add(1, Ordering::SeqCst) == 0 {
        socket.write_all(&body[..cut_after.min(body.len())]).await?;
    } else {
        socket.write_all(body).await?;
    }
    socket.flush().await?;
    socket.shutdown().await
}
