use super::wire::{self, LoadMeshBody, LoadZarrBody, SavePoseBody, ShowEpisodeBody};
use super::{EpisodeSource, LoadError, MeshAssets, Reply, Request};
use crossbeam_channel::{Receiver, Sender};
use episode::mesh::material_candidates;
use episode::{parse_mtl, parse_obj, FrameSequence, MaterialLibrary};
use serde::Serialize;
use std::collections::HashMap;
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;

/// Handle to the loader thread. Dropping it closes the request channel and
/// lets the thread wind down once in-flight requests finish.
pub struct Loader {
    tx: mpsc::UnboundedSender<Request>,
    rx: Receiver<Reply>,
    _thread: thread::JoinHandle<()>,
}

impl Loader {
    pub fn spawn(base_url: &str) -> anyhow::Result<Self> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_io()
            .enable_time()
            .build()?;
        let backend = Backend::new(base_url)?;

        let (req_tx, req_rx) = mpsc::unbounded_channel();
        let (reply_tx, reply_rx) = crossbeam_channel::unbounded();

        let handle = thread::Builder::new()
            .name("loader".into())
            .spawn(move || {
                rt.block_on(run_loader(backend, req_rx, reply_tx));
                log::info!("Loader thread stopped");
            })?;

        Ok(Self {
            tx: req_tx,
            rx: reply_rx,
            _thread: handle,
        })
    }

    pub fn send(&self, request: Request) -> Result<(), LoadError> {
        self.tx.send(request).map_err(|_| LoadError::Disconnected)
    }

    /// Next finished request, if any. Never blocks.
    pub fn try_recv(&self) -> Option<Reply> {
        self.rx.try_recv().ok()
    }
}

async fn run_loader(
    backend: Backend,
    mut requests: mpsc::UnboundedReceiver<Request>,
    replies: Sender<Reply>,
) {
    while let Some(request) = requests.recv().await {
        log::debug!("Request: {:?}", request);
        let backend = backend.clone();
        let replies = replies.clone();
        tokio::spawn(async move {
            let reply = backend.handle(request).await;
            if replies.send(reply).is_err() {
                log::debug!("Dropped reply (viewer gone)");
            }
        });
    }
}

fn content_type(resp: &reqwest::Response) -> Option<String> {
    resp.headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

#[derive(Clone)]
struct Backend {
    http: reqwest::Client,
    base: String,
}

impl Backend {
    fn new(base_url: &str) -> anyhow::Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder().build()?,
            base: base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base, endpoint)
    }

    async fn handle(&self, request: Request) -> Reply {
        match request {
            Request::LoadEpisodes { path, traj_id } => {
                let result = self.load_episodes(&path, traj_id).await;
                Reply::Episodes { path, result }
            }
            Request::ShowEpisode { episode_id } => Reply::Episode {
                episode_id,
                result: self.show_episode(episode_id).await,
            },
            Request::LoadMesh { path } => {
                let result = self.load_mesh(&path).await;
                Reply::Mesh { path, result }
            }
            Request::SavePose { pose, frame, scale } => {
                Reply::PoseSaved(self.save_pose(pose, frame, scale).await)
            }
        }
    }

    async fn post_json<B: Serialize>(&self, endpoint: &str, body: &B) -> Result<Vec<u8>, LoadError> {
        let resp = self.http.post(self.url(endpoint)).json(body).send().await?;
        let status = resp.status().as_u16();
        let content_type = content_type(&resp);
        let body = resp.bytes().await?.to_vec();
        wire::check_status(status, content_type.as_deref(), body)
    }

    async fn load_episodes(&self, path: &str, traj_id: usize) -> Result<EpisodeSource, LoadError> {
        let body = self
            .post_json(wire::LOAD_ZARR, &LoadZarrBody { path, traj_id })
            .await?;
        let source = wire::decode_load_zarr(&body)?;
        match &source {
            EpisodeSource::Frames(seq) => log::info!(
                "Loaded '{}': {} frames x {} points",
                path,
                seq.len(),
                seq.points_per_frame()
            ),
            EpisodeSource::Episodes { count } => {
                log::info!("'{}' holds {} episodes", path, count)
            }
        }
        Ok(source)
    }

    async fn show_episode(&self, episode_id: usize) -> Result<FrameSequence, LoadError> {
        let body = self
            .post_json(wire::SHOW_EPISODE, &ShowEpisodeBody { episode_id })
            .await?;
        wire::decode_show_episode(&body)
    }

    async fn fetch_file(&self, file_path: &str) -> Result<Vec<u8>, LoadError> {
        let resp = self
            .http
            .post(self.url(wire::LOAD_MESH))
            .json(&LoadMeshBody { file_path })
            .send()
            .await?;
        let status = resp.status().as_u16();
        let content_type = content_type(&resp);
        let body = resp.bytes().await?.to_vec();
        wire::decode_file(status, content_type.as_deref(), body)
    }

    async fn load_mesh(&self, path: &str) -> Result<MeshAssets, LoadError> {
        let obj = self.fetch_file(path).await?;
        let model = parse_obj(obj.as_slice())?;
        log::info!(
            "Loaded '{}': {} objects, {} triangles",
            path,
            model.objects.len(),
            model.triangle_count()
        );

        let mut materials = MaterialLibrary::default();
        for candidate in material_candidates(path, &model) {
            match self.fetch_file(&candidate).await {
                Ok(bytes) => match parse_mtl(bytes.as_slice()) {
                    Ok(mut lib) => {
                        lib.resolve_maps(&candidate);
                        log::info!("Materials from '{}': {}", candidate, lib.len());
                        materials.merge(lib);
                    }
                    Err(e) => log::warn!("Skipping materials '{}': {}", candidate, e),
                },
                Err(e) => log::warn!("No materials at '{}': {}", candidate, e),
            }
        }

        let mut textures = HashMap::new();
        for map in materials.texture_paths() {
            if textures.contains_key(map) {
                continue;
            }
            match self.fetch_texture(map).await {
                Ok(img) => {
                    log::debug!("Texture '{}': {}x{}", map, img.width(), img.height());
                    textures.insert(map.to_owned(), img);
                }
                Err(e) => log::warn!("Skipping texture '{}': {}", map, e),
            }
        }

        Ok(MeshAssets {
            model,
            materials,
            textures,
        })
    }

    async fn fetch_texture(&self, file_path: &str) -> Result<image::RgbaImage, LoadError> {
        let bytes = self.fetch_file(file_path).await?;
        Ok(image::load_from_memory(&bytes)?.to_rgba8())
    }

    async fn save_pose(&self, pose: [f32; 7], frame: i64, scale: Option<f32>) -> Result<(), LoadError> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        let body = self
            .post_json(
                wire::SAVE_POSE,
                &SavePoseBody {
                    pose,
                    frame,
                    scale,
                    timestamp,
                },
            )
            .await?;
        wire::decode_save_pose(&body)?;
        log::info!("Saved pose {:?} (frame {})", pose, frame);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::time::Duration;

    /// Answers a single HTTP request with the given status and body.
    fn serve_once(status: &'static str, content_type: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            // Drain headers and the JSON body before answering.
            loop {
                let n = stream.read(&mut buf).unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(end) = text.find("\r\n\r\n") {
                    let len = text[..end]
                        .lines()
                        .find_map(|l| {
                            let (k, v) = l.split_once(':')?;
                            k.eq_ignore_ascii_case("content-length")
                                .then(|| v.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= end + 4 + len {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
        });
        format!("http://{addr}")
    }

    fn reply(loader: &Loader) -> Reply {
        loader.rx.recv_timeout(Duration::from_secs(10)).unwrap()
    }

    #[test]
    fn error_page_reports_http_status() {
        let url = serve_once("500 Internal Server Error", "text/html", "<html>boom</html>");
        let loader = Loader::spawn(&url).unwrap();
        loader
            .send(Request::LoadEpisodes {
                path: "/data/run.zarr".into(),
                traj_id: 0,
            })
            .unwrap();

        match reply(&loader) {
            Reply::Episodes { result, .. } => {
                let err = result.unwrap_err();
                assert!(matches!(err, LoadError::HttpStatus(500)), "{err:?}");
                assert_eq!(err.to_string(), "HTTP error: 500");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejected_save_uses_server_message() {
        let url = serve_once(
            "400 Bad Request",
            "application/json",
            r#"{"success":false,"error":"no active episode"}"#,
        );
        let loader = Loader::spawn(&url).unwrap();
        loader
            .send(Request::SavePose {
                pose: [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0],
                frame: 4,
                scale: None,
            })
            .unwrap();

        match reply(&loader) {
            Reply::PoseSaved(Err(LoadError::Server(msg))) => assert_eq!(msg, "no active episode"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn url_joins_without_double_slash() {
        let backend = Backend::new("http://127.0.0.1:8000/").unwrap();
        assert_eq!(backend.url(wire::LOAD_ZARR), "http://127.0.0.1:8000/load_zarr");
    }

    #[test]
    fn unreachable_backend_reports_transport_error() {
        // Nothing listens on port 9.
        let loader = Loader::spawn("http://127.0.0.1:9").unwrap();
        loader.send(Request::ShowEpisode { episode_id: 3 }).unwrap();

        match reply(&loader) {
            Reply::Episode { episode_id, result } => {
                assert_eq!(episode_id, 3);
                assert!(matches!(result, Err(LoadError::Transport(_))));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
