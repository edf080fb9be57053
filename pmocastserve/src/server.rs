//! Serveur HTTP éphémère à fichier unique.
//!
//! Publie un seul fichier sous `/<nom-encodé>`; toute autre requête
//! reçoit un 404. Le listener est lié avant que `start` ne rende la
//! main, donc l'URL annoncée est servable dès qu'elle existe. Port 0 =
//! port éphémère choisi par l'OS.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use axum::body::Body;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use thiserror::Error;
use tokio::sync::oneshot;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

/// Caractères encodés dans le segment de chemin de l'URL publiée.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("Media source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Cannot read media source {}: {}", .0.display(), .1)]
    SourceUnreadable(PathBuf, std::io::Error),

    #[error("Failed to start file server: {0}")]
    Runtime(std::io::Error),

    #[error("Failed to bind HTTP listener on {0}: {1}")]
    Bind(String, std::io::Error),
}

/// Le fichier publié, partagé avec le handler axum.
struct ServedFile {
    path: PathBuf,
    /// Nom de fichier en clair (les chemins axum arrivent décodés)
    name: String,
    content_type: &'static str,
    length: u64,
}

/// Serveur HTTP jetable pour un fichier.
///
/// Le serveur tourne sur un thread dédié portant son propre runtime
/// tokio current-thread. `stop()` coupe proprement et peut être appelé
/// plusieurs fois; le drop coupe aussi.
#[derive(Debug)]
pub struct FileServer {
    url: String,
    local_addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    join_handle: Option<thread::JoinHandle<()>>,
}

impl FileServer {
    /// Publie `path` et démarre le serveur.
    ///
    /// `host_ip` ne sert qu'à construire l'URL annoncée: le listener
    /// écoute sur toutes les interfaces. `port` 0 laisse l'OS choisir.
    pub fn start(path: &Path, host_ip: &str, port: u16) -> Result<Self, ServeError> {
        let metadata = match std::fs::metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ServeError::SourceNotFound(path.to_path_buf()));
            }
            Err(e) => return Err(ServeError::SourceUnreadable(path.to_path_buf(), e)),
        };
        if !metadata.is_file() {
            return Err(ServeError::SourceNotFound(path.to_path_buf()));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ServeError::SourceNotFound(path.to_path_buf()))?;

        let served = Arc::new(ServedFile {
            path: path.to_path_buf(),
            name,
            content_type: content_type_for(path),
            length: metadata.len(),
        });

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ServeError::Runtime)?;

        // Bind avant de rendre la main: l'URL retournée est déjà servable
        let bind_addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = runtime
            .block_on(tokio::net::TcpListener::bind(bind_addr))
            .map_err(|e| ServeError::Bind(bind_addr.to_string(), e))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServeError::Bind(bind_addr.to_string(), e))?;

        let url = format!(
            "http://{}:{}/{}",
            host_ip,
            local_addr.port(),
            utf8_percent_encode(&served.name, PATH_SEGMENT)
        );

        let app = Router::new()
            .route("/{name}", get(serve_track))
            .with_state(served.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let join_handle = thread::Builder::new()
            .name("pmocast-fileserver".to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    let shutdown = async move {
                        let _ = shutdown_rx.await;
                    };
                    if let Err(e) = axum::serve(listener, app.into_make_service())
                        .with_graceful_shutdown(shutdown)
                        .await
                    {
                        warn!("File server error: {}", e);
                    }
                });
            })
            .map_err(ServeError::Runtime)?;

        info!(
            "📤 Serving {} at {} ({} bytes)",
            served.path.display(),
            url,
            served.length
        );

        Ok(Self {
            url,
            local_addr,
            shutdown: Some(shutdown_tx),
            join_handle: Some(join_handle),
        })
    }

    /// URL que le renderer doit venir chercher.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Port réellement lié (utile avec port 0).
    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Coupe le serveur et attend la fin de son thread.
    ///
    /// Appeler plusieurs fois est sans effet après la première.
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            debug!("Shutting down file server on {}", self.local_addr);
            let _ = tx.send(());
        }
        if let Some(handle) = self.join_handle.take() {
            if handle.join().is_err() {
                warn!("File server thread panicked");
            }
        }
    }
}

impl Drop for FileServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Handler GET /{name}: streame le fichier publié, 404 pour le reste.
async fn serve_track(
    State(file): State<Arc<ServedFile>>,
    axum::extract::Path(requested): axum::extract::Path<String>,
) -> Response {
    if requested != file.name {
        debug!("Rejecting request for unknown path: {}", requested);
        return (StatusCode::NOT_FOUND, "File not found").into_response();
    }

    let opened = match tokio::fs::File::open(&file.path).await {
        Ok(f) => f,
        Err(e) => {
            warn!("Error opening file {:?}: {}", file.path, e);
            return (StatusCode::NOT_FOUND, "File not found").into_response();
        }
    };

    debug!("📥 Streaming {} ({} bytes)", file.name, file.length);

    // Un client qui raccroche en cours de stream coupe juste ce stream;
    // le serveur reste disponible pour la requête suivante
    let stream = ReaderStream::new(opened);
    let body = Body::from_stream(stream);

    (
        StatusCode::OK,
        [
            ("content-type", file.content_type.to_string()),
            ("content-length", file.length.to_string()),
        ],
        body,
    )
        .into_response()
}

/// Content-Type d'après l'extension, octet-stream par défaut.
fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mp3" => "audio/mpeg",
        "flac" => "audio/flac",
        "wav" => "audio/wav",
        "ogg" | "oga" => "audio/ogg",
        "opus" => "audio/opus",
        "m4a" | "mp4" => "audio/mp4",
        "aac" => "audio/aac",
        "wma" => "audio/x-ms-wma",
        "aiff" | "aif" => "audio/aiff",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    fn temp_media(name: &str, contents: &[u8]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pmocastserve-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn test_agent() -> ureq::Agent {
        ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .into()
    }

    #[test]
    fn serves_the_published_file() {
        let path = temp_media("track one.mp3", b"not really mpeg audio");
        let mut server = FileServer::start(&path, "127.0.0.1", 0).unwrap();

        // le nom avec espace est encodé dans l'URL publiée
        assert!(server.url().ends_with("/track%20one.mp3"));

        let agent = test_agent();
        let mut response = agent.get(server.url()).call().unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(
            response
                .headers()
                .get("content-type")
                .unwrap()
                .to_str()
                .unwrap(),
            "audio/mpeg"
        );
        assert_eq!(
            response
                .headers()
                .get("content-length")
                .unwrap()
                .to_str()
                .unwrap(),
            b"not really mpeg audio".len().to_string()
        );
        let body = response.body_mut().read_to_vec().unwrap();
        assert_eq!(body, b"not really mpeg audio");

        server.stop();
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn unknown_paths_get_404() {
        let path = temp_media("only.flac", b"flac bytes");
        let mut server = FileServer::start(&path, "127.0.0.1", 0).unwrap();
        let base = format!("http://127.0.0.1:{}", server.port());

        let agent = test_agent();
        for probe in ["/other.flac", "/", "/only.flac/extra"] {
            let response = agent.get(format!("{}{}", base, probe)).call().unwrap();
            assert_eq!(response.status(), 404, "probe {}", probe);
        }

        // le fichier publié reste servi après les 404
        let response = agent.get(server.url()).call().unwrap();
        assert_eq!(response.status(), 200);

        server.stop();
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_source_is_reported() {
        let path = std::env::temp_dir().join("pmocastserve-definitely-absent.mp3");
        match FileServer::start(&path, "127.0.0.1", 0) {
            Err(ServeError::SourceNotFound(p)) => assert_eq!(p, path),
            other => panic!("expected SourceNotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn directory_is_not_a_servable_source() {
        let dir = std::env::temp_dir();
        assert!(matches!(
            FileServer::start(&dir, "127.0.0.1", 0),
            Err(ServeError::SourceNotFound(_))
        ));
    }

    #[test]
    fn stop_is_idempotent_and_releases_the_port() {
        let path = temp_media("quiet.wav", b"wav");
        let mut server = FileServer::start(&path, "127.0.0.1", 0).unwrap();
        let port = server.port();

        server.stop();
        server.stop();

        // le port est réutilisable une fois le serveur coupé
        std::net::TcpListener::bind(("0.0.0.0", port)).unwrap();

        drop(server);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn client_disconnect_mid_stream_leaves_server_usable() {
        let contents = vec![0xA5u8; 1024 * 1024];
        let path = temp_media("big.bin", &contents);
        let mut server = FileServer::start(&path, "127.0.0.1", 0).unwrap();

        // client impoli: lit un peu puis raccroche
        {
            let mut raw =
                std::net::TcpStream::connect(("127.0.0.1", server.port())).unwrap();
            write!(raw, "GET /big.bin HTTP/1.1\r\nHost: localhost\r\n\r\n").unwrap();
            let mut first = [0u8; 1024];
            raw.read_exact(&mut first).unwrap();
        }

        let agent = test_agent();
        let mut response = agent.get(server.url()).call().unwrap();
        assert_eq!(response.status(), 200);
        let body = response.body_mut().read_to_vec().unwrap();
        assert_eq!(body.len(), contents.len());

        server.stop();
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn content_types_follow_extension() {
        assert_eq!(content_type_for(Path::new("a.MP3")), "audio/mpeg");
        assert_eq!(content_type_for(Path::new("a.flac")), "audio/flac");
        assert_eq!(content_type_for(Path::new("a.ogg")), "audio/ogg");
        assert_eq!(
            content_type_for(Path::new("mystery")),
            "application/octet-stream"
        );
    }
}
