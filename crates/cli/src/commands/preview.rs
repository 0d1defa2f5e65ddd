use anyhow::{Context, Result};
use axum::{
    Router,
    extract::State,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::get,
};
use mpa_kit_core::config::load_build_config;
use notify::{Event as NotifyEvent, EventKind, RecursiveMode, Watcher};
use std::{net::SocketAddr, path::PathBuf};
use tokio::sync::broadcast;
use tower_http::services::ServeDir;

#[derive(Clone)]
struct AppState {
    reload_tx: broadcast::Sender<()>,
}

/// Script a page can include to reload itself when the watcher fires.
const RELOAD_SCRIPT: &str = r#"// mpa-kit live reload
const eventSource = new EventSource('/_reload');
eventSource.onmessage = () => {
    console.log('Reloading...');
    location.reload();
};
eventSource.onerror = () => {
    console.log('Preview server disconnected');
    eventSource.close();
};
"#;

/// Serve the build output directory locally with live reload.
///
/// This command:
/// - Serves the output directory (default `dist/`) as static files
/// - Watches the source directory and fires a reload event on changes
/// - Exposes the reload stream at `/_reload` (SSE) and a ready-made
///   client snippet at `/_reload.js`
///
/// # Arguments
///
/// * `path` - Path to the project directory
/// * `port` - Port to serve on (default: 8080)
pub async fn run(path: PathBuf, port: u16) -> Result<()> {
    println!("🌐 Starting preview server...");
    println!("   Project: {}", path.display());

    if !path.exists() {
        anyhow::bail!(
            "Project directory does not exist: {}\nRun 'mpa-kit init {}' first",
            path.display(),
            path.display()
        );
    }

    let config = load_build_config(&path).context("Failed to load project config")?;
    let output_root = config.output_root(&path);
    if !output_root.is_dir() {
        anyhow::bail!(
            "Build output not found at {}\nWrite a plan with 'mpa-kit plan {}' and run your bundler first",
            output_root.display(),
            path.display()
        );
    }

    let source_root = path.join(&config.source_dir);

    // Create broadcast channel for reload events
    let (reload_tx, _) = broadcast::channel::<()>(100);

    let state = AppState {
        reload_tx: reload_tx.clone(),
    };

    // Build router: reload endpoints first, everything else from the
    // output directory.
    let app = Router::new()
        .route("/_reload", get(sse_handler))
        .route("/_reload.js", get(reload_script_handler))
        .fallback_service(ServeDir::new(output_root.clone()))
        .with_state(state);

    // Start file watcher over the source tree
    tokio::spawn(async move {
        if let Err(e) = watch_files(source_root, reload_tx).await {
            eprintln!("File watcher error: {}", e);
        }
    });

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    println!("   Serving: {}", output_root.display());
    println!("\n🚀 Preview ready at: http://localhost:{}", port);
    println!("   Press Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to port")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Watch for file changes and trigger reload
async fn watch_files(path: PathBuf, reload_tx: broadcast::Sender<()>) -> Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::channel(100);

    let mut watcher =
        notify::recommended_watcher(move |res: Result<NotifyEvent, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.blocking_send(event);
            }
        })?;

    watcher.watch(&path, RecursiveMode::Recursive)?;

    while let Some(event) = rx.recv().await {
        match event.kind {
            EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_) => {
                // Filter out temporary files and hidden files
                if event.paths.iter().any(|p| {
                    let filename = p.file_name().unwrap_or_default().to_string_lossy();
                    !filename.starts_with('.') && !filename.ends_with('~')
                }) {
                    println!("   📝 File changed, reloading...");
                    let _ = reload_tx.send(());
                }
            }
            _ => {}
        }
    }

    Ok(())
}

/// SSE endpoint for live reload
async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl futures::Stream<Item = Result<Event, std::convert::Infallible>>> {
    let mut rx = state.reload_tx.subscribe();

    let stream = async_stream::stream! {
        loop {
            if rx.recv().await.is_ok() {
                yield Ok(Event::default().data("reload"));
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn reload_script_handler() -> Response {
    (
        [("content-type", "application/javascript")],
        RELOAD_SCRIPT,
    )
        .into_response()
}
