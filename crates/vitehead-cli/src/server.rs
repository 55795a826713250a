//! HTTP surface for `vitehead serve`.
//!
//! [`asset_router`] answers every request under `/{basePath}` that names an
//! existing file in `distPath` from disk and hands everything else (missing
//! files, directories, other paths) to the page router. [`page_router`]
//! renders a minimal HTML shell with the entry point's current heads.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    Router,
};
use tower::ServiceExt;
use tower_http::services::ServeDir;
use vitehead::{Vite, ViteConfig};

struct Assets {
    prefix: String,
    dist_path: PathBuf,
    files: ServeDir,
    page: Router,
}

/// Serve built assets under `/{basePath}`, falling back to `page`.
pub fn asset_router(config: &ViteConfig, page: Router) -> Router {
    let assets = Assets {
        prefix: format!("/{}", config.base_path.trim_start_matches('/')),
        dist_path: config.dist_path.clone(),
        files: ServeDir::new(&config.dist_path).append_index_html_on_directories(false),
        page,
    };
    Router::new()
        .fallback(serve_asset)
        .with_state(Arc::new(assets))
}

#[derive(Clone)]
struct Page {
    vite: Arc<Vite>,
    entry: Arc<str>,
}

/// Render the HTML shell for `entry` on every request.
pub fn page_router(vite: Arc<Vite>, entry: impl Into<Arc<str>>) -> Router {
    Router::new().fallback(render_page).with_state(Page {
        vite,
        entry: entry.into(),
    })
}

/// Assets plus page shell, as mounted by `vitehead serve`.
pub fn app(vite: Arc<Vite>, entry: impl Into<Arc<str>>) -> Router {
    let page = page_router(Arc::clone(&vite), entry);
    asset_router(vite.config(), page)
}

async fn serve_asset(State(assets): State<Arc<Assets>>, req: Request) -> Response {
    let asset = asset_path(&assets.prefix, req.uri().path())
        .map(|(encoded, file)| (encoded.to_owned(), file));

    if let Some((encoded, file)) = asset {
        if is_file(&assets.dist_path.join(&file)).await {
            // ServeDir decodes the path itself, so it gets the encoded form.
            let target = match req.uri().query() {
                Some(query) => format!("/{encoded}?{query}"),
                None => format!("/{encoded}"),
            };
            let Ok(uri) = target.parse::<Uri>() else {
                return StatusCode::BAD_REQUEST.into_response();
            };
            let (mut parts, body) = req.into_parts();
            parts.uri = uri;
            tracing::debug!(asset = %file.display(), "serving asset");
            return assets
                .files
                .clone()
                .oneshot(Request::from_parts(parts, body))
                .await
                .into_response();
        }
    }

    assets.page.clone().oneshot(req).await.into_response()
}

async fn render_page(State(page): State<Page>) -> Response {
    match page.vite.get_heads_string(&page.entry) {
        Ok(heads) => Html(page_shell(&heads)).into_response(),
        Err(e) => {
            tracing::error!(entry = %page.entry, "cannot render page: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// A bare document with `heads` in `<head>` and a mount point in `<body>`.
pub fn page_shell(heads: &str) -> String {
    format!(
        "<!doctype html>\n\
         <html>\n\
         <head>\n\
         <meta charset='utf-8'>\n\
         {heads}\n\
         </head>\n\
         <body>\n\
         <div id='app'></div>\n\
         </body>\n\
         </html>\n"
    )
}

/// Path below `prefix`, still percent-encoded, and the file it names.
///
/// Only plain relative file paths qualify.
fn asset_path<'a>(prefix: &str, path: &'a str) -> Option<(&'a str, PathBuf)> {
    let encoded = path.strip_prefix(prefix)?.trim_start_matches('/');
    let decoded = urlencoding::decode(encoded).ok()?;
    if decoded.is_empty() {
        return None;
    }
    let file = PathBuf::from(decoded.as_ref());
    let normal = file
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    normal.then_some((encoded, file))
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}
