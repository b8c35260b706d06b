use std::path::{Path, PathBuf};
use std::{fs, io};

use spdlog::{debug, info, warn};
use thiserror::Error;

use crate::post_info::{PostInfo, PostInfoError};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    PostInfo(#[from] PostInfoError),
    #[error("markdown source {0} does not exist")]
    MissingSource(PathBuf),
}

impl RenderError {
    fn io(path: &Path, source: io::Error) -> RenderError {
        RenderError::Io { path: path.to_path_buf(), source }
    }
}

/// Default CommonMark rendering. Raw HTML in the source is escaped.
pub fn render_markdown_to_html(md: &[u8]) -> Vec<u8> {
    let md = String::from_utf8_lossy(md);
    markdown::to_html(&md).into_bytes()
}

/// Renders `<dir>/<date>_<name>.md` into `<dir>/<date>_<name>.html`, overwriting it
pub fn render_markdown_post_to_html(md_path: &Path) -> Result<PostInfo, RenderError> {
    let info = PostInfo::parse(md_path)?;
    let md = fs::read(md_path).map_err(|e| RenderError::io(md_path, e))?;

    let html_path = info.to_file_path("html");
    fs::write(&html_path, render_markdown_to_html(&md)).map_err(|e| RenderError::io(&html_path, e))?;
    debug!("Rendered {} into {}", md_path.display(), html_path.display());

    Ok(info)
}

/// Renders every markdown post of the directory. Files not following the
/// naming convention are skipped.
pub fn render_all(posts_dir: &Path) -> Result<Vec<PostInfo>, RenderError> {
    let entries = fs::read_dir(posts_dir).map_err(|e| RenderError::io(posts_dir, e))?;

    let mut rendered = vec![];
    for entry in entries {
        let entry = entry.map_err(|e| RenderError::io(posts_dir, e))?;
        let path = entry.path();
        if !path.is_file() || !path.extension().is_some_and(|ext| ext == "md") {
            continue;
        }

        match render_markdown_post_to_html(&path) {
            Ok(info) => rendered.push(info),
            Err(RenderError::PostInfo(e)) => warn!("Skipping {}: {}", path.display(), e),
            Err(e) => return Err(e),
        }
    }

    info!("Rendered {} posts in {}", rendered.len(), posts_dir.display());
    Ok(rendered)
}

fn is_stale(md_path: &Path, html_path: &Path) -> bool {
    let modified = |p: &Path| fs::metadata(p).and_then(|m| m.modified());
    match (modified(md_path), modified(html_path)) {
        (Ok(md), Ok(html)) => md > html,
        (Ok(_), Err(_)) => true,
        _ => false,
    }
}

/// Makes sure the HTML for the post exists and is not older than its markdown
/// source, rendering it once if needed. Returns the HTML path.
pub fn ensure_rendered(info: &PostInfo) -> Result<PathBuf, RenderError> {
    let md_path = info.to_file_path("md");
    let html_path = info.to_file_path("html");

    if !md_path.exists() {
        if html_path.exists() {
            return Ok(html_path);
        }
        return Err(RenderError::MissingSource(md_path));
    }

    if is_stale(&md_path, &html_path) {
        info!("Rendering {} on demand", md_path.display());
        render_markdown_post_to_html(&md_path)?;
    }

    Ok(html_path)
}
