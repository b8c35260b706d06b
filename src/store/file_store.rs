use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::{fs, io};

use lazy_static::lazy_static;
use regex::Regex;
use spdlog::warn;

use crate::comments::PostKey;
use crate::post_info::PostInfo;
use crate::post_render::{ensure_rendered, RenderError};
use crate::store::{sort_newest_first, PostPage, PostStore, PostSummary, StoreError};

/// Posts kept as `<date>_<name>.md` files, rendered next to the source as `.html`.
/// A post is addressed by the file name of its HTML rendition, so a post whose
/// markdown was removed is still served from the HTML left behind.
pub struct FilePostStore {
    posts_dir: PathBuf,
}

impl FilePostStore {
    pub fn new(posts_dir: &Path) -> FilePostStore {
        FilePostStore {
            posts_dir: posts_dir.to_path_buf(),
        }
    }

    fn parse_id(&self, id: &str) -> Result<PostInfo, StoreError> {
        lazy_static! {
            static ref POST_ID_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_:.\-]+\.html$").unwrap();
        }

        if !POST_ID_REGEX.is_match(id) || id.contains("..") {
            return Err(StoreError::BadPostId(id.to_string()));
        }

        PostInfo::parse(&self.posts_dir.join(id)).map_err(|e| StoreError::BadPostId(e.to_string()))
    }

    fn post_files(&self) -> io::Result<Vec<PathBuf>> {
        let mut files = vec![];
        for entry in fs::read_dir(&self.posts_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "md" || ext == "html") {
                files.push(path);
            }
        }
        Ok(files)
    }
}

impl PostStore for FilePostStore {
    fn list_posts(&self) -> Result<Vec<PostSummary>, StoreError> {
        let mut posts = vec![];
        let mut seen = HashSet::new();
        for path in self.post_files()? {
            let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                warn!("Ignoring {}: file name is not valid UTF-8", path.display());
                continue;
            };
            let Some((stem, _)) = file_name.rsplit_once('.') else {
                continue;
            };

            // Only list what get_post will accept
            let id = format!("{}.html", stem);
            let info = match self.parse_id(&id) {
                Ok(info) => info,
                Err(e) => {
                    warn!("Ignoring {}: {}", path.display(), e);
                    continue;
                }
            };

            if seen.insert(id.clone()) {
                posts.push(PostSummary {
                    id,
                    name: info.name,
                    date: info.date,
                });
            }
        }

        sort_newest_first(&mut posts);
        Ok(posts)
    }

    fn get_post(&self, id: &str) -> Result<PostPage, StoreError> {
        let info = self.parse_id(id)?;

        let html_path = match ensure_rendered(&info) {
            Ok(path) => path,
            Err(RenderError::MissingSource(_)) => return Err(StoreError::NotFound(id.to_string())),
            Err(e) => return Err(e.into()),
        };
        let html = fs::read_to_string(html_path)?;

        Ok(PostPage {
            key: PostKey::Name(id.to_string()),
            title: info.name,
            date: info.date,
            html,
        })
    }

    fn post_key(&self, id: &str) -> Result<PostKey, StoreError> {
        let info = self.parse_id(id)?;
        if !info.to_file_path("md").exists() && !info.to_file_path("html").exists() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(PostKey::Name(id.to_string()))
    }
}
