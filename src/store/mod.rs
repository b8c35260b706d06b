use chrono::NaiveDateTime;
use thiserror::Error;

use crate::comments::PostKey;
use crate::flat_db::DbError;
use crate::post_render::RenderError;

pub mod db_store;
pub mod file_store;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid post id: {0}")]
    BadPostId(String),
    #[error("post {0} not found")]
    NotFound(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Db(#[from] DbError),
}

/// One entry of the post list
#[derive(Debug, Clone, PartialEq)]
pub struct PostSummary {
    pub id: String,
    pub name: String,
    pub date: NaiveDateTime,
}

/// A post ready to be displayed, `html` is already rendered
#[derive(Debug, Clone, PartialEq)]
pub struct PostPage {
    pub key: PostKey,
    pub title: String,
    pub date: NaiveDateTime,
    pub html: String,
}

pub trait PostStore: Send + Sync {
    /// Newest first
    fn list_posts(&self) -> Result<Vec<PostSummary>, StoreError>;

    fn get_post(&self, id: &str) -> Result<PostPage, StoreError>;

    /// Resolves the key comments are stored under, failing if the post does not exist
    fn post_key(&self, id: &str) -> Result<PostKey, StoreError>;
}

pub(crate) fn sort_newest_first(posts: &mut [PostSummary]) {
    posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.name.cmp(&b.name)));
}
