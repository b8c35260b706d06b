use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use spdlog::info;

use crate::comments::PostKey;
use crate::flat_db::{Collection, DbError, FlatDb, Record};
use crate::store::{sort_newest_first, PostPage, PostStore, PostSummary, StoreError};

pub const POSTS_COLLECTION_NAME: &str = "posts";

/// Stored post, `content` holds the rendered HTML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub name: String,
    pub date: NaiveDateTime,
    pub content: String,
}

/// Posts kept in the flat database, addressed by their numeric id
pub struct DbPostStore {
    posts: Collection<PostRecord>,
}

impl DbPostStore {
    pub fn open(db: &FlatDb) -> Result<DbPostStore, DbError> {
        let posts = db.collection(POSTS_COLLECTION_NAME)?;
        Ok(DbPostStore { posts })
    }

    pub fn add_post(&self, post: PostRecord) -> Result<Record<PostRecord>, DbError> {
        let saved = self.posts.insert(post)?;
        info!("Saved post {} ({})", saved.id, saved.data.name);
        Ok(saved)
    }

    fn parse_id(id: &str) -> Result<u64, StoreError> {
        id.parse::<u64>().map_err(|_| StoreError::BadPostId(id.to_string()))
    }

    fn fetch(&self, id: &str) -> Result<Record<PostRecord>, StoreError> {
        let post_id = Self::parse_id(id)?;
        match self.posts.get(post_id) {
            Ok(record) => Ok(record),
            Err(DbError::NotFound(_)) => Err(StoreError::NotFound(id.to_string())),
            Err(e) => Err(e.into()),
        }
    }
}

impl PostStore for DbPostStore {
    fn list_posts(&self) -> Result<Vec<PostSummary>, StoreError> {
        let mut posts: Vec<PostSummary> = self
            .posts
            .all()?
            .into_iter()
            .map(|r| PostSummary {
                id: r.id.to_string(),
                name: r.data.name,
                date: r.data.date,
            })
            .collect();

        sort_newest_first(&mut posts);
        Ok(posts)
    }

    fn get_post(&self, id: &str) -> Result<PostPage, StoreError> {
        let Record { id, data } = self.fetch(id)?;
        Ok(PostPage {
            key: PostKey::Id(id),
            title: data.name,
            date: data.date,
            html: data.content,
        })
    }

    fn post_key(&self, id: &str) -> Result<PostKey, StoreError> {
        let record = self.fetch(id)?;
        Ok(PostKey::Id(record.id))
    }
}
