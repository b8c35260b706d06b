use std::fmt::{Display, Formatter};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use spdlog::info;

use crate::flat_db::{Collection, DbError, FlatDb, Record};

pub const COMMENTS_COLLECTION_NAME: &str = "comments";

pub const MAX_AUTHOR_LEN: usize = 100;
pub const MAX_COMMENT_LEN: usize = 2000;

/// Error codes sent back in the JSON error envelope
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "u16")]
pub enum ErrorCode {
    BadPostId = 1,
    BadCommentAuthorLen = 2,
    BadCommentLen = 3,
    BadRequestBody = 4,
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code as u16
    }
}

#[derive(Debug, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ErrorResponse { code, message: message.into() }
    }
}

/// A post is either addressed by its database id or by its file name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostKey {
    Id(u64),
    Name(String),
}

impl Display for PostKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PostKey::Id(id) => write!(f, "{}", id),
            PostKey::Name(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub post: PostKey,
    pub author: String,
    pub date: NaiveDateTime,
    pub comment: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse<'a> {
    pub author: &'a str,
    pub comment: &'a str,
}

impl CommentRequest {
    /// Lengths are counted in characters, bounds are inclusive
    pub fn validate(&self) -> Result<(), ErrorResponse> {
        let author_len = self.author.chars().count();
        if author_len < 1 {
            return Err(ErrorResponse::new(ErrorCode::BadCommentAuthorLen, "author should be at least 1 character long"));
        }
        if author_len > MAX_AUTHOR_LEN {
            return Err(ErrorResponse::new(
                ErrorCode::BadCommentAuthorLen,
                format!("author should be at most {} characters long", MAX_AUTHOR_LEN),
            ));
        }

        let comment_len = self.comment.chars().count();
        if comment_len < 1 {
            return Err(ErrorResponse::new(ErrorCode::BadCommentLen, "comment should be at least 1 character long"));
        }
        if comment_len > MAX_COMMENT_LEN {
            return Err(ErrorResponse::new(
                ErrorCode::BadCommentLen,
                format!("comment should be at most {} characters long", MAX_COMMENT_LEN),
            ));
        }

        Ok(())
    }
}

pub struct CommentService {
    comments: Collection<Comment>,
}

impl CommentService {
    pub fn open(db: &FlatDb) -> Result<CommentService, DbError> {
        let comments = db.collection(COMMENTS_COLLECTION_NAME)?;
        Ok(CommentService { comments })
    }

    pub fn save_comment(&self, comment: Comment) -> Result<Record<Comment>, DbError> {
        let saved = self.comments.insert(comment)?;
        info!("Saved comment {} for post {}", saved.id, saved.data.post);
        Ok(saved)
    }

    /// Oldest first
    pub fn comments_for(&self, post: &PostKey) -> Result<Vec<Comment>, DbError> {
        let mut comments: Vec<Comment> = self
            .comments
            .find(|c| &c.post == post)?
            .into_iter()
            .map(|r| r.data)
            .collect();
        comments.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(comments)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use tempfile::TempDir;

    use super::*;

    fn request(author_len: usize, comment_len: usize) -> CommentRequest {
        CommentRequest {
            author: "a".repeat(author_len),
            comment: "c".repeat(comment_len),
        }
    }

    fn code_of(req: &CommentRequest) -> Option<ErrorCode> {
        req.validate().err().map(|e| e.code)
    }

    #[test]
    fn test_author_bounds() {
        assert_eq!(code_of(&request(0, 10)), Some(ErrorCode::BadCommentAuthorLen));
        assert_eq!(code_of(&request(1, 10)), None);
        assert_eq!(code_of(&request(100, 10)), None);
        assert_eq!(code_of(&request(101, 10)), Some(ErrorCode::BadCommentAuthorLen));
    }

    #[test]
    fn test_comment_bounds() {
        assert_eq!(code_of(&request(5, 0)), Some(ErrorCode::BadCommentLen));
        assert_eq!(code_of(&request(5, 1)), None);
        assert_eq!(code_of(&request(5, 2000)), None);
        assert_eq!(code_of(&request(5, 2001)), Some(ErrorCode::BadCommentLen));
    }

    #[test]
    fn test_lengths_count_characters() {
        let req = CommentRequest {
            author: "é".repeat(100),
            comment: "ü".repeat(2000),
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_error_envelope() {
        let resp = ErrorResponse::new(ErrorCode::BadCommentAuthorLen, "too short");
        assert_eq!(serde_json::to_string(&resp).unwrap(), r#"{"code":2,"message":"too short"}"#);
    }

    #[test]
    fn test_post_key_serialization() {
        assert_eq!(serde_json::to_string(&PostKey::Id(7)).unwrap(), "7");
        assert_eq!(serde_json::to_string(&PostKey::Name("a.html".to_string())).unwrap(), "\"a.html\"");
        assert_eq!(serde_json::from_str::<PostKey>("7").unwrap(), PostKey::Id(7));
        assert_eq!(serde_json::from_str::<PostKey>("\"7\"").unwrap(), PostKey::Name("7".to_string()));
    }

    #[test]
    fn test_comments_for_post() {
        let dir = TempDir::new().unwrap();
        let db = FlatDb::open(dir.path()).unwrap();
        let service = CommentService::open(&db).unwrap();

        let at = |h| NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(h, 0, 0).unwrap();
        let comment = |post: PostKey, author: &str, h| Comment {
            post,
            author: author.to_string(),
            date: at(h),
            comment: format!("from {}", author),
        };

        service.save_comment(comment(PostKey::Id(1), "late", 12)).unwrap();
        service.save_comment(comment(PostKey::Id(2), "other", 9)).unwrap();
        service.save_comment(comment(PostKey::Id(1), "early", 8)).unwrap();

        let authors: Vec<_> = service
            .comments_for(&PostKey::Id(1))
            .unwrap()
            .into_iter()
            .map(|c| c.author)
            .collect();
        assert_eq!(authors, ["early", "late"]);
        assert!(service.comments_for(&PostKey::Name("1".to_string())).unwrap().is_empty());
    }
}
