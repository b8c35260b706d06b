use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, Timelike};
use thiserror::Error;

/// Layout of the date prefix in post file names, e.g. `2023-05-01-10:00`
pub const POST_DATE_LAYOUT: &str = "%Y-%m-%d-%H:%M";

#[derive(Debug, Error, PartialEq)]
pub enum PostInfoError {
    #[error("post file {0} has no extension")]
    MissingExtension(String),
    #[error("post file {0} has no date separator")]
    MissingSeparator(String),
    #[error("post file {file} has an invalid date: {reason}")]
    BadDate { file: String, reason: String },
    #[error("invalid post name: {0:?}")]
    InvalidName(String),
}

/// Identity of a post as encoded in its file name: `<dir>/<date>_<name>.<ext>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostInfo {
    pub date: NaiveDateTime,
    pub name: String,
    pub dir: PathBuf,
}

impl PostInfo {
    pub fn new(date: NaiveDateTime, name: &str, dir: impl Into<PathBuf>) -> Result<PostInfo, PostInfoError> {
        if name.is_empty() || name.contains('/') || name.contains('\\') {
            return Err(PostInfoError::InvalidName(name.to_string()));
        }

        // The layout has minute precision, anything below would not survive a round trip
        let date = date
            .with_second(0)
            .and_then(|d| d.with_nanosecond(0))
            .unwrap_or(date);

        Ok(PostInfo {
            date,
            name: name.to_string(),
            dir: dir.into(),
        })
    }

    pub fn file_name(&self, ext: &str) -> String {
        format!("{}_{}.{}", self.date.format(POST_DATE_LAYOUT), self.name, ext)
    }

    pub fn to_file_path(&self, ext: &str) -> PathBuf {
        self.dir.join(self.file_name(ext))
    }

    /// The extension is split on the last `.` and the date on the first `_`.
    /// The date layout contains neither, so names are free to use both.
    pub fn parse(path: &Path) -> Result<PostInfo, PostInfoError> {
        let file_name = path
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_default();

        let stem = match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => stem,
            _ => return Err(PostInfoError::MissingExtension(file_name)),
        };

        let (date, name) = match stem.split_once('_') {
            Some((date, name)) if !name.is_empty() => (date, name),
            _ => return Err(PostInfoError::MissingSeparator(file_name)),
        };

        let date = NaiveDateTime::parse_from_str(date, POST_DATE_LAYOUT).map_err(|e| PostInfoError::BadDate {
            file: file_name.clone(),
            reason: e.to_string(),
        })?;

        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        PostInfo::new(date, name, dir)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn date(y: i32, m: u32, d: u32, h: u32, mn: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, mn, 0).unwrap()
    }

    #[test]
    fn test_to_file_path() {
        let info = PostInfo::new(date(2023, 5, 1, 10, 0), "hello-world", "posts").unwrap();
        assert_eq!(info.to_file_path("md"), PathBuf::from("posts/2023-05-01-10:00_hello-world.md"));
        assert_eq!(info.file_name("html"), "2023-05-01-10:00_hello-world.html");
    }

    #[test]
    fn test_parse() {
        let info = PostInfo::parse(Path::new("./posts/2023-05-01-10:00_hello-world.md")).unwrap();
        assert_eq!(info.date, date(2023, 5, 1, 10, 0));
        assert_eq!(info.name, "hello-world");
        assert_eq!(info.dir, PathBuf::from("./posts"));
    }

    #[test]
    fn test_round_trip() {
        let names = ["hello-world", "with_underscore", "v1.2-release", "a_b.c_d", "x"];
        for name in names {
            let info = PostInfo::new(date(2021, 12, 31, 23, 59), name, "some/dir").unwrap();
            for ext in ["md", "html"] {
                let parsed = PostInfo::parse(&info.to_file_path(ext)).unwrap();
                assert_eq!(parsed, info, "name={} ext={}", name, ext);
            }
        }
    }

    #[test]
    fn test_new_truncates_seconds() {
        let with_seconds = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap().and_hms_milli_opt(6, 20, 53, 120).unwrap();
        let info = PostInfo::new(with_seconds, "leap", "").unwrap();
        assert_eq!(info.date, date(2024, 2, 29, 6, 20));
        assert_eq!(PostInfo::parse(&info.to_file_path("md")).unwrap(), info);
    }

    #[test]
    fn test_invalid_name() {
        assert_eq!(PostInfo::new(date(2024, 1, 1, 0, 0), "", "posts"), Err(PostInfoError::InvalidName("".to_string())));
        assert!(PostInfo::new(date(2024, 1, 1, 0, 0), "a/b", "posts").is_err());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            PostInfo::parse(Path::new("posts/2023-05-01-10:00_hello")),
            Err(PostInfoError::MissingExtension("2023-05-01-10:00_hello".to_string()))
        );
        assert_eq!(
            PostInfo::parse(Path::new("posts/2023-05-01-10:00.md")),
            Err(PostInfoError::MissingSeparator("2023-05-01-10:00.md".to_string()))
        );
        assert_eq!(
            PostInfo::parse(Path::new("posts/2023-05-01-10:00_.md")),
            Err(PostInfoError::MissingSeparator("2023-05-01-10:00_.md".to_string()))
        );
        assert!(matches!(
            PostInfo::parse(Path::new("posts/20230501_hello.md")),
            Err(PostInfoError::BadDate { .. })
        ));
        assert!(matches!(
            PostInfo::parse(Path::new("posts/2023-13-01-10:00_hello.md")),
            Err(PostInfoError::BadDate { .. })
        ));
    }
}
