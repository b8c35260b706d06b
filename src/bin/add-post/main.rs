use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDateTime};
use clap::Parser;
use spdlog::{info, warn};

use blog::config::{open_config, Backend};
use blog::flat_db::FlatDb;
use blog::logger::configure_logger;
use blog::post_info::PostInfo;
use blog::post_render::{render_markdown_post_to_html, render_markdown_to_html};
use blog::store::db_store::{DbPostStore, PostRecord};
use blog::util::slug::slug_from_title;

/// Adds a markdown post to the blog. Missing values are asked on stdin.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Config path
    #[arg(short, long)]
    config_path: Option<String>,

    /// Title of the post
    #[arg(short, long)]
    title: Option<String>,

    /// Markdown file with the post content
    #[arg(short, long)]
    file: Option<PathBuf>,
}

fn prompt(input: &mut impl BufRead, question: &str) -> Result<String> {
    println!("{}", question);
    io::stdout().flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let answer = line.trim();
    if answer.is_empty() {
        bail!("no input");
    }
    Ok(answer.to_string())
}

/// Copies the markdown into the posts directory under its dated name and renders it
fn add_file_post(posts_dir: &Path, title: &str, content: &[u8], date: NaiveDateTime) -> Result<PostInfo> {
    let name = slug_from_title(title);
    if name.is_empty() {
        bail!("title {:?} does not contain any usable character", title);
    }

    let info = PostInfo::new(date, &name, posts_dir)?;
    let md_path = info.to_file_path("md");
    if md_path.exists() {
        bail!("post {} already exists", md_path.display());
    }

    fs::write(&md_path, content).with_context(|| format!("error writing {}", md_path.display()))?;
    render_markdown_post_to_html(&md_path)?;
    Ok(info)
}

fn add_db_post(data_dir: &Path, title: &str, content: &[u8], date: NaiveDateTime) -> Result<u64> {
    let db = FlatDb::open(data_dir)?;
    let store = DbPostStore::open(&db)?;

    let html = render_markdown_to_html(content);
    let record = store.add_post(PostRecord {
        name: title.to_string(),
        date,
        content: String::from_utf8_lossy(&html).to_string(),
    })?;
    Ok(record.id)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = open_config(args.config_path.map(PathBuf::from))?;

    if let Err(err) = configure_logger(&config) {
        warn!("Error creating logger sinks. Using console instead. Desc={}", err);
    }

    let mut stdin = io::stdin().lock();
    let title = match args.title {
        Some(title) => title,
        None => prompt(&mut stdin, "enter post name")?,
    };
    let file = match args.file {
        Some(file) => file,
        None => PathBuf::from(prompt(&mut stdin, "enter post filepath")?),
    };

    let content = fs::read(&file).with_context(|| format!("error reading post file {}", file.display()))?;
    let date = Local::now().naive_local();

    match config.storage.backend {
        Backend::Files => {
            let info = add_file_post(&config.paths.posts_dir, &title, &content, date)?;
            info!("Created post {}", info.to_file_path("md").display());
            println!("successfully created post {}", info.file_name("html"));
        }
        Backend::FlatDb => {
            let id = add_db_post(&config.paths.data_dir, &title, &content, date)?;
            info!("Inserted post {} ({})", id, title);
            println!("successfully inserted post {}", id);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use chrono::NaiveDate;
    use tempfile::TempDir;

    use blog::store::PostStore;

    use super::*;

    fn date() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 27).unwrap().and_hms_opt(6, 20, 53).unwrap()
    }

    #[test]
    fn test_prompt() {
        let mut input = Cursor::new("  My title \nsecond\n");
        assert_eq!(prompt(&mut input, "title?").unwrap(), "My title");
        assert_eq!(prompt(&mut input, "file?").unwrap(), "second");
        assert!(prompt(&mut input, "more?").is_err());
    }

    #[test]
    fn test_add_file_post() {
        let dir = TempDir::new().unwrap();
        let info = add_file_post(dir.path(), "Hello World", b"# Hi", date()).unwrap();

        assert_eq!(info.name, "hello-world");
        assert!(dir.path().join("2024-02-27-06:20_hello-world.md").exists());
        let html = fs::read_to_string(dir.path().join("2024-02-27-06:20_hello-world.html")).unwrap();
        assert!(html.contains("<h1>Hi</h1>"));

        assert!(add_file_post(dir.path(), "Hello, world!", b"again", date()).is_err());
        assert!(add_file_post(dir.path(), "???", b"nothing", date()).is_err());
    }

    #[test]
    fn test_add_db_post() {
        let dir = TempDir::new().unwrap();
        assert_eq!(add_db_post(dir.path(), "First one", b"*first*", date()).unwrap(), 1);
        assert_eq!(add_db_post(dir.path(), "Second one", b"second", date()).unwrap(), 2);

        let db = FlatDb::open(dir.path()).unwrap();
        let store = DbPostStore::open(&db).unwrap();
        let post = store.get_post("1").unwrap();
        assert_eq!(post.title, "First one");
        assert!(post.html.contains("<em>first</em>"));
    }
}
