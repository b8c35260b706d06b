use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

use serde::Deserialize;

pub const CFG_FILE_NAME: &str = "blog.toml";

#[derive(Deserialize, Debug, Clone)]
pub struct Paths {
    pub template_dir: PathBuf,
    pub static_dir: PathBuf,
    pub posts_dir: PathBuf,
    pub data_dir: PathBuf,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Defaults {
    pub page_size: u32,
    /// Render every markdown post when the server starts
    #[serde(default = "default_prerender")]
    pub prerender: bool,
}

fn default_prerender() -> bool {
    true
}

#[derive(Deserialize, Debug, Clone)]
pub struct Server {
    pub address: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Markdown files in the posts directory
    #[default]
    Files,
    /// Post records in the flat database
    FlatDb,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Storage {
    #[serde(default)]
    pub backend: Backend,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Log {
    pub level: LogLevel,
    pub log_to_console: bool,
    /// Base path of the daily log files
    #[serde(default = "default_log_location")]
    pub location: PathBuf,
}

fn default_log_location() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(env::temp_dir)
        .join("blog")
        .join("log")
        .join("server.log")
}

#[derive(Deserialize, Debug, Copy, Clone)]
pub enum LogLevel {
    Critical = 0,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub paths: Paths,
    pub defaults: Defaults,
    pub server: Server,
    #[serde(default)]
    pub storage: Storage,
    pub log: Option<Log>,
}

fn parse_path(path: PathBuf) -> PathBuf {
    if !path.starts_with("${exe_dir}") {
        return path;
    }

    let exe_dir = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    let str_path = path.to_string_lossy();
    PathBuf::from(str_path.replace("${exe_dir}", &exe_dir.to_string_lossy()))
}

pub fn parse_config(cfg_content: &str) -> io::Result<Config> {
    let mut cfg: Config = match toml::from_str::<Config>(cfg_content) {
        Ok(cfg) => cfg,
        Err(e) => return Err(io::Error::new(
            ErrorKind::InvalidData, format!("Error parsing configuration file: {}", e))),
    };

    if cfg.defaults.page_size == 0 {
        return Err(io::Error::new(ErrorKind::InvalidData, "defaults.page_size must be greater than 0"));
    }

    cfg.paths = Paths {
        template_dir: parse_path(cfg.paths.template_dir),
        static_dir: parse_path(cfg.paths.static_dir),
        posts_dir: parse_path(cfg.paths.posts_dir),
        data_dir: parse_path(cfg.paths.data_dir),
    };
    if let Some(log) = cfg.log.as_mut() {
        log.location = parse_path(log.location.clone());
    }

    Ok(cfg)
}

pub fn read_config(cfg_path: &Path) -> io::Result<Config> {
    let cfg_content = match fs::read_to_string(cfg_path) {
        Ok(content) => content,
        Err(e) => return Err(io::Error::new(e.kind(), format!("Error opening configuration file {}: {}", cfg_path.display(), e))),
    };

    parse_config(&cfg_content)
}

/// Looks for the configuration next to the executable, then in the current
/// directory, then in the user config directory
pub fn find_config_path() -> Option<PathBuf> {
    let exe_dir = env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf));
    let cur_dir = env::current_dir().ok();
    let cfg_dir = dirs::config_dir();

    [exe_dir, cur_dir, cfg_dir]
        .into_iter()
        .flatten()
        .map(|dir| dir.join(CFG_FILE_NAME))
        .find(|path| path.exists())
}

/// Reads the configuration from `cfg_path` or from the first location found by [find_config_path]
pub fn open_config(cfg_path: Option<PathBuf>) -> io::Result<Config> {
    let config_path = match cfg_path.or_else(find_config_path) {
        Some(path) => path,
        None => return Err(io::Error::new(ErrorKind::NotFound, format!("Could not find {}", CFG_FILE_NAME))),
    };

    println!("Reading config from {}", config_path.display());
    read_config(&config_path)
}
