use serde::Deserialize;

#[derive(Deserialize, PartialEq, Debug, Default)]
pub struct ListQuery {
    page: Option<String>,
}

impl ListQuery {
    pub fn from(buf: &str) -> Self {
        serde_urlencoded::from_str(buf).unwrap_or_default()
    }

    /// Anything that is not a positive number means the first page
    pub fn get_page(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|p| p.parse::<u32>().ok())
            .filter(|p| *p > 0)
            .unwrap_or(1)
    }
}
