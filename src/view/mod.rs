use std::path::Path;

use chrono::NaiveDateTime;
use ramhorns::{Ramhorns, Template};
use thiserror::Error;

pub mod list_renderer;
pub mod post_renderer;

pub const POSTS_TEMPLATE: &str = "posts.html";
pub const POST_TEMPLATE: &str = "post.html";
pub const ABOUT_TEMPLATE: &str = "about.html";

const DISPLAY_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("error loading templates from {dir}: {source}")]
    Load {
        dir: String,
        #[source]
        source: ramhorns::Error,
    },
    #[error("template {0} is missing")]
    Missing(&'static str),
}

/// Every `.html` file of the template directory, partials included
pub struct Templates {
    tpls: Ramhorns,
}

impl Templates {
    pub fn load(template_dir: &Path) -> Result<Templates, TemplateError> {
        let tpls = Ramhorns::from_folder(template_dir).map_err(|source| TemplateError::Load {
            dir: template_dir.display().to_string(),
            source,
        })?;

        let templates = Templates { tpls };
        for name in [POSTS_TEMPLATE, POST_TEMPLATE, ABOUT_TEMPLATE] {
            templates.get(name)?;
        }
        Ok(templates)
    }

    pub fn get(&self, name: &'static str) -> Result<&Template<'static>, TemplateError> {
        self.tpls.get(name).ok_or(TemplateError::Missing(name))
    }
}

pub fn format_date(date: &NaiveDateTime) -> String {
    date.format(DISPLAY_DATE_FORMAT).to_string()
}

#[derive(ramhorns::Content)]
struct AboutPage {
    post_count: usize,
}

pub fn render_about(template: &Template, post_count: usize) -> String {
    template.render(&AboutPage { post_count })
}


#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_load_templates() {
        let dir = TempDir::new().unwrap();
        test_templates::write_templates(dir.path());

        let templates = Templates::load(dir.path()).unwrap();
        assert!(templates.get(POST_TEMPLATE).is_ok());
        let about = render_about(templates.get(ABOUT_TEMPLATE).unwrap(), 3);
        assert_eq!(about, "<nav>blog</nav><p>3 posts</p>");
    }

    #[test]
    fn test_missing_template() {
        let dir = TempDir::new().unwrap();
        test_templates::write_templates(dir.path());
        fs::remove_file(dir.path().join("about.html")).unwrap();

        assert!(matches!(Templates::load(dir.path()), Err(TemplateError::Missing(ABOUT_TEMPLATE))));
    }
}
