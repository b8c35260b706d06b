use ramhorns::Template;

use crate::comments::Comment;
use crate::store::PostPage;
use crate::view::format_date;

#[derive(ramhorns::Content)]
struct ViewComment<'a> {
    author: &'a str,
    date: String,
    comment: &'a str,
}

#[derive(ramhorns::Content)]
struct ViewItem<'a> {
    title: &'a str,
    date: String,
    content: &'a str,
    comments: Vec<ViewComment<'a>>,
    comment_count: usize,
}

pub struct PostRenderer<'a> {
    template: &'a Template<'static>,
}

impl<'a> PostRenderer<'a> {
    pub fn new(template: &'a Template<'static>) -> PostRenderer<'a> {
        PostRenderer { template }
    }

    /// `content` is inserted as is, author and comment are escaped by the template
    pub fn render(&self, post: &PostPage, comments: &[Comment]) -> String {
        let comments: Vec<ViewComment> = comments
            .iter()
            .map(|c| ViewComment {
                author: &c.author,
                date: format_date(&c.date),
                comment: &c.comment,
            })
            .collect();

        self.template.render(&ViewItem {
            title: &post.title,
            date: format_date(&post.date),
            content: &post.html,
            comment_count: comments.len(),
            comments,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::comments::PostKey;

    use super::*;

    #[test]
    fn render_view() {
        let template_src = r##"
TITLE=[{{title}}]
DATE=[{{date}}]
COMMENTS={{comment_count}}[{{#comments}}({{author}} {{date}} {{comment}}){{/comments}}]
POST_CONTENT=[{{{content}}}]"##;
        let template = Template::new(template_src).unwrap();
        let renderer = PostRenderer::new(&template);
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(3, 4, 5).unwrap();

        let post = PostPage {
            key: PostKey::Id(1),
            title: "<post-title>".to_string(),
            date,
            html: "<p>post-content</p>".to_string(),
        };
        let comments = vec![Comment {
            post: PostKey::Id(1),
            author: "<ann>".to_string(),
            date,
            comment: "nice & short".to_string(),
        }];

        let res = renderer.render(&post, &comments);
        assert_eq!(res, r##"
TITLE=[&lt;post-title&gt;]
DATE=[2024-01-02 03:04]
COMMENTS=1[(&lt;ann&gt; 2024-01-02 03:04 nice &amp; short)]
POST_CONTENT=[<p>post-content</p>]"##);
    }
}
