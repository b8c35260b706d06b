use ramhorns::Template;

use crate::paginator::Paginator;
use crate::store::PostSummary;
use crate::view::format_date;

#[derive(ramhorns::Content)]
struct ListPage {
    posts: Vec<PostItem>,
    pages: Vec<ViewPagination>,
    show_pagination: bool,
}

#[derive(ramhorns::Content)]
struct PostItem {
    name: String,
    link: String,
    date: String,
}

#[derive(ramhorns::Content)]
struct ViewPagination {
    current: bool,
    number: u32,
}

pub struct ListRenderer<'a> {
    template: &'a Template<'static>,
    page_size: u32,
}

impl<'a> ListRenderer<'a> {
    pub fn new(template: &'a Template<'static>, page_size: u32) -> ListRenderer<'a> {
        ListRenderer { template, page_size }
    }

    /// `posts` must already be sorted. Out of range pages show the first page.
    pub fn render(&self, posts: &[PostSummary], cur_page: u32) -> String {
        let paginator = Paginator::from(posts, self.page_size);
        let cur_page = paginator.clamp(cur_page);
        let page = paginator.get_page(cur_page).unwrap_or_default();

        let posts = page
            .iter()
            .map(|post| PostItem {
                name: post.name.clone(),
                link: format!("/posts/{}", post.id),
                date: format_date(&post.date),
            })
            .collect();

        let pages = (1..=paginator.page_count())
            .map(|number| ViewPagination {
                current: number == cur_page,
                number,
            })
            .collect();

        self.template.render(&ListPage {
            posts,
            pages,
            show_pagination: paginator.page_count() > 1,
        })
    }
}
