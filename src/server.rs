use std::sync::Arc;

use chrono::Local;
use ntex::util::Bytes;
use ntex::web;
use ntex::web::HttpRequest;
use ntex_files::NamedFile;
use spdlog::{error, info, warn};
use thiserror::Error;

use crate::comments::{Comment, CommentRequest, CommentResponse, CommentService, ErrorCode, ErrorResponse};
use crate::config::{Backend, Config};
use crate::flat_db::{DbError, FlatDb};
use crate::post_render::{render_all, RenderError};
use crate::query_string::ListQuery;
use crate::store::db_store::DbPostStore;
use crate::store::file_store::FilePostStore;
use crate::store::{PostStore, StoreError};
use crate::view::list_renderer::ListRenderer;
use crate::view::post_renderer::PostRenderer;
use crate::view::{render_about, TemplateError, Templates, ABOUT_TEMPLATE, POSTS_TEMPLATE, POST_TEMPLATE};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Everything the handlers need, built once at startup
pub struct AppState {
    pub config: Config,
    pub templates: Templates,
    pub posts: Box<dyn PostStore>,
    pub comments: CommentService,
}

impl AppState {
    pub fn new(config: Config) -> Result<AppState, AppError> {
        let templates = Templates::load(&config.paths.template_dir)?;
        let db = FlatDb::open(&config.paths.data_dir)?;
        let comments = CommentService::open(&db)?;

        let posts: Box<dyn PostStore> = match config.storage.backend {
            Backend::Files => {
                if config.defaults.prerender {
                    render_all(&config.paths.posts_dir)?;
                }
                Box::new(FilePostStore::new(&config.paths.posts_dir))
            }
            Backend::FlatDb => Box::new(DbPostStore::open(&db)?),
        };

        Ok(AppState {
            config,
            templates,
            posts,
            comments,
        })
    }
}

type State = web::types::State<Arc<AppState>>;

fn html_response(body: String) -> web::HttpResponse {
    web::HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

fn json_body<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

fn bad_request(error: ErrorResponse) -> web::HttpResponse {
    web::HttpResponse::BadRequest()
        .content_type("application/json")
        .body(json_body(&error))
}

fn store_error_response(id: &str, err: StoreError) -> web::HttpResponse {
    match err {
        StoreError::BadPostId(reason) => {
            warn!("Bad post id {}: {}", id, reason);
            bad_request(ErrorResponse::new(ErrorCode::BadPostId, "invalid post id"))
        }
        StoreError::NotFound(_) => web::HttpResponse::NotFound().finish(),
        err => {
            error!("Error loading post {}: {}", id, err);
            web::HttpResponse::InternalServerError().finish()
        }
    }
}

#[web::get("/")]
async fn index(req: HttpRequest, state: State) -> web::HttpResponse {
    let posts = match state.posts.list_posts() {
        Ok(posts) => posts,
        Err(e) => {
            error!("Error listing posts: {}", e);
            return web::HttpResponse::InternalServerError().finish();
        }
    };

    let template = match state.templates.get(POSTS_TEMPLATE) {
        Ok(template) => template,
        Err(e) => {
            error!("{}", e);
            return web::HttpResponse::InternalServerError().finish();
        }
    };

    let cur_page = ListQuery::from(req.uri().query().unwrap_or_default()).get_page();
    let renderer = ListRenderer::new(template, state.config.defaults.page_size);
    html_response(renderer.render(&posts, cur_page))
}

#[web::get("/posts/{post_id}")]
async fn show_post(path: web::types::Path<String>, state: State) -> web::HttpResponse {
    let post_id = path.into_inner();
    info!("Got post request for {}", post_id);

    let post = match state.posts.get_post(&post_id) {
        Ok(post) => post,
        Err(e) => return store_error_response(&post_id, e),
    };

    // A post is still worth showing without its comments
    let comments = state.comments.comments_for(&post.key).unwrap_or_else(|e| {
        error!("Error getting comments for post {}: {}", post_id, e);
        vec![]
    });

    match state.templates.get(POST_TEMPLATE) {
        Ok(template) => html_response(PostRenderer::new(template).render(&post, &comments)),
        Err(e) => {
            error!("{}", e);
            web::HttpResponse::InternalServerError().finish()
        }
    }
}

#[web::post("/posts/{post_id}/comments")]
async fn add_comment(path: web::types::Path<String>, state: State, body: Bytes) -> web::HttpResponse {
    let post_id = path.into_inner();
    info!("Handling comment request for post {}", post_id);

    let request: CommentRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Malformed comment request for post {}: {}", post_id, e);
            return bad_request(ErrorResponse::new(ErrorCode::BadRequestBody, "body should be a JSON object with author and comment"));
        }
    };

    if let Err(error) = request.validate() {
        return bad_request(error);
    }

    let post = match state.posts.post_key(&post_id) {
        Ok(key) => key,
        Err(e) => return store_error_response(&post_id, e),
    };

    let saved = state.comments.save_comment(Comment {
        post,
        author: request.author,
        date: Local::now().naive_local(),
        comment: request.comment,
    });

    match saved {
        Ok(record) => web::HttpResponse::Ok()
            .content_type("application/json")
            .body(json_body(&CommentResponse {
                author: &record.data.author,
                comment: &record.data.comment,
            })),
        Err(e) => {
            error!("Error saving comment for post {}: {}", post_id, e);
            web::HttpResponse::InternalServerError().finish()
        }
    }
}

#[web::get("/static/{file_name}")]
async fn static_files(path: web::types::Path<String>, state: State) -> Result<NamedFile, web::Error> {
    if path.contains("..") {
        return Err(web::error::ErrorUnauthorized("Access forbidden").into());
    }

    let file_path = state.config.paths.static_dir.join(path.into_inner());
    Ok(NamedFile::open(file_path)?)
}

#[web::get("/about")]
async fn about(state: State) -> web::HttpResponse {
    let post_count = match state.posts.list_posts() {
        Ok(posts) => posts.len(),
        Err(e) => {
            warn!("Error counting posts: {}", e);
            0
        }
    };

    match state.templates.get(ABOUT_TEMPLATE) {
        Ok(template) => html_response(render_about(template, post_count)),
        Err(e) => {
            error!("{}", e);
            web::HttpResponse::InternalServerError().finish()
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(index)
        .service(show_post)
        .service(add_comment)
        .service(static_files)
        .service(about);
}

pub async fn server_run(state: AppState) -> std::io::Result<()> {
    let bind_addr = state.config.server.address.clone();
    let bind_port = state.config.server.port;
    let app_state = Arc::new(state);

    info!("Listening on {}:{}", bind_addr, bind_port);
    web::HttpServer::new(move || {
        web::App::new()
            .state(app_state.clone())
            .configure(configure)
    })
        .bind((bind_addr, bind_port))?
        .run()
        .await
}
