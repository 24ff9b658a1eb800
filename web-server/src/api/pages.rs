// web-server/src/api/pages.rs
use actix_web::http::header;
use actix_web::{get, web, HttpRequest, HttpResponse};

use crate::db;
use crate::error::ApiError;
use crate::middleware::{csrf_token, current_user, require_project_owner, CurrentUser};
use crate::state::AppState;
use crate::views;

fn html(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

#[get("/")]
pub async fn index(req: HttpRequest) -> HttpResponse {
    if current_user(&req).is_some() {
        return HttpResponse::SeeOther()
            .insert_header((header::LOCATION, "/dashboard/projects"))
            .finish();
    }
    html(views::intro_page(&csrf_token(&req)))
}

#[get("/projects")]
pub async fn dashboard(
    req: HttpRequest,
    user: CurrentUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let projects = db::list_projects(&state.pool, &user.0.id).await?;
    Ok(html(views::dashboard_page(&user.0, &projects, &csrf_token(&req))))
}

#[get("/{id}")]
pub async fn editor(
    req: HttpRequest,
    path: web::Path<String>,
    user: CurrentUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let project = require_project_owner(&state.pool, &path, &user.0).await?;
    Ok(html(views::editor_page(&project, &csrf_token(&req))))
}
