// web-server/src/api/auth.rs
use actix_web::cookie::{time, Cookie};
use actix_web::http::header;
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use vaev_common::AUTH_TOKEN_TTL_DAYS;

use crate::error::ApiError;
use crate::forms::read_form;
use crate::identity::{IdentityError, IdentityProvider};
use crate::middleware::{csrf_token, current_user, secure_cookie};
use crate::sse::{MergeMode, SseResponse};
use crate::state::AppState;
use crate::views;

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const RESET_LOGIN_FORM: &str = r#"document.getElementById("login-form").reset();"#;

/// Decoded `next` query parameter, empty when absent
fn next_param(req: &HttpRequest) -> String {
    url::form_urlencoded::parse(req.query_string().as_bytes())
        .find(|(key, _)| key == "next")
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default()
}

/// Keep only same-origin paths; anything else bounces to `/`
pub fn sanitize_next(next: &str) -> &str {
    let same_origin = next.starts_with('/') && !next.starts_with("//") && !next.starts_with("/\\");
    if same_origin {
        next
    } else {
        "/"
    }
}

/// Empty cookie sent with `Max-Age=0` and an `Expires` in the past
fn removal_cookie(name: &str) -> Cookie<'static> {
    let mut cookie = secure_cookie(name, String::new(), time::Duration::ZERO);
    cookie.make_removal();
    cookie
}

#[get("/login")]
pub async fn login_page(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let next = next_param(&req);

    if current_user(&req).is_some() {
        return HttpResponse::SeeOther()
            .insert_header((header::LOCATION, sanitize_next(&next)))
            .finish();
    }

    let mut response = HttpResponse::Ok();
    if req.cookie(&state.config.auth_cookie_name).is_some() {
        tracing::info!("Clearing stale auth cookie");
        response.cookie(removal_cookie(&state.config.auth_cookie_name));
    }

    response
        .content_type("text/html; charset=utf-8")
        .body(views::login_page(&next, &csrf_token(&req)))
}

#[post("/auth/validate")]
pub async fn validate(
    req: HttpRequest,
    payload: web::Payload,
    state: web::Data<AppState>,
) -> Result<SseResponse, ApiError> {
    let form = read_form(&req, payload).await?;
    let email = form.get("username").unwrap_or_default().trim();
    let password = form.get("password").unwrap_or_default();

    let user = match state.identity.verify(email, password).await {
        Ok(user) => user,
        Err(IdentityError::InvalidCredentials) => {
            tracing::warn!("Failed sign-in attempt for {}", email);
            return Ok(SseResponse::new()
                .merge_fragments(
                    &views::error_toast(INVALID_CREDENTIALS),
                    Some("#toaster"),
                    MergeMode::Append,
                )
                .execute_script(RESET_LOGIN_FORM));
        }
        Err(e) => return Err(ApiError::Internal(e.into())),
    };

    let token = state
        .identity
        .mint_token(&user)
        .map_err(|e| ApiError::Internal(e.into()))?;
    tracing::info!("User {} signed in", user.id);

    let next = next_param(&req);
    Ok(SseResponse::new()
        .cookie(secure_cookie(
            &state.config.auth_cookie_name,
            token,
            time::Duration::days(AUTH_TOKEN_TTL_DAYS),
        ))
        .redirect(sanitize_next(&next)))
}

#[post("/auth/logout")]
pub async fn logout(state: web::Data<AppState>) -> SseResponse {
    SseResponse::new()
        .cookie(removal_cookie(&state.config.auth_cookie_name))
        .redirect("/login")
}

#[get("/auth/user")]
pub async fn user_card(req: HttpRequest) -> SseResponse {
    let card = match current_user(&req) {
        Some(user) => views::user_card(&user, &csrf_token(&req)),
        None => views::guest_card(),
    };
    SseResponse::new().merge_fragments(&card, Some("#user-card"), MergeMode::Morph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_sanitize_next() {
        assert_eq!(sanitize_next("/project/abc"), "/project/abc");
        assert_eq!(sanitize_next(""), "/");
        assert_eq!(sanitize_next("https://evil.example"), "/");
        assert_eq!(sanitize_next("//evil.example"), "/");
        assert_eq!(sanitize_next("/\\evil.example"), "/");
    }

    #[test]
    fn test_next_param_is_decoded() {
        let req = TestRequest::get()
            .uri("/login?next=%2Fproject%2Fabc")
            .to_http_request();
        assert_eq!(next_param(&req), "/project/abc");

        let req = TestRequest::get().uri("/login").to_http_request();
        assert_eq!(next_param(&req), "");
    }

    #[test]
    fn test_removal_cookie_expires() {
        let cookie = removal_cookie("vaev-auth");
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
        assert_eq!(cookie.path(), Some("/"));
    }
}
