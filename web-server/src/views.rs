// web-server/src/views.rs
//! HTML pages and fragments consumed by the browser front-end.
use chrono::Utc;
use vaev_common::models::{EdgeType, NodeType, Project, User};

/// Escape text for HTML element content and double-quoted attributes
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Full document shell with the CSRF token exposed to scripts
pub fn document(title: &str, csrf_token: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<meta name="CSRF-Token" content="{csrf}">
<title>{title}</title>
<link rel="stylesheet" href="/dist/style.css">
<script type="module" src="/dist/index.js"></script>
</head>
<body>
<div id="toaster"></div>
{body}
</body>
</html>"#,
        csrf = escape(csrf_token),
        title = escape(title),
        body = body,
    )
}

fn csrf_field(csrf_token: &str) -> String {
    format!(
        r#"<input type="hidden" name="CSRF-Token" value="{}">"#,
        escape(csrf_token)
    )
}

pub fn intro_page(csrf_token: &str) -> String {
    document(
        "Vaev",
        csrf_token,
        r#"<main class="intro">
<h1>Vaev</h1>
<p>Sketch typed property graphs together.</p>
<a href="/login">Sign in</a>
</main>"#,
    )
}

pub fn login_page(next: &str, csrf_token: &str) -> String {
    let action = if next.is_empty() {
        "/auth/validate".to_string()
    } else {
        format!(
            "/auth/validate?next={}",
            url::form_urlencoded::byte_serialize(next.as_bytes()).collect::<String>()
        )
    };
    let body = format!(
        r#"<main class="login">
<form id="login-form" data-on-submit="@post('{action}', {{contentType: 'form'}})">
{csrf}
<label>Email <input type="email" name="username" autocomplete="username" required></label>
<label>Password <input type="password" name="password" autocomplete="current-password" required></label>
<button type="submit">Sign in</button>
</form>
</main>"#,
        action = escape(&action),
        csrf = csrf_field(csrf_token),
    );
    document("Sign in", csrf_token, &body)
}

pub fn project_list_item(project: &Project) -> String {
    format!(
        r#"<li id="project-{id}"><a href="/project/{id}">{name}</a> <time>{created}</time></li>"#,
        id = escape(&project.id),
        name = escape(&project.name),
        created = escape(&project.created),
    )
}

pub fn dashboard_page(user: &User, projects: &[Project], csrf_token: &str) -> String {
    let items: String = projects.iter().map(project_list_item).collect::<Vec<_>>().join("\n");
    let body = format!(
        r#"<header><div id="user-card">{card}</div></header>
<main class="dashboard">
<form id="project-form" data-on-submit="@post('/sse/project/create', {{contentType: 'form'}})">
{csrf}
<input type="text" name="project-name" placeholder="Project name" required>
<button type="submit">Create project</button>
</form>
<ul id="projects-list">
{items}
</ul>
</main>"#,
        card = user_card(user, csrf_token),
        csrf = csrf_field(csrf_token),
        items = items,
    );
    document("Projects", csrf_token, &body)
}

pub fn editor_page(project: &Project, csrf_token: &str) -> String {
    let body = format!(
        r#"<header><div id="user-card" data-on-load="@get('/auth/user')"></div><h1>{name}</h1></header>
<main id="graph-editor" data-project-id="{id}" data-on-load="@get('/sse/project/{id}')">
<div id="node-select" data-on-load="@get('/sse/project/{id}/node-select')"></div>
<div id="edge-select" data-on-load="@get('/sse/project/{id}/edge-select')"></div>
<canvas id="graph-canvas"></canvas>
</main>"#,
        name = escape(&project.name),
        id = escape(&project.id),
    );
    document(&project.name, csrf_token, &body)
}

pub fn node_type_select(node_types: &[NodeType]) -> String {
    let options: String = node_types
        .iter()
        .map(|t| {
            format!(
                r#"<option value="{}" data-fill="{}" data-stroke="{}" data-shape="{}">{}</option>"#,
                escape(&t.id),
                escape(&t.fill_color),
                escape(&t.stroke_color),
                t.shape,
                escape(&t.name),
            )
        })
        .collect();
    format!(
        r#"<select id="node-select" name="node-type" data-bind-currentnodetype>{}</select>"#,
        options
    )
}

pub fn edge_type_select(edge_types: &[EdgeType]) -> String {
    let options: String = edge_types
        .iter()
        .map(|t| {
            let dash = String::from_utf8_lossy(&t.line_dash);
            format!(
                r#"<option value="{}" data-stroke="{}" data-dash="{}">{}</option>"#,
                escape(&t.id),
                escape(&t.stroke_color),
                escape(&dash),
                escape(&t.name),
            )
        })
        .collect();
    format!(
        r#"<select id="edge-select" name="edge-type" data-bind-currentedgetype>{}</select>"#,
        options
    )
}

/// Signed-in card; the sign-out action carries the CSRF token as a header
pub fn user_card(user: &User, csrf_token: &str) -> String {
    let display = if user.name.is_empty() { &user.email } else { &user.name };
    format!(
        r#"<div id="user-card" class="user-card"><span>{}</span><button data-on-click="@post('/auth/logout', {{headers: {{'X-CSRF-Token': '{}'}}}})">Sign out</button></div>"#,
        escape(display),
        escape(csrf_token)
    )
}

pub fn guest_card() -> String {
    r#"<div id="user-card" class="user-card guest"><a href="/login">Sign in</a></div>"#.to_string()
}

/// Toast appended to `#toaster`; the id keeps repeated toasts distinct
pub fn error_toast(message: &str) -> String {
    format!(
        r#"<div id="toast-{}" class="toast error" role="alert">{}</div>"#,
        Utc::now().timestamp_millis(),
        escape(message)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaev_common::models::Permissions;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_project_item_escapes_name() {
        let project = Project {
            id: "p1".into(),
            owner: "u1".into(),
            name: "<script>".into(),
            created: "2024-01-01 00:00:00.000Z".into(),
            updated: String::new(),
            permissions: Permissions::ALL,
        };
        let html = project_list_item(&project);
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains(r#"href="/project/p1""#));
    }

    #[test]
    fn test_login_page_carries_next_and_csrf() {
        let html = login_page("/project/abc", "tok");
        assert!(html.contains("next=%2Fproject%2Fabc"));
        assert!(html.contains(r#"name="CSRF-Token" value="tok""#));
        assert!(html.contains(r#"<meta name="CSRF-Token" content="tok">"#));
    }

    #[test]
    fn test_user_card_falls_back_to_email() {
        let user = User {
            id: "u".into(),
            email: "ada@example.com".into(),
            name: String::new(),
        };
        assert!(user_card(&user, "tok").contains("ada@example.com"));
    }

    #[test]
    fn test_sign_out_sends_csrf_header() {
        let user = User {
            id: "u".into(),
            email: "ada@example.com".into(),
            name: "Ada".into(),
        };
        let html = user_card(&user, "tok");
        assert!(html.contains("@post('/auth/logout', {headers: {'X-CSRF-Token': 'tok'}})"));
    }
}
