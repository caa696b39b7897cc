use crate::session::{Role, Session};

pub const LOGIN_PATH: &str = "/login";
pub const ADMIN_HOME: &str = "/admin";
pub const DEFAULT_HOME: &str = "/dashboard";
const ROOT_PATH: &str = "/";
const NEXT_PARAM: &str = "next";

/// Routes only an Admin may open, matched as path prefixes.
const ADMIN_ONLY: &[&str] = &[ADMIN_HOME];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    RedirectTo(String),
}

pub fn requires_auth(target: &str) -> bool {
    path_only(target) != LOGIN_PATH
}

pub fn role_home(role: Role) -> &'static str {
    match role {
        Role::Admin => ADMIN_HOME,
        Role::Teacher => DEFAULT_HOME,
    }
}

/// Navigation decision for `target` under `session`. Pure: recomputed on
/// every navigation from its two inputs.
pub fn resolve(session: Option<&Session>, target: &str) -> Decision {
    let path = path_only(target);
    match session {
        None if requires_auth(path) => Decision::RedirectTo(login_with_next(target)),
        None => Decision::Allow,
        Some(s) if path == LOGIN_PATH || path == ROOT_PATH => {
            Decision::RedirectTo(role_home(s.role).to_string())
        }
        Some(s) if is_admin_only(path) && s.role != Role::Admin => {
            Decision::RedirectTo(DEFAULT_HOME.to_string())
        }
        Some(_) => Decision::Allow,
    }
}

/// Where to land after signing in: the remembered path when the new
/// session may open it, otherwise the role home.
pub fn post_login_target(session: &Session, next: Option<&str>) -> String {
    let usable = |n: &&str| {
        n.starts_with('/') && !n.starts_with("//") && path_only(n) != LOGIN_PATH
    };
    match next.filter(usable) {
        Some(n) if resolve(Some(session), n) == Decision::Allow => n.to_string(),
        _ => role_home(session.role).to_string(),
    }
}

/// Extract the remembered path from a login location's query string.
pub fn next_from_query(query: &str) -> Option<String> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == NEXT_PARAM)
        .and_then(|(_, v)| urlencoding::decode(v).ok())
        .map(|v| v.into_owned())
}

fn login_with_next(target: &str) -> String {
    if path_only(target) == ROOT_PATH {
        return LOGIN_PATH.to_string();
    }
    format!("{}?{}={}", LOGIN_PATH, NEXT_PARAM, urlencoding::encode(target))
}

fn is_admin_only(path: &str) -> bool {
    ADMIN_ONLY.iter().any(|prefix| {
        path == *prefix
            || path
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

fn path_only(target: &str) -> &str {
    let end = target.find(['?', '#']).unwrap_or(target.len());
    match &target[..end] {
        "" => ROOT_PATH,
        p if p.len() > 1 => p.trim_end_matches('/'),
        p => p,
    }
}
