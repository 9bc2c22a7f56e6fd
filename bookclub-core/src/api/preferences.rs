//! Theme and locale preference handlers
//!
//! Both take a form post and answer with a 303 back to `redirectURL`.

use axum::{response::Redirect, Form};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use tracing::debug;

pub const THEME_COOKIE: &str = "theme";
pub const LOCALE_COOKIE: &str = "locale";

const THEMES: [&str; 3] = ["light", "dark", "system"];
const SYSTEM_THEME: &str = "system";
const LOCALES: [&str; 1] = ["en"];
const DEFAULT_LOCALE: &str = "en";

#[derive(Debug, Default, Deserialize)]
pub struct ThemeForm {
    #[serde(default)]
    pub theme: String,
    #[serde(rename = "redirectURL", default)]
    pub redirect_url: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LocaleForm {
    #[serde(default)]
    pub locale: String,
    #[serde(rename = "redirectURL", default)]
    pub redirect_url: String,
}

fn preference_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(365))
        .build()
}

/// Only same-site paths are followed; anything else goes home.
///
/// Browsers read `\` as `/`, so `/\host` is protocol-relative too. Every
/// character must be visible ASCII, which also keeps the value a valid
/// `Location` header.
fn redirect_target(url: &str) -> &str {
    let same_site = url.starts_with('/') && !url.starts_with("//");
    let printable = url.chars().all(|c| c.is_ascii_graphic() && c != '\\');
    if same_site && printable {
        url
    } else {
        "/"
    }
}

pub fn resolve_theme(theme: &str) -> &'static str {
    THEMES
        .iter()
        .find(|t| **t == theme)
        .copied()
        .unwrap_or(SYSTEM_THEME)
}

pub fn resolve_locale(locale: &str) -> &'static str {
    LOCALES
        .iter()
        .find(|l| **l == locale)
        .copied()
        .unwrap_or(DEFAULT_LOCALE)
}

/// Unknown themes fall back to `system`, which clears the cookie.
pub async fn set_theme(jar: CookieJar, Form(form): Form<ThemeForm>) -> (CookieJar, Redirect) {
    let theme = resolve_theme(&form.theme);
    if theme != form.theme {
        debug!(requested = %form.theme, "Unknown theme, using system");
    }

    let cookie = preference_cookie(THEME_COOKIE, theme.to_string());
    let jar = if theme == SYSTEM_THEME {
        let mut removal = cookie;
        removal.make_removal();
        jar.add(removal)
    } else {
        jar.add(cookie)
    };

    (jar, Redirect::to(redirect_target(&form.redirect_url)))
}

pub async fn set_locale(jar: CookieJar, Form(form): Form<LocaleForm>) -> (CookieJar, Redirect) {
    let locale = resolve_locale(&form.locale);
    let jar = jar.add(preference_cookie(LOCALE_COOKIE, locale.to_string()));

    (jar, Redirect::to(redirect_target(&form.redirect_url)))
}
