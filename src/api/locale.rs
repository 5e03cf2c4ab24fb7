use crate::domain::Locale;
use axum::http::{header, HeaderMap};
use url::{form_urlencoded, Url};

/// 前端记住语言选择的 cookie 名
pub const LOCALE_COOKIE: &str = "NEXT_LOCALE";

fn header_str<'a>(headers: &'a HeaderMap, name: header::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn from_referer(headers: &HeaderMap) -> Option<Locale> {
    let referer = Url::parse(header_str(headers, header::REFERER)?).ok()?;
    let first = referer.path_segments()?.next()?;
    (first.len() == 2).then(|| Locale::from_tag(first)).flatten()
}

fn from_cookie(headers: &HeaderMap) -> Option<Locale> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == LOCALE_COOKIE)
        .and_then(|(_, value)| Locale::from_tag(value))
}

fn from_accept_language(headers: &HeaderMap) -> Option<Locale> {
    header_str(headers, header::ACCEPT_LANGUAGE)?
        .split(',')
        .filter_map(|entry| entry.split(';').next())
        .find_map(Locale::from_tag)
}

/// 语言推断顺序：显式参数、referer 路径前缀、cookie、Accept-Language、默认
pub fn infer_locale(explicit: Option<&str>, headers: &HeaderMap) -> Locale {
    explicit
        .and_then(Locale::from_tag)
        .or_else(|| from_referer(headers))
        .or_else(|| from_cookie(headers))
        .or_else(|| from_accept_language(headers))
        .unwrap_or_default()
}

/// 带语言前缀的支付结果页地址
pub fn payment_page_location(
    base_url: Option<&str>,
    locale: Locale,
    success: bool,
    params: &[(&str, Option<&str>)],
) -> String {
    let page = if success { "success" } else { "pending" };
    let mut query = form_urlencoded::Serializer::new(String::new());
    for (name, value) in params {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            query.append_pair(name, value);
        }
    }
    let query = query.finish();

    let mut location = format!("{}/{}/payment/{}", base_url.unwrap_or(""), locale, page);
    if !query.is_empty() {
        location.push('?');
        location.push_str(&query);
    }
    location
}
