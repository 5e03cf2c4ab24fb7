use crate::domain::errors::{DomainError, DomainResult};

pub const PAYMENT_ID_MIN_LEN: usize = 6;
pub const PAYMENT_ID_MAX_LEN: usize = 80;
pub const PHONE_MIN_DIGITS: usize = 8;

/// 支付ID：字母、数字、`-`、`_`，长度 6-80
pub fn validate_payment_id(raw: &str) -> DomainResult<String> {
    let id = raw.trim();
    let len_ok = (PAYMENT_ID_MIN_LEN..=PAYMENT_ID_MAX_LEN).contains(&id.len());
    let chars_ok = id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if !len_ok || !chars_ok {
        return Err(DomainError::ValidationError(
            "paymentId must be 6-80 characters of letters, digits, '-' or '_'".to_string(),
        ));
    }
    Ok(id.to_string())
}

pub fn validate_email(field: &str, raw: &str) -> DomainResult<String> {
    let email = raw.trim();
    let invalid = || DomainError::ValidationError(format!("{} is not a valid email", field));

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let dot_ok = domain
        .rsplit_once('.')
        .map(|(host, tld)| !host.is_empty() && !tld.is_empty())
        .unwrap_or(false);
    if !dot_ok {
        return Err(invalid());
    }
    Ok(email.to_string())
}

pub fn validate_phone(field: &str, raw: &str) -> DomainResult<String> {
    let phone = raw.trim();
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    if digits < PHONE_MIN_DIGITS {
        return Err(DomainError::ValidationError(format!(
            "{} must contain at least {} digits",
            field, PHONE_MIN_DIGITS
        )));
    }
    Ok(phone.to_string())
}

/// 必填文本字段，`field` 用于错误信息
pub fn require_text(field: &str, value: Option<&str>) -> DomainResult<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(DomainError::ValidationError(format!("{} is required", field))),
    }
}
