#![forbid(unsafe_code)]

use crate::ids::Username;

/// `{suffix}-{company}-{label}{ext}`, or `{suffix}-{label}{ext}` without a
/// company. The company is reduced to characters that are safe in object
/// keys.
pub fn stored_file_name(
    username: &Username,
    company: Option<&str>,
    label: &str,
    original_name: &str,
) -> String {
    let extension = file_extension(original_name);
    let company = company.map(sanitize_component).filter(|c| !c.is_empty());
    let label = sanitize_component(label);
    match company {
        Some(company) => format!("{}-{company}-{label}{extension}", username.suffix()),
        None => format!("{}-{label}{extension}", username.suffix()),
    }
}

/// Extension including the leading dot, or an empty string.
pub fn file_extension(name: &str) -> &str {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match base.rfind('.') {
        Some(0) | None => "",
        Some(idx) => &base[idx..],
    }
}

/// File name without its extension (used when a type is declared by name).
pub fn file_stem(name: &str) -> &str {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let extension = file_extension(base);
    base[..base.len() - extension.len()].trim()
}

fn sanitize_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.trim().chars() {
        if ch.is_alphanumeric() || matches!(ch, ' ' | '.' | '_' | '-' | '&' | '(' | ')') {
            out.push(ch);
        } else {
            out.push('_');
        }
    }
    out.trim().to_string()
}
