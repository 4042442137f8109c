use std::collections::HashMap;

use percent_encoding::percent_decode_str;

/// Suggested filename from a `Content-Disposition` header value.
///
/// The RFC 5987 `filename*` parameter wins over the plain `filename`. Returns
/// `None` when the header is malformed or names no file, so callers can pick
/// their own default.
pub fn filename_from_disposition(header: &str) -> Option<String> {
    let params = parse_params(header)?;

    if let Some(extended) = params.get("filename*") {
        if let Some(name) = decode_extended(extended).filter(|n| !n.is_empty()) {
            return Some(name);
        }
    }

    params.get("filename").filter(|n| !n.is_empty()).cloned()
}

/// Parameters of a `type; key=value; key="quoted value"` header, keys
/// lowercased. `None` if the value does not follow that grammar.
fn parse_params(header: &str) -> Option<HashMap<String, String>> {
    let (disposition, mut rest) = match header.find(';') {
        Some(i) => (&header[..i], &header[i..]),
        None => (header, ""),
    };
    if !is_token(disposition.trim()) {
        return None;
    }

    let mut params = HashMap::new();
    loop {
        rest = rest.trim_start_matches(|c: char| c == ';' || c.is_whitespace());
        if rest.is_empty() {
            return Some(params);
        }

        let eq = rest.find('=')?;
        let key = rest[..eq].trim().to_ascii_lowercase();
        if !is_token(&key) {
            return None;
        }
        rest = rest[eq + 1..].trim_start();

        let value = if let Some(quoted) = rest.strip_prefix('"') {
            let (value, consumed) = unquote(quoted)?;
            rest = &quoted[consumed..];
            value
        } else {
            let end = rest.find(';').unwrap_or(rest.len());
            let value = rest[..end].trim().to_string();
            rest = &rest[end..];
            value
        };

        params.entry(key).or_insert(value);
    }
}

/// Read a quoted string up to its closing quote, resolving backslash escapes.
/// Returns the value and the number of bytes consumed, including the quote.
fn unquote(s: &str) -> Option<(String, usize)> {
    let mut value = String::new();
    let mut chars = s.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Some((value, i + 1)),
            '\\' => value.push(chars.next()?.1),
            c => value.push(c),
        }
    }
    None
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.chars().all(|c| {
            c.is_ascii() && !c.is_ascii_control() && !" ()<>@,;:\\\"/[]?=".contains(c)
        })
}

/// Decode `charset'language'percent-encoded` as used by `filename*`.
/// A value without the charset prefix is returned as-is.
fn decode_extended(value: &str) -> Option<String> {
    let mut pieces = value.splitn(3, '\'');
    let (charset, _language, encoded) = match (pieces.next(), pieces.next(), pieces.next()) {
        (Some(charset), Some(language), Some(encoded)) => (charset, language, encoded),
        _ => return Some(value.to_string()),
    };

    let decoded = percent_decode_str(encoded);
    if charset.eq_ignore_ascii_case("iso-8859-1") {
        Some(decoded.map(char::from).collect())
    } else {
        decoded.decode_utf8().ok().map(|s| s.into_owned())
    }
}
