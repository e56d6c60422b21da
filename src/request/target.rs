//! リクエストターゲットの分解
//!
//! `REQUEST_URI`、`SCRIPT_NAME`、`SCRIPT_FILENAME` から
//! ベースURL、ベースパス、パス情報を求める純粋関数群。

use log::debug;
use url::Url;

use crate::common::utils::{basename, dirname, from_hex, raw_percent_decode};

/// 生の `REQUEST_URI` を正規化する
///
/// フラグメントを取り除き、`/` で始まればそのまま返す。
/// 絶対URLや `host:port/path` の場合はパスとクエリのみを残す。
/// 残した部分のバイト列は送られてきたまま（再エンコードしない）。
pub fn fetch_request_uri(raw: Option<&str>) -> String {
    let raw = raw.unwrap_or("/");
    let raw = match raw.find('#') {
        Some(idx) => &raw[..idx],
        None => raw,
    };

    if raw.starts_with('/') {
        return raw.to_string();
    }

    // `?a=b` や `foo` のような相対表記はそのまま
    let mut uri = match path_offset(raw) {
        Some(idx) => raw[idx..].to_string(),
        None => raw.to_string(),
    };

    if !uri.contains('/') {
        uri.insert(0, '/');
    }
    uri
}

/// 絶対URLまたは `host:port` 表記で、パス（なければクエリ）が始まるバイト位置
///
/// どちらもなければ `raw.len()`。オーソリティを持たない表記は `None`。
pub fn path_offset(raw: &str) -> Option<usize> {
    let authority_start = match Url::parse(raw) {
        Ok(url) if url.has_host() => raw.find("://")? + 3,
        _ if is_host_port(authority_of(raw)) => 0,
        _ => return None,
    };
    let rest = &raw[authority_start..];
    Some(authority_start + authority_of(rest).len())
}

fn authority_of(raw: &str) -> &str {
    match raw.find(|c: char| c == '/' || c == '?') {
        Some(idx) => &raw[..idx],
        None => raw,
    }
}

fn is_host_port(authority: &str) -> bool {
    match authority.rsplit_once(':') {
        Some((host, port)) => {
            !host.is_empty()
                && !host.contains(':')
                && !port.is_empty()
                && port.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

/// デコード後の `uri` が `prefix` で始まり、直後が終端か `/` かどうか
pub fn has_prefix(uri: &str, prefix: &str) -> bool {
    let decoded = raw_percent_decode(uri);
    let prefix = prefix.as_bytes();
    decoded.starts_with(prefix) && matches!(decoded.get(prefix.len()), None | Some(b'/'))
}

/// エンコードされたままの `uri` から、デコード後の長さが `prefix` と一致する先頭部分を取り出す
///
/// `%XX` はひとつの単位として数える。一致しなければ `None`。
pub fn extract_prefix<'a>(uri: &'a str, prefix: &str) -> Option<&'a str> {
    if !has_prefix(uri, prefix) {
        return None;
    }

    let bytes = uri.as_bytes();
    let mut i = 0;
    let mut units = 0;
    while units < prefix.len() {
        if i >= bytes.len() {
            return None;
        }
        let escaped = bytes[i] == b'%'
            && i + 2 < bytes.len()
            && from_hex(bytes[i + 1]).is_some()
            && from_hex(bytes[i + 2]).is_some();
        i += if escaped { 3 } else { 1 };
        units += 1;
    }
    uri.get(..i)
}

/// デコード後のパスに `/<script_basename>` のセグメントが含まれるかどうか
pub fn contains_script_basename(path: &str, script_basename: &str) -> bool {
    let decoded = raw_percent_decode(path);
    let needle = script_basename.as_bytes();
    decoded
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == b'/')
        .any(|(idx, _)| {
            let start = idx + 1;
            let end = start + needle.len();
            decoded.get(start..end) == Some(needle) && matches!(decoded.get(end), None | Some(b'/'))
        })
}

/// プロキシのプレフィックスを含まないベースURLを求める
pub fn resolve_base_url_real(request_uri: &str, script_name: &str, script_filename: &str) -> String {
    if basename(script_filename) != basename(script_name) {
        debug!("Script basename mismatch, base URL is empty");
        return String::new();
    }

    if let Some(prefix) = extract_prefix(request_uri, script_name) {
        debug!("Base URL matched script name: {}", prefix);
        return prefix.to_string();
    }

    let script_dir = dirname(script_name);
    if let Some(prefix) = extract_prefix(request_uri, script_dir) {
        debug!("Base URL matched script directory: {}", prefix);
        return prefix.to_string();
    }

    let path = request_uri.split('?').next().unwrap_or("");
    if !contains_script_basename(path, basename(script_name)) {
        return String::new();
    }

    // mod_rewrite 経由でスクリプト名がURIの途中に現れる場合
    match request_uri.find(script_name) {
        Some(pos) if pos > 0 && !script_name.is_empty() => {
            let end = pos + script_name.len();
            debug!("Base URL truncated at rewritten script name: {}", &request_uri[..end]);
            request_uri[..end].to_string()
        }
        _ => script_name.to_string(),
    }
}

/// ベースURLからベースパスを求める
pub fn base_path(base_url: &str, script_filename: &str) -> String {
    if base_url.is_empty() {
        return String::new();
    }

    let path = if basename(base_url) == basename(script_filename) {
        dirname(base_url)
    } else {
        base_url
    };

    path.replace('\\', "/").trim_end_matches('/').to_string()
}

/// ベースURL以降のパス情報を求める（クエリは含まない）
///
/// `base_url_real` の長さがマルチバイト文字の途中に当たる場合は `/` を返す。
pub fn path_info(request_uri: &str, base_url_real: &str) -> String {
    if request_uri == "/" {
        return request_uri.to_string();
    }

    let path = request_uri.split('?').next().unwrap_or("");
    match path.get(base_url_real.len()..) {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => "/".to_string(),
    }
}
