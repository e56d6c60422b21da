//! 共通ユーティリティ関数群（URLデコード、クエリ解析、パス操作、環境設定 等）

use std::env;
use indexmap::IndexMap;

use super::value::Value;

/// リクエストボディ上限を指定する環境変数名
pub const MAX_BODY_SIZE_ENV: &str = "CGI_HTTP_MAX_BODY_SIZE";

/// URLエンコーディングのデコード（`+` はそのまま残す、rawurldecode相当）
///
/// 不正なエスケープ（`%` の後に16進数2桁が続かない）は文字として扱う。
pub fn raw_percent_decode(input: &str) -> Vec<u8> {
    decode_bytes(input.as_bytes(), false)
}

/// フォーム形式のデコード（`+` をスペースとして扱う）
pub fn percent_decode(input: &str) -> String {
    String::from_utf8_lossy(&decode_bytes(input.as_bytes(), true)).into_owned()
}

fn decode_bytes(bytes: &[u8], plus_as_space: bool) -> Vec<u8> {
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(h), Some(l)) = (from_hex(bytes[i + 1]), from_hex(bytes[i + 2])) {
                result.push(h * 16 + l);
                i += 3;
                continue;
            }
        } else if plus_as_space && bytes[i] == b'+' {
            result.push(b' ');
            i += 1;
            continue;
        }
        result.push(bytes[i]);
        i += 1;
    }
    result
}

/// 16進数文字をバイト値に変換するヘルパー関数
pub(crate) fn from_hex(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// RFC 3986 の非予約文字以外をパーセントエンコードする
pub fn percent_encode(input: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(input.len());
    for &b in input.as_bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX[(b >> 4) as usize] as char);
            out.push(HEX[(b & 0x0f) as usize] as char);
        }
    }
    out
}

/// クエリ文字列をパースしてURLデコードを行う共通関数
///
/// `key[]=v` はリストへの追加、`key[name]=v` はマップへの格納として扱う。
/// 同じキーが複数回現れた場合は後勝ち。
pub fn parse_query_string(query_string: &str) -> IndexMap<String, Value> {
    let mut params: IndexMap<String, Value> = IndexMap::new();

    if query_string.is_empty() {
        return params;
    }

    for pair in query_string.split('&') {
        if pair.is_empty() {
            continue;
        }
        let mut parts = pair.splitn(2, '=');
        let key = percent_decode(parts.next().unwrap_or(""));
        let value = percent_decode(parts.next().unwrap_or(""));
        if key.is_empty() {
            continue;
        }

        match split_bracket_key(&key) {
            Some((base, "")) => {
                let entry = params.entry(base.to_string()).or_insert_with(|| Value::List(Vec::new()));
                if let Value::List(items) = entry {
                    items.push(Value::String(value));
                } else {
                    *entry = Value::List(vec![Value::String(value)]);
                }
            }
            Some((base, sub)) => {
                let entry = params.entry(base.to_string()).or_insert_with(|| Value::Map(IndexMap::new()));
                if let Value::Map(map) = entry {
                    map.insert(sub.to_string(), Value::String(value));
                } else {
                    let mut map = IndexMap::new();
                    map.insert(sub.to_string(), Value::String(value));
                    *entry = Value::Map(map);
                }
            }
            None => {
                params.insert(key, Value::String(value));
            }
        }
    }

    params
}

/// `name[sub]` 形式のキーを `(name, sub)` に分割する
fn split_bracket_key(key: &str) -> Option<(&str, &str)> {
    let open = key.find('[')?;
    if open == 0 || !key.ends_with(']') {
        return None;
    }
    Some((&key[..open], &key[open + 1..key.len() - 1]))
}

/// クエリ文字列を正規化する（デコード後にRFC 3986形式で再エンコード）
pub fn normalize_query_string(query_string: &str) -> String {
    query_string
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = percent_decode(parts.next().unwrap_or(""));
            if key.is_empty() {
                return None;
            }
            let value = percent_decode(parts.next().unwrap_or(""));
            Some(format!("{}={}", percent_encode(&key), percent_encode(&value)))
        })
        .collect::<Vec<String>>()
        .join("&")
}

/// パラメータからクエリ文字列を組み立てる
///
/// リストは `key[0]=v`、マップは `key[sub]=v` 形式で展開し、`null` は出力しない。
pub fn build_query_string(params: &IndexMap<String, Value>) -> String {
    let mut pairs = Vec::new();
    for (key, value) in params {
        append_query_pairs(key, value, &mut pairs);
    }
    pairs.join("&")
}

fn append_query_pairs(key: &str, value: &Value, pairs: &mut Vec<String>) {
    match value {
        Value::Null | Value::Object(_) => {}
        Value::Bool(b) => pairs.push(format!("{}={}", percent_encode(key), u8::from(*b))),
        Value::List(items) => {
            for (idx, item) in items.iter().enumerate() {
                append_query_pairs(&format!("{}[{}]", key, idx), item, pairs);
            }
        }
        Value::Map(map) => {
            for (sub, item) in map {
                append_query_pairs(&format!("{}[{}]", key, sub), item, pairs);
            }
        }
        scalar => {
            let text = scalar.to_scalar_string().unwrap_or_default();
            pairs.push(format!("{}={}", percent_encode(key), percent_encode(&text)));
        }
    }
}

/// パスの最後の要素を返す（末尾のスラッシュは無視）
pub fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// 親ディレクトリのパスを返す
///
/// 区切りを含まない場合は `"."`、ルート直下の場合は `"/"`。
pub fn dirname(path: &str) -> &str {
    if path.is_empty() {
        return "";
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/";
    }
    match trimmed.rfind('/') {
        None => ".",
        Some(idx) => {
            let parent = trimmed[..idx].trim_end_matches('/');
            if parent.is_empty() {
                "/"
            } else {
                parent
            }
        }
    }
}

/// リクエストボディの最大サイズ（バイト）を取得する
/// 優先順位: 環境変数 `CGI_HTTP_MAX_BODY_SIZE` -> デフォルト 5MB
pub fn get_max_body_size() -> usize {
    const DEFAULT_MAX_SIZE: usize = 5 * 1024 * 1024; // 5MB
    env::var(MAX_BODY_SIZE_ENV)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(DEFAULT_MAX_SIZE)
}
