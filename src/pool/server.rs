//! サーバー/環境変数テーブル

use std::ops::{Deref, DerefMut};

use log::warn;

use super::Pool;
use crate::cgi::validation::{is_valid_header_name, is_valid_header_value};

/// `REQUEST_URI` や `HTTP_*` などのサーバー変数を保持するプール
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerPool {
    inner: Pool<String>,
}

impl ServerPool {
    /// 変数を文字列として取得
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.inner.get(key).map(String::as_str)
    }

    /// 空でない値のみを取得
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get_str(key).filter(|v| !v.is_empty())
    }

    /// 変数からHTTPヘッダーを取り出す
    ///
    /// `HTTP_X_AUTH_TOKEN` -> `X-Auth-Token` のように変換し、
    /// `CONTENT_TYPE` / `CONTENT_LENGTH` / `CONTENT_MD5` も含める。
    /// 不正な名前・値のヘッダーは読み飛ばす。
    pub fn headers(&self) -> Vec<(String, String)> {
        let mut headers = Vec::new();
        for (key, value) in self.inner.iter() {
            let header_name = match header_name_for(key) {
                Some(name) => name,
                None => continue,
            };
            if !is_valid_header_name(&header_name) || !is_valid_header_value(value) {
                warn!("Skipping invalid header from server variable {}", key);
                continue;
            }
            headers.push((header_name, value.clone()));
        }
        headers
    }
}

/// サーバー変数名に対応するヘッダー名（ヘッダーでなければ `None`）
pub fn header_name_for(key: &str) -> Option<String> {
    let raw = if let Some(rest) = key.strip_prefix("HTTP_") {
        rest
    } else if matches!(key, "CONTENT_TYPE" | "CONTENT_LENGTH" | "CONTENT_MD5") {
        key
    } else {
        return None;
    };
    let name = raw
        .split('_')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => c.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase(),
            }
        })
        .collect::<Vec<String>>()
        .join("-");
    Some(name)
}

impl Deref for ServerPool {
    type Target = Pool<String>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for ServerPool {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl IntoIterator for ServerPool {
    type Item = (String, String);
    type IntoIter = indexmap::map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ServerPool {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
