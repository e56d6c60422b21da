//! リクエストヘッダーの保持（名前は小文字へ正規化）

use indexmap::IndexMap;

/// よく使うヘッダー名（小文字）
pub mod names {
    pub const HOST: &str = "host";
    pub const CONTENT_TYPE: &str = "content-type";
    pub const COOKIE: &str = "cookie";
    pub const FORWARDED: &str = "forwarded";
    pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
    pub const X_FORWARDED_PROTO: &str = "x-forwarded-proto";
    pub const X_FORWARDED_HOST: &str = "x-forwarded-host";
    pub const X_FORWARDED_PORT: &str = "x-forwarded-port";
    pub const X_FORWARDED_PREFIX: &str = "x-forwarded-prefix";
}

/// 大文字小文字を区別しないヘッダーの集合
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderBag {
    headers: IndexMap<String, String>,
}

impl HeaderBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// ヘッダーを取得
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// 空でないヘッダー値のみを取得
    pub fn get_non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).map(str::trim).filter(|v| !v.is_empty())
    }

    /// ヘッダーを設定（同名は上書き）
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn has(&self, name: &str) -> bool {
        self.headers.contains_key(&name.to_ascii_lowercase())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.headers.shift_remove(&name.to_ascii_lowercase())
    }

    /// 全ヘッダー（小文字キー、挿入順）
    pub fn all(&self) -> &IndexMap<String, String> {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for HeaderBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = HeaderBag::new();
        for (name, value) in iter {
            bag.set(name.as_ref(), value);
        }
        bag
    }
}
