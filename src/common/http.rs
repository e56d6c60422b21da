//! HTTP関連の基本型（メソッド、Content-Type定数）

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// ステータスコードは `http` クレートのものをそのまま利用する
pub use ::http::StatusCode;

/// よく使うContent-Typeの定数
pub mod content_type {
    pub const JSON: &str = "application/json";
    pub const FORM: &str = "application/x-www-form-urlencoded";
    pub const TEXT: &str = "text/plain";
    pub const HTML: &str = "text/html";
}

/// HTTPメソッド
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Method {
    HEAD,
    OPTIONS,
    TRACE,
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
}

impl Method {
    /// メソッド名を取得
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::HEAD => "HEAD",
            Method::OPTIONS => "OPTIONS",
            Method::TRACE => "TRACE",
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::PATCH => "PATCH",
        }
    }

    /// 安全なメソッド（サーバー状態を変更しない）かどうか
    pub fn is_safe(&self) -> bool {
        matches!(self, Method::HEAD | Method::GET | Method::OPTIONS | Method::TRACE)
    }

    /// 冪等なメソッドかどうか
    pub fn is_idempotent(&self) -> bool {
        matches!(
            self,
            Method::HEAD | Method::GET | Method::PUT | Method::DELETE | Method::OPTIONS
        )
    }

    /// レスポンスがキャッシュ可能なメソッドかどうか
    pub fn is_cacheable(&self) -> bool {
        matches!(self, Method::HEAD | Method::GET)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    /// 文字列からMethodに変換（大文字小文字は区別しない）
    fn from_str(method: &str) -> Result<Self, Self::Err> {
        match method.to_ascii_uppercase().as_str() {
            "HEAD" => Ok(Method::HEAD),
            "OPTIONS" => Ok(Method::OPTIONS),
            "TRACE" => Ok(Method::TRACE),
            "GET" => Ok(Method::GET),
            "POST" => Ok(Method::POST),
            "PUT" => Ok(Method::PUT),
            "DELETE" => Ok(Method::DELETE),
            "PATCH" => Ok(Method::PATCH),
            _ => Err(Error::InvalidMethod(method.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_from_str() {
        assert_eq!("GET".parse::<Method>(), Ok(Method::GET));
        assert_eq!("get".parse::<Method>(), Ok(Method::GET));
        assert_eq!("TRACE".parse::<Method>(), Ok(Method::TRACE));
        assert_eq!("Patch".parse::<Method>(), Ok(Method::PATCH));
        assert_eq!(
            "CONNECT".parse::<Method>(),
            Err(Error::InvalidMethod("CONNECT".to_string()))
        );
    }

    #[test]
    fn test_method_capabilities() {
        assert!(Method::GET.is_safe());
        assert!(Method::TRACE.is_safe());
        assert!(!Method::POST.is_safe());

        assert!(Method::PUT.is_idempotent());
        assert!(!Method::TRACE.is_idempotent());
        assert!(!Method::PATCH.is_idempotent());

        assert!(Method::HEAD.is_cacheable());
        assert!(!Method::OPTIONS.is_cacheable());
    }

    #[test]
    fn test_method_display() {
        assert_eq!(Method::DELETE.to_string(), "DELETE");
    }
}
