//! ログ出力前の機密値マスク

use crate::pool::ServerPool;

const REDACTED: &str = "***redacted***";
const MAX_LOG_VALUE_LEN: usize = 200;

/// ログに出力する値をマスク・切り詰めする
pub fn redact_value_for_log(key: &str, value: &str) -> String {
    let key_l = key.to_ascii_lowercase();
    if key_l == "query_string" {
        return redact_query_string(value);
    }
    if is_sensitive_key_like(&key_l) {
        return REDACTED.to_string();
    }
    // 長すぎる値は truncate（例：User-Agent）
    if value.len() > MAX_LOG_VALUE_LEN {
        let mut end = MAX_LOG_VALUE_LEN;
        while !value.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &value[..end])
    } else {
        value.to_string()
    }
}

/// 機密情報を含みそうなキー名かどうか（小文字で渡す）
pub fn is_sensitive_key_like(lower_key: &str) -> bool {
    const PATTERNS: [&str; 16] = [
        "authorization",
        "cookie",
        "token",
        "secret",
        "password",
        "pass",
        "api-key",
        "api_key",
        "apikey",
        "jwt",
        "auth",
        "session",
        "csrf",
        "signature",
        "credential",
        "bearer",
    ];
    PATTERNS.iter().any(|p| lower_key.contains(p))
}

/// クエリ文字列の機密パラメータ値をマスクする
pub fn redact_query_string(qs: &str) -> String {
    qs.split('&')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut it = part.splitn(2, '=');
            let k = it.next().unwrap_or("");
            let v = it.next().unwrap_or("");
            if is_sensitive_key_like(&k.to_ascii_lowercase()) {
                format!("{}={}", k, REDACTED)
            } else {
                format!("{}={}", k, v)
            }
        })
        .collect::<Vec<String>>()
        .join("&")
}

/// デバッグログ用にサーバー変数の概要を作る
pub fn describe_server(server: &ServerPool, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| {
            server
                .get_str(key)
                .map(|value| format!("{}={}", key, redact_value_for_log(key, value)))
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_sensitive_keys() {
        assert_eq!(redact_value_for_log("HTTP_AUTHORIZATION", "Bearer abc"), REDACTED);
        assert_eq!(redact_value_for_log("HTTP_COOKIE", "sid=1"), REDACTED);
        assert_eq!(redact_value_for_log("REQUEST_URI", "/foo"), "/foo");
    }

    #[test]
    fn test_redact_query_string() {
        assert_eq!(
            redact_value_for_log("QUERY_STRING", "page=1&api_key=xyz&&token=t"),
            "page=1&api_key=***redacted***&token=***redacted***"
        );
    }

    #[test]
    fn test_truncate_long_values() {
        let long = "あ".repeat(100);
        let redacted = redact_value_for_log("HTTP_USER_AGENT", &long);
        assert!(redacted.ends_with("...[truncated]"));
        assert!(redacted.len() < long.len());
    }

    #[test]
    fn test_describe_server() {
        let server: ServerPool = [("REQUEST_URI", "/a"), ("HTTP_COOKIE", "sid=1")].into_iter().collect();
        assert_eq!(
            describe_server(&server, &["REQUEST_URI", "HTTP_COOKIE", "MISSING"]),
            "REQUEST_URI=/a HTTP_COOKIE=***redacted***"
        );
    }
}
