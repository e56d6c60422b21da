//! プール値の検証・変換フィルタ

use std::net::IpAddr;
use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::common::Value;

/// フィルタの種類
#[derive(Debug, Clone)]
pub enum Filter {
    /// 値をそのまま返す
    Default,
    /// 整数として検証し、整数値を返す
    Int,
    /// 浮動小数点数として検証する
    Float,
    /// 真偽値として解釈する（1/true/on/yes, 0/false/off/no/空文字）
    Bool,
    /// メールアドレス形式
    Email,
    /// 絶対URL形式
    Url,
    /// IPv4/IPv6アドレス
    Ip,
    /// 正規表現に一致する文字列
    Regex(Regex),
    /// 任意の関数で検証・変換する
    Callback(fn(&Value) -> Option<Value>),
}

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    EMAIL
        .get_or_init(|| {
            Regex::new(
                r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
            )
        })
        .as_ref()
        .ok()
}

impl Filter {
    /// フィルタを適用する。失敗時は `None`
    pub fn apply(&self, value: &Value) -> Option<Value> {
        match value {
            Value::List(items) => items
                .iter()
                .map(|item| self.apply(item))
                .collect::<Option<Vec<Value>>>()
                .map(Value::List),
            Value::Map(map) => map
                .iter()
                .map(|(k, v)| self.apply(v).map(|v| (k.clone(), v)))
                .collect::<Option<IndexMap<String, Value>>>()
                .map(Value::Map),
            _ => self.apply_scalar(value),
        }
    }

    fn apply_scalar(&self, value: &Value) -> Option<Value> {
        if let Filter::Callback(f) = self {
            return f(value);
        }
        if let Filter::Default = self {
            return Some(value.clone());
        }
        if let Filter::Bool = self {
            return parse_bool(value).map(Value::Bool);
        }

        let text = value.to_scalar_string()?;
        let trimmed = text.trim();
        match self {
            Filter::Int => match value {
                Value::Int(i) => Some(Value::Int(*i)),
                _ => trimmed.parse::<i64>().ok().map(Value::Int),
            },
            Filter::Float => match value {
                Value::Float(x) => Some(Value::Float(*x)),
                _ => trimmed.parse::<f64>().ok().filter(|x| x.is_finite()).map(Value::Float),
            },
            Filter::Email => email_regex()
                .filter(|re| re.is_match(&text))
                .map(|_| Value::String(text.clone())),
            Filter::Url => url::Url::parse(&text)
                .ok()
                .filter(|u| u.has_host() || u.scheme() == "file")
                .map(|_| Value::String(text.clone())),
            Filter::Ip => text.parse::<IpAddr>().ok().map(|_| Value::String(text.clone())),
            Filter::Regex(re) => re.is_match(&text).then(|| Value::String(text.clone())),
            Filter::Default | Filter::Bool | Filter::Callback(_) => None,
        }
    }
}

/// 真偽値の解釈。認識できない値は `None`
pub fn parse_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Null => Some(false),
        _ => {
            let text = value.to_scalar_string()?;
            match text.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => Some(true),
                "0" | "false" | "off" | "no" | "" => Some(false),
                _ => None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_filter() {
        assert_eq!(Filter::Int.apply(&Value::from(" 42 ")), Some(Value::Int(42)));
        assert_eq!(Filter::Int.apply(&Value::from("4.2")), None);
        assert_eq!(Filter::Int.apply(&Value::from(7)), Some(Value::Int(7)));
    }

    #[test]
    fn test_bool_filter() {
        assert_eq!(Filter::Bool.apply(&Value::from("yes")), Some(Value::Bool(true)));
        assert_eq!(Filter::Bool.apply(&Value::from("Off")), Some(Value::Bool(false)));
        assert_eq!(Filter::Bool.apply(&Value::from(999)), None);
    }

    #[test]
    fn test_url_and_ip_filters() {
        assert!(Filter::Url.apply(&Value::from("https://example.com/a")).is_some());
        assert!(Filter::Url.apply(&Value::from("not a url")).is_none());
        assert!(Filter::Ip.apply(&Value::from("::1")).is_some());
        assert!(Filter::Ip.apply(&Value::from("300.1.1.1")).is_none());
    }

    #[test]
    fn test_regex_and_callback_filters() {
        let re = Filter::Regex(Regex::new(r"^\d{3}$").unwrap());
        assert!(re.apply(&Value::from("123")).is_some());
        assert!(re.apply(&Value::from("1234")).is_none());

        fn upper(v: &Value) -> Option<Value> {
            v.as_str().map(|s| Value::String(s.to_uppercase()))
        }
        assert_eq!(Filter::Callback(upper).apply(&Value::from("ab")), Some(Value::from("AB")));
    }

    #[test]
    fn test_array_filter() {
        let list = Value::from(vec!["1", "2"]);
        assert_eq!(
            Filter::Int.apply(&list),
            Some(Value::List(vec![Value::Int(1), Value::Int(2)]))
        );
        assert_eq!(Filter::Int.apply(&Value::from(vec!["1", "x"])), None);
    }
}
