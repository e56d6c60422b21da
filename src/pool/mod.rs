//! パラメータプール（挿入順を保持するキー/値コンテナ）
//!
//! クエリ、ボディ、Cookie、ルート属性、サーバー変数をそれぞれ保持する。

pub mod attribute;
pub mod filter;
pub mod input;
pub mod server;

use indexmap::map::{IntoIter, Iter};
use indexmap::IndexMap;

use crate::common::Value;

pub use attribute::AttributePool;
pub use filter::Filter;
pub use input::InputPool;
pub use server::ServerPool;

/// 汎用パラメータプール
///
/// 値の形は制限しない。キーは一意で、反復は挿入順。
#[derive(Debug, Clone, PartialEq)]
pub struct Pool<V = Value> {
    parameters: IndexMap<String, V>,
}

impl<V> Default for Pool<V> {
    fn default() -> Self {
        Self {
            parameters: IndexMap::new(),
        }
    }
}

impl<V: Clone> Pool<V> {
    /// 新しいプールを作成
    pub fn new(parameters: IndexMap<String, V>) -> Self {
        Self { parameters }
    }

    /// 全パラメータを取得
    pub fn all(&self) -> &IndexMap<String, V> {
        &self.parameters
    }

    /// キーの一覧を挿入順で取得
    pub fn keys(&self) -> Vec<String> {
        self.parameters.keys().cloned().collect()
    }

    /// 全パラメータを置き換える
    pub fn replace(&mut self, parameters: IndexMap<String, V>) {
        self.parameters = parameters;
    }

    /// パラメータを追加する（既存キーは新しい値で上書き、位置は維持）
    pub fn add(&mut self, parameters: IndexMap<String, V>) {
        self.parameters.extend(parameters);
    }

    /// 値を参照する
    pub fn get(&self, key: &str) -> Option<&V> {
        self.parameters.get(key)
    }

    /// 値を取得し、存在しなければデフォルト値を返す
    pub fn get_or(&self, key: &str, default: V) -> V {
        self.parameters.get(key).cloned().unwrap_or(default)
    }

    /// キーが存在するかどうか
    pub fn has(&self, key: &str) -> bool {
        self.parameters.contains_key(key)
    }

    /// 値を設定する
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<V>) {
        self.parameters.insert(key.into(), value.into());
    }

    /// 値を削除して返却（残りの順序は維持）
    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.parameters.shift_remove(key)
    }

    /// パラメータ数
    pub fn count(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// 挿入順のイテレータ
    pub fn iter(&self) -> Iter<'_, String, V> {
        self.parameters.iter()
    }
}

impl Pool<Value> {
    /// 値（またはデフォルト値）をフィルタで検証・変換する
    ///
    /// 検証に失敗した場合は `None`。配列は要素ごとに検証し、
    /// ひとつでも失敗すれば全体を失敗とする。
    pub fn filter(&self, key: &str, default: Option<Value>, filter: &Filter) -> Option<Value> {
        let value = match self.parameters.get(key) {
            Some(v) => v.clone(),
            None => default.unwrap_or(Value::Null),
        };
        filter.apply(&value)
    }
}

impl<V> From<IndexMap<String, V>> for Pool<V> {
    fn from(parameters: IndexMap<String, V>) -> Self {
        Self { parameters }
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for Pool<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            parameters: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl<'a, V> IntoIterator for &'a Pool<V> {
    type Item = (&'a String, &'a V);
    type IntoIter = Iter<'a, String, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.parameters.iter()
    }
}

impl<V> IntoIterator for Pool<V> {
    type Item = (String, V);
    type IntoIter = IntoIter<String, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.parameters.into_iter()
    }
}

/// `(キー, 値)` の列から順序付きマップを作るヘルパー
pub fn params<K, V, I>(items: I) -> IndexMap<String, Value>
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    items.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parameters() -> IndexMap<String, Value> {
        let mut map = params([("int", Value::from(999)), ("string", Value::from("foo"))]);
        map.insert("array".to_string(), Value::Map(params([("foo", "bar")])));
        map.insert("object".to_string(), Value::object(vec![1u8, 2, 3]));
        map
    }

    #[test]
    fn test_has() {
        let pool = Pool::new(parameters());

        assert!(!pool.has("foo"));
        assert!(pool.has("string"));
    }

    #[test]
    fn test_get() {
        let pool = Pool::new(parameters());

        assert_eq!(pool.get("int"), Some(&Value::from(999)));
        assert_eq!(pool.get("string"), Some(&Value::from("foo")));
        assert_eq!(pool.get("array"), Some(&Value::Map(params([("foo", "bar")]))));
        assert!(pool.get("object").and_then(|v| v.downcast_ref::<Vec<u8>>()).is_some());
    }

    #[test]
    fn test_get_default() {
        let pool: Pool = Pool::default();

        assert_eq!(pool.get_or("foo", Value::from("bar")), Value::from("bar"));
    }

    #[test]
    fn test_set_and_remove() {
        let mut pool = Pool::new(parameters());
        pool.set("string", "bar");
        assert_eq!(pool.get("string"), Some(&Value::from("bar")));

        pool.remove("string");
        assert_eq!(pool.get("string"), None);
        assert!(!pool.has("string"));
        assert_eq!(pool.keys(), vec!["int", "array", "object"]);
    }

    #[test]
    fn test_keys_and_count() {
        let pool = Pool::new(parameters());

        assert_eq!(pool.keys(), vec!["int", "string", "array", "object"]);
        assert_eq!(pool.count(), 4);
    }

    #[test]
    fn test_replace() {
        let mut pool = Pool::new(params([("x", 0), ("y", 2)]));
        pool.replace(params([("x", 1)]));

        assert_eq!(pool.all(), &params([("x", 1)]));
    }

    #[test]
    fn test_add() {
        let mut pool = Pool::new(params([("x", 0), ("y", 2)]));
        pool.add(params([("x", 1)]));

        assert_eq!(pool.all(), &params([("x", 1), ("y", 2)]));
        assert_eq!(pool.keys(), vec!["x", "y"]);
    }

    #[test]
    fn test_iteration_order() {
        let pool = Pool::new(params([("b", 1), ("a", 2), ("c", 3)]));
        let keys: Vec<&String> = pool.iter().map(|(k, _)| k).collect();

        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_filter() {
        let mut pool: Pool = Pool::default();
        pool.set("valid_email", "foo@bar.test");
        pool.set("invalid_email", "foo");

        assert_eq!(pool.filter("undefined_key", None, &Filter::Email), None);
        assert_eq!(pool.filter("invalid_email", None, &Filter::Email), None);
        assert_eq!(
            pool.filter("valid_email", None, &Filter::Email),
            Some(Value::from("foo@bar.test"))
        );
    }
}
