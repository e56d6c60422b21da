//! ルーティング属性用のプール（型付きゲッター付き）

use std::ops::{Deref, DerefMut};

use indexmap::IndexMap;

use super::filter::parse_bool;
use super::Pool;
use crate::common::Value;

/// ルートのマッチ結果などを保持するプール。値の形は制限しない
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributePool {
    inner: Pool<Value>,
}

impl AttributePool {
    pub fn new(parameters: IndexMap<String, Value>) -> Self {
        Self {
            inner: Pool::new(parameters),
        }
    }

    /// 整数として取得する（数値として解釈できない文字列は0）
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        match self.inner.get(key) {
            Some(value) => value.to_int(),
            None => default,
        }
    }

    /// 真偽値として取得する（解釈できない値はfalse）
    pub fn get_boolean(&self, key: &str, default: bool) -> bool {
        match self.inner.get(key) {
            Some(value) => parse_bool(value).unwrap_or(false),
            None => default,
        }
    }

    /// オブジェクト値を具体的な型として参照する
    pub fn get_object<T: 'static>(&self, key: &str) -> Option<&T> {
        self.inner.get(key).and_then(|value| value.downcast_ref::<T>())
    }
}

impl Deref for AttributePool {
    type Target = Pool<Value>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for AttributePool {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl From<IndexMap<String, Value>> for AttributePool {
    fn from(parameters: IndexMap<String, Value>) -> Self {
        Self::new(parameters)
    }
}
