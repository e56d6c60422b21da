//! 外部入力（クエリ、ボディ、Cookie）用のプール

use std::ops::Deref;

use indexmap::IndexMap;

use super::Pool;
use crate::common::Value;
use crate::error::Error;

/// スカラー値・配列・null のみを受け付けるプール
///
/// オブジェクト値は `set` / `replace` / `add` と `get_or` のデフォルト値で拒否し、
/// 既に格納されていた場合も `get` の時点で `InvalidValue` を返す。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputPool {
    inner: Pool<Value>,
}

fn is_input_value(value: &Value) -> bool {
    match value {
        Value::Object(_) => false,
        Value::List(items) => items.iter().all(is_input_value),
        Value::Map(map) => map.values().all(is_input_value),
        _ => true,
    }
}

impl InputPool {
    pub fn new(parameters: IndexMap<String, Value>) -> Self {
        Self {
            inner: Pool::new(parameters),
        }
    }

    /// 値を取得する
    pub fn get(&self, key: &str) -> Result<Option<&Value>, Error> {
        match self.inner.get(key) {
            Some(value) if !is_input_value(value) => Err(Error::InvalidValue(format!(
                "Input value \"{}\" contains a non-scalar value.",
                key
            ))),
            other => Ok(other),
        }
    }

    /// 値を取得し、存在しなければデフォルト値を返す
    pub fn get_or(&self, key: &str, default: impl Into<Value>) -> Result<Value, Error> {
        let default = default.into();
        if !is_input_value(&default) {
            return Err(Error::InvalidValue(format!(
                "Expected a scalar value as a default for \"{}\", \"{}\" given.",
                key,
                default.type_name()
            )));
        }
        Ok(self.get(key)?.cloned().unwrap_or(default))
    }

    /// 値を設定する
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<(), Error> {
        let key = key.into();
        let value = value.into();
        if !is_input_value(&value) {
            return Err(Error::InvalidValue(format!(
                "Expected a scalar, or an array as a value for \"{}\", \"{}\" given.",
                key,
                value.type_name()
            )));
        }
        self.inner.set(key, value);
        Ok(())
    }

    /// 全パラメータを置き換える
    pub fn replace(&mut self, parameters: IndexMap<String, Value>) -> Result<(), Error> {
        check_all(&parameters)?;
        self.inner.replace(parameters);
        Ok(())
    }

    /// パラメータを追加する（既存キーは上書き）
    pub fn add(&mut self, parameters: IndexMap<String, Value>) -> Result<(), Error> {
        check_all(&parameters)?;
        self.inner.add(parameters);
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.inner.remove(key)
    }
}

fn check_all(parameters: &IndexMap<String, Value>) -> Result<(), Error> {
    match parameters.iter().find(|(_, v)| !is_input_value(v)) {
        Some((key, value)) => Err(Error::InvalidValue(format!(
            "Expected a scalar, or an array as a value for \"{}\", \"{}\" given.",
            key,
            value.type_name()
        ))),
        None => Ok(()),
    }
}

impl Deref for InputPool {
    type Target = Pool<Value>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl From<IndexMap<String, Value>> for InputPool {
    fn from(parameters: IndexMap<String, Value>) -> Self {
        Self::new(parameters)
    }
}
