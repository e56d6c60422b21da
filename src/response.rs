//! HTTPレスポンス
//!
//! ステータス、ヘッダー、ボディを蓄積し、`emit` で一度だけ出力する。

use std::io::Write;

use indexmap::IndexMap;
use serde::Serialize;

use crate::cgi::response::{write_response, write_response_to};
use crate::cgi::validation::quote_filename;
use crate::common::{content_type, StatusCode};
use crate::error::Error;

/// レスポンスボディ
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Body {
    #[default]
    Empty,
    Bytes(Vec<u8>),
    /// 出力時にJSONへエンコードされる構造化データ
    Json(serde_json::Value),
}

impl Body {
    /// 出力するバイト列へ変換する
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        match self {
            Body::Empty => Ok(Vec::new()),
            Body::Bytes(bytes) => Ok(bytes.clone()),
            Body::Json(value) => {
                serde_json::to_vec(value).map_err(|e| Error::ResponseSerializationError(e.to_string()))
            }
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, Body::Json(_))
    }
}

/// HTTPレスポンス
///
/// ヘッダー名は指定された大文字小文字のまま保持し、同名の再設定は
/// 最初の位置のまま値だけを置き換える。
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: StatusCode,
    headers: IndexMap<String, String>,
    body: Body,
}

impl Default for Response {
    fn default() -> Self {
        Self::new(StatusCode::OK)
    }
}

impl Response {
    /// 新しいレスポンスを作成
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: IndexMap::new(),
            body: Body::Empty,
        }
    }

    /// ヘッダーを追加したレスポンスを返す
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// ボディを設定したレスポンスを返す
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.set_content(body);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &IndexMap<String, String> {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    /// ヘッダーを設定する（後勝ち）
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn set_content_type(&mut self, value: impl Into<String>) -> &mut Self {
        self.set_header("Content-Type", value)
    }

    pub fn set_code(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    pub fn set_content(&mut self, content: impl Into<Vec<u8>>) -> &mut Self {
        self.body = Body::Bytes(content.into());
        self
    }

    /// 構造化データをボディに設定する（出力時にJSONへエンコード）
    pub fn set_json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<&mut Self, Error> {
        let value = serde_json::to_value(value).map_err(|e| Error::ResponseSerializationError(e.to_string()))?;
        self.body = Body::Json(value);
        Ok(self)
    }

    /// リダイレクトレスポンス（既定は302）
    pub fn redirect(location: impl Into<String>, status: Option<StatusCode>) -> Self {
        Self::new(status.unwrap_or(StatusCode::FOUND)).with_header("Location", location)
    }

    /// JSONレスポンス
    pub fn json<T: Serialize + ?Sized>(value: &T, status: Option<StatusCode>) -> Result<Self, Error> {
        let mut response = Self::new(status.unwrap_or(StatusCode::OK));
        response.set_content_type(content_type::JSON).set_json(value)?;
        Ok(response)
    }

    /// HTMLレスポンス
    pub fn html(text: impl Into<String>, status: Option<StatusCode>) -> Self {
        Self::new(status.unwrap_or(StatusCode::OK))
            .with_header("Content-Type", format!("{}; charset=utf-8", content_type::HTML))
            .with_body(text.into().into_bytes())
    }

    /// プレーンテキストレスポンス
    pub fn text(text: impl Into<String>, status: Option<StatusCode>) -> Self {
        Self::new(status.unwrap_or(StatusCode::OK))
            .with_header("Content-Type", format!("{}; charset=utf-8", content_type::TEXT))
            .with_body(text.into().into_bytes())
    }

    /// ダウンロード用のヘッダーを設定する
    ///
    /// `Content-Length` は現在のボディのバイト長になる。
    pub fn attachment(&mut self, filename: &str, mime: &str) -> Result<&mut Self, Error> {
        let length = self.body.to_bytes()?.len();
        self.set_header(
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", quote_filename(filename)),
        )
        .set_header("Content-Length", length.to_string())
        .set_content_type(mime);
        Ok(self)
    }

    /// ダウンロードとして標準出力へ出力する
    pub fn send_as_attachment(mut self, filename: &str, mime: &str) -> Result<(), Error> {
        self.attachment(filename, mime)?;
        self.emit()
    }

    /// 標準出力へCGI形式で出力する
    pub fn emit(self) -> Result<(), Error> {
        write_response(self)
    }

    /// 任意のライターへCGI形式で出力する
    pub fn emit_to<W: Write>(self, out: &mut W) -> Result<(), Error> {
        write_response_to(self, out)
    }

    /// 構成要素へ分解する
    pub fn into_parts(self) -> (StatusCode, IndexMap<String, String>, Body) {
        (self.status, self.headers, self.body)
    }
}
