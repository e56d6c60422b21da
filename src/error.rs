//! エラー型の定義

use thiserror::Error;

/// アプリケーションのエラー型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// ホスト名の形式が不正（Hostヘッダーの改ざん等）
    #[error("Invalid Host \"{0}\".")]
    InvalidHost(String),

    /// プールに格納できない値（スカラー・配列以外）
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// 未知のHTTPメソッド
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// 無効なリクエストボディ
    #[error("Invalid request body: {0}")]
    InvalidRequestBody(String),

    /// リクエストボディが上限を超過
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// レスポンスのシリアライズエラー
    #[error("Failed to serialize response: {0}")]
    ResponseSerializationError(String),

    /// 設定エラー
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// 内部サーバーエラー
    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl Error {
    /// エラーからHTTPステータスコードを取得
    pub fn status_code(&self) -> u16 {
        match self {
            Error::InvalidHost(_) => 400,
            Error::InvalidValue(_) => 400,
            Error::InvalidMethod(_) => 400,
            Error::InvalidRequestBody(_) => 400,
            Error::PayloadTooLarge(_) => 413,
            Error::ResponseSerializationError(_) => 500,
            Error::ConfigurationError(_) => 500,
            Error::InternalServerError(_) => 500,
        }
    }
}
