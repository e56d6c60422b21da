//! CGI環境での実行をサポートするモジュール
//!
//! 環境変数と標準入力からリクエストを構築し、
//! 標準出力にCGIレスポンスフォーマットで出力するための機能を提供します。

pub mod core;
pub mod redaction;
pub mod request;
pub mod response;
pub mod validation;

pub use self::core::{handle, run};

#[cfg(test)]
mod tests;
