//! cgi-http: CGI系ゲートウェイ向けの正規化されたHTTPリクエスト/レスポンス
//!
//! サーバー変数からベースURL・パス情報・ホスト・ポートを安全に求め、
//! 信頼するリバースプロキシの転送ヘッダーをフィールド単位で採用する。

pub mod cgi;
pub mod common;
pub mod error;
pub mod pool;
pub mod request;
pub mod response;
pub mod trust;

pub use common::{content_type, HeaderBag, Method, StatusCode, Value};
pub use error::Error;
pub use pool::{AttributePool, Filter, InputPool, Pool, ServerPool};
pub use request::{Request, RequestBuilder, RequestParts};
pub use response::{Body, Response};
pub use trust::{ForwardedInfo, TrustPolicy, TrustedField, TrustedFields, TrustedValue};
