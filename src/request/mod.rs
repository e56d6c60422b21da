//! 正規化されたHTTPリクエスト
//!
//! サーバー変数とヘッダーから、スキーム・ホスト・ポート・ベースURL・パス情報などを
//! 必要になった時点で計算し、結果をキャッシュする。
//! 信頼するプロキシからのリクエストであれば、許可されたフィールドに限り
//! 転送ヘッダーの値を採用する。

pub mod builder;
pub mod host;
pub mod target;

use std::cell::OnceCell;
use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, warn};

use crate::common::headers::names;
use crate::common::utils::normalize_query_string;
use crate::common::{HeaderBag, Method, Value};
use crate::error::Error;
use crate::pool::server::header_name_for;
use crate::pool::{AttributePool, InputPool, ServerPool};
use crate::trust::{self, ForwardedInfo, TrustPolicy, TrustedField, TrustedValue};

pub use builder::RequestBuilder;

/// `Request` を組み立てるための素材
#[derive(Debug, Clone, Default)]
pub struct RequestParts {
    pub query: IndexMap<String, Value>,
    pub body: IndexMap<String, Value>,
    pub attributes: IndexMap<String, Value>,
    pub cookies: IndexMap<String, Value>,
    pub files: IndexMap<String, Value>,
    pub server: ServerPool,
    pub content: Option<Vec<u8>>,
}

/// 遅延計算した値のキャッシュ
#[derive(Debug, Clone, Default)]
struct Memo {
    method: OnceCell<Method>,
    host: OnceCell<String>,
    port: OnceCell<u16>,
    request_uri: OnceCell<String>,
    base_url_real: OnceCell<String>,
    base_path: OnceCell<String>,
    path_info: OnceCell<String>,
}

/// HTTPリクエスト
#[derive(Debug, Clone)]
pub struct Request {
    /// クエリパラメータ
    pub query: InputPool,
    /// ボディパラメータ（フォーム / JSON）
    pub body: InputPool,
    /// ルーティング等で付与される属性
    pub attributes: AttributePool,
    pub cookies: InputPool,
    /// アップロードファイル情報（内容は解釈しない）
    pub files: IndexMap<String, Value>,
    server: ServerPool,
    headers: HeaderBag,
    forwarded: ForwardedInfo,
    trust: Arc<TrustPolicy>,
    content: Option<Vec<u8>>,
    memo: Memo,
}

impl Default for Request {
    fn default() -> Self {
        Self::from_parts(RequestParts::default())
    }
}

impl Request {
    /// 空のリクエストを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 素材からリクエストを作成する
    ///
    /// ヘッダーはサーバー変数の `HTTP_*` と `CONTENT_*` から構築し、
    /// 信頼ポリシーはプロセス全体の設定を使う。
    pub fn from_parts(parts: RequestParts) -> Self {
        let headers: HeaderBag = parts.server.headers().into_iter().collect();
        let forwarded = ForwardedInfo::from_headers(&headers);
        debug!(
            "Request constructed: {} server variables, {} headers",
            parts.server.count(),
            headers.len()
        );

        Self {
            query: InputPool::new(parts.query),
            body: InputPool::new(parts.body),
            attributes: AttributePool::new(parts.attributes),
            cookies: InputPool::new(parts.cookies),
            files: parts.files,
            server: parts.server,
            headers,
            forwarded,
            trust: trust::current(),
            content: parts.content,
            memo: Memo::default(),
        }
    }

    /// URLからリクエストを合成する（テストやサブリクエスト向け）
    pub fn create(method: Method, url: &str) -> Self {
        RequestBuilder::new(method, url).build()
    }

    /// 合成用のビルダーを作成
    pub fn builder(method: Method, url: &str) -> RequestBuilder {
        RequestBuilder::new(method, url)
    }

    /// 信頼ポリシーを差し替える
    pub fn with_trust_policy(mut self, policy: Arc<TrustPolicy>) -> Self {
        self.trust = policy;
        self.memo = Memo::default();
        self
    }

    pub fn trust_policy(&self) -> &Arc<TrustPolicy> {
        &self.trust
    }

    pub fn server(&self) -> &ServerPool {
        &self.server
    }

    pub fn headers(&self) -> &HeaderBag {
        &self.headers
    }

    pub fn forwarded(&self) -> &ForwardedInfo {
        &self.forwarded
    }

    /// サーバー変数を設定する
    ///
    /// ヘッダーに対応する変数（`HTTP_*` 等）はヘッダーにも反映する。
    /// 計算済みの値は破棄される。
    pub fn set_server(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(name) = header_name_for(key) {
            self.headers.set(&name, value.clone());
            self.forwarded = ForwardedInfo::from_headers(&self.headers);
        }
        self.server.set(key, value);
        self.memo = Memo::default();
    }

    pub fn remove_server(&mut self, key: &str) -> Option<String> {
        if let Some(name) = header_name_for(key) {
            self.headers.remove(&name);
            self.forwarded = ForwardedInfo::from_headers(&self.headers);
        }
        self.memo = Memo::default();
        self.server.remove(key)
    }

    /// ヘッダーを設定する（転送情報を再構築し、計算済みの値を破棄する）
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.set(name, value);
        self.forwarded = ForwardedInfo::from_headers(&self.headers);
        self.memo = Memo::default();
    }

    pub fn remove_header(&mut self, name: &str) -> Option<String> {
        let removed = self.headers.remove(name);
        self.forwarded = ForwardedInfo::from_headers(&self.headers);
        self.memo = Memo::default();
        removed
    }

    /// HTTPメソッド（`REQUEST_METHOD`、未設定ならGET）
    pub fn method(&self) -> Result<Method, Error> {
        if let Some(method) = self.memo.method.get() {
            return Ok(*method);
        }
        let method: Method = self.server.get_str("REQUEST_METHOD").unwrap_or("GET").parse()?;
        let _ = self.memo.method.set(method);
        Ok(method)
    }

    /// メソッドを上書きする（`REQUEST_METHOD` も更新）
    pub fn set_method(&mut self, method: Method) {
        self.server.set("REQUEST_METHOD", method.as_str());
        self.memo.method = OnceCell::from(method);
    }

    /// いずれかのメソッドに一致するかどうか
    pub fn is_method(&self, methods: &[Method]) -> bool {
        match self.method() {
            Ok(method) => methods.contains(&method),
            Err(_) => false,
        }
    }

    /// 生のリクエストボディ
    pub fn content(&self) -> &[u8] {
        self.content.as_deref().unwrap_or_default()
    }

    /// Content-Typeのメディアタイプ（パラメータを除く、小文字）
    pub fn content_type(&self) -> Option<String> {
        self.headers
            .get_non_empty(names::CONTENT_TYPE)
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_ascii_lowercase())
            .filter(|v| !v.is_empty())
    }

    /// 属性、クエリ、ボディの順に値を探す
    pub fn get(&self, name: &str) -> Result<Option<&Value>, Error> {
        if let Some(value) = self.attributes.get(name) {
            return Ok(Some(value));
        }
        if let Some(value) = self.query.get(name)? {
            return Ok(Some(value));
        }
        self.body.get(name)
    }

    /// 接続元が信頼するプロキシかどうか
    pub fn is_from_trusted_proxy(&self) -> bool {
        self.trust.is_trusted_proxy(self.remote_addr())
    }

    /// 信頼できる場合のみ転送ヘッダーの値を返す
    pub fn trusted_value(&self, field: TrustedField) -> Option<TrustedValue<'_>> {
        self.trust.resolve(self.remote_addr(), field, &self.forwarded)
    }

    fn trusted_str(&self, field: TrustedField) -> Option<&str> {
        match self.trusted_value(field)? {
            TrustedValue::Proto(s) | TrustedValue::Host(s) | TrustedValue::Prefix(s) => {
                Some(s).filter(|s| !s.is_empty())
            }
            _ => None,
        }
    }

    fn remote_addr(&self) -> &str {
        self.server.get_str("REMOTE_ADDR").unwrap_or("")
    }

    /// クライアントIPの一覧（信頼できる転送ヘッダーがあればその内容）
    pub fn client_ips(&self) -> Vec<String> {
        if let Some(TrustedValue::For(ips)) = self.trusted_value(TrustedField::For) {
            return ips.to_vec();
        }
        match self.server.get_str("REMOTE_ADDR") {
            Some(ip) => vec![ip.to_string()],
            None => Vec::new(),
        }
    }

    /// オリジンに最も近いクライアントIP
    pub fn client_ip(&self) -> Option<String> {
        self.client_ips().into_iter().next()
    }

    /// HTTPS経由かどうか
    pub fn is_secure(&self) -> bool {
        if let Some(proto) = self.trusted_str(TrustedField::Proto) {
            return proto == "https";
        }
        match self.server.get_non_empty("HTTPS") {
            Some(https) => !https.eq_ignore_ascii_case("off"),
            None => false,
        }
    }

    pub fn scheme(&self) -> &'static str {
        if self.is_secure() {
            "https"
        } else {
            "http"
        }
    }

    /// 正規化されたホスト名（ポートを含まない）
    pub fn host(&self) -> Result<String, Error> {
        if let Some(host) = self.memo.host.get() {
            return Ok(host.clone());
        }
        let host = host::normalize_host(self.raw_host()).map_err(|e| {
            warn!("Rejected host value: {}", e);
            e
        })?;
        let _ = self.memo.host.set(host.clone());
        Ok(host)
    }

    fn raw_host(&self) -> &str {
        self.trusted_str(TrustedField::Host)
            .or_else(|| self.headers.get_non_empty(names::HOST))
            .or_else(|| self.server.get_non_empty("SERVER_NAME"))
            .or_else(|| self.server.get_non_empty("SERVER_ADDR"))
            .unwrap_or("")
    }

    /// ポート番号
    ///
    /// 信頼できる転送ポート、ホスト値に含まれるポート（なければスキームの既定値）、
    /// `SERVER_PORT` の順に決定する。
    pub fn port(&self) -> u16 {
        *self.memo.port.get_or_init(|| {
            if let Some(TrustedValue::Port(port)) = self.trusted_value(TrustedField::Port) {
                return port;
            }
            let authority = self
                .trusted_str(TrustedField::Host)
                .or_else(|| self.headers.get_non_empty(names::HOST));
            if let Some(authority) = authority {
                return host::port_from_host(authority)
                    .unwrap_or(if self.is_secure() { 443 } else { 80 });
            }
            self.server
                .get_str("SERVER_PORT")
                .and_then(|p| p.trim().parse::<u16>().ok())
                .unwrap_or(0)
        })
    }

    /// ホスト名（既定ポート以外ならポート付き）
    pub fn http_host(&self) -> Result<String, Error> {
        let host = self.host()?;
        let port = self.port();
        match (self.scheme(), port) {
            ("http", 80) | ("https", 443) => Ok(host),
            _ => Ok(format!("{}:{}", host, port)),
        }
    }

    pub fn scheme_and_http_host(&self) -> Result<String, Error> {
        Ok(format!("{}://{}", self.scheme(), self.http_host()?))
    }

    /// 正規化したクエリ文字列付きの完全なURL
    pub fn url(&self) -> Result<String, Error> {
        let mut url = format!(
            "{}{}{}",
            self.scheme_and_http_host()?,
            self.base_url(),
            self.path_info()
        );
        if let Some(query) = self.query_string().filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(&query);
        }
        Ok(url)
    }

    /// 正規化したクエリ文字列（`QUERY_STRING` がなければ `None`）
    pub fn query_string(&self) -> Option<String> {
        self.server.get_str("QUERY_STRING").map(normalize_query_string)
    }

    /// 指定パスの絶対URLを生成する
    pub fn generate_url_for_path(&self, path: &str) -> Result<String, Error> {
        Ok(format!("{}{}{}", self.scheme_and_http_host()?, self.base_url(), path))
    }

    pub fn script_name(&self) -> &str {
        self.server.get_str("SCRIPT_NAME").unwrap_or("")
    }

    fn script_filename(&self) -> &str {
        self.server.get_str("SCRIPT_FILENAME").unwrap_or("")
    }

    /// フラグメントとスキーム・ホストを除いたリクエストURI
    pub fn request_uri(&self) -> &str {
        self.memo
            .request_uri
            .get_or_init(|| target::fetch_request_uri(self.server.get_str("REQUEST_URI")))
    }

    /// プロキシのプレフィックスを含まないベースURL
    pub fn base_url_real(&self) -> &str {
        self.memo.base_url_real.get_or_init(|| {
            target::resolve_base_url_real(self.request_uri(), self.script_name(), self.script_filename())
        })
    }

    /// ベースURL（信頼できる転送プレフィックスを先頭に付与）
    pub fn base_url(&self) -> String {
        let prefix = self
            .trusted_str(TrustedField::Prefix)
            .map(|p| p.trim_end_matches('/'))
            .unwrap_or("");
        format!("{}{}", prefix, self.base_url_real())
    }

    /// ベースパス（スクリプトファイル名を含まないディレクトリ部分）
    pub fn base_path(&self) -> &str {
        self.memo
            .base_path
            .get_or_init(|| target::base_path(&self.base_url(), self.script_filename()))
    }

    /// ベースURL以降のパス（`/` から始まる）
    pub fn path_info(&self) -> &str {
        self.memo
            .path_info
            .get_or_init(|| target::path_info(self.request_uri(), self.base_url_real()))
    }
}
