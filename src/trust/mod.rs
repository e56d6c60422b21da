//! 信頼するリバースプロキシの設定と、転送ヘッダーの採用判定
//!
//! アプリケーション起動時に [`init`] で一度だけプロセス全体のポリシーを設定し、
//! 以降に構築される全ての `Request` がそれを参照する。

pub mod forwarded;
pub mod proxy;

use std::env;
use std::ops::BitOr;
use std::sync::{Arc, OnceLock};

use log::{debug, info};

use crate::error::Error;
pub use forwarded::ForwardedInfo;
pub use proxy::IpMatcher;
use proxy::{compile_ip_matchers, parse_peer};

/// 信頼するプロキシ一覧を指定する環境変数名（カンマ区切り）
pub const TRUSTED_PROXIES_ENV: &str = "CGI_HTTP_TRUSTED_PROXIES";
/// 採用する転送フィールドを指定する環境変数名（カンマ区切り）
pub const TRUSTED_HEADERS_ENV: &str = "CGI_HTTP_TRUSTED_HEADERS";

/// 転送ヘッダーのフィールド
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrustedField {
    For,
    Proto,
    Host,
    Port,
    Prefix,
}

impl TrustedField {
    pub fn bit(self) -> TrustedFields {
        match self {
            TrustedField::For => TrustedFields::FOR,
            TrustedField::Proto => TrustedFields::PROTO,
            TrustedField::Host => TrustedFields::HOST,
            TrustedField::Port => TrustedFields::PORT,
            TrustedField::Prefix => TrustedFields::PREFIX,
        }
    }
}

/// 採用するフィールドのビットマスク
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct TrustedFields(u8);

impl TrustedFields {
    pub const NONE: TrustedFields = TrustedFields(0);
    pub const FOR: TrustedFields = TrustedFields(0b00001);
    pub const PROTO: TrustedFields = TrustedFields(0b00010);
    pub const HOST: TrustedFields = TrustedFields(0b00100);
    pub const PORT: TrustedFields = TrustedFields(0b01000);
    pub const PREFIX: TrustedFields = TrustedFields(0b10000);
    pub const ALL: TrustedFields = TrustedFields(0b11111);

    pub fn bits(self) -> u8 {
        self.0
    }

    /// 未知のビットは捨てる
    pub fn from_bits_truncate(bits: u8) -> Self {
        TrustedFields(bits & Self::ALL.0)
    }

    pub fn contains(self, other: TrustedFields) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    /// `for,proto,host,port,prefix` または `all` 形式の文字列から解釈する
    pub fn parse_list(list: &str) -> Result<Self, Error> {
        let mut fields = TrustedFields::NONE;
        for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            fields = fields
                | match name.to_ascii_lowercase().as_str() {
                    "for" => TrustedFields::FOR,
                    "proto" => TrustedFields::PROTO,
                    "host" => TrustedFields::HOST,
                    "port" => TrustedFields::PORT,
                    "prefix" => TrustedFields::PREFIX,
                    "all" => TrustedFields::ALL,
                    other => {
                        return Err(Error::ConfigurationError(format!(
                            "Unknown trusted header field: {}",
                            other
                        )))
                    }
                };
        }
        Ok(fields)
    }
}

impl BitOr for TrustedFields {
    type Output = TrustedFields;

    fn bitor(self, rhs: TrustedFields) -> TrustedFields {
        TrustedFields(self.0 | rhs.0)
    }
}

impl BitOr<TrustedField> for TrustedFields {
    type Output = TrustedFields;

    fn bitor(self, rhs: TrustedField) -> TrustedFields {
        self | rhs.bit()
    }
}

/// 信頼された転送フィールドの値
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustedValue<'a> {
    For(&'a [String]),
    Proto(&'a str),
    Host(&'a str),
    Port(u16),
    Prefix(&'a str),
}

/// 信頼するプロキシとフィールドの設定
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustPolicy {
    proxies: Vec<IpMatcher>,
    fields: TrustedFields,
}

impl TrustPolicy {
    /// プロキシ一覧（IP、CIDR、名前付き範囲）と採用フィールドから作成
    pub fn new<I, S>(proxies: I, fields: TrustedFields) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            proxies: compile_ip_matchers(proxies)?,
            fields,
        })
    }

    /// 環境変数から作成する
    ///
    /// `CGI_HTTP_TRUSTED_PROXIES` が未設定なら何も信頼しない。
    /// `CGI_HTTP_TRUSTED_HEADERS` が未設定ならフィールドは全て無効。
    pub fn from_env() -> Result<Self, Error> {
        let proxies = env::var(TRUSTED_PROXIES_ENV).unwrap_or_default();
        let fields = match env::var(TRUSTED_HEADERS_ENV) {
            Ok(list) => TrustedFields::parse_list(&list)?,
            Err(_) => TrustedFields::NONE,
        };
        let policy = Self::new(proxies.split(','), fields)?;
        debug!(
            "Trust policy from environment: {} proxy entries, fields={:#07b}",
            policy.proxies.len(),
            fields.bits()
        );
        Ok(policy)
    }

    pub fn fields(&self) -> TrustedFields {
        self.fields
    }

    pub fn proxies(&self) -> &[IpMatcher] {
        &self.proxies
    }

    /// 接続元が信頼するプロキシかどうか
    pub fn is_trusted_proxy(&self, peer: &str) -> bool {
        if self.proxies.is_empty() {
            return false;
        }
        match parse_peer(peer) {
            Some(ip) => self.proxies.iter().any(|m| m.matches(&ip)),
            None => false,
        }
    }

    /// 接続元が信頼でき、かつフィールドが有効な場合のみ転送ヘッダーの値を返す
    pub fn resolve<'a>(
        &self,
        peer: &str,
        field: TrustedField,
        info: &'a ForwardedInfo,
    ) -> Option<TrustedValue<'a>> {
        if !self.fields.contains(field.bit()) || !self.is_trusted_proxy(peer) {
            return None;
        }
        match field {
            TrustedField::For if !info.forwarded_for.is_empty() => {
                Some(TrustedValue::For(&info.forwarded_for))
            }
            TrustedField::Proto => info.proto.as_deref().map(TrustedValue::Proto),
            TrustedField::Host => info.host.as_deref().map(TrustedValue::Host),
            TrustedField::Port => info.port.filter(|p| *p != 0).map(TrustedValue::Port),
            TrustedField::Prefix => info.prefix.as_deref().map(TrustedValue::Prefix),
            TrustedField::For => None,
        }
    }
}

static GLOBAL_POLICY: OnceLock<Arc<TrustPolicy>> = OnceLock::new();

/// プロセス全体のポリシーを設定する（起動時に一度だけ）
pub fn init(policy: TrustPolicy) -> Result<(), Error> {
    GLOBAL_POLICY
        .set(Arc::new(policy))
        .map_err(|_| Error::ConfigurationError("Trust policy is already initialized".to_string()))?;
    info!("Trust policy initialized");
    Ok(())
}

/// 現在のプロセス全体のポリシー（未設定なら何も信頼しないポリシー）
pub fn current() -> Arc<TrustPolicy> {
    static EMPTY: OnceLock<Arc<TrustPolicy>> = OnceLock::new();
    GLOBAL_POLICY
        .get()
        .unwrap_or_else(|| EMPTY.get_or_init(|| Arc::new(TrustPolicy::default())))
        .clone()
}
