//! 信頼するプロキシアドレスの照合

use std::net::IpAddr;

use ipnet::IpNet;

use crate::error::Error;

/// 単一IPまたはネットワーク範囲
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpMatcher {
    Exact(IpAddr),
    Net(IpNet),
}

impl IpMatcher {
    pub fn matches(&self, ip: &IpAddr) -> bool {
        match self {
            IpMatcher::Exact(x) => x == ip,
            IpMatcher::Net(n) => n.contains(ip),
        }
    }
}

/// 名前付きの範囲（大文字小文字は区別しない）
///
/// `private_v4`, `private`, `loopback`, `link_local`
fn macro_nets(name: &str) -> Option<Vec<IpNet>> {
    let cidrs: &[&str] = match name.trim().to_ascii_lowercase().as_str() {
        "private_v4" => &["10.0.0.0/8", "172.16.0.0/12", "192.168.0.0/16"],
        "private" => &["10.0.0.0/8", "172.16.0.0/12", "192.168.0.0/16", "fc00::/7"],
        "loopback" => &["127.0.0.0/8", "::1/128"],
        "link_local" => &["169.254.0.0/16", "fe80::/10"],
        _ => return None,
    };
    Some(cidrs.iter().filter_map(|c| c.parse::<IpNet>().ok()).collect())
}

/// 設定値の一覧を照合器へ変換する
///
/// 解釈できないエントリは `ConfigurationError`。
pub fn compile_ip_matchers<I, S>(entries: I) -> Result<Vec<IpMatcher>, Error>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = Vec::new();
    for raw in entries {
        let s = raw.as_ref().trim();
        if s.is_empty() {
            continue;
        }
        if let Ok(ip) = s.parse::<IpAddr>() {
            out.push(IpMatcher::Exact(ip));
            continue;
        }
        if let Ok(net) = s.parse::<IpNet>() {
            out.push(IpMatcher::Net(net));
            continue;
        }
        match macro_nets(s) {
            Some(nets) => out.extend(nets.into_iter().map(IpMatcher::Net)),
            None => {
                return Err(Error::ConfigurationError(format!(
                    "Invalid trusted proxy entry: {}",
                    s
                )))
            }
        }
    }
    Ok(out)
}

/// 接続元アドレスを解釈する（`[::1]` のような角括弧表記も受け付ける）
pub fn parse_peer(peer: &str) -> Option<IpAddr> {
    let peer = peer.trim();
    let peer = peer
        .strip_prefix('[')
        .and_then(|p| p.strip_suffix(']'))
        .unwrap_or(peer);
    peer.parse::<IpAddr>().ok()
}
