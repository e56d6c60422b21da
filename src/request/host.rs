//! ホスト名の正規化と検証

use crate::error::Error;

/// ホスト値を正規化して検証する
///
/// 前後の空白を除去して小文字化し、末尾の `:ポート` を取り除く。
/// 英数字とハイフンのラベル（各ラベルの後に `.` をひとつまで許可）、
/// または角括弧で囲まれたIPv6リテラルのみを受け付ける。
/// 入力長に対して線形時間で終わる。
pub fn normalize_host(raw: &str) -> Result<String, Error> {
    let host = strip_port(raw.trim()).to_ascii_lowercase();

    if host.is_empty() || is_bracketed_ipv6(&host) || is_label_sequence(&host) {
        Ok(host)
    } else {
        Err(Error::InvalidHost(host))
    }
}

/// `host:port` 形式の末尾ポートを取り出す
pub fn port_from_host(host: &str) -> Option<u16> {
    let (_, port) = host.rsplit_once(':')?;
    if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    port.parse::<u16>().ok()
}

fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((head, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => head,
        _ => host,
    }
}

fn is_bracketed_ipv6(host: &str) -> bool {
    match host.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
        Some(inner) => {
            !inner.is_empty() && inner.bytes().all(|b| b == b':' || b == b'.' || b.is_ascii_hexdigit())
        }
        None => false,
    }
}

fn is_label_sequence(host: &str) -> bool {
    let mut in_label = false;
    for b in host.bytes() {
        match b {
            b'a'..=b'z' | b'0'..=b'9' | b'-' => in_label = true,
            b'.' if in_label => in_label = false,
            _ => return false,
        }
    }
    true
}
