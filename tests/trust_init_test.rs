// プロセス全体の信頼ポリシー設定の統合テスト
//
// ポリシーはプロセスで一度しか設定できないため、このファイルのテストは1つにまとめる。
use cgi_http::{trust, Error, Request, TrustPolicy, TrustedFields};

fn vars() -> [(&'static str, &'static str); 4] {
    [
        ("REQUEST_URI", "/"),
        ("HTTP_HOST", "example.com"),
        ("REMOTE_ADDR", "127.0.0.1"),
        ("HTTP_X_FORWARDED_FOR", "203.0.113.9, 127.0.0.1"),
    ]
}

#[test]
fn test_global_trust_policy() {
    // 設定前に構築したリクエストは何も信頼しない
    let before = Request::from_cgi(vars(), None).unwrap();
    assert!(!before.is_from_trusted_proxy());
    assert_eq!(before.client_ip().as_deref(), Some("127.0.0.1"));

    let policy = TrustPolicy::new(["loopback"], TrustedFields::FOR).unwrap();
    trust::init(policy).unwrap();
    assert_eq!(trust::current().fields(), TrustedFields::FOR);

    let request = Request::from_cgi(vars(), None).unwrap();
    assert!(request.is_from_trusted_proxy());
    assert_eq!(request.client_ip().as_deref(), Some("203.0.113.9"));
    assert_eq!(request.client_ips(), vec!["203.0.113.9", "127.0.0.1"]);

    // 既に構築済みのリクエストは自身のポリシーを保持する
    assert!(!before.is_from_trusted_proxy());

    let err = trust::init(TrustPolicy::default()).unwrap_err();
    assert!(matches!(err, Error::ConfigurationError(_)));

    // 2回目の設定は反映されない
    let request = Request::from_cgi(vars(), None).unwrap();
    assert_eq!(request.client_ip().as_deref(), Some("203.0.113.9"));
}
