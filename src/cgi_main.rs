//! CGI環境でのエントリポイント
//!
//! 解決したリクエストの構成（ベースURL、パス情報、ホスト等）をJSONで返す。

use env_logger::Env;
use log::{error, info, warn};
use serde_json::json;

use cgi_http::{cgi, trust, Request, Response, TrustPolicy};

fn describe(request: &Request) -> Result<Response, cgi_http::Error> {
    let body = json!({
        "method": request.method()?.as_str(),
        "scheme": request.scheme(),
        "host": request.host()?,
        "port": request.port(),
        "http_host": request.http_host()?,
        "url": request.url()?,
        "request_uri": request.request_uri(),
        "base_url": request.base_url(),
        "base_path": request.base_path(),
        "path_info": request.path_info(),
        "script_name": request.script_name(),
        "query_string": request.query_string(),
        "content_type": request.content_type(),
        "client_ip": request.client_ip(),
        "client_ips": request.client_ips(),
        "from_trusted_proxy": request.is_from_trusted_proxy(),
        "forwarded": request.forwarded(),
        "query": request.query.all(),
        "body": request.body.all(),
        "cookies": request.cookies.all(),
    });
    Response::json(&body, None)
}

fn main() {
    // CGIでは標準出力がHTTPレスポンスとなるため、ログは標準エラー出力に出力する
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    info!("Starting cgi-http-info");

    match TrustPolicy::from_env() {
        Ok(policy) => {
            if let Err(err) = trust::init(policy) {
                warn!("{}", err);
            }
        }
        Err(err) => warn!("Ignoring trust configuration: {}", err),
    }

    if let Err(err) = cgi::run(describe) {
        error!("Error running CGI application: {:?}", err);
        std::process::exit(1);
    }
}
