//! CGIメイン実行ロジック

use log::{debug, error, info};

use super::response::{error_response, write_response};
use crate::error::Error;
use crate::request::Request;
use crate::response::Response;

/// CGI環境からリクエストを構築し、ハンドラのレスポンスを標準出力へ書き出す
///
/// リクエストの構築やハンドラが失敗した場合は、エラーに対応するステータスの
/// 平文レスポンスを出力する。書き出しに失敗した場合のみ `Err` を返す。
pub fn run<F>(handler: F) -> Result<(), Error>
where
    F: FnOnce(&Request) -> Result<Response, Error>,
{
    let response = match Request::from_env() {
        Ok(request) => {
            debug!("Processing CGI request: {}", request.request_uri());
            handle(&request, handler)
        }
        Err(err) => {
            error!("Failed to build request from CGI environment: {}", err);
            error_response(&err)
        }
    };

    write_response(response)?;
    info!("CGI request processed");
    Ok(())
}

/// ハンドラを呼び出し、エラーをレスポンスへ変換する
pub fn handle<F>(request: &Request, handler: F) -> Response
where
    F: FnOnce(&Request) -> Result<Response, Error>,
{
    match handler(request) {
        Ok(response) => response,
        Err(err) => {
            error!("Handler returned error at {}: {}", request.request_uri(), err);
            error_response(&err)
        }
    }
}
