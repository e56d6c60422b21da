//! 共通の基本型とユーティリティ

pub mod headers;
pub mod http;
pub mod utils;
pub mod value;

pub use headers::HeaderBag;
pub use self::http::{content_type, Method, StatusCode};
pub use utils::{get_max_body_size, parse_query_string, percent_decode};
pub use value::Value;
