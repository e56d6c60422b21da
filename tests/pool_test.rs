// パラメータプール（Pool / InputPool / AttributePool）の統合テスト
use cgi_http::pool::params;
use cgi_http::{AttributePool, Error, Filter, InputPool, Pool, Value};

#[test]
fn test_add_and_replace() {
    let mut pool: Pool<Value> = Pool::new(params([("x", 1), ("y", 2)]));

    pool.add(params([("x", 0)]));
    assert_eq!(pool.all(), &params([("x", 0), ("y", 2)]));
    assert_eq!(pool.keys(), vec!["x", "y"]);

    pool.replace(params([("foo", "bar")]));
    assert_eq!(pool.all(), &params([("foo", "bar")]));
    assert_eq!(pool.count(), 1);
}

#[test]
fn test_get_default_and_remove() {
    let mut pool: Pool<Value> = Pool::default();
    assert_eq!(pool.get_or("foo", Value::from("bar")), Value::from("bar"));

    pool.set("foo", "baz");
    assert!(pool.has("foo"));
    assert_eq!(pool.remove("foo"), Some(Value::from("baz")));
    assert!(!pool.has("foo"));
    assert_eq!(pool.get("foo"), None);
}

#[test]
fn test_filter() {
    let mut pool: Pool<Value> = Pool::default();
    pool.set("valid_email", "foo@bar.test");
    pool.set("invalid_email", "foo");
    pool.set("ids", vec!["1", "2", "x"]);

    assert_eq!(pool.filter("undefined_key", None, &Filter::Email), None);
    assert_eq!(pool.filter("invalid_email", None, &Filter::Email), None);
    assert_eq!(
        pool.filter("valid_email", None, &Filter::Email),
        Some(Value::from("foo@bar.test"))
    );
    assert_eq!(pool.filter("ids", None, &Filter::Int), None);
    assert_eq!(
        pool.filter("page", Some(Value::from("3")), &Filter::Int),
        Some(Value::Int(3))
    );
}

#[test]
fn test_input_pool_accepts_scalars_and_arrays() {
    let mut pool = InputPool::default();
    pool.set("name", "bob").unwrap();
    pool.set("tags", vec!["a", "b"]).unwrap();
    pool.set("missing", Value::Null).unwrap();

    assert_eq!(pool.get("name"), Ok(Some(&Value::from("bob"))));
    assert_eq!(pool.get("tags"), Ok(Some(&Value::from(vec!["a", "b"]))));
    assert_eq!(pool.get_or("page", 1).unwrap(), Value::from(1));
}

#[test]
fn test_input_pool_rejects_objects() {
    let mut pool = InputPool::default();

    assert!(matches!(pool.set("obj", Value::object(1u8)), Err(Error::InvalidValue(_))));
    assert!(matches!(
        pool.add(params([("nested", Value::List(vec![Value::object(1u8)]))])),
        Err(Error::InvalidValue(_))
    ));
    assert!(matches!(pool.get_or("obj", Value::object(1u8)), Err(Error::InvalidValue(_))));
    assert!(pool.is_empty());
}

#[test]
fn test_input_pool_get_checks_stored_values() {
    let pool = InputPool::new(params([("obj", Value::object("raw"))]));
    assert!(matches!(pool.get("obj"), Err(Error::InvalidValue(_))));
}

#[test]
fn test_attribute_pool_get_int() {
    let pool = AttributePool::new(params([
        ("foo", Value::from(999)),
        ("bar", Value::from("999")),
        ("baz", Value::from("test")),
    ]));

    assert_eq!(pool.get_int("foo", 0), 999);
    assert_eq!(pool.get_int("bar", 0), 999);
    assert_eq!(pool.get_int("baz", 0), 0);
    assert_eq!(pool.get_int("missing", 7), 7);
}

#[test]
fn test_attribute_pool_get_boolean() {
    let pool = AttributePool::new(params([
        ("foo", Value::from(999)),
        ("bar", Value::from("no")),
        ("baz", Value::from("yes")),
    ]));

    assert!(!pool.get_boolean("foo", true));
    assert!(!pool.get_boolean("bar", true));
    assert!(pool.get_boolean("baz", false));
    assert!(pool.get_boolean("missing", true));
}
