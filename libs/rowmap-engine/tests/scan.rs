use std::str::FromStr;

use rowmap_api::{Array, ErrorKind, NullInt64, Record, ResultSet, SourceError, Value};
use rowmap_engine::{MapError, Mapper, MapperConfig, NameErrorKind, ScanOutcome};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

#[derive(Debug, Default, PartialEq, Record)]
struct FooTest {
    i1: i64,
    i2: Option<i64>,
    s1: String,
    s2: Option<String>,
    f1: Decimal,
    f2: Option<Decimal>,
    ff1: f64,
    ff2: Option<f64>,
    ia1: Vec<i64>,
    ia2: Vec<Option<i64>>,
    ia3: Option<Vec<i64>>,
    sa1: Vec<String>,
    sa2: Vec<Option<String>>,
    sa3: Option<Vec<String>>,
    faf1: Vec<f64>,
    faf2: Vec<Option<f64>>,
    faf3: Option<Vec<f64>>,
}

const FOO_COLUMNS: [&str; 17] = [
    "i1", "i2", "s1", "s2", "f1", "f2", "ff1", "ff2", "ia1", "ia2", "ia3", "sa1", "sa2", "sa3",
    "faf1", "faf2", "faf3",
];

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn text_array(items: &[&str]) -> Value {
    Value::Array(Array::Text(items.iter().map(|s| s.to_string()).collect()))
}

fn foo_row_a() -> Vec<Value> {
    vec![
        Value::Int32(1),
        Value::Int32(2),
        Value::from("a"),
        Value::from("b"),
        Value::Decimal(dec("5.2")),
        Value::Decimal(dec("5.4")),
        Value::Float64(6.1),
        Value::Float64(6.2),
        Value::Array(Array::Int(vec![1, 2])),
        Value::Array(Array::Int(vec![3, 4])),
        Value::Array(Array::Int(vec![6, 7])),
        text_array(&["foo", "bar"]),
        text_array(&["moshe", "haim"]),
        text_array(&["moshe2", "haim2"]),
        Value::Array(Array::Float(vec![1.123, 2.342])),
        Value::Array(Array::Float(vec![63.233, 6.245])),
        Value::Array(Array::Float(vec![2.222, 54.32])),
    ]
}

fn foo_row_b() -> Vec<Value> {
    vec![
        Value::Int32(10),
        Value::Null,
        Value::from("c"),
        Value::Null,
        Value::Decimal(dec("1.5")),
        Value::Null,
        Value::Float64(0.5),
        Value::Null,
        Value::Array(Array::Int(vec![])),
        Value::Array(Array::Int(vec![8])),
        Value::Null,
        text_array(&["x"]),
        text_array(&[]),
        Value::Null,
        Value::Array(Array::Float(vec![])),
        Value::Array(Array::Float(vec![0.25])),
        Value::Null,
    ]
}

fn expected_a() -> FooTest {
    FooTest {
        i1: 1,
        i2: Some(2),
        s1: "a".into(),
        s2: Some("b".into()),
        f1: dec("5.2"),
        f2: Some(dec("5.4")),
        ff1: 6.1,
        ff2: Some(6.2),
        ia1: vec![1, 2],
        ia2: vec![Some(3), Some(4)],
        ia3: Some(vec![6, 7]),
        sa1: vec!["foo".into(), "bar".into()],
        sa2: vec![Some("moshe".into()), Some("haim".into())],
        sa3: Some(vec!["moshe2".into(), "haim2".into()]),
        faf1: vec![1.123, 2.342],
        faf2: vec![Some(63.233), Some(6.245)],
        faf3: Some(vec![2.222, 54.32]),
    }
}

fn expected_b() -> FooTest {
    FooTest {
        i1: 10,
        s1: "c".into(),
        f1: dec("1.5"),
        ff1: 0.5,
        ia2: vec![Some(8)],
        sa1: vec!["x".into()],
        faf2: vec![Some(0.25)],
        ..FooTest::default()
    }
}

#[test]
fn basic_types_in_struct() {
    let mut rs = ResultSet::new(FOO_COLUMNS).row(foo_row_a());
    let mut bar = FooTest::default();
    let outcome = Mapper::default().query(&mut rs, &mut bar).unwrap();
    assert_eq!(outcome, ScanOutcome { rows: 1, empty: false });
    assert_eq!(bar, expected_a());
}

#[test]
fn basic_types_in_struct_in_vec() {
    let mut rs = ResultSet::new(FOO_COLUMNS)
        .row(foo_row_a())
        .row(foo_row_b());
    let mut bar: Vec<FooTest> = Vec::new();
    let outcome = rowmap_engine::query(&mut rs, &mut bar).unwrap();
    assert_eq!(outcome.rows, 2);
    assert_eq!(bar, vec![expected_a(), expected_b()]);
}

#[test]
fn optional_fields_are_allocated_once_per_destination() {
    let mut rs = ResultSet::new(["i2", "s2"]).row(vec![Value::Int32(5), Value::from("z")]);
    let mut bar = FooTest::default();
    Mapper::default().query(&mut rs, &mut bar).unwrap();
    assert_eq!(bar.i2, Some(5));
    assert_eq!(bar.s2.as_deref(), Some("z"));
    // Untouched optional fields stay unallocated.
    assert!(bar.f2.is_none());
    assert!(bar.ia3.is_none());
}

#[derive(Debug, Default, PartialEq, Record)]
struct Cocktail {
    name: String,
    based_on: Vec<String>,
}

#[test]
fn json_array_in_text_column() {
    let mut rs = ResultSet::new(["name", "based_on"])
        .row(vec![Value::from("foo"), Value::from(r#"["Vodka"]"#)]);
    let mut out: Vec<Cocktail> = Vec::new();
    rowmap_engine::query(&mut rs, &mut out).unwrap();
    assert_eq!(
        out,
        vec![Cocktail {
            name: "foo".into(),
            based_on: vec!["Vodka".into()],
        }]
    );
}

#[derive(Debug, Default, PartialEq, Record)]
struct Profile {
    name: String,
    is_img_verified: bool,
    profile_dir: String,
}

#[derive(Debug, Default, PartialEq, Record)]
struct Post {
    id: i64,
    user: Option<Box<Profile>>,
}

#[test]
fn map_column_into_boxed_record() {
    let user = Value::from(serde_json::json!({
        "name": "dj. ufk",
        "is_img_verified": false,
        "profile_dir": "moshe",
    }));
    let mut rs = ResultSet::new(["id", "user"]).row(vec![Value::Int64(3), user]);
    let mut post = Post::default();
    Mapper::default().query(&mut rs, &mut post).unwrap();
    assert_eq!(
        post,
        Post {
            id: 3,
            user: Some(Box::new(Profile {
                name: "dj. ufk".into(),
                is_img_verified: false,
                profile_dir: "moshe".into(),
            })),
        }
    );
}

fn two_rows() -> ResultSet {
    ResultSet::new(["n"])
        .row(vec![Value::Int64(1)])
        .row(vec![Value::Int64(2)])
}

#[test]
fn single_destination_keeps_last_row_but_exactly_one_fails() {
    let mapper = Mapper::default();

    let mut n = 0i64;
    let outcome = mapper.query(&mut two_rows(), &mut n).unwrap();
    assert_eq!(n, 2);
    assert_eq!(outcome.rows, 2);

    let mut n = 0i64;
    let err = mapper.query_one(&mut two_rows(), &mut n).unwrap_err();
    assert!(matches!(err, MapError::TooManyRows));
    assert_eq!(n, 1);
}

#[test]
fn configured_fail_policy_applies_to_query() {
    let config = MapperConfig::parse(r#"multi_row = "fail""#).unwrap();
    let mapper = Mapper::new(config);
    let mut n = 0i64;
    let err = mapper.query(&mut two_rows(), &mut n).unwrap_err();
    assert!(matches!(err, MapError::TooManyRows));
}

#[test]
fn empty_result_is_flagged_not_failed() {
    let mapper = Mapper::default();
    let mut n = 0i64;
    let outcome = mapper.query(&mut ResultSet::new(["n"]), &mut n).unwrap();
    assert_eq!(outcome, ScanOutcome { rows: 0, empty: true });
    assert_eq!(n, 0);

    let outcome = mapper.query_one(&mut ResultSet::new(["n"]), &mut n).unwrap();
    assert!(outcome.empty);
}

#[derive(Debug, Default, Record)]
struct Price {
    amount: f64,
}

#[test]
fn decimal_into_f64_is_bit_identical() {
    let d = dec("123.456789");
    let mut rs = ResultSet::new(["amount"]).row(vec![Value::Decimal(d)]);
    let mut price = Price::default();
    Mapper::default().query(&mut rs, &mut price).unwrap();
    assert_eq!(price.amount.to_bits(), d.to_f64().unwrap().to_bits());
}

#[derive(Debug, Default, PartialEq, Record)]
struct Tagged {
    n: i64,
    tags: Vec<String>,
}

#[test]
fn nested_value_into_wrong_shape_is_a_shape_error() {
    let mut rs = ResultSet::new(["n"]).row(vec![Value::List(vec![Value::Int64(1), Value::Int64(2)])]);
    let mut dest = Tagged::default();
    let err = Mapper::default().query(&mut rs, &mut dest).unwrap_err();
    assert!(matches!(err, MapError::Shape(_)), "{err:?}");

    let mut rs = ResultSet::new(["tags"]).row(vec![Value::Map(vec![("a".into(), Value::from("b"))])]);
    let err = Mapper::default().query(&mut rs, &mut dest).unwrap_err();
    assert!(matches!(err, MapError::Shape(_)), "{err:?}");
    assert!(dest.tags.is_empty());
}

#[test]
fn plain_text_into_json_field() {
    #[derive(Debug, Default, Record)]
    struct Note {
        body: serde_json::Value,
    }

    let mut rs = ResultSet::new(["body"]).row(vec![Value::from("hello")]);
    let mut note = Note::default();
    Mapper::default().query(&mut rs, &mut note).unwrap();
    assert_eq!(note.body, serde_json::json!("hello"));
}

#[test]
fn stale_sequence_elements_are_dropped() {
    let mut rs = ResultSet::new(["n"]).row(vec![Value::Int64(1)]);
    let mut out: Vec<i64> = vec![9, 9, 9];
    let outcome = Mapper::default().query(&mut rs, &mut out).unwrap();
    assert_eq!(outcome.rows, 1);
    assert_eq!(out, vec![1]);
}

#[test]
fn unknown_column_is_a_name_error() {
    let mut rs = ResultSet::new(["amount", "currency"])
        .row(vec![Value::Decimal(dec("1")), Value::from("EUR")]);
    let mut price = Price::default();
    let err = Mapper::default().query(&mut rs, &mut price).unwrap_err();
    assert_eq!(
        err.to_string(),
        "row returned column name 'currency' which was not found in destination Price"
    );
    let MapError::Name(name) = err else {
        panic!("expected name error");
    };
    assert_eq!(name.kind, NameErrorKind::Missing);
}

#[test]
fn coercion_error_names_column_and_kinds() {
    let mut rs = ResultSet::new(["i1"]).row(vec![Value::Decimal(dec("1.5"))]);
    let mut bar = FooTest::default();
    let err = Mapper::default().query(&mut rs, &mut bar).unwrap_err();
    assert_eq!(
        err.to_string(),
        "column 'i1': cannot convert decimal to i64: unknown format"
    );
}

#[derive(Debug, Default, Record)]
struct Account {
    #[column(rename = "ID")]
    key: String,
    balance: NullInt64,
    #[column(skip)]
    touched: bool,
}

#[test]
fn uuid_hex_and_nullable_int_wrapper() {
    let id = uuid::Uuid::from_str("6f9619ff-8b86-d011-b42d-00c04fc964ff").unwrap();
    let mut rs = ResultSet::new(["id", "balance"]).row(vec![Value::Uuid(id), Value::Float64(12.75)]);
    let mut account = Account::default();
    Mapper::default().query(&mut rs, &mut account).unwrap();
    assert_eq!(account.key, "6f9619ff8b86d011b42d00c04fc964ff");
    assert_eq!(account.balance.get(), Some(12));
    assert!(!account.touched);
}

#[test]
fn cancellation_mid_stream_stops_the_scan() {
    let mut rs = two_rows().fail_after(1, SourceError::cancelled("canceling statement due to user request"));
    let mut out: Vec<i64> = Vec::new();
    let err = Mapper::default().query(&mut rs, &mut out).unwrap_err();
    let MapError::Fetch { row, source } = err else {
        panic!("expected fetch error");
    };
    assert_eq!(row, 2);
    assert_eq!(source.kind(), ErrorKind::Cancelled);
    assert_eq!(out, vec![1]);
}

#[test]
fn execution_failure_before_first_row() {
    let mut rs = two_rows().fail_after(0, SourceError::query("syntax error at or near \"selec\""));
    let mut out: Vec<i64> = Vec::new();
    let err = Mapper::default().query(&mut rs, &mut out).unwrap_err();
    assert_eq!(
        err.to_string(),
        "could not select from source: syntax error at or near \"selec\""
    );
    assert!(out.is_empty());
}

#[test]
fn query_row_binds_positionally() {
    let mut rs = ResultSet::new(["count", "label"]).row(vec![Value::Int64(3), Value::from("x")]);
    let mapper = Mapper::default();
    let row = mapper.query_row(&mut rs).unwrap();
    let mut count = 0i32;
    let mut label = String::new();
    row.bind(&mut [&mut count, &mut label]).unwrap();
    assert_eq!((count, label.as_str()), (3, "x"));
    assert_eq!(row.get::<String>(1).unwrap(), "x");
}

#[test]
fn query_row_rejects_second_row() {
    let mapper = Mapper::default();
    let err = mapper.query_row(&mut two_rows()).unwrap_err();
    assert!(matches!(err, MapError::TooManyRows));
}

#[test]
fn materialize_a_prefetched_row() {
    let columns = rowmap_api::Column::list(["Name", "Based_On"]);
    let values = [Value::from("negroni"), Value::Array(Array::Text(vec!["Gin".into()]))];
    let mut cocktail = Cocktail::default();
    Mapper::default()
        .materialize(&columns, &values, &mut cocktail)
        .unwrap();
    assert_eq!(cocktail.name, "negroni");
    assert_eq!(cocktail.based_on, vec!["Gin".to_string()]);
}
