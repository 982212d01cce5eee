use std::any::type_name;
use std::borrow::Cow;
use std::sync::Arc;

use rowbind_db::{StorageClass, Value};

use super::*;
use crate::codec::{ReadCodec, WriteCodec};
use crate::error::{AssignmentFailure, BindingFailure, Error, SchemaError, SchemaViolation};
use crate::schema::{Schema, Shape};

crate::record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    struct Person {
        id: i64,
        name: String,
        age: Option<i64>,
    }
}

fn alice() -> Person {
    Person {
        id: 7,
        name: "alice".into(),
        age: None,
    }
}

/// `dollars` is computed, `label` has no setter and `audit` has no getter.
#[derive(Debug, Default)]
struct Account {
    cents: i64,
    label: String,
    audit: i64,
}

impl Record for Account {
    fn schema() -> Result<Schema<Self>, SchemaError> {
        let set_dollars: fn(&mut Self, i64) = |a, v| a.cents = v * 100;
        Schema::builder("Account", Shape::Struct)
            .member(
                "dollars",
                Accessor::<Self, i64>::property(|a| a.cents / 100, Some(set_dollars)),
            )
            .member("label", Accessor::<Self, String>::read_only(|a| &a.label))
            .member("audit", Accessor::<Self, i64>::write_only(|a, v| a.audit = v))
            .build()
    }
}

struct Broken;

impl Record for Broken {
    fn schema() -> Result<Schema<Self>, SchemaError> {
        Schema::builder("Broken", Shape::Struct).build()
    }
}

fn bind_all<T: 'static>(converter: &ParameterConverter<T>, params: &T) -> Result<Vec<Value>> {
    let mut values = vec![Value::Null; converter.len()];
    converter.bind(params, &mut values)?;
    Ok(values)
}

// ── Compilation ─────────────────────────────────────────────────────────

#[test]
fn test_members_follow_declaration_order() {
    let params = ParameterConverter::<Person>::build().expect("build");
    let rows = ResultConverter::<Person>::build().expect("build");
    assert_eq!(params.members().collect::<Vec<_>>(), ["id", "name", "age"]);
    assert_eq!(rows.members().collect::<Vec<_>>(), ["id", "name", "age"]);
    assert_eq!(params.record(), "Person");

    let schema = Person::schema().expect("schema");
    assert_eq!(schema.shape(), Shape::Struct);
    assert_eq!(
        schema.member("age").expect("age").type_name(),
        type_name::<Option<i64>>()
    );
}

#[test]
fn test_members_without_accessor_are_skipped() {
    let params = ParameterConverter::<Account>::build().expect("build");
    let rows = ResultConverter::<Account>::build().expect("build");
    assert_eq!(params.members().collect::<Vec<_>>(), ["dollars", "label"]);
    assert_eq!(rows.members().collect::<Vec<_>>(), ["dollars", "audit"]);

    let account = rows
        .read(&[Value::Integer(5), Value::Integer(9)][..])
        .expect("read");
    assert_eq!((account.cents, account.audit), (500, 9));
}

#[test]
fn test_override_on_member_without_accessor_fails() {
    let err = ParameterConverter::<Account>::builder()
        .with("audit", WriteCodec::<i64>::new().to_integer(|v| Ok(*v)))
        .compile()
        .expect_err("audit has no getter");
    assert_eq!(
        err,
        BuildError::MissingAccessor {
            record: "Account",
            member: "audit",
            direction: Direction::Parameters,
        }
    );

    let err = ResultConverter::<Account>::builder()
        .with("label", ReadCodec::<String>::new().from_text(|s| Ok(s.to_owned())))
        .compile()
        .expect_err("label has no setter");
    assert!(matches!(
        err,
        BuildError::MissingAccessor {
            member: "label",
            direction: Direction::Columns,
            ..
        }
    ));
}

#[test]
fn test_unknown_member_names_fail() {
    let err = ParameterConverter::<Person>::builder()
        .with("nope", WriteCodec::<i64>::new())
        .compile()
        .expect_err("unknown override");
    assert_eq!(
        err,
        BuildError::UnknownMember {
            record: "Person",
            member: "nope".into(),
        }
    );

    let err = ResultConverter::<Person>::builder()
        .ignore("nope")
        .compile()
        .expect_err("unknown ignore");
    assert!(matches!(err, BuildError::UnknownMember { .. }));
}

#[test]
fn test_override_of_wrong_type_fails() {
    let err = ParameterConverter::<Person>::builder()
        .with("name", WriteCodec::<i64>::new().to_integer(|v| Ok(*v)))
        .compile()
        .expect_err("type mismatch");
    assert_eq!(
        err,
        BuildError::OverrideType {
            record: "Person",
            member: "name",
            expected: type_name::<String>(),
            found: "i64",
        }
    );
}

#[test]
fn test_schema_violations() {
    let err = Schema::<Person>::builder("Person", Shape::Struct)
        .member("id", crate::field!(Person, id: i64))
        .member("id", crate::field!(Person, id: i64))
        .build()
        .expect_err("duplicate");
    assert_eq!(err.violation, SchemaViolation::DuplicateMember("id"));

    let err = Schema::<(i64, i64)>::builder("Pair", Shape::Tuple)
        .member("1", crate::field!((i64, i64), 1: i64))
        .member("0", crate::field!((i64, i64), 0: i64))
        .build()
        .expect_err("out of order");
    assert_eq!(
        err.violation,
        SchemaViolation::TupleOrder {
            position: 0,
            found: "1",
        }
    );

    let err = ParameterConverter::<Broken>::build().expect_err("empty schema");
    assert_eq!(
        err,
        BuildError::Schema(SchemaError {
            record: "Broken",
            violation: SchemaViolation::Empty,
        })
    );
    assert!(err.to_string().contains("no stable member order"));
}

// ── Binding ─────────────────────────────────────────────────────────────

#[test]
fn test_bind_record_in_order() {
    let params = ParameterConverter::<Person>::build().expect("build");
    let values = bind_all(&params, &alice()).expect("bind");
    assert_eq!(
        values,
        [Value::Integer(7), Value::Text("alice".into()), Value::Null]
    );
}

#[test]
fn test_bind_computed_property() {
    let params = ParameterConverter::<Account>::build().expect("build");
    let account = Account {
        cents: 1_250,
        label: "savings".into(),
        audit: 0,
    };
    let values = bind_all(&params, &account).expect("bind");
    assert_eq!(values, [Value::Integer(12), Value::Text("savings".into())]);
}

#[test]
fn test_bind_checks_arity_before_binding() {
    let params = ParameterConverter::<Person>::build().expect("build");
    let mut values = vec![Value::Integer(-1); 2];
    let err = params.bind(&alice(), &mut values).expect_err("arity");
    assert!(err.is_misuse());
    assert!(matches!(
        err,
        Error::Arity(ArityError {
            entries: 3,
            expected: 2,
            direction: Direction::Parameters,
            ..
        })
    ));
    assert_eq!(values, [Value::Integer(-1), Value::Integer(-1)]);
}

#[test]
fn test_ignore_shifts_positions() {
    let params = ParameterConverter::<Person>::builder()
        .ignore("name")
        .compile()
        .expect("build");
    assert_eq!(params.len(), 2);
    let values = bind_all(&params, &alice()).expect("bind");
    assert_eq!(values, [Value::Integer(7), Value::Null]);
}

#[test]
fn test_write_override_takes_precedence() {
    let params = ParameterConverter::<Person>::builder()
        .with(
            "id",
            WriteCodec::<i64>::new().to_text(|v| Ok(Cow::Owned(format!("#{v}")))),
        )
        .compile()
        .expect("build");
    let values = bind_all(&params, &alice()).expect("bind");
    assert_eq!(values[0], Value::Text("#7".into()));
}

#[test]
fn test_guarded_override_falls_back_to_default() {
    let params = ParameterConverter::<Person>::builder()
        .with(
            "id",
            WriteCodec::<i64>::new()
                .to_null()
                .guard(StorageClass::Null, |v| *v == 0),
        )
        .compile()
        .expect("build");

    let zero = Person { id: 0, ..alice() };
    assert_eq!(bind_all(&params, &zero).expect("bind")[0], Value::Null);
    assert_eq!(bind_all(&params, &alice()).expect("bind")[0], Value::Integer(7));
}

#[test]
fn test_without_defaults_unmapped_member_fails() {
    let params = ParameterConverter::<Person>::builder()
        .use_defaults(false)
        .with("id", WriteCodec::<i64>::new().to_integer(|v| Ok(*v)))
        .compile()
        .expect("build");
    let Err(Error::Binding(err)) = bind_all(&params, &alice()) else {
        panic!("expected a binding error");
    };
    assert_eq!(err.member, "name");
    assert_eq!(err.record, "Person");
    assert_eq!(err.member_type, type_name::<String>());
    assert_eq!(err.value, "\"alice\"");
    assert_eq!(err.failure, BindingFailure::NoConversion);
    assert!(err.source.is_none());
}

#[test]
fn test_failed_write_conversion_keeps_source() {
    let params = ParameterConverter::<(i64,)>::builder()
        .with(
            "0",
            WriteCodec::<i64>::new().to_integer(|v| v.checked_neg().ok_or_else(|| "cannot negate".into())),
        )
        .compile()
        .expect("build");
    assert_eq!(bind_all(&params, &(5,)).expect("bind"), [Value::Integer(-5)]);

    let Err(Error::Binding(err)) = bind_all(&params, &(i64::MIN,)) else {
        panic!("expected a binding error");
    };
    assert_eq!(err.member, "0");
    assert_eq!(err.value, i64::MIN.to_string());
    assert_eq!(
        err.failure,
        BindingFailure::ConversionFailed(StorageClass::Integer)
    );
    assert!(err.source.is_some());
}

#[test]
fn test_tuple_and_scalar_converters() {
    let params = ParameterConverter::<(i64, String)>::build().expect("build");
    assert_eq!(params.members().collect::<Vec<_>>(), ["0", "1"]);
    let values = bind_all(&params, &(3, "x".to_owned())).expect("bind");
    assert_eq!(values, [Value::Integer(3), Value::Text("x".into())]);

    let scalar = ParameterConverter::<f64>::scalar().expect("build");
    assert_eq!(scalar.members().collect::<Vec<_>>(), ["value"]);
    assert_eq!(bind_all(&scalar, &2.5).expect("bind"), [Value::Float(2.5)]);
}

// ── Assignment ──────────────────────────────────────────────────────────

#[test]
fn test_assign_record() {
    let rows = ResultConverter::<Person>::build().expect("build");
    let source = [Value::Integer(7), Value::Text("alice".into()), Value::Null];
    assert_eq!(rows.read(&source[..]).expect("read"), alice());

    let mut target = alice();
    rows.assign(
        &mut target,
        &vec![Value::Integer(1), Value::Text("bob".into()), Value::Integer(40)],
    )
    .expect("assign");
    assert_eq!(target.age, Some(40));
    assert_eq!(target.name, "bob");
}

#[test]
fn test_assign_null_into_non_nullable_field() {
    let rows = ResultConverter::<Person>::build().expect("build");
    let source = [Value::Null, Value::Text("x".into()), Value::Null];
    let err = rows.read(&source[..]).expect_err("null id");
    assert_eq!(err.member, "id");
    assert_eq!(err.storage_class, StorageClass::Null);
    assert_eq!(err.failure, AssignmentFailure::NoConversion);
    assert_eq!(
        err.to_string(),
        "no conversion from class Null for field `id` (i64) of `Person`"
    );
}

#[test]
fn test_failed_read_conversion_keeps_source() {
    let rows = ResultConverter::<(u8,)>::build().expect("build");
    let err = rows.read(&[Value::Integer(300)][..]).expect_err("overflow");
    assert_eq!(err.failure, AssignmentFailure::ConversionFailed);
    assert_eq!(err.storage_class, StorageClass::Integer);
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_read_override_replaces_and_extends_classes() {
    let rows = ResultConverter::<Person>::builder()
        .with(
            "id",
            ReadCodec::<i64>::new()
                .from_integer(|v| Ok(v + 1_000))
                .from_text(|s| Ok(s.trim().parse::<i64>()?)),
        )
        .compile()
        .expect("build");

    let person = rows
        .read(&[Value::Integer(1), Value::Text("a".into()), Value::Null][..])
        .expect("read");
    assert_eq!(person.id, 1_001);

    let person = rows
        .read(&[Value::Text(" 42 ".into()), Value::Text("a".into()), Value::Null][..])
        .expect("read");
    assert_eq!(person.id, 42);
}

#[test]
fn test_blob_member_needs_override() {
    let rows = ResultConverter::<(Vec<u8>,)>::build().expect("build");
    let source = [Value::Blob(vec![1, 2])];
    let err = rows.read(&source[..]).expect_err("no blob reader");
    assert_eq!(err.failure, AssignmentFailure::NoConversion);

    let rows = ResultConverter::<(Vec<u8>,)>::builder()
        .with("0", ReadCodec::<Vec<u8>>::new().from_blob(|b| Ok(b.to_vec())))
        .compile()
        .expect("build");
    assert_eq!(rows.read(&source[..]).expect("read").0, [1, 2]);
}

#[test]
fn test_result_arity_check() {
    let rows = ResultConverter::<Person>::builder()
        .ignore("age")
        .compile()
        .expect("build");
    assert!(rows.check_arity(2).is_ok());
    assert_eq!(
        rows.check_arity(3),
        Err(ArityError {
            record: "Person",
            direction: Direction::Columns,
            entries: 2,
            expected: 3,
        })
    );
}

// ── Sharing ─────────────────────────────────────────────────────────────

#[test]
fn test_converters_are_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ParameterConverter<Person>>();
    assert_send_sync::<ResultConverter<Person>>();

    let params = Arc::new(ParameterConverter::<Person>::build().expect("build"));
    let handles: Vec<_> = (0..4_i64)
        .map(|id| {
            let params = Arc::clone(&params);
            std::thread::spawn(move || bind_all(&params, &Person { id, ..alice() }))
        })
        .collect();
    for (id, handle) in (0..4_i64).zip(handles) {
        let values = handle.join().expect("join").expect("bind");
        assert_eq!(values[0], Value::Integer(id));
    }
}

#[test]
fn test_debug_lists_members() {
    let rows = ResultConverter::<Person>::build().expect("build");
    let rendered = format!("{rows:?}");
    assert!(rendered.contains("Person"));
    assert!(rendered.contains("\"age\""));
}
