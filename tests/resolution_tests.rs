//! End-to-end schema resolution tests: encode under a writer schema,
//! decode through a resolver into the reader's shape.

use jetbridge::{
    encode_value, DecodeError, EnumSchema, FieldSchema, Names, RecordSchema, ResolvedValue,
    Resolver, ResolverBuilder, Schema, Value,
};

fn encode(value: &Value, schema: &Schema) -> Vec<u8> {
    let names = Names::from_schema(schema);
    let mut out = Vec::new();
    encode_value(value, schema, &names, &mut out).unwrap();
    out
}

fn read_one(resolver: &Resolver, data: &[u8]) -> Value {
    let mut reading = ResolvedValue::new(resolver);
    let mut cursor = data;
    reading.read(&mut cursor).unwrap();
    assert!(cursor.is_empty(), "trailing bytes after read");
    reading.into_value()
}

fn record(name: &str, fields: Vec<FieldSchema>) -> Schema {
    Schema::Record(RecordSchema::new(name, fields))
}

// ============================================================================
// Record evolution
// ============================================================================

#[test]
fn test_record_reorder_and_skip_leaves_cursor_aligned() {
    let writer = record(
        "Point",
        vec![
            FieldSchema::new("x", Schema::Int),
            FieldSchema::new("label", Schema::String),
            FieldSchema::new("y", Schema::Int),
        ],
    );
    let reader = record(
        "Point",
        vec![
            FieldSchema::new("y", Schema::Long),
            FieldSchema::new("x", Schema::Long),
        ],
    );
    let resolver = Resolver::new(&writer, &reader).unwrap();

    // Two values back to back: the skipped field of the first must be
    // consumed exactly, or the second read lands mid-stream.
    let mut data = Vec::new();
    for (x, label, y) in [(1, "first", 2), (30, "second", 40)] {
        data.extend(encode(
            &Value::Record(vec![
                ("x".to_string(), Value::Int(x)),
                ("label".to_string(), Value::String(label.to_string())),
                ("y".to_string(), Value::Int(y)),
            ]),
            &writer,
        ));
    }

    let mut reading = ResolvedValue::new(&resolver);
    let mut cursor: &[u8] = &data;
    assert_eq!(
        reading.read(&mut cursor).unwrap(),
        &Value::Record(vec![
            ("y".to_string(), Value::Long(2)),
            ("x".to_string(), Value::Long(1)),
        ])
    );
    assert_eq!(
        reading.read(&mut cursor).unwrap(),
        &Value::Record(vec![
            ("y".to_string(), Value::Long(40)),
            ("x".to_string(), Value::Long(30)),
        ])
    );
    assert!(cursor.is_empty());
}

#[test]
fn test_record_declared_default_fills_unwritten_field() {
    let writer = record("R", vec![FieldSchema::new("a", Schema::Int)]);
    let reader = record(
        "R",
        vec![
            FieldSchema::new("a", Schema::Int),
            FieldSchema::new("note", Schema::String)
                .with_default(serde_json::json!("n/a")),
        ],
    );
    let resolver = Resolver::new(&writer, &reader).unwrap();
    let data = encode(&Value::Record(vec![("a".to_string(), Value::Int(5))]), &writer);
    assert_eq!(
        read_one(&resolver, &data),
        Value::Record(vec![
            ("a".to_string(), Value::Int(5)),
            ("note".to_string(), Value::String("n/a".to_string())),
        ])
    );
}

#[test]
fn test_record_missing_field_strict_vs_tolerant() {
    let writer = record("R", vec![FieldSchema::new("a", Schema::Int)]);
    let reader = record(
        "R",
        vec![
            FieldSchema::new("a", Schema::Int),
            FieldSchema::new("count", Schema::Long),
        ],
    );
    assert!(Resolver::new(&writer, &reader).is_err());

    let resolver = ResolverBuilder::new()
        .with_missing_field_defaults(true)
        .build(&writer, &reader)
        .unwrap();
    let data = encode(&Value::Record(vec![("a".to_string(), Value::Int(1))]), &writer);
    assert_eq!(
        read_one(&resolver, &data),
        Value::Record(vec![
            ("a".to_string(), Value::Int(1)),
            ("count".to_string(), Value::Long(0)),
        ])
    );
}

// ============================================================================
// Unions
// ============================================================================

#[test]
fn test_promoted_reads_are_exact() {
    let cases: [(Schema, Value, Schema, Value); 6] = [
        (Schema::Int, Value::Int(42), Schema::Long, Value::Long(42)),
        (Schema::Int, Value::Int(-7), Schema::Float, Value::Float(-7.0)),
        (Schema::Int, Value::Int(-7), Schema::Double, Value::Double(-7.0)),
        (Schema::Long, Value::Long(1 << 20), Schema::Float, Value::Float(1048576.0)),
        (Schema::Long, Value::Long(-3), Schema::Double, Value::Double(-3.0)),
        (Schema::Float, Value::Float(1.5), Schema::Double, Value::Double(1.5)),
    ];
    for (writer, written, reader, expected) in cases {
        let resolver = Resolver::new(&writer, &reader).unwrap();
        let data = encode(&written, &writer);
        assert_eq!(read_one(&resolver, &data), expected);
    }
}

#[test]
fn test_scalar_narrows_into_reader_union() {
    let reader = Schema::Union(vec![Schema::Null, Schema::Double]);
    let resolver = Resolver::new(&Schema::Long, &reader).unwrap();
    let data = encode(&Value::Long(12), &Schema::Long);
    assert_eq!(
        read_one(&resolver, &data),
        Value::Union(1, Box::new(Value::Double(12.0)))
    );
}

#[test]
fn test_writer_union_reader_union_remaps_branches() {
    let writer = Schema::Union(vec![Schema::Null, Schema::Int]);
    let reader = Schema::Union(vec![Schema::Long, Schema::Null]);
    let resolver = Resolver::new(&writer, &reader).unwrap();

    let null_data = encode(&Value::Union(0, Box::new(Value::Null)), &writer);
    assert_eq!(
        read_one(&resolver, &null_data),
        Value::Union(1, Box::new(Value::Null))
    );

    let int_data = encode(&Value::Union(1, Box::new(Value::Int(8))), &writer);
    assert_eq!(
        read_one(&resolver, &int_data),
        Value::Union(0, Box::new(Value::Long(8)))
    );
}

#[test]
fn test_unreadable_writer_branch_fails_at_read_time() {
    let writer = Schema::Union(vec![Schema::Int, Schema::String]);
    let resolver = Resolver::new(&writer, &Schema::Long).unwrap();

    let good = encode(&Value::Union(0, Box::new(Value::Int(3))), &writer);
    assert_eq!(read_one(&resolver, &good), Value::Long(3));

    let bad = encode(&Value::Union(1, Box::new(Value::String("s".into()))), &writer);
    let mut reading = ResolvedValue::new(&resolver);
    let mut cursor: &[u8] = &bad;
    match reading.read(&mut cursor) {
        Err(DecodeError::IncompatibleBranch { branch, reader }) => {
            assert_eq!(branch, 1);
            assert!(reader.contains("long"), "{}", reader);
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn test_no_compatible_branch_error_names_writer_type() {
    let reader = Schema::Union(vec![Schema::Null, Schema::Int]);
    let err = Resolver::new(&Schema::Boolean, &reader).unwrap_err();
    assert!(err.to_string().contains("boolean"), "{}", err);
}

#[test]
fn test_writer_union_with_no_readable_branch_names_reader() {
    let writer = Schema::Union(vec![Schema::Int, Schema::String]);
    let err = Resolver::new(&writer, &Schema::Boolean).unwrap_err();
    assert!(err.to_string().contains("boolean"), "{}", err);
}

// ============================================================================
// Enums
// ============================================================================

#[test]
fn test_enum_symbol_reordering() {
    let writer = Schema::Enum(EnumSchema::new(
        "Color",
        vec!["RED".into(), "GREEN".into(), "BLUE".into()],
    ));
    let reader = Schema::Enum(EnumSchema::new(
        "Color",
        vec!["BLUE".into(), "RED".into(), "GREEN".into()],
    ));
    let resolver = Resolver::new(&writer, &reader).unwrap();
    let data = encode(&Value::Enum(2, "BLUE".to_string()), &writer);
    assert_eq!(read_one(&resolver, &data), Value::Enum(0, "BLUE".to_string()));
}

#[test]
fn test_enum_symbol_dropped_by_reader_fails_at_read_time() {
    let writer = Schema::Enum(EnumSchema::new("E", vec!["A".into(), "B".into()]));
    let reader = Schema::Enum(EnumSchema::new("E", vec!["A".into()]));
    let resolver = Resolver::new(&writer, &reader).unwrap();

    let ok = encode(&Value::Enum(0, "A".to_string()), &writer);
    assert_eq!(read_one(&resolver, &ok), Value::Enum(0, "A".to_string()));

    let gone = encode(&Value::Enum(1, "B".to_string()), &writer);
    let mut reading = ResolvedValue::new(&resolver);
    let mut cursor: &[u8] = &gone;
    assert!(reading.read(&mut cursor).is_err());
}

// ============================================================================
// Recursive schemas
// ============================================================================

fn tree_schema() -> Schema {
    record(
        "Tree",
        vec![
            FieldSchema::new("value", Schema::Long),
            FieldSchema::new(
                "children",
                Schema::Array(Box::new(Schema::Named("Tree".to_string()))),
            ),
        ],
    )
}

fn tree(value: i64, children: Vec<Value>) -> Value {
    Value::Record(vec![
        ("value".to_string(), Value::Long(value)),
        ("children".to_string(), Value::Array(children)),
    ])
}

#[test]
fn test_recursive_tree_roundtrip() {
    let schema = tree_schema();
    let resolver = Resolver::new(&schema, &schema).unwrap();
    assert!(resolver.instance_size() > 0);

    let depth3 = tree(
        1,
        vec![
            tree(2, vec![tree(4, vec![]), tree(5, vec![])]),
            tree(3, vec![]),
        ],
    );
    let data = encode(&depth3, &schema);
    assert_eq!(read_one(&resolver, &data), depth3);
}

#[test]
fn test_recursive_tree_with_widened_reader() {
    let writer = record(
        "Tree",
        vec![
            FieldSchema::new("value", Schema::Int),
            FieldSchema::new(
                "children",
                Schema::Array(Box::new(Schema::Named("Tree".to_string()))),
            ),
        ],
    );
    let reader = tree_schema();
    let resolver = Resolver::new(&writer, &reader).unwrap();

    let written = Value::Record(vec![
        ("value".to_string(), Value::Int(7)),
        (
            "children".to_string(),
            Value::Array(vec![Value::Record(vec![
                ("value".to_string(), Value::Int(8)),
                ("children".to_string(), Value::Array(vec![])),
            ])]),
        ),
    ]);
    let data = encode(&written, &writer);
    assert_eq!(read_one(&resolver, &data), tree(7, vec![tree(8, vec![])]));
}

// ============================================================================
// Storage reuse and guards
// ============================================================================

#[test]
fn test_consecutive_reads_with_union_and_map() {
    let schema = record(
        "Doc",
        vec![
            FieldSchema::new("tag", Schema::Union(vec![Schema::Null, Schema::String])),
            FieldSchema::new("meta", Schema::Map(Box::new(Schema::Int))),
            FieldSchema::new("words", Schema::Array(Box::new(Schema::String))),
        ],
    );
    let resolver = Resolver::new(&schema, &schema).unwrap();
    let mut reading = ResolvedValue::new(&resolver);

    let values = [
        Value::Record(vec![
            (
                "tag".to_string(),
                Value::Union(1, Box::new(Value::String("alpha".into()))),
            ),
            (
                "meta".to_string(),
                Value::Map(vec![
                    ("a".to_string(), Value::Int(1)),
                    ("b".to_string(), Value::Int(2)),
                ]),
            ),
            (
                "words".to_string(),
                Value::Array(vec![
                    Value::String("one".into()),
                    Value::String("two".into()),
                ]),
            ),
        ]),
        Value::Record(vec![
            ("tag".to_string(), Value::Union(0, Box::new(Value::Null))),
            ("meta".to_string(), Value::Map(vec![])),
            ("words".to_string(), Value::Array(vec![])),
        ]),
        Value::Record(vec![
            (
                "tag".to_string(),
                Value::Union(1, Box::new(Value::String("b".into()))),
            ),
            (
                "meta".to_string(),
                Value::Map(vec![("z".to_string(), Value::Int(-9))]),
            ),
            (
                "words".to_string(),
                Value::Array(vec![Value::String("solo".into())]),
            ),
        ]),
    ];
    for expected in &values {
        let data = encode(expected, &schema);
        let mut cursor: &[u8] = &data;
        assert_eq!(reading.read(&mut cursor).unwrap(), expected);
    }
}

#[test]
fn test_block_count_above_limit_is_rejected() {
    let schema = Schema::Array(Box::new(Schema::Int));
    let resolver = ResolverBuilder::new()
        .with_max_block_items(4)
        .build(&schema, &schema)
        .unwrap();

    let small = Value::Array(vec![Value::Int(1); 4]);
    let data = encode(&small, &schema);
    assert_eq!(read_one(&resolver, &data), small);

    let big = Value::Array(vec![Value::Int(1); 5]);
    let data = encode(&big, &schema);
    let mut reading = ResolvedValue::new(&resolver);
    let mut cursor: &[u8] = &data;
    assert!(matches!(
        reading.read(&mut cursor),
        Err(DecodeError::Allocation {
            requested: 5,
            limit: 4
        })
    ));
}

#[test]
fn test_instance_size_is_stable_across_builds() {
    let schema = tree_schema();
    let a = Resolver::new(&schema, &schema).unwrap().instance_size();
    let b = Resolver::new(&schema, &schema).unwrap().instance_size();
    assert_eq!(a, b);
}
