use std::sync::Arc;

use bitrecord::{Buffer, Context, Error, IndexedSequence, ObjectDef, StdEncoder, Value};

#[test]
fn test_end_to_end_example() {
    let ctx = Context::new();
    let example = ctx
        .define_object(
            &ObjectDef::new("Example")
                .field_at("a", "uint8", 0)
                .field_at("flag", "bit1", 8)
                .field_at("b", "int16", 16),
        )
        .unwrap();
    assert_eq!(example.byte_length(), 4);

    let buffer = Buffer::new(4);
    let record = example.bind(&buffer, 0).unwrap();

    record.set("a", 200).unwrap();
    assert_eq!(record.get("a").unwrap(), Value::Int(200));
    record.set("flag", 1).unwrap();
    assert_eq!(record.get("flag").unwrap(), Value::Int(1));
    record.set("b", -300).unwrap();
    assert_eq!(record.get("b").unwrap(), Value::Int(-300));

    assert_eq!(buffer.to_vec(), vec![0xc8, 0x80, 0xfe, 0xd4]);
    assert_eq!(record.byte_length(), 4);
}

#[test]
fn test_int16_after_bit1_needs_byte_alignment() {
    let ctx = Context::new();
    let err = ctx
        .define_object(
            &ObjectDef::new("Example")
                .field("a", "uint8")
                .field("flag", "bit1")
                .field("b", "int16"),
        )
        .unwrap_err();
    assert!(matches!(err, Error::Alignment { bit_offset: 9, .. }));
}

#[test]
fn test_adjacent_bit_fields_are_isolated() {
    let ctx = Context::new();
    let ty = ctx
        .define_object(&ObjectDef::new("Packed").field("low", "bit3").field("high", "bit5"))
        .unwrap();
    let record = ty.allocate();

    record.set("low", 5).unwrap();
    record.set("high", 31).unwrap();
    assert_eq!(record.get("low").unwrap(), Value::Int(5));
    record.set("high", 0).unwrap();
    assert_eq!(record.get("low").unwrap(), Value::Int(5));
    record.set("low", 0).unwrap();
    record.set("high", 17).unwrap();
    assert_eq!(record.to_hex(), "11");
}

#[test]
fn test_string_field_zero_fill() {
    let ctx = Context::with_text_encoder(StdEncoder);
    let ty = ctx
        .define_object(&ObjectDef::new("Name").field("text", "string(utf8, 5)"))
        .unwrap();
    let record = ty.allocate();

    record.set("text", "ab").unwrap();
    assert_eq!(record.get("text").unwrap(), Value::from("ab"));
    assert_eq!(record.to_hex(), "6162000000");

    record.set("text", "abcde").unwrap();
    assert_eq!(record.get("text").unwrap(), Value::from("abcde"));
    record.set("text", "").unwrap();
    assert_eq!(record.to_hex(), "0000000000");
    assert_eq!(record.get("text").unwrap(), Value::from(""));
}

#[test]
fn test_failed_set_leaves_bytes_unchanged() {
    let ctx = Context::with_text_encoder(StdEncoder);
    let ty = ctx
        .define_object(
            &ObjectDef::new("Mixed")
                .field("small", "int8")
                .field("ratio", "float32")
                .field("text", "string(ascii, 3)"),
        )
        .unwrap();
    let record = ty.allocate();
    record.set("small", -5).unwrap();
    record.set("ratio", 1.5).unwrap();
    record.set("text", "abc").unwrap();
    let before = record.to_hex();

    assert!(matches!(record.set("small", 128), Err(Error::Range { .. })));
    assert!(matches!(record.set("small", 1.5), Err(Error::Range { .. })));
    assert!(matches!(record.set("small", "x"), Err(Error::Range { .. })));
    assert!(matches!(record.set("ratio", f64::NAN), Err(Error::Range { .. })));
    assert!(matches!(record.set("text", "abcd"), Err(Error::Capacity { .. })));
    assert!(matches!(record.set("text", 3), Err(Error::Range { .. })));

    assert_eq!(record.to_hex(), before);
}

#[test]
fn test_sub_record_type_identity() {
    let ctx = Context::new();
    let def = ObjectDef::new("Point").field("x", "int16").field("y", "int16");
    let point = ctx.define_object(&def).unwrap();
    let twin = ctx.define_object(&def).unwrap();
    let line = ctx
        .define_object(&ObjectDef::new("Line").field("from", &point).field("to", &point))
        .unwrap();

    let record = line.allocate();
    let foreign = twin.allocate();
    assert!(matches!(
        record.set("from", foreign),
        Err(Error::TypeIdentity { .. })
    ));

    let source = point.allocate();
    source.set("x", 10).unwrap();
    source.set("y", -10).unwrap();
    record.set("from", source.clone()).unwrap();

    let from = record.get("from").unwrap().into_record().unwrap();
    assert_eq!(from.get("x").unwrap(), Value::Int(10));

    source.set("x", 99).unwrap();
    assert_eq!(from.get("x").unwrap(), Value::Int(10));
    from.set("y", 1).unwrap();
    assert_eq!(source.get("y").unwrap(), Value::Int(-10));
}

#[test]
fn test_sub_record_ending_mid_byte_keeps_next_field() {
    let ctx = Context::new();
    let nibble = ctx
        .define_object(&ObjectDef::new("Nibble").field("v", "bit4"))
        .unwrap();
    let outer = ctx
        .define_object(&ObjectDef::new("Outer").field("n", &nibble).field("tail", "bit4"))
        .unwrap();
    assert_eq!(outer.field("tail").unwrap().bit_offset, 4);
    assert_eq!(outer.byte_length(), 1);

    let record = outer.allocate();
    record.set("tail", 15).unwrap();

    let source = nibble.allocate();
    source.set("v", 3).unwrap();
    record.set("n", source).unwrap();

    assert_eq!(record.get("tail").unwrap(), Value::Int(15));
    let n = record.get("n").unwrap().into_record().unwrap();
    assert_eq!(n.get("v").unwrap(), Value::Int(3));
    assert_eq!(record.to_hex(), "3f");
}

#[test]
fn test_sub_record_copy_within_same_buffer() {
    let ctx = Context::new();
    let point = ctx
        .define_object(&ObjectDef::new("Point").field("x", "int16").field("y", "int16"))
        .unwrap();
    let line = ctx
        .define_object(&ObjectDef::new("Line").field("from", &point).field("to", &point))
        .unwrap();
    let record = line.allocate();

    let from = record.get("from").unwrap();
    from.as_record().unwrap().set("x", 4).unwrap();
    record.set("to", from).unwrap();
    assert_eq!(record.to_hex(), "0004000000040000");
}

#[test]
fn test_array_memo_identity() {
    let ctx = Context::new();
    let a = ctx.define_array("int32", 3).unwrap();
    let b = ctx.define_array("int32", 3).unwrap();
    let c = ctx.define_array("int32", 4).unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&a, &c));
    assert_ne!(a.uid(), c.uid());
}

#[test]
fn test_object_records_are_distinct() {
    let ctx = Context::new();
    let a = ctx
        .define_object(&ObjectDef::new("Left").field("v", "uint8"))
        .unwrap();
    let b = ctx
        .define_object(&ObjectDef::new("Right").field("v", "uint8"))
        .unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
    assert_ne!(a.uid(), b.uid());
}

#[test]
fn test_array_of_records() {
    let ctx = Context::new();
    let point = ctx
        .define_object(&ObjectDef::new("Point").field("x", "uint8").field("y", "uint8"))
        .unwrap();
    let path = ctx.define_array(&point, 3).unwrap();
    assert_eq!(path.byte_length(), 6);

    let record = path.allocate();
    let points = record.as_array().unwrap();
    for (i, p) in points.iter().enumerate() {
        let p = p.unwrap().into_record().unwrap();
        p.set("x", i as i64).unwrap();
        p.set("y", 10 * i as i64).unwrap();
    }
    assert_eq!(record.to_hex(), "0000010a0214");
    let found = points
        .find_index(|p, _| p.as_record().unwrap().get("y").unwrap() == Value::Int(20))
        .unwrap();
    assert_eq!(found, Some(2));
}

#[test]
fn test_array_sequence_operations() {
    let ctx = Context::new();
    let ty = ctx.define_array("uint16", 5).unwrap();
    let buffer = Buffer::from(vec![0, 30, 0, 10, 0, 50, 0, 20, 0, 40]);
    let record = ty.bind(&buffer, 0).unwrap();
    let values = record.as_array().unwrap();

    assert_eq!(values.len(), 5);
    assert_eq!(values.join("-").unwrap(), "30-10-50-20-40");
    assert_eq!(values.index_of(&Value::Int(50)).unwrap(), Some(2));
    assert_eq!(
        values.reduce(0, |sum, v, _| sum + v.as_i64().unwrap()).unwrap(),
        150
    );

    values.sort().unwrap();
    assert_eq!(values.join(",").unwrap(), "10,20,30,40,50");
    values.copy_within(0, 3..).unwrap();
    assert_eq!(values.join(",").unwrap(), "40,50,30,40,50");
    values.fill(Value::Int(7), 2..4).unwrap();
    assert_eq!(buffer.to_vec(), vec![0, 40, 0, 50, 0, 7, 0, 7, 0, 50]);
}

#[test]
fn test_view_over_view() {
    let ctx = Context::new();
    let ty = ctx.define_array("uint8", 2).unwrap();
    let buffer = Buffer::new(6);
    let outer = ty.bind(&buffer, 2).unwrap();

    let inner = ty.bind(outer.byte_view(), 2).unwrap();
    assert_eq!(inner.byte_offset(), 4);
    inner.set_at(1, 9).unwrap();
    assert_eq!(buffer.to_vec(), vec![0, 0, 0, 0, 0, 9]);

    assert!(matches!(
        ty.bind(outer.byte_view(), 3),
        Err(Error::Bounds { .. })
    ));
}
