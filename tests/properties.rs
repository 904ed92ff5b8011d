use bitrecord::{Context, Error, ObjectDef, StdEncoder, Value};
use proptest::prelude::*;

fn numeric_record(ctx: &Context) -> std::sync::Arc<bitrecord::RecordType> {
    ctx.define_object(
        &ObjectDef::new("Numbers")
            .field("i8v", "int8")
            .field("i16v", "int16")
            .field("i32v", "int32")
            .field("u8v", "uint8")
            .field("u16v", "uint16")
            .field("u32v", "uint32")
            .field("f32v", "float32")
            .field("f64v", "float64"),
    )
    .unwrap()
}

proptest! {
    #[test]
    fn prop_integer_round_trip(
        a in any::<i8>(),
        b in any::<i16>(),
        c in any::<i32>(),
        d in any::<u8>(),
        e in any::<u16>(),
        f in any::<u32>(),
    ) {
        let ctx = Context::new();
        let record = numeric_record(&ctx).allocate();

        record.set("i8v", a).unwrap();
        record.set("i16v", b).unwrap();
        record.set("i32v", c).unwrap();
        record.set("u8v", d).unwrap();
        record.set("u16v", e).unwrap();
        record.set("u32v", f).unwrap();

        prop_assert_eq!(record.get("i8v").unwrap(), Value::from(a));
        prop_assert_eq!(record.get("i16v").unwrap(), Value::from(b));
        prop_assert_eq!(record.get("i32v").unwrap(), Value::from(c));
        prop_assert_eq!(record.get("u8v").unwrap(), Value::from(d));
        prop_assert_eq!(record.get("u16v").unwrap(), Value::from(e));
        prop_assert_eq!(record.get("u32v").unwrap(), Value::from(f));
    }

    #[test]
    fn prop_float_round_trip(
        a in any::<f32>().prop_filter("finite", |v| v.is_finite()),
        b in any::<f64>().prop_filter("finite", |v| v.is_finite()),
    ) {
        let ctx = Context::new();
        let record = numeric_record(&ctx).allocate();

        record.set("f32v", a).unwrap();
        record.set("f64v", b).unwrap();

        prop_assert_eq!(record.get("f32v").unwrap().as_f64(), Some(a as f64));
        prop_assert_eq!(record.get("f64v").unwrap().as_f64(), Some(b));
    }

    #[test]
    fn prop_out_of_range_rejected(v in 256i64..=i64::MAX, neg in i64::MIN..0i64) {
        let ctx = Context::new();
        let record = numeric_record(&ctx).allocate();
        record.set("u8v", 42).unwrap();
        let before = record.to_hex();

        prop_assert!(matches!(record.set("u8v", v), Err(Error::Range { .. })), "expected Range error for {}", v);
        prop_assert!(matches!(record.set("u8v", neg), Err(Error::Range { .. })), "expected Range error for {}", neg);
        prop_assert_eq!(record.to_hex(), before);
    }

    #[test]
    fn prop_adjacent_bits_isolated(
        w1 in 1u32..=7,
        w2 in 1u32..=7,
        start in 0usize..8,
        x in any::<u8>(),
        y in any::<u8>(),
        z in any::<u8>(),
    ) {
        let ctx = Context::new();
        let ty = ctx
            .define_object(
                &ObjectDef::new("Pair")
                    .field_at("first", format!("bit{w1}"), start)
                    .field("second", format!("bit{w2}")),
            )
            .unwrap();
        let record = ty.allocate();

        let (x, y, z) = (
            x as i64 & ((1 << w1) - 1),
            y as i64 & ((1 << w2) - 1),
            z as i64 & ((1 << w2) - 1),
        );
        record.set("first", x).unwrap();
        record.set("second", y).unwrap();
        prop_assert_eq!(record.get("first").unwrap(), Value::Int(x));

        record.set("second", z).unwrap();
        prop_assert_eq!(record.get("first").unwrap(), Value::Int(x));
        prop_assert_eq!(record.get("second").unwrap(), Value::Int(z));
    }

    #[test]
    fn prop_string_round_trip(text in "[a-z]{0,6}") {
        let ctx = Context::with_text_encoder(StdEncoder);
        let ty = ctx
            .define_object(&ObjectDef::new("Label").field("text", "string(ascii, 6)"))
            .unwrap();
        let record = ty.allocate();

        record.set("text", "zzzzzz").unwrap();
        record.set("text", text.as_str()).unwrap();
        prop_assert_eq!(record.get("text").unwrap(), Value::from(text.as_str()));

        let bytes = record.buffer().to_vec();
        prop_assert!(bytes[text.len()..].iter().all(|b| *b == 0));
    }
}
