//! The AMQP field-table format.
//!
//! Tables are ordered key/value sequences; values are tagged variants that
//! may nest tables and arrays to arbitrary depth. Duplicate keys are legal
//! on the wire; lookups take the first match.

use crate::codec::{
    backfill_length, put_longstr, put_shortstr, reserve_length, take_bytes, take_f32, take_f64,
    take_longstr, take_shortstr, take_u32, take_u64, take_u8,
};
use crate::error::ProtocolError;
use bytes::{BufMut, Bytes, BytesMut};

/// Wire tags for field values. The byte values are part of the protocol
/// and must remain exactly these.
mod kind {
    pub const BOOLEAN: u8 = b't';
    pub const I8: u8 = b'b';
    pub const U8: u8 = b'B';
    pub const I16: u8 = b's';
    pub const U16: u8 = b'u';
    pub const I32: u8 = b'I';
    pub const U32: u8 = b'i';
    pub const I64: u8 = b'l';
    pub const U64: u8 = b'L';
    pub const F32: u8 = b'f';
    pub const F64: u8 = b'd';
    pub const DECIMAL: u8 = b'D';
    pub const UTF8: u8 = b'S';
    pub const BYTES: u8 = b'x';
    pub const ARRAY: u8 = b'A';
    pub const TABLE: u8 = b'F';
    pub const TIMESTAMP: u8 = b'T';
    pub const VOID: u8 = b'V';
}

/// A fixed-point decimal: `value / 10^scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decimal {
    pub scale: u8,
    pub value: u32,
}

/// A typed field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Boolean(bool),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    Float(f32),
    Double(f64),
    Decimal(Decimal),
    /// UTF-8 long string (`S`).
    LongString(String),
    /// Raw byte string (`x`).
    Bytes(Bytes),
    Array(Vec<FieldValue>),
    Table(Table),
    /// Seconds since the Unix epoch.
    Timestamp(u64),
    Void,
}

impl FieldValue {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), ProtocolError> {
        match self {
            FieldValue::Boolean(v) => {
                buf.put_u8(kind::BOOLEAN);
                buf.put_u8(*v as u8);
            }
            FieldValue::I8(v) => {
                buf.put_u8(kind::I8);
                buf.put_i8(*v);
            }
            FieldValue::U8(v) => {
                buf.put_u8(kind::U8);
                buf.put_u8(*v);
            }
            FieldValue::I16(v) => {
                buf.put_u8(kind::I16);
                buf.put_i16(*v);
            }
            FieldValue::U16(v) => {
                buf.put_u8(kind::U16);
                buf.put_u16(*v);
            }
            FieldValue::I32(v) => {
                buf.put_u8(kind::I32);
                buf.put_i32(*v);
            }
            FieldValue::U32(v) => {
                buf.put_u8(kind::U32);
                buf.put_u32(*v);
            }
            FieldValue::I64(v) => {
                buf.put_u8(kind::I64);
                buf.put_i64(*v);
            }
            FieldValue::U64(v) => {
                buf.put_u8(kind::U64);
                buf.put_u64(*v);
            }
            FieldValue::Float(v) => {
                buf.put_u8(kind::F32);
                buf.put_f32(*v);
            }
            FieldValue::Double(v) => {
                buf.put_u8(kind::F64);
                buf.put_f64(*v);
            }
            FieldValue::Decimal(d) => {
                buf.put_u8(kind::DECIMAL);
                buf.put_u8(d.scale);
                buf.put_u32(d.value);
            }
            FieldValue::LongString(s) => {
                buf.put_u8(kind::UTF8);
                put_longstr(buf, s.as_bytes());
            }
            FieldValue::Bytes(b) => {
                buf.put_u8(kind::BYTES);
                put_longstr(buf, b);
            }
            FieldValue::Array(values) => {
                buf.put_u8(kind::ARRAY);
                let at = reserve_length(buf);
                for value in values {
                    value.encode(buf)?;
                }
                backfill_length(buf, at);
            }
            FieldValue::Table(table) => {
                buf.put_u8(kind::TABLE);
                encode_table(buf, table)?;
            }
            FieldValue::Timestamp(v) => {
                buf.put_u8(kind::TIMESTAMP);
                buf.put_u64(*v);
            }
            FieldValue::Void => buf.put_u8(kind::VOID),
        }
        Ok(())
    }

    fn decode(buf: &mut Bytes) -> Result<Self, ProtocolError> {
        let tag = take_u8(buf)?;
        let value = match tag {
            kind::BOOLEAN => FieldValue::Boolean(take_u8(buf)? != 0),
            kind::I8 => FieldValue::I8(take_u8(buf)? as i8),
            kind::U8 => FieldValue::U8(take_u8(buf)?),
            kind::I16 => FieldValue::I16(crate::codec::take_u16(buf)? as i16),
            kind::U16 => FieldValue::U16(crate::codec::take_u16(buf)?),
            kind::I32 => FieldValue::I32(take_u32(buf)? as i32),
            kind::U32 => FieldValue::U32(take_u32(buf)?),
            kind::I64 => FieldValue::I64(take_u64(buf)? as i64),
            kind::U64 => FieldValue::U64(take_u64(buf)?),
            kind::F32 => FieldValue::Float(take_f32(buf)?),
            kind::F64 => FieldValue::Double(take_f64(buf)?),
            kind::DECIMAL => FieldValue::Decimal(Decimal {
                scale: take_u8(buf)?,
                value: take_u32(buf)?,
            }),
            kind::UTF8 => {
                let raw = take_longstr(buf)?;
                let s = String::from_utf8(raw.to_vec())
                    .map_err(|_| ProtocolError::InvalidUtf8("long string field"))?;
                FieldValue::LongString(s)
            }
            kind::BYTES => FieldValue::Bytes(take_longstr(buf)?),
            kind::ARRAY => {
                let len = take_u32(buf)? as usize;
                let mut sub = take_bytes(buf, len)?;
                let mut values = Vec::new();
                while !sub.is_empty() {
                    values.push(FieldValue::decode(&mut sub)?);
                }
                FieldValue::Array(values)
            }
            kind::TABLE => FieldValue::Table(decode_table(buf)?),
            kind::TIMESTAMP => FieldValue::Timestamp(take_u64(buf)?),
            kind::VOID => FieldValue::Void,
            other => return Err(ProtocolError::UnknownFieldKind(other)),
        };
        Ok(value)
    }
}

/// An ordered key/value table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    entries: Vec<(String, FieldValue)>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry. Existing entries with the same key are kept; the
    /// wire format permits duplicates and lookups take the first match.
    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        self.entries.push((key.into(), value));
    }

    /// Returns the value of the first entry with the given key.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, FieldValue)> {
        self.entries.iter()
    }

    /// Merges `add` over `base`.
    ///
    /// For each key in `add`: if the key exists in both and both values are
    /// tables, the merge recurses; otherwise `add`'s value wins. Keys only
    /// in `base` are kept unchanged.
    pub fn deep_merge(base: &Table, add: &Table) -> Table {
        let mut out = base.clone();
        for (key, value) in &add.entries {
            match out.entries.iter_mut().find(|(k, _)| k == key) {
                Some((_, existing)) => {
                    let merged = match (&*existing, value) {
                        (FieldValue::Table(b), FieldValue::Table(a)) => {
                            FieldValue::Table(Table::deep_merge(b, a))
                        }
                        _ => value.clone(),
                    };
                    *existing = merged;
                }
                None => out.entries.push((key.clone(), value.clone())),
            }
        }
        out
    }
}

impl FromIterator<(String, FieldValue)> for Table {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Encodes a table: 4-byte byte-length prefix, then entries.
pub fn encode_table(buf: &mut BytesMut, table: &Table) -> Result<(), ProtocolError> {
    let at = reserve_length(buf);
    for (key, value) in table.iter() {
        put_shortstr(buf, key)?;
        value.encode(buf)?;
    }
    backfill_length(buf, at);
    Ok(())
}

/// Decodes a table from the cursor.
///
/// An unrecognized kind tag or any read past the declared byte range aborts
/// the whole decode; there is no partial-table recovery.
pub fn decode_table(buf: &mut Bytes) -> Result<Table, ProtocolError> {
    let len = take_u32(buf)? as usize;
    let mut sub = take_bytes(buf, len)?;
    let mut entries = Vec::new();
    while !sub.is_empty() {
        let key = take_shortstr(&mut sub)?;
        let value = FieldValue::decode(&mut sub)?;
        entries.push((key, value));
    }
    Ok(Table { entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn roundtrip(table: &Table) -> Table {
        let mut buf = BytesMut::new();
        encode_table(&mut buf, table).unwrap();
        let mut cursor = buf.freeze();
        let decoded = decode_table(&mut cursor).unwrap();
        assert!(cursor.is_empty());
        decoded
    }

    #[test]
    fn test_scalar_roundtrip() {
        let mut table = Table::new();
        table.insert("bool", FieldValue::Boolean(true));
        table.insert("i8", FieldValue::I8(-8));
        table.insert("u8", FieldValue::U8(8));
        table.insert("i16", FieldValue::I16(-1600));
        table.insert("u16", FieldValue::U16(1600));
        table.insert("i32", FieldValue::I32(-320_000));
        table.insert("u32", FieldValue::U32(320_000));
        table.insert("i64", FieldValue::I64(-64_000_000_000));
        table.insert("u64", FieldValue::U64(64_000_000_000));
        table.insert("f32", FieldValue::Float(1.5));
        table.insert("f64", FieldValue::Double(-2.25));
        table.insert(
            "dec",
            FieldValue::Decimal(Decimal {
                scale: 2,
                value: 12345,
            }),
        );
        table.insert("str", FieldValue::LongString("hello".into()));
        table.insert("bytes", FieldValue::Bytes(Bytes::from_static(b"\x00\xff")));
        table.insert("ts", FieldValue::Timestamp(1_700_000_000));
        table.insert("void", FieldValue::Void);

        assert_eq!(roundtrip(&table), table);
    }

    #[test]
    fn test_nested_two_levels_roundtrip() {
        let mut inner = Table::new();
        inner.insert("depth", FieldValue::U8(2));
        inner.insert(
            "list",
            FieldValue::Array(vec![
                FieldValue::LongString("a".into()),
                FieldValue::I32(7),
            ]),
        );

        let mut middle = Table::new();
        middle.insert("inner", FieldValue::Table(inner));
        middle.insert(
            "mixed",
            FieldValue::Array(vec![FieldValue::Array(vec![FieldValue::Boolean(false)])]),
        );

        let mut outer = Table::new();
        outer.insert("middle", FieldValue::Table(middle));

        assert_eq!(roundtrip(&outer), outer);
    }

    #[test]
    fn test_empty_table() {
        let table = Table::new();
        let mut buf = BytesMut::new();
        encode_table(&mut buf, &table).unwrap();
        assert_eq!(buf.as_ref(), &[0, 0, 0, 0]);
        assert_eq!(roundtrip(&table), table);
    }

    #[test]
    fn test_unknown_kind_aborts() {
        // length 3: key "a" (0x01 'a'), bogus tag 'Z'
        let mut buf = Bytes::from_static(&[0, 0, 0, 3, 0x01, b'a', b'Z']);
        assert!(matches!(
            decode_table(&mut buf),
            Err(ProtocolError::UnknownFieldKind(b'Z'))
        ));
    }

    #[test]
    fn test_value_past_declared_range_aborts() {
        // Declared table length 4, but the i32 value needs 4 payload bytes
        // beyond the tag; the sub-range runs out.
        let mut buf = Bytes::from_static(&[0, 0, 0, 4, 0x01, b'a', b'I', 0x00]);
        assert!(matches!(
            decode_table(&mut buf),
            Err(ProtocolError::Truncated { .. })
        ));
    }

    #[test]
    fn test_duplicate_keys_first_match() {
        let mut table = Table::new();
        table.insert("k", FieldValue::U8(1));
        table.insert("k", FieldValue::U8(2));

        let decoded = roundtrip(&table);
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded.get("k"), Some(&FieldValue::U8(1)));
    }

    #[test]
    fn test_merge_with_empty_is_clone() {
        let mut a = Table::new();
        a.insert("x", FieldValue::U8(1));
        let mut sub = Table::new();
        sub.insert("y", FieldValue::Boolean(true));
        a.insert("sub", FieldValue::Table(sub));

        assert_eq!(Table::deep_merge(&a, &Table::new()), a);
    }

    #[test]
    fn test_merge_leaf_conflict_add_wins() {
        let mut a = Table::new();
        a.insert("k", FieldValue::U8(1));
        a.insert("keep", FieldValue::Void);
        let mut b = Table::new();
        b.insert("k", FieldValue::LongString("two".into()));

        let merged = Table::deep_merge(&a, &b);
        assert_eq!(merged.get("k"), Some(&FieldValue::LongString("two".into())));
        assert_eq!(merged.get("keep"), Some(&FieldValue::Void));
    }

    #[test]
    fn test_merge_recurses_into_tables() {
        let mut base_caps = Table::new();
        base_caps.insert("alpha", FieldValue::Boolean(true));
        base_caps.insert("beta", FieldValue::Boolean(false));
        let mut base = Table::new();
        base.insert("capabilities", FieldValue::Table(base_caps));
        base.insert("product", FieldValue::LongString("coney".into()));

        let mut add_caps = Table::new();
        add_caps.insert("beta", FieldValue::Boolean(true));
        add_caps.insert("gamma", FieldValue::Boolean(true));
        let mut add = Table::new();
        add.insert("capabilities", FieldValue::Table(add_caps));

        let merged = Table::deep_merge(&base, &add);
        let caps = match merged.get("capabilities") {
            Some(FieldValue::Table(t)) => t,
            other => panic!("expected table, got {:?}", other),
        };
        // Only the leaf conflict resolves to add's value.
        assert_eq!(caps.get("alpha"), Some(&FieldValue::Boolean(true)));
        assert_eq!(caps.get("beta"), Some(&FieldValue::Boolean(true)));
        assert_eq!(caps.get("gamma"), Some(&FieldValue::Boolean(true)));
        assert_eq!(
            merged.get("product"),
            Some(&FieldValue::LongString("coney".into()))
        );
    }

    #[test]
    fn test_non_table_over_table_replaces() {
        let mut sub = Table::new();
        sub.insert("x", FieldValue::U8(1));
        let mut a = Table::new();
        a.insert("k", FieldValue::Table(sub));
        let mut b = Table::new();
        b.insert("k", FieldValue::U8(9));

        let merged = Table::deep_merge(&a, &b);
        assert_eq!(merged.get("k"), Some(&FieldValue::U8(9)));
    }

    fn field_value_strategy() -> impl Strategy<Value = FieldValue> {
        let integers = prop_oneof![
            any::<bool>().prop_map(FieldValue::Boolean),
            any::<i8>().prop_map(FieldValue::I8),
            any::<u8>().prop_map(FieldValue::U8),
            any::<i16>().prop_map(FieldValue::I16),
            any::<u16>().prop_map(FieldValue::U16),
            any::<i32>().prop_map(FieldValue::I32),
            any::<u32>().prop_map(FieldValue::U32),
            any::<i64>().prop_map(FieldValue::I64),
            any::<u64>().prop_map(FieldValue::U64),
        ];
        let scalars = prop_oneof![
            (-1.0e6f32..1.0e6f32).prop_map(FieldValue::Float),
            (-1.0e12f64..1.0e12f64).prop_map(FieldValue::Double),
            (any::<u8>(), any::<u32>())
                .prop_map(|(scale, value)| FieldValue::Decimal(Decimal { scale, value })),
            "[a-z0-9]{0,12}".prop_map(FieldValue::LongString),
            proptest::collection::vec(any::<u8>(), 0..16)
                .prop_map(|v| FieldValue::Bytes(Bytes::from(v))),
            any::<u64>().prop_map(FieldValue::Timestamp),
            Just(FieldValue::Void),
        ];
        let leaf = prop_oneof![integers, scalars];
        leaf.prop_recursive(3, 32, 4, |inner| {
            prop_oneof![
                proptest::collection::vec(inner.clone(), 0..4).prop_map(FieldValue::Array),
                proptest::collection::vec(("[a-z]{1,8}", inner), 0..4)
                    .prop_map(|entries| FieldValue::Table(entries.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_table_roundtrip(
            entries in proptest::collection::vec(("[a-z]{1,8}", field_value_strategy()), 0..6)
        ) {
            let table: Table = entries.into_iter().collect();
            let mut buf = BytesMut::new();
            encode_table(&mut buf, &table).unwrap();
            let mut cursor = buf.freeze();
            let decoded = decode_table(&mut cursor).unwrap();
            prop_assert!(cursor.is_empty());
            prop_assert_eq!(decoded, table);
        }
    }
}
