//! A dynamically typed, ordered attribute store.
//!
//! A [`Record`] holds named fields, each a scalar, an n-dimensional array or a
//! nested record, plus a free-text comment. It is the in-memory side of the
//! keyword codec: [`crate::encode::add_keywords`] turns a record into cards and
//! [`crate::decode::get_keywords`] turns cards back into a record.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

/// Element type of a scalar or array field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Bool,
    UChar,
    Short,
    Int,
    UInt,
    Int64,
    Float,
    Double,
    Complex,
    DComplex,
    String,
}

/// The dynamic type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Scalar(ElementKind),
    Array(ElementKind),
    Record,
}

/// A single scalar value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    UChar(u8),
    Short(i16),
    Int(i32),
    UInt(u32),
    Int64(i64),
    Float(f32),
    Double(f64),
    /// `[re, im]`.
    Complex([f32; 2]),
    /// `[re, im]`.
    DComplex([f64; 2]),
    String(String),
}

impl Scalar {
    pub fn kind(&self) -> ElementKind {
        match self {
            Scalar::Bool(_) => ElementKind::Bool,
            Scalar::UChar(_) => ElementKind::UChar,
            Scalar::Short(_) => ElementKind::Short,
            Scalar::Int(_) => ElementKind::Int,
            Scalar::UInt(_) => ElementKind::UInt,
            Scalar::Int64(_) => ElementKind::Int64,
            Scalar::Float(_) => ElementKind::Float,
            Scalar::Double(_) => ElementKind::Double,
            Scalar::Complex(_) => ElementKind::Complex,
            Scalar::DComplex(_) => ElementKind::DComplex,
            Scalar::String(_) => ElementKind::String,
        }
    }
}

/// Flat element storage of an array, row-major (last axis fastest).
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Bool(Vec<bool>),
    UChar(Vec<u8>),
    Short(Vec<i16>),
    Int(Vec<i32>),
    UInt(Vec<u32>),
    Int64(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Complex(Vec<[f32; 2]>),
    DComplex(Vec<[f64; 2]>),
    String(Vec<String>),
}

macro_rules! dispatch_array {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            ArrayData::Bool($v) => $body,
            ArrayData::UChar($v) => $body,
            ArrayData::Short($v) => $body,
            ArrayData::Int($v) => $body,
            ArrayData::UInt($v) => $body,
            ArrayData::Int64($v) => $body,
            ArrayData::Float($v) => $body,
            ArrayData::Double($v) => $body,
            ArrayData::Complex($v) => $body,
            ArrayData::DComplex($v) => $body,
            ArrayData::String($v) => $body,
        }
    };
}

impl ArrayData {
    pub fn len(&self) -> usize {
        dispatch_array!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            ArrayData::Bool(_) => ElementKind::Bool,
            ArrayData::UChar(_) => ElementKind::UChar,
            ArrayData::Short(_) => ElementKind::Short,
            ArrayData::Int(_) => ElementKind::Int,
            ArrayData::UInt(_) => ElementKind::UInt,
            ArrayData::Int64(_) => ElementKind::Int64,
            ArrayData::Float(_) => ElementKind::Float,
            ArrayData::Double(_) => ElementKind::Double,
            ArrayData::Complex(_) => ElementKind::Complex,
            ArrayData::DComplex(_) => ElementKind::DComplex,
            ArrayData::String(_) => ElementKind::String,
        }
    }

    /// Element `i` as a scalar, or `None` when out of range.
    pub fn get(&self, i: usize) -> Option<Scalar> {
        Some(match self {
            ArrayData::Bool(v) => Scalar::Bool(*v.get(i)?),
            ArrayData::UChar(v) => Scalar::UChar(*v.get(i)?),
            ArrayData::Short(v) => Scalar::Short(*v.get(i)?),
            ArrayData::Int(v) => Scalar::Int(*v.get(i)?),
            ArrayData::UInt(v) => Scalar::UInt(*v.get(i)?),
            ArrayData::Int64(v) => Scalar::Int64(*v.get(i)?),
            ArrayData::Float(v) => Scalar::Float(*v.get(i)?),
            ArrayData::Double(v) => Scalar::Double(*v.get(i)?),
            ArrayData::Complex(v) => Scalar::Complex(*v.get(i)?),
            ArrayData::DComplex(v) => Scalar::DComplex(*v.get(i)?),
            ArrayData::String(v) => Scalar::String(v.get(i)?.clone()),
        })
    }
}

/// Product of the dimensions, or `None` if it overflows `usize`.
pub(crate) fn element_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

/// An n-dimensional array: a shape (outermost axis first) and its elements.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    shape: Vec<usize>,
    data: ArrayData,
}

impl ArrayValue {
    /// Returns `None` unless the product of `shape` equals the element count.
    pub fn new(shape: Vec<usize>, data: ArrayData) -> Option<Self> {
        if shape.is_empty() || element_count(&shape) != Some(data.len()) {
            return None;
        }
        Some(ArrayValue { shape, data })
    }

    /// Caller guarantees `shape` matches the element count.
    #[cfg(feature = "array")]
    pub(crate) fn from_parts(shape: Vec<usize>, data: ArrayData) -> Self {
        debug_assert_eq!(element_count(&shape), Some(data.len()));
        ArrayValue { shape, data }
    }

    /// A rank-1 array.
    pub fn vector(data: ArrayData) -> Self {
        ArrayValue {
            shape: vec![data.len()],
            data,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    pub fn into_data(self) -> ArrayData {
        self.data
    }
}

/// The value of one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(Scalar),
    Array(ArrayValue),
    Record(Record),
}

impl FieldValue {
    pub fn data_type(&self) -> DataType {
        match self {
            FieldValue::Scalar(s) => DataType::Scalar(s.kind()),
            FieldValue::Array(a) => DataType::Array(a.data.kind()),
            FieldValue::Record(_) => DataType::Record,
        }
    }

    /// Empty for scalars and records.
    pub fn shape(&self) -> &[usize] {
        match self {
            FieldValue::Array(a) => a.shape(),
            FieldValue::Scalar(_) | FieldValue::Record(_) => &[],
        }
    }
}

macro_rules! impl_from_value {
    ($t:ty, $variant:ident) => {
        impl From<$t> for FieldValue {
            fn from(v: $t) -> Self {
                FieldValue::Scalar(Scalar::$variant(v))
            }
        }

        impl From<Vec<$t>> for FieldValue {
            fn from(v: Vec<$t>) -> Self {
                FieldValue::Array(ArrayValue::vector(ArrayData::$variant(v)))
            }
        }
    };
}

impl_from_value!(bool, Bool);
impl_from_value!(u8, UChar);
impl_from_value!(i16, Short);
impl_from_value!(i32, Int);
impl_from_value!(u32, UInt);
impl_from_value!(i64, Int64);
impl_from_value!(f32, Float);
impl_from_value!(f64, Double);
impl_from_value!(String, String);

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Scalar(Scalar::String(String::from(v)))
    }
}

impl From<Scalar> for FieldValue {
    fn from(v: Scalar) -> Self {
        FieldValue::Scalar(v)
    }
}

impl From<ArrayValue> for FieldValue {
    fn from(v: ArrayValue) -> Self {
        FieldValue::Array(v)
    }
}

impl From<Record> for FieldValue {
    fn from(v: Record) -> Self {
        FieldValue::Record(v)
    }
}

/// One named field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
    pub comment: String,
}

/// An ordered set of uniquely named fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<Field>,
    /// Last suffix handed out by `add_comment`.
    pub(crate) comment_counter: usize,
    /// Last suffix handed out by `add_history`.
    pub(crate) history_counter: usize,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define `name`, replacing the value of an existing field (its comment
    /// is kept) or appending a new field with an empty comment.
    pub fn define(&mut self, name: &str, value: impl Into<FieldValue>) {
        let value = value.into();
        match self.field_index(name) {
            Some(i) => self.fields[i].value = value,
            None => self.fields.push(Field {
                name: String::from(name),
                value,
                comment: String::new(),
            }),
        }
    }

    pub fn define_record(&mut self, name: &str, record: Record) {
        self.define(name, FieldValue::Record(record));
    }

    /// Define a field together with its comment.
    pub fn define_with_comment(&mut self, name: &str, value: impl Into<FieldValue>, comment: &str) {
        self.define(name, value);
        self.set_comment(name, comment);
    }

    /// Returns `false` if no field is called `name`.
    pub fn set_comment(&mut self, name: &str, comment: &str) -> bool {
        match self.field_index(name) {
            Some(i) => {
                self.fields[i].comment = String::from(comment);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    /// Index of the field called exactly `name`.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field_index(name).is_some()
    }

    pub fn name(&self, i: usize) -> Option<&str> {
        self.fields.get(i).map(|f| f.name.as_str())
    }

    pub fn data_type(&self, i: usize) -> Option<DataType> {
        self.fields.get(i).map(|f| f.value.data_type())
    }

    pub fn shape(&self, i: usize) -> Option<&[usize]> {
        self.fields.get(i).map(|f| f.value.shape())
    }

    pub fn comment(&self, i: usize) -> Option<&str> {
        self.fields.get(i).map(|f| f.comment.as_str())
    }

    pub fn value(&self, i: usize) -> Option<&FieldValue> {
        self.fields.get(i).map(|f| &f.value)
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    pub fn remove(&mut self, name: &str) -> Option<Field> {
        let i = self.field_index(name)?;
        Some(self.fields.remove(i))
    }

    pub(crate) fn retain(&mut self, keep: impl FnMut(&Field) -> bool) {
        self.fields.retain(keep);
    }

    fn scalar(&self, name: &str) -> Option<&Scalar> {
        match self.get(name)? {
            FieldValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    fn array(&self, name: &str) -> Option<&ArrayData> {
        match self.get(name)? {
            FieldValue::Array(a) => Some(a.data()),
            _ => None,
        }
    }

    pub fn as_bool(&self, name: &str) -> Option<bool> {
        match self.scalar(name)? {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Any integer scalar that fits in an `i32`.
    pub fn as_int(&self, name: &str) -> Option<i32> {
        match *self.scalar(name)? {
            Scalar::UChar(v) => Some(i32::from(v)),
            Scalar::Short(v) => Some(i32::from(v)),
            Scalar::Int(v) => Some(v),
            Scalar::UInt(v) => i32::try_from(v).ok(),
            Scalar::Int64(v) => i32::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_float(&self, name: &str) -> Option<f32> {
        match self.scalar(name)? {
            Scalar::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Any real scalar, widened to `f64`.
    pub fn as_double(&self, name: &str) -> Option<f64> {
        match self.scalar(name)? {
            Scalar::Float(v) => Some(f64::from(*v)),
            Scalar::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_string(&self, name: &str) -> Option<&str> {
        match self.scalar(name)? {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array_bool(&self, name: &str) -> Option<&[bool]> {
        match self.array(name)? {
            ArrayData::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array_int(&self, name: &str) -> Option<&[i32]> {
        match self.array(name)? {
            ArrayData::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array_float(&self, name: &str) -> Option<&[f32]> {
        match self.array(name)? {
            ArrayData::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array_double(&self, name: &str) -> Option<&[f64]> {
        match self.array(name)? {
            ArrayData::Double(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array_string(&self, name: &str) -> Option<&[String]> {
        match self.array(name)? {
            ArrayData::String(v) => Some(v),
            _ => None,
        }
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = &'a Field;
    type IntoIter = core::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_appends_in_order() {
        let mut r = Record::new();
        r.define("hello", 6.5f64);
        r.define("world", true);
        assert_eq!(r.len(), 2);
        assert_eq!(r.name(0), Some("hello"));
        assert_eq!(r.name(1), Some("world"));
        assert_eq!(r.data_type(0), Some(DataType::Scalar(ElementKind::Double)));
    }

    #[test]
    fn redefine_keeps_position_and_comment() {
        let mut r = Record::new();
        r.define_with_comment("a", 1i32, "first");
        r.define("b", 2i32);
        r.define("a", 3i32);
        assert_eq!(r.field_index("a"), Some(0));
        assert_eq!(r.as_int("a"), Some(3));
        assert_eq!(r.comment(0), Some("first"));
    }

    #[test]
    fn set_comment_on_missing_field() {
        let mut r = Record::new();
        assert!(!r.set_comment("nope", "text"));
    }

    #[test]
    fn field_lookup_is_exact() {
        let mut r = Record::new();
        r.define("Hello", 1i32);
        assert_eq!(r.field_index("Hello"), Some(0));
        assert_eq!(r.field_index("hello"), None);
    }

    #[test]
    fn array_shape_must_match_element_count() {
        assert!(ArrayValue::new(vec![2, 3], ArrayData::Int(vec![0; 6])).is_some());
        assert!(ArrayValue::new(vec![2, 3], ArrayData::Int(vec![0; 5])).is_none());
        assert!(ArrayValue::new(vec![], ArrayData::Int(vec![])).is_none());
    }

    #[test]
    fn overflowing_shape_is_rejected() {
        assert!(ArrayValue::new(vec![usize::MAX, 2], ArrayData::Int(vec![])).is_none());
        assert!(ArrayValue::new(vec![usize::MAX, 0], ArrayData::Int(vec![])).is_some());
        assert_eq!(element_count(&[usize::MAX, 2, 0]), None);
    }

    #[test]
    fn vector_from_vec() {
        let mut r = Record::new();
        r.define("flags", vec![false, true]);
        assert_eq!(r.shape(0), Some(&[2usize][..]));
        assert_eq!(r.as_array_bool("flags"), Some(&[false, true][..]));
        assert_eq!(r.data_type(0), Some(DataType::Array(ElementKind::Bool)));
    }

    #[test]
    fn integer_accessor_widens_and_checks_range() {
        let mut r = Record::new();
        r.define("s", -1i16);
        r.define("u", u32::MAX);
        assert_eq!(r.as_int("s"), Some(-1));
        assert_eq!(r.as_int("u"), None);
    }

    #[test]
    fn scalars_have_empty_shape() {
        let mut r = Record::new();
        r.define("d", "I like dogs");
        r.define_record("rec", Record::new());
        assert_eq!(r.shape(0), Some(&[][..]));
        assert_eq!(r.data_type(1), Some(DataType::Record));
        assert_eq!(r.as_string("d"), Some("I like dogs"));
    }

    #[test]
    fn array_element_access() {
        let data = ArrayData::String(vec![String::from("Hello"), String::from("World")]);
        assert_eq!(data.get(1), Some(Scalar::String(String::from("World"))));
        assert_eq!(data.get(2), None);
        assert_eq!(data.kind(), ElementKind::String);
    }

    #[test]
    fn remove_returns_field() {
        let mut r = Record::new();
        r.define("x", 1.0f32);
        let f = r.remove("x").unwrap();
        assert_eq!(f.value, FieldValue::Scalar(Scalar::Float(1.0)));
        assert!(r.is_empty());
    }
}
