//! Conversions between numeric array fields and `ndarray` arrays.
//!
//! Both sides are row-major, so element order is preserved unchanged.

use ndarray::{ArrayD, IxDyn};

use crate::record::{ArrayData, ArrayValue, FieldValue, Record};

/// Element types with an `ndarray` view of array fields.
pub trait ArrayElement: Clone + Sized {
    /// Convert stored elements, or `None` if they do not fit `Self` losslessly.
    fn from_data(data: &ArrayData) -> Option<Vec<Self>>;

    fn into_data(values: Vec<Self>) -> ArrayData;
}

impl ArrayElement for f64 {
    fn from_data(data: &ArrayData) -> Option<Vec<Self>> {
        Some(match data {
            ArrayData::UChar(v) => v.iter().map(|&x| f64::from(x)).collect(),
            ArrayData::Short(v) => v.iter().map(|&x| f64::from(x)).collect(),
            ArrayData::Int(v) => v.iter().map(|&x| f64::from(x)).collect(),
            ArrayData::UInt(v) => v.iter().map(|&x| f64::from(x)).collect(),
            ArrayData::Float(v) => v.iter().map(|&x| f64::from(x)).collect(),
            ArrayData::Double(v) => v.clone(),
            _ => return None,
        })
    }

    fn into_data(values: Vec<Self>) -> ArrayData {
        ArrayData::Double(values)
    }
}

impl ArrayElement for i32 {
    fn from_data(data: &ArrayData) -> Option<Vec<Self>> {
        match data {
            ArrayData::UChar(v) => Some(v.iter().map(|&x| i32::from(x)).collect()),
            ArrayData::Short(v) => Some(v.iter().map(|&x| i32::from(x)).collect()),
            ArrayData::Int(v) => Some(v.clone()),
            ArrayData::UInt(v) => v.iter().map(|&x| i32::try_from(x).ok()).collect(),
            ArrayData::Int64(v) => v.iter().map(|&x| i32::try_from(x).ok()).collect(),
            _ => None,
        }
    }

    fn into_data(values: Vec<Self>) -> ArrayData {
        ArrayData::Int(values)
    }
}

impl ArrayValue {
    /// View this array as an `ndarray` with the same shape.
    pub fn to_ndarray<T: ArrayElement>(&self) -> Option<ArrayD<T>> {
        let values = T::from_data(self.data())?;
        ArrayD::from_shape_vec(IxDyn(self.shape()), values).ok()
    }

    /// Copy an `ndarray`, in logical (row-major) order. A 0-d array becomes
    /// a one-element vector.
    pub fn from_ndarray<T: ArrayElement>(array: &ArrayD<T>) -> Self {
        let data = T::into_data(array.iter().cloned().collect());
        match array.ndim() {
            0 => ArrayValue::vector(data),
            _ => ArrayValue::from_parts(array.shape().to_vec(), data),
        }
    }
}

impl<T: ArrayElement> From<ArrayD<T>> for FieldValue {
    fn from(array: ArrayD<T>) -> Self {
        FieldValue::Array(ArrayValue::from_ndarray(&array))
    }
}

impl Record {
    /// The array field `name` as an `ndarray`.
    pub fn as_ndarray<T: ArrayElement>(&self, name: &str) -> Option<ArrayD<T>> {
        match self.get(name)? {
            FieldValue::Array(array) => array.to_ndarray(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array;

    #[test]
    fn matrix_keeps_row_major_order() {
        let m = ArrayValue::new(vec![2, 3], ArrayData::Int((0..6).collect())).unwrap();
        let arr: ArrayD<i32> = m.to_ndarray().unwrap();
        assert_eq!(arr.shape(), &[2, 3]);
        assert_eq!(arr[[0, 2]], 2);
        assert_eq!(arr[[1, 0]], 3);
    }

    #[test]
    fn float_fields_widen_to_f64() {
        let v = ArrayValue::vector(ArrayData::Float(vec![1.5, 2.5]));
        let arr: ArrayD<f64> = v.to_ndarray().unwrap();
        assert_eq!(arr.as_slice().unwrap(), &[1.5, 2.5]);
    }

    #[test]
    fn lossy_conversions_are_refused() {
        let v = ArrayValue::vector(ArrayData::Double(vec![1.0]));
        assert!(v.to_ndarray::<i32>().is_none());
        let w = ArrayValue::vector(ArrayData::Int64(vec![i64::MAX]));
        assert!(w.to_ndarray::<i32>().is_none());
    }

    #[test]
    fn ndarray_defines_a_field() {
        let cube = Array::from_shape_vec(IxDyn(&[2, 2, 2]), (0..8i32).map(f64::from).collect())
            .unwrap();
        let mut r = Record::new();
        r.define("cube", cube.clone());
        assert_eq!(r.shape(0), Some(&[2usize, 2, 2][..]));
        assert_eq!(r.as_ndarray::<f64>("cube"), Some(cube));
    }

    #[test]
    fn zero_dimensional_becomes_vector() {
        let a = ArrayD::from_elem(IxDyn(&[]), 4i32);
        let v = ArrayValue::from_ndarray(&a);
        assert_eq!(v.shape(), &[1]);
        assert_eq!(v.data(), &ArrayData::Int(vec![4]));
    }
}
