//! Typed data arrays and named attribute collections.
//!
//! A [`DataArray`] is a flat buffer of tuples, each with a fixed number of
//! components. Meshes store their points (3 components) and their point and
//! cell attributes in this form, and contour output uses it too.

use std::fmt;

/// Element type of a [`DataArray`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "lowercase"))]
pub enum ScalarType {
    U8,
    I32,
    U32,
    I64,
    F32,
    F64,
}

impl ScalarType {
    /// Returns the lowercase Rust name of the element type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarType::U8 => "u8",
            ScalarType::I32 => "i32",
            ScalarType::U32 => "u32",
            ScalarType::I64 => "i64",
            ScalarType::F32 => "f32",
            ScalarType::F64 => "f64",
        }
    }

    /// Whether this is a floating point type usable for point coordinates.
    #[inline]
    pub fn is_real(&self) -> bool {
        matches!(self, ScalarType::F32 | ScalarType::F64)
    }

    /// Whether arrays of this type can drive contouring.
    #[inline]
    pub fn is_contour_scalar(&self) -> bool {
        matches!(
            self,
            ScalarType::U32 | ScalarType::I32 | ScalarType::F32 | ScalarType::F64
        )
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A numeric element type that can live in a [`DataArray`].
///
/// All interpolation happens in `f64`; `from_f64` rounds and saturates for
/// integer types.
pub trait Component: Copy + Send + Sync + PartialOrd + fmt::Debug + 'static {
    /// The runtime tag of this type.
    const TYPE: ScalarType;
    /// Additive identity, used to pre-size output buffers.
    const ZERO: Self;

    fn to_f64(self) -> f64;
    fn from_f64(value: f64) -> Self;

    /// Wrap a typed buffer into the matching [`ArrayData`] variant.
    fn wrap(values: Vec<Self>) -> ArrayData;

    /// Borrow the typed buffer if `data` holds this type.
    fn view(data: &ArrayData) -> Option<&[Self]>;

    /// Mutably borrow the typed buffer if `data` holds this type.
    fn view_mut(data: &mut ArrayData) -> Option<&mut Vec<Self>>;
}

macro_rules! impl_component {
    ($t:ty, $variant:ident, $zero:expr, |$v:ident| $from:expr) => {
        impl Component for $t {
            const TYPE: ScalarType = ScalarType::$variant;
            const ZERO: Self = $zero;

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64($v: f64) -> Self {
                $from
            }

            fn wrap(values: Vec<Self>) -> ArrayData {
                ArrayData::$variant(values)
            }

            fn view(data: &ArrayData) -> Option<&[Self]> {
                match data {
                    ArrayData::$variant(values) => Some(values),
                    _ => None,
                }
            }

            fn view_mut(data: &mut ArrayData) -> Option<&mut Vec<Self>> {
                match data {
                    ArrayData::$variant(values) => Some(values),
                    _ => None,
                }
            }
        }
    };
}

impl_component!(u8, U8, 0, |v| v.round() as u8);
impl_component!(i32, I32, 0, |v| v.round() as i32);
impl_component!(u32, U32, 0, |v| v.round() as u32);
impl_component!(i64, I64, 0, |v| v.round() as i64);
impl_component!(f32, F32, 0.0, |v| v as f32);
impl_component!(f64, F64, 0.0, |v| v);

/// Storage of a [`DataArray`], one variant per element type.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    U8(Vec<u8>),
    I32(Vec<i32>),
    U32(Vec<u32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

/// Evaluate an expression against the typed buffer inside an [`ArrayData`].
///
/// The body is expanded once per variant, so it may call generic code.
macro_rules! with_array_data {
    ($data:expr, $values:ident => $body:expr) => {
        match $data {
            $crate::array::ArrayData::U8($values) => $body,
            $crate::array::ArrayData::I32($values) => $body,
            $crate::array::ArrayData::U32($values) => $body,
            $crate::array::ArrayData::I64($values) => $body,
            $crate::array::ArrayData::F32($values) => $body,
            $crate::array::ArrayData::F64($values) => $body,
        }
    };
}
pub(crate) use with_array_data;

impl ArrayData {
    /// Number of scalar elements (not tuples).
    pub fn len(&self) -> usize {
        with_array_data!(self, values => values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn scalar_type(&self) -> ScalarType {
        match self {
            ArrayData::U8(_) => ScalarType::U8,
            ArrayData::I32(_) => ScalarType::I32,
            ArrayData::U32(_) => ScalarType::U32,
            ArrayData::I64(_) => ScalarType::I64,
            ArrayData::F32(_) => ScalarType::F32,
            ArrayData::F64(_) => ScalarType::F64,
        }
    }

    /// An empty buffer of the given type with reserved capacity.
    pub fn with_capacity(scalar_type: ScalarType, capacity: usize) -> Self {
        match scalar_type {
            ScalarType::U8 => ArrayData::U8(Vec::with_capacity(capacity)),
            ScalarType::I32 => ArrayData::I32(Vec::with_capacity(capacity)),
            ScalarType::U32 => ArrayData::U32(Vec::with_capacity(capacity)),
            ScalarType::I64 => ArrayData::I64(Vec::with_capacity(capacity)),
            ScalarType::F32 => ArrayData::F32(Vec::with_capacity(capacity)),
            ScalarType::F64 => ArrayData::F64(Vec::with_capacity(capacity)),
        }
    }

    /// Element `index` widened to `f64`.
    #[inline]
    pub fn get_f64(&self, index: usize) -> Option<f64> {
        with_array_data!(self, values => values.get(index).map(|v| v.to_f64()))
    }
}

impl<T: Component> From<Vec<T>> for ArrayData {
    fn from(values: Vec<T>) -> Self {
        T::wrap(values)
    }
}

/// A named, typed array of fixed-width tuples.
#[derive(Debug, Clone, PartialEq)]
pub struct DataArray {
    name: String,
    components: usize,
    data: ArrayData,
}

impl DataArray {
    /// Create an array from a flat buffer holding `components` values per tuple.
    pub fn new(name: impl Into<String>, components: usize, data: impl Into<ArrayData>) -> Self {
        Self {
            name: name.into(),
            components,
            data: data.into(),
        }
    }

    /// Create a one-component array.
    pub fn scalars<T: Component>(name: impl Into<String>, values: Vec<T>) -> Self {
        Self::new(name, 1, values)
    }

    /// Create a three-component array from packed triples.
    pub fn vectors<T: Component>(name: impl Into<String>, values: Vec<[T; 3]>) -> Self {
        let flat: Vec<T> = values.into_iter().flatten().collect();
        Self::new(name, 3, flat)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[inline]
    pub fn components(&self) -> usize {
        self.components
    }

    #[inline]
    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut ArrayData {
        &mut self.data
    }

    #[inline]
    pub fn scalar_type(&self) -> ScalarType {
        self.data.scalar_type()
    }

    /// Number of scalar elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of tuples. Zero when the array has no components.
    #[inline]
    pub fn tuple_count(&self) -> usize {
        if self.components == 0 {
            0
        } else {
            self.data.len() / self.components
        }
    }

    /// Borrow the flat typed buffer.
    pub fn as_slice<T: Component>(&self) -> Option<&[T]> {
        T::view(&self.data)
    }

    /// Component `component` of tuple `tuple`, widened to `f64`.
    #[inline]
    pub fn value(&self, tuple: usize, component: usize) -> Option<f64> {
        if component >= self.components {
            return None;
        }
        self.data.get_f64(tuple * self.components + component)
    }

    /// Tuple `tuple` widened to `f64`.
    pub fn tuple(&self, tuple: usize) -> Option<Vec<f64>> {
        (0..self.components)
            .map(|c| self.value(tuple, c))
            .collect()
    }

    /// Minimum and maximum of the first component, ignoring NaN.
    ///
    /// Returns `None` for an empty array or one holding only NaN.
    pub fn range(&self) -> Option<(f64, f64)> {
        if self.components == 0 {
            return None;
        }
        let stride = self.components;
        with_array_data!(&self.data, values => {
            values
                .iter()
                .step_by(stride)
                .map(|v| v.to_f64())
                .filter(|v| !v.is_nan())
                .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                    None => Some((v, v)),
                    Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
                })
        })
    }
}

/// A collection of named arrays attached to points or cells.
///
/// Names are unique: adding an array replaces any array with the same name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeSet {
    arrays: Vec<DataArray>,
    active_scalars: Option<String>,
}

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an array, replacing an existing array of the same name.
    pub fn add(&mut self, array: DataArray) {
        match self.arrays.iter_mut().find(|a| a.name() == array.name()) {
            Some(existing) => *existing = array,
            None => self.arrays.push(array),
        }
    }

    pub fn get(&self, name: &str) -> Option<&DataArray> {
        self.arrays.iter().find(|a| a.name() == name)
    }

    /// Remove and return the named array.
    pub fn remove(&mut self, name: &str) -> Option<DataArray> {
        let index = self.arrays.iter().position(|a| a.name() == name)?;
        if self.active_scalars.as_deref() == Some(name) {
            self.active_scalars = None;
        }
        Some(self.arrays.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataArray> {
        self.arrays.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    /// Mark a present array as the active scalars. Returns `false` if absent.
    pub fn set_active_scalars(&mut self, name: &str) -> bool {
        if self.get(name).is_some() {
            self.active_scalars = Some(name.to_string());
            true
        } else {
            false
        }
    }

    pub fn active_scalars_name(&self) -> Option<&str> {
        self.active_scalars.as_deref()
    }

    pub fn active_scalars(&self) -> Option<&DataArray> {
        self.active_scalars.as_deref().and_then(|name| self.get(name))
    }
}

impl FromIterator<DataArray> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = DataArray>>(iter: I) -> Self {
        let mut set = AttributeSet::new();
        for array in iter {
            set.add(array);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tuple_count() {
        let array = DataArray::new("v", 3, vec![0.0f32; 12]);
        assert_eq!(array.tuple_count(), 4);
        assert_eq!(array.scalar_type(), ScalarType::F32);

        let empty = DataArray::new("none", 0, vec![1u8, 2]);
        assert_eq!(empty.tuple_count(), 0);
    }

    #[test]
    fn test_integer_conversion_rounds_and_saturates() {
        assert_eq!(u8::from_f64(2.6), 3);
        assert_eq!(u8::from_f64(300.0), 255);
        assert_eq!(u8::from_f64(-4.0), 0);
        assert_eq!(i32::from_f64(-1.5), -2);
        assert_eq!(u32::from_f64(f64::NAN), 0);
    }

    #[test]
    fn test_value_and_tuple_access() {
        let array = DataArray::vectors("v", vec![[1.0f64, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        assert_eq!(array.value(1, 2), Some(6.0));
        assert_eq!(array.value(1, 3), None);
        assert_eq!(array.value(2, 0), None);
        assert_eq!(array.tuple(0), Some(vec![1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_range_skips_nan() {
        let array = DataArray::scalars("s", vec![3.0f64, f64::NAN, -1.0, 7.5]);
        assert_eq!(array.range(), Some((-1.0, 7.5)));

        let empty = DataArray::scalars::<f32>("s", Vec::new());
        assert_eq!(empty.range(), None);

        let ints = DataArray::new("i", 2, vec![5i32, 100, -3, 100]);
        assert_eq!(ints.range(), Some((-3.0, 5.0)));
    }

    #[test]
    fn test_attribute_set_replace_and_active() {
        let mut set = AttributeSet::new();
        set.add(DataArray::scalars("a", vec![1.0f32]));
        set.add(DataArray::scalars("b", vec![2i32]));
        set.add(DataArray::scalars("a", vec![3.0f64]));
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("a").map(|a| a.scalar_type()), Some(ScalarType::F64));

        assert!(set.set_active_scalars("b"));
        assert!(!set.set_active_scalars("missing"));
        assert_eq!(set.active_scalars().map(|a| a.name()), Some("b"));

        set.remove("b");
        assert!(set.active_scalars().is_none());
    }
}
