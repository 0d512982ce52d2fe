//! Minimal NumPy `.npy` writer (format v1.0, little-endian, C order).

use contracts::{ArrayDtype, ContractError, Stage};

/// Leading bytes of every `.npy` file
pub const MAGIC: &[u8; 6] = b"\x93NUMPY";

const VERSION: [u8; 2] = [1, 0];
const ALIGNMENT: usize = 64;

/// Scalar types that can be stored in an `.npy` array
pub trait NpyElement: Copy {
    const DTYPE: ArrayDtype;

    fn extend_le(self, out: &mut Vec<u8>);
}

impl NpyElement for f64 {
    const DTYPE: ArrayDtype = ArrayDtype::F64;

    fn extend_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl NpyElement for f32 {
    const DTYPE: ArrayDtype = ArrayDtype::F32;

    fn extend_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl NpyElement for i16 {
    const DTYPE: ArrayDtype = ArrayDtype::I16;

    fn extend_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

fn element_size(dtype: ArrayDtype) -> usize {
    match dtype {
        ArrayDtype::F64 => 8,
        ArrayDtype::F32 => 4,
        ArrayDtype::I16 => 2,
    }
}

/// Python tuple literal, `(5,)` for one dimension
fn shape_tuple(shape: &[usize]) -> String {
    match shape {
        [] => "()".to_string(),
        [n] => format!("({n},)"),
        dims => format!(
            "({})",
            dims.iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

/// Header block including magic, version and length prefix.
///
/// The total is padded with spaces to a multiple of 64 bytes and ends in `\n`.
pub fn header(dtype: ArrayDtype, shape: &[usize]) -> Result<Vec<u8>, ContractError> {
    let mut dict = format!(
        "{{'descr': '{}', 'fortran_order': False, 'shape': {}, }}",
        dtype.descr(),
        shape_tuple(shape)
    );
    let unpadded = MAGIC.len() + VERSION.len() + 2 + dict.len() + 1;
    let padding = (ALIGNMENT - unpadded % ALIGNMENT) % ALIGNMENT;
    dict.extend(std::iter::repeat_n(' ', padding));
    dict.push('\n');

    let len = u16::try_from(dict.len())
        .map_err(|_| ContractError::Other(format!("npy header too long: {} bytes", dict.len())))?;

    let mut out = Vec::with_capacity(MAGIC.len() + VERSION.len() + 2 + dict.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&VERSION);
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(dict.as_bytes());
    Ok(out)
}

/// Encode `values` as a complete `.npy` file of the given shape
///
/// # Errors
/// `ShapeMismatch` when `values.len()` differs from the product of `shape`
pub fn encode<T: NpyElement>(shape: &[usize], values: &[T]) -> Result<Vec<u8>, ContractError> {
    let expected: usize = shape.iter().product();
    if expected != values.len() {
        return Err(ContractError::shape_mismatch(
            Stage::Output,
            [("shape_product", expected), ("elements", values.len())],
        ));
    }

    let mut out = header(T::DTYPE, shape)?;
    out.reserve(values.len() * element_size(T::DTYPE));
    for v in values {
        v.extend_le(&mut out);
    }
    Ok(out)
}
