//! Element kinds supported by virtual vectors.
//!
//! Exactly two element types exist: 32-bit signed integers and 64-bit
//! floats. [`Element`] is sealed so that every access path can be
//! monomorphized over a closed set of plain-old-data types.

use std::fmt;

mod sealed {
    pub trait Sealed {}

    impl Sealed for i32 {}
    impl Sealed for f64 {}
}

/// Runtime tag for an element type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKind {
    /// 32-bit signed integer elements.
    Integer,
    /// 64-bit floating point elements.
    Real,
}

impl ElementKind {
    /// All supported kinds, in registration order.
    pub const ALL: [ElementKind; 2] = [ElementKind::Integer, ElementKind::Real];

    /// Short name used to derive host class names.
    pub fn name(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Real => "real",
        }
    }

    /// Width of one element in bytes.
    pub fn byte_width(self) -> usize {
        match self {
            Self::Integer => std::mem::size_of::<i32>(),
            Self::Real => std::mem::size_of::<f64>(),
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A numeric element type storable in a virtual vector.
///
/// Implemented for `i32` ([`ElementKind::Integer`]) and `f64`
/// ([`ElementKind::Real`]) only. Every bit pattern is a valid value
/// (`Pod`), so host bytes can be viewed as `[T]` without validation.
pub trait Element:
    bytemuck::Pod + fmt::Debug + PartialEq + Send + Sync + sealed::Sealed + 'static
{
    /// Runtime tag for this type.
    const KIND: ElementKind;

    /// Lossy conversion used by diagnostic output only.
    fn to_f64(self) -> f64;
}

impl Element for i32 {
    const KIND: ElementKind = ElementKind::Integer;

    fn to_f64(self) -> f64 {
        f64::from(self)
    }
}

impl Element for f64 {
    const KIND: ElementKind = ElementKind::Real;

    fn to_f64(self) -> f64 {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_width_matches_type_size() {
        assert_eq!(ElementKind::Integer.byte_width(), std::mem::size_of::<i32>());
        assert_eq!(ElementKind::Real.byte_width(), std::mem::size_of::<f64>());
        assert_eq!(<i32 as Element>::KIND.byte_width(), 4);
        assert_eq!(<f64 as Element>::KIND.byte_width(), 8);
    }

    #[test]
    fn kind_names() {
        assert_eq!(ElementKind::Integer.to_string(), "integer");
        assert_eq!(ElementKind::Real.to_string(), "real");
    }

    #[test]
    fn integer_to_f64_is_exact() {
        assert_eq!((-7i32).to_f64(), -7.0);
        assert_eq!(i32::MAX.to_f64(), 2_147_483_647.0);
    }
}
