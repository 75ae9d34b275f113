// Type requirements for data in rasters and masks
pub trait RasterNum:
    Copy + PartialOrd + Default + num::NumCast + std::fmt::Debug + std::fmt::Display + Send + Sync + 'static
{
    /// Conversion from the double precision representation used by headers and codecs.
    /// Out of range values saturate, NaN becomes zero for integer types.
    fn from_f64(v: f64) -> Self;

    fn as_f64(self) -> f64;
}

macro_rules! rasternum_impl {
    ($t:ty) => {
        impl RasterNum for $t {
            #[inline]
            fn from_f64(v: f64) -> Self {
                v as $t
            }

            #[inline]
            fn as_f64(self) -> f64 {
                self as f64
            }
        }
    };
}

rasternum_impl!(i8);
rasternum_impl!(u8);
rasternum_impl!(i16);
rasternum_impl!(u16);
rasternum_impl!(i32);
rasternum_impl!(u32);
rasternum_impl!(i64);
rasternum_impl!(u64);
rasternum_impl!(f32);
rasternum_impl!(f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturating_conversion() {
        assert_eq!(i32::from_f64(-9999.0), -9999);
        assert_eq!(u8::from_f64(-9999.0), 0);
        assert_eq!(i16::from_f64(1e9), i16::MAX);
        assert_eq!(f32::from_f64(2.75).as_f64(), 2.75);
    }
}
