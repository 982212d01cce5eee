//! Built-in conversions.
//!
//! | field type | reads from | writes as |
//! |---|---|---|
//! | `i8`..`i64`, `isize`, `u8`..`u32` | Integer (range checked) | Integer |
//! | `u64`, `usize` | Integer, bit for bit | Integer, bit for bit |
//! | `bool` | Integer (non-zero is `true`) | Integer 0/1 |
//! | `f32`, `f64` | Float, Integer | Float |
//! | `String`, `Box<str>`, `Arc<str>` | Text | Text |
//! | `char` | Text of exactly one character | Text |
//! | `Vec<u16>` | Text, re-encoded as UTF-16 | Text |
//! | `Vec<u8>` | nothing | Blob |
//! | `Uuid` | Text in N, D, B or P layout | Text (D) |
//! | `TimeDelta`, `std::time::Duration` | Integer ticks, Text | Integer ticks |
//! | `DateTime<Utc>` | Integer ticks since the epoch, Text | Integer ticks |
//! | `Option<T>` | Null as `None`, otherwise as `T` | Null for `None`, otherwise as `T` |
//!
//! Enums declared through [`sql_enum!`](crate::sql_enum) read and write
//! their integer discriminant. Blob columns have no default reader for any
//! type; a field that should accept them needs an override.

use std::borrow::Cow;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use super::{guid, registry, ticks, ReadCodec, SqlType, WriteCodec};
use crate::error::BoxError;

fn out_of_range<T>(value: impl std::fmt::Display) -> BoxError {
    format!("{value} is out of range for {}", std::any::type_name::<T>()).into()
}

macro_rules! integer_type {
    ($($ty:ty),+ $(,)?) => {$(
        #[allow(clippy::useless_conversion)]
        impl SqlType for $ty {
            fn read_codec() -> ReadCodec<Self> {
                ReadCodec::new().from_integer(|v| Self::try_from(v).map_err(|_| out_of_range::<Self>(v)))
            }

            fn write_codec() -> WriteCodec<Self> {
                WriteCodec::new().to_integer(|v| i64::try_from(*v).map_err(|_| out_of_range::<i64>(*v)))
            }
        }
    )+};
}

integer_type!(i8, i16, i32, i64, isize, u8, u16, u32);

// The full unsigned 64-bit range is stored in the Integer's two's-complement
// bits, so values above `i64::MAX` read back as negative in SQL.
macro_rules! wide_unsigned_type {
    ($($ty:ty),+ $(,)?) => {$(
        #[allow(
            clippy::useless_conversion,
            clippy::cast_possible_wrap,
            clippy::cast_sign_loss,
            clippy::cast_lossless
        )]
        impl SqlType for $ty {
            fn read_codec() -> ReadCodec<Self> {
                ReadCodec::new().from_integer(|v| Self::try_from(v as u64).map_err(|_| out_of_range::<Self>(v as u64)))
            }

            fn write_codec() -> WriteCodec<Self> {
                WriteCodec::new().to_integer(|v| Ok(*v as u64 as i64))
            }
        }
    )+};
}

wide_unsigned_type!(u64, usize);

impl SqlType for bool {
    fn read_codec() -> ReadCodec<Self> {
        ReadCodec::new().from_integer(|v| Ok(v != 0))
    }

    fn write_codec() -> WriteCodec<Self> {
        WriteCodec::new().to_integer(|v| Ok(i64::from(*v)))
    }
}

#[allow(clippy::cast_precision_loss)]
impl SqlType for f64 {
    fn read_codec() -> ReadCodec<Self> {
        ReadCodec::new()
            .from_float(Ok)
            .from_integer(|v| Ok(v as Self))
    }

    fn write_codec() -> WriteCodec<Self> {
        WriteCodec::new().to_float(|v| Ok(*v))
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
impl SqlType for f32 {
    fn read_codec() -> ReadCodec<Self> {
        ReadCodec::new()
            .from_float(|v| Ok(v as Self))
            .from_integer(|v| Ok(v as Self))
    }

    fn write_codec() -> WriteCodec<Self> {
        WriteCodec::new().to_float(|v| Ok(f64::from(*v)))
    }
}

impl SqlType for String {
    fn read_codec() -> ReadCodec<Self> {
        ReadCodec::new().from_text(|s| Ok(s.to_owned()))
    }

    fn write_codec() -> WriteCodec<Self> {
        WriteCodec::<Self>::new().to_text(|v| Ok(Cow::Borrowed(v.as_str())))
    }
}

impl SqlType for Box<str> {
    fn read_codec() -> ReadCodec<Self> {
        ReadCodec::new().from_text(|s| Ok(s.into()))
    }

    fn write_codec() -> WriteCodec<Self> {
        WriteCodec::<Self>::new().to_text(|v| Ok(Cow::Borrowed(&**v)))
    }
}

impl SqlType for Arc<str> {
    fn read_codec() -> ReadCodec<Self> {
        ReadCodec::new().from_text(|s| Ok(s.into()))
    }

    fn write_codec() -> WriteCodec<Self> {
        WriteCodec::<Self>::new().to_text(|v| Ok(Cow::Borrowed(&**v)))
    }
}

impl SqlType for char {
    fn read_codec() -> ReadCodec<Self> {
        ReadCodec::new().from_text(|s| {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => Err(format!("expected a single character, got {s:?}").into()),
            }
        })
    }

    fn write_codec() -> WriteCodec<Self> {
        WriteCodec::<Self>::new().to_text(|v| Ok(Cow::Owned(v.to_string())))
    }
}

impl SqlType for Vec<u16> {
    fn read_codec() -> ReadCodec<Self> {
        ReadCodec::new().from_text(|s| Ok(s.encode_utf16().collect()))
    }

    fn write_codec() -> WriteCodec<Self> {
        WriteCodec::<Self>::new().to_text(|v| Ok(Cow::Owned(String::from_utf16(v)?)))
    }
}

impl SqlType for Vec<u8> {
    fn write_codec() -> WriteCodec<Self> {
        WriteCodec::<Self>::new().to_blob(|v| Ok(Cow::Borrowed(v.as_slice())))
    }
}

impl SqlType for Uuid {
    fn read_codec() -> ReadCodec<Self> {
        ReadCodec::new().from_text(|s| Ok(guid::parse(s)?))
    }

    fn write_codec() -> WriteCodec<Self> {
        WriteCodec::<Self>::new().to_text(|v| Ok(Cow::Owned(v.hyphenated().to_string())))
    }
}

impl SqlType for TimeDelta {
    fn read_codec() -> ReadCodec<Self> {
        ReadCodec::new()
            .from_integer(|v| Ok(ticks::delta_from_ticks(v)?))
            .from_text(|s| Ok(ticks::parse_delta(s)?))
    }

    fn write_codec() -> WriteCodec<Self> {
        WriteCodec::new().to_integer(|v| Ok(ticks::delta_to_ticks(v)?))
    }
}

impl SqlType for std::time::Duration {
    fn read_codec() -> ReadCodec<Self> {
        ReadCodec::new()
            .from_integer(|v| Ok(ticks::duration_from_ticks(v)?))
            .from_text(|s| Ok(ticks::parse_duration(s)?))
    }

    fn write_codec() -> WriteCodec<Self> {
        WriteCodec::new().to_integer(|v| Ok(ticks::duration_to_ticks(v)?))
    }
}

impl SqlType for DateTime<Utc> {
    fn read_codec() -> ReadCodec<Self> {
        ReadCodec::new()
            .from_integer(|v| Ok(ticks::timestamp_from_ticks(v)?))
            .from_text(|s| Ok(ticks::parse_timestamp(s)?))
    }

    fn write_codec() -> WriteCodec<Self> {
        WriteCodec::new().to_integer(|v| Ok(ticks::timestamp_to_ticks(v)?))
    }
}

impl<T: SqlType> SqlType for Option<T> {
    fn read_codec() -> ReadCodec<Self> {
        registry::read_codec::<T>()
            .map(Some)
            .from_null(|| Ok(None))
    }

    fn write_codec() -> WriteCodec<Self> {
        WriteCodec::optional(&registry::write_codec::<T>())
    }
}

/// Declares a field-less enum stored as its integer discriminant.
///
/// Every variant needs an explicit discriminant. Reading an integer that
/// matches no variant fails the assignment.
///
/// ```
/// rowbind::sql_enum! {
///     #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
///     pub enum Status {
///         #[default]
///         Active = 0,
///         Archived = 1,
///     }
/// }
///
/// assert_eq!(Status::from_raw(1), Some(Status::Archived));
/// assert_eq!(Status::Active.to_raw(), 0);
/// ```
#[macro_export]
macro_rules! sql_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $( $(#[$vmeta])* $variant = $value ),+
        }

        impl $name {
            /// Variant with discriminant `raw`.
            #[allow(dead_code)]
            $vis const fn from_raw(raw: i64) -> ::std::option::Option<Self> {
                $( if raw == $value { return ::std::option::Option::Some(Self::$variant); } )+
                ::std::option::Option::None
            }

            /// Discriminant of this variant.
            #[allow(dead_code)]
            $vis const fn to_raw(&self) -> i64 {
                match self {
                    $( Self::$variant => $value ),+
                }
            }
        }

        impl $crate::SqlType for $name {
            fn read_codec() -> $crate::codec::ReadCodec<Self> {
                $crate::codec::ReadCodec::new().from_integer(|raw| {
                    Self::from_raw(raw).ok_or_else(|| {
                        ::std::format!("{} has no variant with discriminant {raw}", stringify!($name)).into()
                    })
                })
            }

            fn write_codec() -> $crate::codec::WriteCodec<Self> {
                $crate::codec::WriteCodec::<Self>::new().to_integer(|v| ::std::result::Result::Ok(v.to_raw()))
            }
        }
    };
}
