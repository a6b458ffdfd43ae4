use std::fs::File;
use std::net::IpAddr;
use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use ipnet::IpNet;

use crate::coerce::*;
use crate::model::{FileMode, NetInterface, TypeHint};
use crate::parser::{BuildError, Nest};

/// Mutable access to one field `T` somewhere inside the record `P`.
pub type Lens<P, T> = Rc<dyn Fn(&mut P) -> &mut T>;

/// Create a [`Lens`] from a field accessor closure.
///
/// ### Example
/// ```
/// # use fieldopt_builder as fieldopt;
/// use fieldopt::lens;
///
/// struct Record {
///     count: u8,
/// }
///
/// let count = lens(|record: &mut Record| &mut record.count);
/// let mut record = Record { count: 0 };
/// *count(&mut record) = 3;
/// assert_eq!(record.count, 3);
/// ```
pub fn lens<P, T, F>(access: F) -> Lens<P, T>
where
    F: Fn(&mut P) -> &mut T + 'static,
{
    Rc::new(access)
}

pub(crate) fn compose<P, S, T>(outer: Lens<P, S>, inner: Lens<S, T>) -> Lens<P, T>
where
    P: 'static,
    S: 'static,
    T: 'static,
{
    lens(move |record: &mut P| inner(outer(record)))
}

/// How a field type takes part in the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Toggled without a value.
    Boolean,
    /// Takes one value, converted according to the hint.
    Scalar(TypeHint),
    /// A nested record, exposed as a sub-command.
    Record,
}

impl Shape {
    pub(crate) fn hint(&self) -> TypeHint {
        match self {
            Shape::Scalar(hint) => *hint,
            Shape::Boolean | Shape::Record => TypeHint::None,
        }
    }
}

/// Behaviour of a field type which may be bound to the command line.
///
/// Implemented for every supported value type and for `Option<T>` of those.
/// Records implement it via `#[derive(Command)]`.
pub trait Bindable: Sized + 'static {
    /// The shape of this type.
    fn shape() -> Shape;

    /// Whether the value sits behind an `Option`.
    fn indirect() -> bool {
        false
    }

    /// Convert a token into a value.
    /// When `truncate` is set, integers which do not fit are narrowed instead of rejected.
    fn coerce(token: &str, truncate: bool) -> Result<Self, CoerceError> {
        let _ = (token, truncate);
        Err(CoerceError::Unsupported {
            hint: Self::shape().hint(),
        })
    }

    /// Toggle the value in place.
    fn flip(&mut self) -> Result<(), CoerceError> {
        Err(CoerceError::Unsupported {
            hint: Self::shape().hint(),
        })
    }

    /// The value toggled from, when an unset `Option` is flipped.
    fn vacant() -> Option<Self> {
        None
    }

    /// Whether the value still holds its zero value.
    fn is_unset(&self) -> bool {
        false
    }

    /// The text shown as the default in the usage.
    fn display(&self) -> Option<String> {
        None
    }

    /// The sub-command for a record reached directly through `lens`.
    #[doc(hidden)]
    fn nest<P: 'static>(lens: Lens<P, Self>) -> Option<Result<Nest<P>, BuildError>> {
        let _ = lens;
        None
    }

    /// The sub-command for a record reached through an `Option`.
    #[doc(hidden)]
    fn nest_optional<P: 'static>(
        lens: Lens<P, Option<Self>>,
    ) -> Option<Result<Nest<P>, BuildError>> {
        let _ = lens;
        None
    }
}

impl Bindable for bool {
    fn shape() -> Shape {
        Shape::Boolean
    }

    fn coerce(token: &str, _truncate: bool) -> Result<Self, CoerceError> {
        parse_bool(token)
    }

    fn flip(&mut self) -> Result<(), CoerceError> {
        *self = !*self;
        Ok(())
    }

    fn vacant() -> Option<Self> {
        Some(false)
    }

    fn is_unset(&self) -> bool {
        !*self
    }

    fn display(&self) -> Option<String> {
        Some(self.to_string())
    }
}

macro_rules! bind_signed {
    ($($t:ty),*) => {
        $(
            impl Bindable for $t {
                fn shape() -> Shape {
                    Shape::Scalar(TypeHint::Int)
                }

                fn coerce(token: &str, truncate: bool) -> Result<Self, CoerceError> {
                    let value = parse_int(token)?;
                    <$t>::try_from(value).or_else(|_| {
                        if truncate {
                            Ok(value as $t)
                        } else {
                            Err(CoerceError::Overflow {
                                token: token.to_string(),
                                target: stringify!($t),
                            })
                        }
                    })
                }

                fn is_unset(&self) -> bool {
                    *self == 0
                }

                fn display(&self) -> Option<String> {
                    Some(self.to_string())
                }
            }
        )*
    };
}

macro_rules! bind_unsigned {
    ($($t:ty),*) => {
        $(
            impl Bindable for $t {
                fn shape() -> Shape {
                    Shape::Scalar(TypeHint::Uint)
                }

                fn coerce(token: &str, truncate: bool) -> Result<Self, CoerceError> {
                    let value = parse_uint(token)?;
                    <$t>::try_from(value).or_else(|_| {
                        if truncate {
                            Ok(value as $t)
                        } else {
                            Err(CoerceError::Overflow {
                                token: token.to_string(),
                                target: stringify!($t),
                            })
                        }
                    })
                }

                fn is_unset(&self) -> bool {
                    *self == 0
                }

                fn display(&self) -> Option<String> {
                    Some(self.to_string())
                }
            }
        )*
    };
}

bind_signed!(i8, i16, i32, i64, isize);
bind_unsigned!(u8, u16, u32, u64, usize);

impl Bindable for f64 {
    fn shape() -> Shape {
        Shape::Scalar(TypeHint::Rat)
    }

    fn coerce(token: &str, _truncate: bool) -> Result<Self, CoerceError> {
        parse_rat(token)
    }

    fn is_unset(&self) -> bool {
        *self == 0.0
    }

    fn display(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl Bindable for f32 {
    fn shape() -> Shape {
        Shape::Scalar(TypeHint::Rat)
    }

    fn coerce(token: &str, truncate: bool) -> Result<Self, CoerceError> {
        let value = parse_rat(token)?;
        let narrowed = value as f32;

        if narrowed.is_infinite() && value.is_finite() && !truncate {
            return Err(CoerceError::Overflow {
                token: token.to_string(),
                target: "f32",
            });
        }

        Ok(narrowed)
    }

    fn is_unset(&self) -> bool {
        *self == 0.0
    }

    fn display(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl Bindable for String {
    fn shape() -> Shape {
        Shape::Scalar(TypeHint::Str)
    }

    fn coerce(token: &str, _truncate: bool) -> Result<Self, CoerceError> {
        Ok(token.to_string())
    }

    fn is_unset(&self) -> bool {
        self.is_empty()
    }

    fn display(&self) -> Option<String> {
        Some(self.clone())
    }
}

impl Bindable for File {
    fn shape() -> Shape {
        Shape::Scalar(TypeHint::File)
    }

    fn coerce(token: &str, _truncate: bool) -> Result<Self, CoerceError> {
        open_file(token)
    }
}

impl Bindable for FileMode {
    fn shape() -> Shape {
        Shape::Scalar(TypeHint::FileMode)
    }

    fn coerce(token: &str, _truncate: bool) -> Result<Self, CoerceError> {
        parse_file_mode(token)
    }

    fn is_unset(&self) -> bool {
        self.bits() == 0
    }

    fn display(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl Bindable for DateTime<FixedOffset> {
    fn shape() -> Shape {
        Shape::Scalar(TypeHint::Time)
    }

    fn coerce(token: &str, _truncate: bool) -> Result<Self, CoerceError> {
        parse_timestamp(token)
    }

    fn is_unset(&self) -> bool {
        self.timestamp() == 0 && self.timestamp_subsec_nanos() == 0
    }

    fn display(&self) -> Option<String> {
        Some(self.to_rfc3339())
    }
}

impl Bindable for Duration {
    fn shape() -> Shape {
        Shape::Scalar(TypeHint::Span)
    }

    fn coerce(token: &str, _truncate: bool) -> Result<Self, CoerceError> {
        parse_duration(token)
    }

    fn is_unset(&self) -> bool {
        self.is_zero()
    }

    fn display(&self) -> Option<String> {
        Some(humantime::format_duration(*self).to_string())
    }
}

impl Bindable for NetInterface {
    fn shape() -> Shape {
        Shape::Scalar(TypeHint::Iface)
    }

    fn coerce(token: &str, _truncate: bool) -> Result<Self, CoerceError> {
        lookup_interface(token)
    }

    fn is_unset(&self) -> bool {
        self.name.is_empty()
    }

    fn display(&self) -> Option<String> {
        Some(self.name.clone())
    }
}

impl Bindable for IpAddr {
    fn shape() -> Shape {
        Shape::Scalar(TypeHint::Ip)
    }

    fn coerce(token: &str, _truncate: bool) -> Result<Self, CoerceError> {
        resolve_ip(token)
    }

    fn is_unset(&self) -> bool {
        self.is_unspecified()
    }

    fn display(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl Bindable for IpNet {
    fn shape() -> Shape {
        Shape::Scalar(TypeHint::Cidr)
    }

    fn coerce(token: &str, _truncate: bool) -> Result<Self, CoerceError> {
        parse_network(token)
    }

    fn is_unset(&self) -> bool {
        self.addr().is_unspecified() && self.prefix_len() == 0
    }

    fn display(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl<T: Bindable> Bindable for Option<T> {
    fn shape() -> Shape {
        T::shape()
    }

    fn indirect() -> bool {
        true
    }

    fn coerce(token: &str, truncate: bool) -> Result<Self, CoerceError> {
        T::coerce(token, truncate).map(Some)
    }

    fn flip(&mut self) -> Result<(), CoerceError> {
        match self {
            Some(value) => value.flip(),
            None => {
                let mut value = T::vacant().ok_or(CoerceError::Unsupported {
                    hint: T::shape().hint(),
                })?;
                value.flip()?;
                *self = Some(value);
                Ok(())
            }
        }
    }

    fn vacant() -> Option<Self> {
        Some(None)
    }

    fn is_unset(&self) -> bool {
        self.is_none()
    }

    fn display(&self) -> Option<String> {
        self.as_ref().and_then(T::display)
    }

    fn nest<P: 'static>(lens: Lens<P, Self>) -> Option<Result<Nest<P>, BuildError>> {
        T::nest_optional(lens)
    }
}
