//! `define_port_error!`: declare a port error enum together with the API
//! error code each variant surfaces as.
//!
//! ```ignore
//! define_port_error! {
//!     pub enum LessonRepositoryError {
//!         Connection { message: String } => ServiceUnavailable,
//!             "lesson repository connection failed: {message}",
//!         Query { message: String } => InternalError,
//!             "lesson repository query failed: {message}",
//!     }
//! }
//! ```
//!
//! Each variant gets a snake_case constructor whose fields accept
//! `impl Into<T>`, the enum gets `code()`, and `From<_> for Error` lets
//! services write `.map_err(Error::from)`.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($field: impl Into<$ty>),*) -> Self {
                Self::$variant { $($field: $field.into()),* }
            }
        }
    };

    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )?
                    => $code:ident, $message:literal
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*

            /// API error code this failure maps to.
            pub fn code(&self) -> $crate::domain::ErrorCode {
                match self {
                    $( Self::$variant { .. } => $crate::domain::ErrorCode::$code, )*
                }
            }
        }

        impl From<$name> for $crate::domain::Error {
            fn from(error: $name) -> Self {
                Self::new(error.code(), error.to_string())
            }
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    use crate::domain::{Error, ErrorCode};
    use rstest::rstest;

    define_port_error! {
        pub enum LessonStoreError {
            Offline => ServiceUnavailable, "lesson store offline",
            Missing { lesson: String } => NotFound, "lesson {lesson} not found",
            Overbooked { lesson: String, seats: u32 } => Conflict,
                "lesson {lesson} is full ({seats} seats)",
        }
    }

    #[rstest]
    fn constructors_convert_field_types() {
        assert_eq!(
            LessonStoreError::overbooked("piano-101", 4_u32).to_string(),
            "lesson piano-101 is full (4 seats)"
        );
        assert_eq!(LessonStoreError::offline(), LessonStoreError::Offline);
    }

    #[rstest]
    #[case(LessonStoreError::offline(), ErrorCode::ServiceUnavailable)]
    #[case(LessonStoreError::missing("violin-2"), ErrorCode::NotFound)]
    #[case(LessonStoreError::overbooked("violin-2", 1_u32), ErrorCode::Conflict)]
    fn variants_map_to_declared_codes(#[case] error: LessonStoreError, #[case] code: ErrorCode) {
        let message = error.to_string();
        let api: Error = error.into();
        assert_eq!(api.code(), code);
        assert_eq!(api.message(), message);
    }
}
