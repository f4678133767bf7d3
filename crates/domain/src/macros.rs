//! Macro for implementing Display and FromStr for wire-level enums
//!
//! Query parameters and XML fields carry short lowercase tokens (`aes`,
//! `raw`, `subscribe`, ...). This macro maps them to enum variants with
//! case-insensitive parsing and consistent lowercase output.
//!
//! # Example
//!
//! ```rust
//! use courier_domain::impl_wire_enum_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Channel {
//!     Push,
//!     Pull,
//! }
//!
//! impl_wire_enum_conversions!(Channel {
//!     Push => "push",
//!     Pull => "pull",
//! });
//!
//! assert_eq!("PUSH".parse::<Channel>(), Ok(Channel::Push));
//! assert_eq!(Channel::Pull.to_string(), "pull");
//! ```

/// Implements Display and FromStr for wire-level enums
///
/// This macro generates:
/// - Display trait: writes the variant's wire token
/// - FromStr trait: parses case-insensitive tokens; unknown tokens produce a
///   descriptive `String` error naming the enum
#[macro_export]
macro_rules! impl_wire_enum_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl ::core::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl ::core::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                match s.to_ascii_lowercase().as_str() {
                    $($str => ::core::result::Result::Ok(Self::$variant),)+
                    _ => ::core::result::Result::Err(::std::format!(
                        "Invalid {}: {}",
                        ::core::stringify!($enum_name),
                        s
                    )),
                }
            }
        }
    };
}
