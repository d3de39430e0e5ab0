//! Macro for implementing Display and FromStr for small domain enums
//!
//! Used for enums that travel as lowercase words: command families in topics
//! and scheduler states in logs.
//!
//! # Example
//!
//! ```rust
//! use uplinkbridge_domain::impl_domain_enum_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Direction {
//!     Inbound,
//!     Outbound,
//! }
//!
//! impl_domain_enum_conversions!(Direction {
//!     Inbound => "inbound",
//!     Outbound => "outbound",
//! });
//!
//! assert_eq!(Direction::Inbound.to_string(), "inbound");
//! assert_eq!("OUTBOUND".parse::<Direction>(), Ok(Direction::Outbound));
//! ```

/// Implements Display and FromStr traits for unit-only enums
///
/// - Display writes the mapped lowercase word
/// - FromStr matches case-insensitively and names the enum in its error
#[macro_export]
macro_rules! impl_domain_enum_conversions {
    ($enum_name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
