//! Macros to reduce boilerplate in the codebase

/// Macro to generate Display and FromStr implementations for enums
///
/// Parsing is case-insensitive; the display string is the canonical,
/// wire-level spelling (which is why it is matched after lowercasing).
///
/// # Usage
///
/// ```rust,ignore
/// enum_display_fromstr!(
///     MyEnum,
///     QueueError::invalid_my_enum,
///     {
///         Variant1 => "variant1",
///         Variant2 => "Variant2",
///     }
/// );
/// ```
#[macro_export]
macro_rules! enum_display_fromstr {
    (
        $enum_name:ident,
        $error_fn:path,
        { $($variant:ident => $str:expr),+ $(,)? }
    ) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $($enum_name::$variant => write!(f, "{}", $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = $crate::error::QueueError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                let lower = s.trim().to_lowercase();
                $(
                    if lower == $str.to_lowercase() {
                        return Ok($enum_name::$variant);
                    }
                )+
                Err($error_fn(s.to_string()))
            }
        }
    };
}
