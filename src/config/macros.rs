/// Configuration macros
///
/// `config_struct!` declares a section struct and its defaults in one place.

/// Define a configuration section with embedded defaults
///
/// Generates the struct with public fields, a `Default` impl built from the
/// listed values, and serde support with `#[serde(default)]` so partial TOML
/// files fall back field by field.
///
/// # Example
/// ```ignore
/// config_struct! {
///     pub struct DescriptionConfig {
///         enabled: bool = true,
///         interval_secs: u64 = 300,
///     }
/// }
/// ```
#[macro_export]
macro_rules! config_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_name:ident: $field_type:ty = $default_value:expr
            ),*
            $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(default)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field_name: $field_type,
            )*
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $(
                        $field_name: $default_value,
                    )*
                }
            }
        }
    };
}
