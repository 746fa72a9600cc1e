//! Path taxonomy: semantic categories for artifact paths and the divergence
//! buckets derived from them.
//!
//! Both enums are declared through [`define_labels!`] so the variant list,
//! the wire label, `ALL`, and `Display` come from a single declaration.

/// Declares a label enum, `as_str()`, `ALL`, and `Display` from one list.
macro_rules! define_labels {
    (
        $(#[$enum_meta:meta])*
        $name:ident {
            $(
                $(#[$meta:meta])*
                $variant:ident => $label:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $(
                $(#[$meta])*
                $variant,
            )+
        }

        impl $name {
            /// The stable wire label written into reports.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $label, )+
                }
            }

            /// All variants in declaration order.
            pub const ALL: &[$name] = &[
                $( Self::$variant, )+
            ];
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub mod category;
pub mod divergence;
