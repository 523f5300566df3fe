//! Macros for defining kind enums.

/// Defines a fieldless enum of record kinds (statuses, methods, roles),
/// stored as `INT2` and rendered in `SCREAMING_SNAKE_CASE`.
///
/// Every variant must have an explicit non-zero discriminant, which is the
/// stored value, so never renumber the existing ones.
///
/// # Example
///
/// ```rust
/// use common::define_kind;
///
/// define_kind! {
///     #[doc = "Way a rent is paid."]
///     enum Method {
///         #[doc = "Bank transfer."]
///         BankTransfer = 1,
///
///         #[doc = "Cash."]
///         Cash = 2,
///     }
/// }
///
/// assert_eq!(Method::from_u8(2), Some(Method::Cash));
/// assert_eq!(Method::BankTransfer.to_string(), "BANK_TRANSFER");
/// assert_eq!(Method::ALL.len(), 2);
/// ```
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_kind {
    (
        #[doc = $doc:literal]
        enum $name:ident {
            $(
                #[doc = $variant_doc:literal]
                $variant:ident = $value:expr
            ),* $(,)?
        }
    ) => {
        #[derive(
            Clone,
            Copy,
            Debug,
            $crate::private::strum::Display,
            $crate::private::strum::EnumString,
            Eq,
            Hash,
            PartialEq,
        )]
        #[cfg_attr(
            feature = "serde",
            derive(
                $crate::private::serde::Deserialize,
                $crate::private::serde::Serialize,
            ),
            serde(rename_all = "SCREAMING_SNAKE_CASE"),
        )]
        #[doc = $doc]
        #[repr(u8)]
        #[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $(
                 #[doc = $variant_doc]
                 $variant = $value,
            )*
        }

        impl $name {
            #[doc = ::core::concat!(
                "All the [`", ::core::stringify!($name), "`] variants in \
                 the declaration order.",
            )]
            pub const ALL: &'static [Self] = &[$(Self::$variant),*];

            /// Converts this into its stored [`u8`] representation.
            #[must_use]
            pub const fn u8(self) -> u8 {
                self as u8
            }

            #[doc = ::core::concat!(
                "Restores the [`", ::core::stringify!($name), "`] from its \
                 stored [`u8`] representation, if there is such a variant.",
            )]
            #[must_use]
            pub const fn from_u8(value: u8) -> Option<Self> {
                $(
                    if value == Self::$variant.u8() {
                        return Some(Self::$variant);
                    }
                )*
                None
            }
        }

        #[cfg(feature = "postgres")]
        impl<'a> $crate::private::postgres_types::FromSql<'a> for $name {
            $crate::private::postgres_types::accepts!(INT2);

            fn from_sql(
                ty: &$crate::private::postgres_types::Type,
                raw: &[u8],
            ) -> Result<
                $name,
                Box<dyn ::std::error::Error
                    + ::core::marker::Sync
                    + ::core::marker::Send>,
            > {
                let v = u8::try_from(i16::from_sql(ty, raw)?)?;
                Self::from_u8(v).ok_or_else(|| ::std::format!(
                    "invalid `{}` value: {v}",
                    ::core::stringify!($name),
                ).into())
            }
        }

        #[cfg(feature = "postgres")]
        impl $crate::private::postgres_types::ToSql for $name {
            $crate::private::postgres_types::accepts!(INT2);
            $crate::private::postgres_types::to_sql_checked!();

            fn to_sql(
                &self,
                ty: &$crate::private::postgres_types::Type,
                w: &mut $crate::private::postgres_types::private::BytesMut,
            ) -> Result<
                $crate::private::postgres_types::IsNull,
                ::std::boxed::Box<
                    dyn ::std::error::Error
                        + ::core::marker::Sync
                        + ::core::marker::Send
                >,
            > {
                i16::from(self.u8()).to_sql(ty, w)
            }
        }
    };
}
