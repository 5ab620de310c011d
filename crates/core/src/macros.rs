// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative macros for reducing boilerplate.
//!
//! - [`simple_display!`] — `Display` for fieldless status enums, mapping each
//!   variant to its wire label
//! - [`setters!`] — chainable setter methods for spec/config structs

/// Implement `Display` for a fieldless enum by mapping every variant to a
/// string literal. The labels are the same strings serde puts on the wire.
///
/// ```ignore
/// crate::simple_display! {
///     ExecutionStatus {
///         Scheduled => "scheduled",
///         Running => "running",
///     }
/// }
/// ```
#[macro_export]
macro_rules! simple_display {
    ($ty:ty { $( $variant:ident => $label:literal ),+ $(,)? }) => {
        impl ::std::fmt::Display for $ty {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $( Self::$variant => f.write_str($label), )+
                }
            }
        }
    };
}

/// Generate chainable setter methods inside an existing `impl` block.
///
/// Accepts any number of field groups, in any order; each group picks the
/// setter flavour:
/// - `into { field: Type }` — setter takes `impl Into<Type>`
/// - `set { field: Type }` — setter takes `Type` as-is
/// - `option { field: Type }` — struct field is `Option<Type>`, setter wraps
///   the value in `Some`
///
/// ```ignore
/// impl JobSpec {
///     crate::setters! {
///         into { description: String }
///         set { target_ids: Vec<i64> }
///         option { scheduled_at: DateTime<Utc> }
///     }
/// }
/// ```
#[macro_export]
macro_rules! setters {
    () => {};
    (into { $( $field:ident : $ty:ty ),* $(,)? } $($rest:tt)*) => {
        $(
            pub fn $field(mut self, value: impl Into<$ty>) -> Self {
                self.$field = value.into();
                self
            }
        )*
        $crate::setters! { $($rest)* }
    };
    (set { $( $field:ident : $ty:ty ),* $(,)? } $($rest:tt)*) => {
        $(
            pub fn $field(mut self, value: $ty) -> Self {
                self.$field = value;
                self
            }
        )*
        $crate::setters! { $($rest)* }
    };
    (option { $( $field:ident : $ty:ty ),* $(,)? } $($rest:tt)*) => {
        $(
            pub fn $field(mut self, value: impl Into<$ty>) -> Self {
                self.$field = Some(value.into());
                self
            }
        )*
        $crate::setters! { $($rest)* }
    };
}
