//! Newtype IDs for type-safe entity references.
//!
//! Every table keyed by a `SERIAL` column gets its own ID type, so an
//! ingredient id can never be passed where a product id is expected.

/// Define one or more `i32`-backed ID newtypes.
///
/// Each generated type has:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_i32()`
/// - `From<i32>` and `Into<i32>` implementations
/// - a transparent `sqlx::Type` (with `postgres` feature)
///
/// `Ord` matters: ingredient ids key the consumption map, and its ascending
/// order is the order in which stock rows get locked.
macro_rules! define_id {
    ($($name:ident),+ $(,)?) => {
        $(
            #[derive(
                Debug,
                Clone,
                Copy,
                PartialEq,
                Eq,
                Hash,
                PartialOrd,
                Ord,
                ::serde::Serialize,
                ::serde::Deserialize
            )]
            #[cfg_attr(feature = "postgres", derive(::sqlx::Type))]
            #[cfg_attr(feature = "postgres", sqlx(transparent))]
            #[serde(transparent)]
            pub struct $name(i32);

            impl $name {
                /// Create a new ID from an i32 value.
                #[must_use]
                pub const fn new(id: i32) -> Self {
                    Self(id)
                }

                /// Get the underlying i32 value.
                #[must_use]
                pub const fn as_i32(&self) -> i32 {
                    self.0
                }
            }

            impl ::core::fmt::Display for $name {
                fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl From<i32> for $name {
                fn from(id: i32) -> Self {
                    Self(id)
                }
            }

            impl From<$name> for i32 {
                fn from(id: $name) -> Self {
                    id.0
                }
            }
        )+
    };
}

define_id!(
    UserId,
    IngredientId,
    ProductId,
    OrderId,
    OrderItemId,
    ShiftId,
    LogEntryId,
);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrip() {
        let id = IngredientId::new(42);
        assert_eq!(id.as_i32(), 42);
        assert_eq!(i32::from(id), 42);
        assert_eq!(IngredientId::from(42), id);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_id_serde_is_transparent() {
        let json = serde_json::to_string(&OrderId::new(7)).unwrap();
        assert_eq!(json, "7");

        let parsed: ProductId = serde_json::from_str("13").unwrap();
        assert_eq!(parsed, ProductId::new(13));
    }

    #[test]
    fn test_ids_order_numerically() {
        let mut ids = vec![IngredientId::new(3), IngredientId::new(1), IngredientId::new(2)];
        ids.sort();
        assert_eq!(ids, [1, 2, 3].map(IngredientId::new));
    }
}
