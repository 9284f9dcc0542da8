use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::value::Value;

/// A persisted object mapped to one table row.
///
/// Usually generated with `dump_data_sqlx::entity!`, but can be implemented
/// by hand.
///
/// # Example
///
/// ```ignore
/// impl Entity for Goods {
///     fn entity_name() -> &'static str { "Goods" }
///     fn table_name() -> &'static str { "goods" }
///     fn id_column() -> &'static str { "id" }
///     fn columns() -> &'static [&'static str] { &["id", "name", "price"] }
///     fn id(&self) -> i64 { self.id }
///     fn set_id(&mut self, id: i64) { self.id = id }
///     fn values(&self) -> Vec<(&'static str, Value)> { ... }
///     fn take_changes(&mut self) -> Changes { std::mem::take(&mut self.changes) }
/// }
/// ```
pub trait Entity: Debug + Send + Sync + Unpin + 'static {
    /// Name used as the `model` label in metrics and logs.
    fn entity_name() -> &'static str;
    fn table_name() -> &'static str;
    fn id_column() -> &'static str;
    fn columns() -> &'static [&'static str];

    fn id(&self) -> i64;
    fn set_id(&mut self, id: i64);

    /// Every column with its current value, in `columns()` order.
    fn values(&self) -> Vec<(&'static str, Value)>;

    /// Return the fields changed since load and reset the change set.
    fn take_changes(&mut self) -> Changes;

    /// Non-zero columns, used when the entity serves as an equality filter.
    fn template(&self) -> Vec<(&'static str, Value)> {
        self.values()
            .into_iter()
            .filter(|(_, value)| !value.is_zero())
            .collect()
    }
}

/// Columns changed since an entity was loaded, with their new values.
///
/// Recording the same column twice keeps the latest value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changes {
    fields: BTreeMap<&'static str, Value>,
}

impl Changes {
    pub fn record(&mut self, column: &'static str, value: impl Into<Value>) {
        self.fields.insert(column, value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.fields.iter().map(|(column, value)| (*column, value))
    }
}

impl IntoIterator for Changes {
    type Item = (&'static str, Value);
    type IntoIter = std::collections::btree_map::IntoIter<&'static str, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Cart {
        id: i64,
        user_id: i64,
        goods_id: i64,
        num: i64,
        changes: Changes,
    }

    impl Entity for Cart {
        fn entity_name() -> &'static str {
            "Cart"
        }
        fn table_name() -> &'static str {
            "cart"
        }
        fn id_column() -> &'static str {
            "id"
        }
        fn columns() -> &'static [&'static str] {
            &["id", "user_id", "goods_id", "num"]
        }
        fn id(&self) -> i64 {
            self.id
        }
        fn set_id(&mut self, id: i64) {
            self.id = id;
        }
        fn values(&self) -> Vec<(&'static str, Value)> {
            vec![
                ("id", self.id.into()),
                ("user_id", self.user_id.into()),
                ("goods_id", self.goods_id.into()),
                ("num", self.num.into()),
            ]
        }
        fn take_changes(&mut self) -> Changes {
            std::mem::take(&mut self.changes)
        }
    }

    #[test]
    fn test_template_skips_zero_fields() {
        let cart = Cart {
            user_id: 7,
            num: 2,
            ..Default::default()
        };
        assert_eq!(
            cart.template(),
            vec![("user_id", Value::Int(7)), ("num", Value::Int(2))]
        );
    }

    #[test]
    fn test_take_changes_resets() {
        let mut cart = Cart::default();
        cart.changes.record("num", 3i64);
        cart.changes.record("num", 4i64);

        let changes = cart.take_changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes.get("num"), Some(&Value::Int(4)));
        assert!(cart.take_changes().is_empty());
    }
}
