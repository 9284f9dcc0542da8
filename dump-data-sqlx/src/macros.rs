/// Define an entity struct with an `i64` primary key `id`, change-tracking
/// setters, and the `Entity` and `FromRow<AnyRow>` impls.
///
/// ```ignore
/// dump_data_sqlx::entity! {
///     /// A product on sale.
///     pub struct Goods in "goods" {
///         name: String => set_name,
///         price: i64 => set_price,
///         stock: i64 => set_stock,
///     }
/// }
///
/// let mut goods = repo.find(&Goods { id: 4, ..Default::default() }, Shape::Default).await?;
/// goods.set_price(12);
/// repo.save(&mut goods).await?;
/// ```
#[macro_export]
macro_rules! entity {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident in $table:literal {
            $(
                $(#[$field_meta:meta])*
                $field:ident : $ty:ty => $setter:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        $vis struct $name {
            pub id: i64,
            $(
                $(#[$field_meta])*
                pub $field: $ty,
            )*
            #[doc(hidden)]
            pub changes: $crate::__private::Changes,
        }

        impl $name {
            $(
                pub fn $setter(&mut self, value: $ty) -> &mut Self {
                    self.$field = value;
                    self.changes
                        .record(stringify!($field), ::core::clone::Clone::clone(&self.$field));
                    self
                }
            )*

            /// Columns changed since load.
            pub fn changes(&self) -> &$crate::__private::Changes {
                &self.changes
            }
        }

        impl $crate::__private::Entity for $name {
            fn entity_name() -> &'static str {
                stringify!($name)
            }

            fn table_name() -> &'static str {
                $table
            }

            fn id_column() -> &'static str {
                "id"
            }

            fn columns() -> &'static [&'static str] {
                &["id", $(stringify!($field)),*]
            }

            fn id(&self) -> i64 {
                self.id
            }

            fn set_id(&mut self, id: i64) {
                self.id = id;
            }

            fn values(&self) -> ::std::vec::Vec<(&'static str, $crate::__private::Value)> {
                ::std::vec![
                    ("id", $crate::__private::Value::from(self.id)),
                    $(
                        (
                            stringify!($field),
                            $crate::__private::Value::from(::core::clone::Clone::clone(&self.$field)),
                        ),
                    )*
                ]
            }

            fn take_changes(&mut self) -> $crate::__private::Changes {
                ::core::mem::take(&mut self.changes)
            }
        }

        impl<'r> $crate::__private::sqlx::FromRow<'r, $crate::__private::sqlx::any::AnyRow> for $name {
            fn from_row(
                row: &'r $crate::__private::sqlx::any::AnyRow,
            ) -> ::core::result::Result<Self, $crate::__private::sqlx::Error> {
                use $crate::__private::sqlx::Row as _;
                ::core::result::Result::Ok(Self {
                    id: row.try_get("id")?,
                    $( $field: row.try_get(stringify!($field))?, )*
                    changes: ::core::default::Default::default(),
                })
            }
        }
    };
}
