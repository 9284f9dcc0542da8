use dump_data::{DataError, Dialect};
use dump_data_sqlx::{Database, SqlxErrorExt};

#[derive(Clone, Copy)]
enum Column {
    Int(&'static str),
    Text(&'static str),
    NullableText(&'static str),
}

use Column::{Int, NullableText, Text};

const TABLES: &[(&str, &[Column])] = &[
    ("admin", &[Text("name"), Text("password"), Int("created"), Int("updated")]),
    (
        "user",
        &[Text("name"), Int("money"), Text("password"), Int("created"), Int("updated")],
    ),
    (
        "goods",
        &[
            Text("name"),
            Int("price"),
            Int("stock"),
            Text("tag"),
            Int("created"),
            Int("updated"),
        ],
    ),
    (
        "cart",
        &[Int("user_id"), Int("goods_id"), Int("num"), Int("created"), Int("updated")],
    ),
    (
        "order",
        &[
            Text("order_no"),
            Int("user_id"),
            Int("total_price"),
            Text("status"),
            Int("created"),
            Int("updated"),
        ],
    ),
    (
        "order_detail",
        &[
            Text("order_no"),
            Int("goods_id"),
            Text("goods_name"),
            Int("num"),
            Int("created"),
            Int("updated"),
        ],
    ),
    (
        "order_log",
        &[Text("order_no"), Text("status"), NullableText("remark"), Int("created")],
    ),
    (
        "delivery",
        &[
            Int("admin_id"),
            Text("order_no"),
            Text("tracking_number"),
            Int("created"),
            Int("updated"),
        ],
    ),
    (
        "product",
        &[
            Text("name"),
            Text("sku"),
            Int("price"),
            NullableText("description"),
            Int("created"),
            Int("updated"),
        ],
    ),
];

/// `CREATE TABLE IF NOT EXISTS` statements for every entity, `;`-separated.
pub fn schema(dialect: Dialect) -> String {
    let quote = if dialect == Dialect::MySql { '`' } else { '"' };
    let (id, text) = match dialect {
        Dialect::Postgres => ("BIGSERIAL PRIMARY KEY", "TEXT"),
        Dialect::MySql => ("BIGINT AUTO_INCREMENT PRIMARY KEY", "VARCHAR(255)"),
        Dialect::Sqlite | Dialect::Generic => ("INTEGER PRIMARY KEY AUTOINCREMENT", "TEXT"),
    };

    let mut ddl = String::new();
    for (table, columns) in TABLES {
        let mut defs = vec![format!("{quote}id{quote} {id}")];
        for column in columns.iter() {
            defs.push(match column {
                Int(name) => format!("{quote}{name}{quote} BIGINT NOT NULL DEFAULT 0"),
                Text(name) => format!("{quote}{name}{quote} {text} NOT NULL DEFAULT ''"),
                NullableText(name) => format!("{quote}{name}{quote} {text} NULL"),
            });
        }
        ddl.push_str(&format!(
            "CREATE TABLE IF NOT EXISTS {quote}{table}{quote} ({});\n",
            defs.join(", ")
        ));
    }
    ddl
}

/// Create every entity table that does not exist yet.
pub async fn create_schema(db: &Database) -> Result<(), DataError> {
    let ddl = schema(db.dialect());
    for statement in ddl.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        sqlx::query(statement)
            .execute(db.pool())
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
    }
    tracing::info!(tables = TABLES.len(), dialect = ?db.dialect(), "schema ready");
    Ok(())
}
