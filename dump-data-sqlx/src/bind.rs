use dump_data::{DataError, Value};
use sqlx::any::AnyArguments;
use sqlx::Arguments;

/// Encode positional values for the `Any` driver.
pub(crate) fn arguments<'q>(params: &[Value]) -> Result<AnyArguments<'q>, DataError> {
    let mut args = AnyArguments::default();
    for value in params {
        let added = match value.clone() {
            Value::Null => args.add(None::<String>),
            Value::Bool(b) => args.add(b),
            Value::Int(i) => args.add(i),
            Value::Float(f) => args.add(f),
            Value::Text(s) => args.add(s),
            Value::Bytes(b) => args.add(b),
        };
        added.map_err(DataError::Database)?;
    }
    Ok(args)
}
