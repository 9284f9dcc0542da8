use dump_data::DataError;

/// `sqlx::Error` → [`DataError`], for use as `.map_err(SqlxErrorExt::into_data_error)`.
///
/// `RowNotFound` becomes `NotFound`; everything else is a database failure.
pub trait SqlxErrorExt {
    fn into_data_error(self) -> DataError;
}

impl SqlxErrorExt for sqlx::Error {
    fn into_data_error(self) -> DataError {
        if let sqlx::Error::RowNotFound = self {
            return DataError::not_found("row");
        }
        DataError::database(self)
    }
}
