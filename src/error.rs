use plotters::drawing::DrawingAreaErrorKind;
use thiserror::Error;

/// Errors raised while loading, cleaning, joining or charting the datasets
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// File I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV input
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// A table lacks columns the pipeline depends on
    #[error("missing required columns in {table}: {columns:?}")]
    MissingColumns { table: String, columns: Vec<String> },

    /// A cell that must hold a number does not
    #[error("invalid value {value:?} in {table} column {column:?} (row {row})")]
    InvalidValue {
        table: String,
        column: String,
        row: usize,
        value: String,
    },

    /// Plotting backend failure
    #[error("render error: {0}")]
    Render(String),
}

impl<E> From<DrawingAreaErrorKind<E>> for AnalysisError
where
    E: std::error::Error + Send + Sync,
{
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        AnalysisError::Render(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_names_every_column() {
        let err = AnalysisError::MissingColumns {
            table: "Life Expectancy Data".into(),
            columns: vec!["year".into(), "Alcohol".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("Life Expectancy Data"));
        assert!(msg.contains("\"year\""));
        assert!(msg.contains("\"Alcohol\""));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: AnalysisError = io_err.into();
        assert!(matches!(err, AnalysisError::Io(_)));
        assert!(err.to_string().contains("io error"));
    }
}
