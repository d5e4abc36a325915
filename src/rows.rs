use crate::error::Error;
use crate::{Result, Value};

pub enum ColumnIndex {
    Name(String),
    Position(usize),
}

impl From<usize> for ColumnIndex {
    fn from(i: usize) -> Self {
        Self::Position(i)
    }
}

impl From<&str> for ColumnIndex {
    fn from(s: &str) -> Self {
        Self::Name(s.to_string())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Creates a new row.
    /// Private outside this crate.
    pub(crate) fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Gets a column by index.
    ///
    /// If an index (string or numeric) is not present, an error is raised.
    pub fn get<C: Into<ColumnIndex>>(&self, i: C) -> Result<&Value> {
        let i = match i.into() {
            ColumnIndex::Name(name) => self
                .columns
                .iter()
                .position(|column_name| column_name.eq_ignore_ascii_case(&name))
                .ok_or_else(|| Error::from(format!("Unable to read {} column", name)))?,
            ColumnIndex::Position(index) => index,
        };

        self.values
            .get(i)
            .ok_or_else(|| Error::from(format!("Unable to read {} index", i)))
    }
}

#[cfg(test)]
mod tests {
    use crate::{Row, Value};

    #[test]
    fn can_read_columns_by_name_and_position() {
        let row = Row::new(
            vec!["migration".to_string(), "applied".to_string()],
            vec![Value::from("a"), Value::Boolean(false)],
        );

        assert_eq!(row.get("migration").unwrap(), &Value::from("a"));
        assert_eq!(row.get("APPLIED").unwrap(), &Value::Boolean(false));
        assert_eq!(row.get(1_usize).unwrap(), &Value::Boolean(false));
        assert!(row.get("missing").is_err());
        assert!(row.get(2_usize).is_err());
    }
}
