use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    NULL,
    Int(i64),
    String(String),
    Boolean(bool),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::NULL)
    }

    /// Reads the value as a boolean flag.
    ///
    /// Backends without a native boolean type store flags as integers.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(value) => Some(*value),
            Value::Int(value) => Some(*value != 0),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::NULL => write!(f, "NULL"),
            Value::Int(value) => write!(f, "{}", value),
            Value::String(value) => write!(f, "{}", value),
            Value::Boolean(value) => write!(f, "{}", value),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($value:expr),+ $(,)?) => {
        vec![$($crate::Value::from($value)),+]
    };
}

#[cfg(test)]
mod tests {
    use crate::Value;

    #[test]
    fn flags_can_be_read_from_integers() {
        assert_eq!(Value::Int(1).as_bool(), Some(true));
        assert_eq!(Value::Int(0).as_bool(), Some(false));
        assert_eq!(Value::Boolean(true).as_bool(), Some(true));
        assert_eq!(Value::from("x").as_bool(), None);
    }

    #[test]
    fn params_macro_converts_values() {
        let params = params!["name", true, 3_i64];
        assert_eq!(
            params,
            vec![
                Value::String("name".to_string()),
                Value::Boolean(true),
                Value::Int(3)
            ]
        );
        assert!(params!().is_empty());
    }
}
