//! Common GraphQL types

use async_graphql::{Scalar, ScalarType, Value};
use chrono::{DateTime as ChronoDateTime, Utc};
use serde::{Deserialize, Serialize};

/// DateTime scalar, serialized as RFC 3339 in UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DateTime(pub ChronoDateTime<Utc>);

impl DateTime {
    pub fn now() -> Self {
        DateTime(Utc::now())
    }
}

#[Scalar]
impl ScalarType for DateTime {
    fn parse(value: Value) -> async_graphql::InputValueResult<Self> {
        if let Value::String(s) = value {
            Ok(DateTime(
                ChronoDateTime::parse_from_rfc3339(&s)
                    .map_err(|e| format!("Invalid DateTime: {}", e))?
                    .with_timezone(&Utc),
            ))
        } else {
            Err("Expected string for DateTime".into())
        }
    }

    fn to_value(&self) -> Value {
        Value::String(self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datetime_to_value() {
        let dt = DateTime::now();
        let value = dt.to_value();
        assert!(matches!(value, Value::String(_)));
    }

    #[test]
    fn test_datetime_parse_normalizes_to_utc() {
        let parsed = DateTime::parse(Value::String("2024-03-01T12:00:00+02:00".into())).unwrap();
        assert_eq!(parsed.0.to_rfc3339(), "2024-03-01T10:00:00+00:00");
    }

    #[test]
    fn test_datetime_parse_rejects_non_string() {
        assert!(DateTime::parse(Value::Boolean(true)).is_err());
    }
}
