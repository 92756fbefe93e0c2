//! Values that can be bound to a PostgreSQL query.

use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::types::Json;
use sqlx::{Database, Type};

/// A bind parameter. Typed values travel as text and are cast in SQL (`$1::date`).
#[derive(Clone, Debug, PartialEq)]
pub enum BindValue {
    Text(String),
    TextArray(Vec<String>),
    Json(Value),
}

impl<'q> Encode<'q, Postgres> for BindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        match self {
            BindValue::Text(s) => <&str as Encode<Postgres>>::encode_by_ref(&s.as_str(), buf),
            BindValue::TextArray(v) => <Vec<String> as Encode<Postgres>>::encode_by_ref(v, buf),
            BindValue::Json(v) => <Json<&Value> as Encode<Postgres>>::encode_by_ref(&Json(v), buf),
        }
    }

    fn produces(&self) -> Option<PgTypeInfo> {
        Some(match self {
            BindValue::Text(_) => <String as Type<Postgres>>::type_info(),
            BindValue::TextArray(_) => <Vec<String> as Type<Postgres>>::type_info(),
            BindValue::Json(_) => <Json<Value> as Type<Postgres>>::type_info(),
        })
    }
}

impl Type<Postgres> for BindValue {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("TEXT")
    }
}
