use sqlx::postgres;
use sqlx::{Decode, Encode, Type};

use models::RawValue;

/// The free-form `info` payload attached to catalog entities (tenants,
/// catalogs, variants, versions, workspaces, collections, namespaces).
///
/// Info columns are postgres JSON rather than JSONB: the document is opaque
/// to the engine and must come back exactly as submitted, property order
/// included. Only directories, which the engine manipulates server-side,
/// use JSONB.
#[derive(Clone, Debug)]
pub struct Info(pub RawValue);

impl Info {
    pub fn as_raw(&self) -> &RawValue {
        &self.0
    }

    pub fn into_raw(self) -> RawValue {
        self.0
    }
}

impl From<RawValue> for Info {
    fn from(raw: RawValue) -> Self {
        Self(raw)
    }
}

impl Type<postgres::Postgres> for Info {
    fn type_info() -> postgres::PgTypeInfo {
        postgres::PgTypeInfo::with_name("JSON")
    }
    fn compatible(ty: &postgres::PgTypeInfo) -> bool {
        // Deliberately not JSONB: an info payload round-trips verbatim.
        *ty == Self::type_info()
    }
}

impl Encode<'_, postgres::Postgres> for Info {
    fn encode_by_ref(&self, buf: &mut postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        // The wrapped RawValue already holds serialized JSON text, so the
        // wire form is a space (the JSON protocol marker) followed by the
        // document bytes as-is. No re-serialization happens on this path.
        buf.push(b' ');
        buf.extend_from_slice(self.0.get().as_bytes());
        sqlx::encode::IsNull::No
    }
}

impl<'r> Decode<'r, postgres::Postgres> for Info {
    fn decode(value: postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        // A JSON (not JSONB) value's wire form is the document text itself
        // in both protocol formats.
        let text = value.as_str()?;
        Ok(Self(RawValue::from_str(text)?))
    }
}
