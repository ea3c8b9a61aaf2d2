use crate::HashDigest;

/// RawValue holds a JSON document in its canonical textual form: the
/// compact serde_json rendering, with properties kept in submission order.
///
/// Content addresses are computed over exactly these bytes, so
/// canonicalization happens once, at construction, instead of at every
/// hashing site. Two RawValues built from differently-formatted renderings
/// of the same document are byte-identical, carry the same digest, and
/// compare equal.
#[derive(serde::Serialize, Clone)]
pub struct RawValue(Box<serde_json::value::RawValue>);

impl RawValue {
    pub fn from_str(s: &str) -> serde_json::Result<Self> {
        Self::from_string(s.to_owned())
    }

    pub fn from_string(s: String) -> serde_json::Result<Self> {
        let text = canonicalize(&s)?;
        Ok(Self(serde_json::value::RawValue::from_string(text)?))
    }

    pub fn from_value(value: &serde_json::Value) -> Self {
        // serde_json renders Values compactly, so this cannot introduce
        // insignificant whitespace.
        Self(
            serde_json::value::RawValue::from_string(value.to_string())
                .expect("a rendered Value is valid JSON"),
        )
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::from_str(self.get()).expect("held JSON is valid by construction")
    }

    pub fn is_null(&self) -> bool {
        self.get() == "null"
    }

    /// The bytes a content address is computed over.
    pub fn canonical_bytes(&self) -> &[u8] {
        self.get().as_bytes()
    }

    /// The content address of this document.
    pub fn digest(&self) -> HashDigest {
        HashDigest::of(self.canonical_bytes())
    }
}

// Strip insignificant whitespace by streaming the document through a
// compact serializer. Whitespace inside string values survives; key order
// is preserved. No Value tree is built.
fn canonicalize(s: &str) -> serde_json::Result<String> {
    let compact = !s
        .bytes()
        .any(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'));
    if compact {
        return Ok(s.to_owned());
    }

    let mut out = Vec::with_capacity(s.len());
    let mut deserializer = serde_json::Deserializer::from_str(s);
    let mut serializer = serde_json::Serializer::new(&mut out);
    serde_transcode::transcode(&mut deserializer, &mut serializer)?;
    deserializer.end()?;
    Ok(String::from_utf8(out).expect("serde_json emits utf-8"))
}

// Canonical form makes equality plain byte equality.
impl std::cmp::PartialEq<RawValue> for RawValue {
    fn eq(&self, other: &RawValue) -> bool {
        self.get() == other.get()
    }
}

impl<'de> serde::Deserialize<'de> for RawValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let inner = Box::<serde_json::value::RawValue>::deserialize(deserializer)?;
        Ok(inner.into())
    }
}

impl Default for RawValue {
    fn default() -> Self {
        Self(serde_json::value::RawValue::from_string("null".to_string()).unwrap())
    }
}

// Documents arriving through serde keep the formatting of their source;
// re-canonicalize so the digest invariant holds for every RawValue.
impl From<Box<serde_json::value::RawValue>> for RawValue {
    fn from(value: Box<serde_json::value::RawValue>) -> Self {
        let s: Box<str> = value.into();
        Self::from_string(s.into()).expect("transcoding already-parsed JSON cannot fail")
    }
}

impl From<RawValue> for Box<serde_json::value::RawValue> {
    fn from(RawValue(inner): RawValue) -> Self {
        inner
    }
}

impl From<RawValue> for String {
    fn from(value: RawValue) -> Self {
        let s: Box<str> = value.0.into();
        s.into()
    }
}

impl std::ops::Deref for RawValue {
    type Target = serde_json::value::RawValue;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Debug for RawValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl schemars::JsonSchema for RawValue {
    fn schema_name() -> std::borrow::Cow<'static, str> {
        "Value".into()
    }
    fn inline_schema() -> bool {
        true
    }
    fn json_schema(generator: &mut schemars::SchemaGenerator) -> schemars::Schema {
        <serde_json::Value as schemars::JsonSchema>::json_schema(generator)
    }
}
