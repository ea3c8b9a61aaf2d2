use lazy_static::lazy_static;
use std::collections::BTreeMap;

use crate::types;
use crate::{Parameter, SchemaError};
use models::{RawValue, SpecVersion};

/// A loader turns the raw `spec` block of a resource document into a typed
/// Parameter implementation.
pub type Loader = fn(&RawValue) -> Result<Box<dyn Parameter>, SchemaError>;

lazy_static! {
    // The process-wide data-type registry, keyed by (envelope version,
    // data-type name). Built once and read-only thereafter; new data types
    // register here and nowhere else.
    static ref DATA_TYPES: BTreeMap<(SpecVersion, &'static str), Loader> = {
        let mut registry = BTreeMap::new();
        let mut register = |name, loader: Loader| {
            registry.insert((SpecVersion::V1, name), loader);
        };
        register(types::integer::NAME, types::integer::load);
        register(types::float::NAME, types::float::load);
        register(types::string::NAME, types::string::load);
        register(types::boolean::NAME, types::boolean::load);
        register(types::array::NAME, types::array::load);
        register(types::dictionary::NAME, types::dictionary::load);
        register(types::object::NAME, types::object::load);
        registry
    };
}

/// The loader registered for (version, data-type name), if any.
pub fn lookup(version: SpecVersion, data_type: &str) -> Option<Loader> {
    DATA_TYPES.get(&(version, data_type)).copied()
}

/// Names of every data type registered for a version.
pub fn registered_types(version: SpecVersion) -> impl Iterator<Item = &'static str> {
    DATA_TYPES
        .keys()
        .filter(move |(v, _)| *v == version)
        .map(|(_, name)| *name)
}
