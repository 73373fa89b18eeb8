//! A thin navigation layer over `serde_json::Value` for digging through
//! upstream JSON whose shape isn't under our control (spec section 9,
//! "Dynamic JSON"). Strict `#[derive(Deserialize)]` schemas fight back the
//! moment the upstream adds or renames a field; these getters fail soft
//! instead.

use serde_json::Value;

pub trait JsonTreeExt {
    /// Index into an object by key, or `Value::Null` if this isn't an
    /// object or the key is absent.
    fn get_path(&self, key: &str) -> &Value;

    fn as_string_or_default(&self, default: &str) -> String;

    fn as_u32_or_default(&self, default: u32) -> u32;

    fn as_bool_or_default(&self, default: bool) -> bool;
}

impl JsonTreeExt for Value {
    fn get_path(&self, key: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.get(key).unwrap_or(&NULL)
    }

    fn as_string_or_default(&self, default: &str) -> String {
        self.as_str().map(str::to_string).unwrap_or_else(|| default.to_string())
    }

    fn as_u32_or_default(&self, default: u32) -> u32 {
        self.as_u64().and_then(|n| u32::try_from(n).ok()).unwrap_or(default)
    }

    fn as_bool_or_default(&self, default: bool) -> bool {
        self.as_bool().unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn navigates_present_path() {
        let v = json!({"a": {"b": "c"}});
        assert_eq!(v.get_path("a").get_path("b").as_string_or_default(""), "c");
    }

    #[test]
    fn missing_path_yields_default() {
        let v = json!({"a": 1});
        assert_eq!(v.get_path("missing").as_string_or_default("fallback"), "fallback");
        assert_eq!(v.get_path("missing").get_path("deeper").as_u32_or_default(7), 7);
    }

    #[test]
    fn type_mismatch_yields_default_not_panic() {
        let v = json!({"a": "not a number"});
        assert_eq!(v.get_path("a").as_u32_or_default(0), 0);
        assert_eq!(v.get_path("a").as_bool_or_default(true), true);
    }
}
