// UDMF-style custom fields carried by sidedefs and sectors.
// Absent keys always fall back to the caller-supplied default, so the
// editor never has to materialise every field up front.

use std::collections::HashMap;

/// One stored field value.
#[derive(Clone, Debug, PartialEq)]
pub enum UniValue {
    Int(i32),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl From<i32> for UniValue {
    fn from(v: i32) -> Self {
        UniValue::Int(v)
    }
}

impl From<f64> for UniValue {
    fn from(v: f64) -> Self {
        UniValue::Float(v)
    }
}

impl From<bool> for UniValue {
    fn from(v: bool) -> Self {
        UniValue::Bool(v)
    }
}

impl From<&str> for UniValue {
    fn from(v: &str) -> Self {
        UniValue::Str(v.to_string())
    }
}

/// Key → value map.  Numeric getters accept either numeric variant.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UniFields {
    map: HashMap<String, UniValue>,
}

impl UniFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&UniValue> {
        self.map.get(key)
    }

    pub fn set<V: Into<UniValue>>(&mut self, key: &str, value: V) {
        self.map.insert(key.to_string(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<UniValue> {
        self.map.remove(key)
    }

    pub fn float(&self, key: &str, default: f64) -> f64 {
        match self.map.get(key) {
            Some(UniValue::Float(v)) => *v,
            Some(UniValue::Int(v)) => f64::from(*v),
            _ => default,
        }
    }

    pub fn int(&self, key: &str, default: i32) -> i32 {
        match self.map.get(key) {
            Some(UniValue::Int(v)) => *v,
            Some(UniValue::Float(v)) => *v as i32,
            _ => default,
        }
    }

    pub fn flag(&self, key: &str) -> bool {
        matches!(self.map.get(key), Some(UniValue::Bool(true)))
    }

    pub fn string<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        match self.map.get(key) {
            Some(UniValue::Str(s)) => s.as_str(),
            _ => default,
        }
    }

    pub fn set_float_or_remove(&mut self, key: &str, value: f64, default: f64) {
        if value == default {
            self.map.remove(key);
        } else {
            self.set(key, value);
        }
    }

    /// Store an integer, dropping the key when it equals `default`.
    pub fn set_int_or_remove(&mut self, key: &str, value: i32, default: i32) {
        if value == default {
            self.map.remove(key);
        } else {
            self.set(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_for_absent_keys() {
        let f = UniFields::new();
        assert_eq!(f.float("scalex_mid", 1.0), 1.0);
        assert_eq!(f.int("light", 0), 0);
        assert!(!f.flag("wrapmidtex"));
        assert_eq!(f.string("skew_middle_type", "none"), "none");
    }

    #[test]
    fn numeric_variants_interchange() {
        let mut f = UniFields::new();
        f.set("light", 16);
        f.set("offsetx_mid", 3.5);
        assert_eq!(f.float("light", 0.0), 16.0);
        assert_eq!(f.int("offsetx_mid", 0), 3);
    }

    #[test]
    fn set_int_or_remove_drops_default() {
        let mut f = UniFields::new();
        f.set("light", 10);
        f.set_int_or_remove("light", 0, 0);
        assert!(!f.contains("light"));
        f.set_int_or_remove("light", -8, 0);
        assert_eq!(f.int("light", 0), -8);
    }
}
