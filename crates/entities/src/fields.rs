use serde_json::Value;
use sidescroll_level::FieldInstance;
use std::collections::BTreeMap;

/// Custom fields of an entity definition, flattened by field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityFields(BTreeMap<String, Value>);

impl EntityFields {
    /// Later duplicates of a field name overwrite earlier ones.
    pub fn from_instances(instances: &[FieldInstance]) -> Self {
        Self(
            instances
                .iter()
                .map(|f| (f.identifier.clone(), f.value.clone()))
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn get_f32(&self, name: &str) -> Option<f32> {
        self.get(name).and_then(Value::as_f64).map(|v| v as f32)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(name: &str, value: Value) -> FieldInstance {
        FieldInstance {
            identifier: name.into(),
            value,
        }
    }

    #[test]
    fn typed_getters() {
        let fields = EntityFields::from_instances(&[
            field("hp", json!(30)),
            field("speed", json!(1.5)),
            field("patrol", json!(true)),
            field("name", json!("zap")),
        ]);
        assert_eq!(fields.get_i64("hp"), Some(30));
        assert_eq!(fields.get_f32("speed"), Some(1.5));
        assert_eq!(fields.get_bool("patrol"), Some(true));
        assert_eq!(fields.get_str("name"), Some("zap"));
        assert_eq!(fields.get_str("hp"), None);
        assert_eq!(fields.len(), 4);
    }

    #[test]
    fn duplicate_names_last_wins() {
        let fields =
            EntityFields::from_instances(&[field("hp", json!(1)), field("hp", json!(2))]);
        assert_eq!(fields.get_i64("hp"), Some(2));
    }
}
