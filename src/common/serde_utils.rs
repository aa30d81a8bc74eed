use serde::{Deserialize, Deserializer};

/// Diferencia campo ausente (`None`) de `null` explícito (`Some(None)`).
/// Usar junto com `#[serde(default, deserialize_with = "nullable")]`.
pub fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Aplica um patch anulável sobre o valor armazenado: ausente mantém o anterior.
pub fn patch<T>(current: Option<T>, change: Option<Option<T>>) -> Option<T> {
    match change {
        Some(value) => value,
        None => current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use uuid::Uuid;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "nullable")]
        deal_id: Option<Option<Uuid>>,
    }

    #[test]
    fn distinguishes_missing_from_null() {
        let missing: Probe = serde_json::from_str("{}").unwrap();
        let null: Probe = serde_json::from_str(r#"{"deal_id": null}"#).unwrap();
        assert_eq!(missing.deal_id, None);
        assert_eq!(null.deal_id, Some(None));
    }

    #[test]
    fn patch_retains_omitted_values() {
        assert_eq!(patch(Some(1), None), Some(1));
        assert_eq!(patch(Some(1), Some(None)), None);
        assert_eq!(patch(None, Some(Some(2))), Some(2));
    }
}
