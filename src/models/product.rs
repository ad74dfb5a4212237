use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Fila de producto tal como la devuelve la hoja de cálculo.
/// La hoja mezcla números y strings, así que id/nombre/stock se leen de forma tolerante.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub nombre: String,
    #[serde(default, deserialize_with = "lenient_stock")]
    pub stock: i64,
    // Columnas extra de la hoja (ubicación, categoría, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Product {
    /// `query` ya en minúsculas: nombre sin distinguir mayúsculas, id por substring
    pub fn matches(&self, query: &str) -> bool {
        self.nombre.to_lowercase().contains(query) || self.id.contains(query)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "se esperaba string o número, llegó {}",
            other
        ))),
    }
}

fn lenient_stock<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let stock = match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.trunc() as i64))
                .unwrap_or(0)
        }
        _ => 0,
    };
    Ok(stock)
}
