use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

/// "views" query for the data-slice options of the checked variables of a
/// single dataset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ViewsQuery {
    pub variables: Vec<String>,
    pub variable_count: usize,
}

impl ViewsQuery {
    pub fn new(variables: Vec<String>) -> Self {
        Self {
            variable_count: variables.len(),
            variables,
        }
    }

    pub fn to_query(&self) -> String {
        format!(
            "get=views&variables={}&variableCount={}&contentType=application/json",
            self.variables.join(","),
            self.variable_count
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewOption {
    #[serde(deserialize_with = "string_or_number")]
    pub value: String,
    #[serde(default)]
    pub label: String,
}

#[derive(Deserialize)]
struct ViewsResponse {
    #[serde(default)]
    views: Vec<ViewOption>,
}

fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(d)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

/// Options from a `{"views": [{value, label}]}` payload. Anything malformed
/// yields no options.
pub fn parse_views_response(text: &str) -> Vec<ViewOption> {
    match serde_json::from_str::<ViewsResponse>(text) {
        Ok(resp) => resp.views,
        Err(e) => {
            debug!(error = %e, "views response rejected");
            Vec::new()
        }
    }
}
