//! Request arguments shared by `call` and `resolve`.

use std::collections::BTreeMap;

use clap::Args;

use partyline_common::{CallOptions, HeaderInput, ParamValue, QueryValue};

#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Endpoint id
    pub endpoint: String,

    /// Path template, e.g. /users/:id
    pub path: String,

    /// HTTP method
    #[arg(short = 'X', long)]
    pub method: Option<String>,

    /// Path parameter as name=value (repeatable)
    #[arg(short = 'p', long = "param", value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,

    /// Query parameter as name=value (repeatable; repeated names become a list)
    #[arg(short = 'q', long = "query", value_parser = parse_key_value)]
    pub query: Vec<(String, String)>,

    /// Header as 'Name: value' (repeatable; later wins)
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Request body. Sent as JSON when it parses as JSON, otherwise as text
    #[arg(short = 'd', long = "data")]
    pub data: Option<String>,
}

impl RequestArgs {
    /// Builds the call options these arguments describe.
    pub fn to_options(&self) -> CallOptions {
        let mut opts = CallOptions::default();

        for (name, value) in &self.params {
            opts = opts.with_path_param(name.clone(), value.clone());
        }

        let mut query: BTreeMap<String, Vec<ParamValue>> = BTreeMap::new();
        for (name, value) in &self.query {
            query
                .entry(name.clone())
                .or_default()
                .push(ParamValue::from(value.as_str()));
        }
        for (name, mut values) in query {
            let value = if values.len() == 1 {
                QueryValue::One(values.remove(0))
            } else {
                QueryValue::Many(values)
            };
            opts = opts.with_query(name, value);
        }

        if !self.headers.is_empty() {
            opts.headers = HeaderInput::Pairs(self.headers.clone());
        }
        opts.method.clone_from(&self.method);
        opts.body = self.data.as_deref().map(parse_body);

        opts
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected name=value, got '{s}'")),
    }
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    match s.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected 'Name: value', got '{s}'")),
    }
}

fn parse_body(s: &str) -> serde_json::Value {
    serde_json::from_str(s).unwrap_or_else(|_| serde_json::Value::String(s.to_string()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn args() -> RequestArgs {
        RequestArgs {
            endpoint: "cms".to_string(),
            path: "/posts/:id".to_string(),
            method: None,
            params: vec![],
            query: vec![],
            headers: vec![],
            data: None,
        }
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("id=42").unwrap(),
            ("id".to_string(), "42".to_string())
        );
        assert_eq!(
            parse_key_value("q=a=b").unwrap(),
            ("q".to_string(), "a=b".to_string())
        );
        assert!(parse_key_value("id").is_err());
        assert!(parse_key_value("=42").is_err());
    }

    #[test]
    fn test_parse_header() {
        assert_eq!(
            parse_header("Authorization: Bearer x").unwrap(),
            ("Authorization".to_string(), "Bearer x".to_string())
        );
        assert!(parse_header("no-colon").is_err());
    }

    #[test]
    fn test_body_json_or_text() {
        assert_eq!(parse_body(r#"{"a": 1}"#), serde_json::json!({"a": 1}));
        assert_eq!(
            parse_body("hello"),
            serde_json::Value::String("hello".to_string())
        );
    }

    #[test]
    fn test_to_options() {
        let mut request = args();
        request.method = Some("post".to_string());
        request.params = vec![("id".to_string(), "7".to_string())];
        request.query = vec![
            ("tag".to_string(), "a".to_string()),
            ("page".to_string(), "2".to_string()),
            ("tag".to_string(), "b".to_string()),
        ];
        request.headers = vec![
            ("X-Trace".to_string(), "1".to_string()),
            ("X-Trace".to_string(), "2".to_string()),
        ];

        let opts = request.to_options();

        assert_eq!(opts.method(), "POST");
        assert_eq!(opts.path_params["id"].to_string(), "7");
        assert_eq!(opts.query["tag"].to_strings(), vec!["a", "b"]);
        assert_eq!(opts.query["page"].to_strings(), vec!["2"]);
        assert_eq!(opts.headers.normalize()["X-Trace"], "2");
        assert!(opts.body.is_none());
    }
}
