//! URL-encoded form handling

use crate::Error;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// Media type of a URL-encoded form body
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Parse URL-encoded form data
pub fn parse_form<T: DeserializeOwned>(body: &[u8]) -> Result<T, Error> {
    serde_urlencoded::from_bytes(body)
        .map_err(|e| Error::BadRequest(format!("Failed to parse form data: {}", e)))
}

/// Parse URL-encoded form data into a HashMap
pub fn parse_form_map(body: &[u8]) -> Result<HashMap<String, String>, Error> {
    let form_data: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
        .map_err(|e| Error::BadRequest(format!("Failed to parse form data: {}", e)))?;

    Ok(form_data.into_iter().collect())
}

/// Encode key/value pairs as a URL-encoded body
pub fn encode_form(fields: &[(&str, &str)]) -> Result<String, Error> {
    serde_urlencoded::to_string(fields).map_err(|e| Error::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct TitleForm {
        title: String,
    }

    #[test]
    fn test_parse_form() {
        let form: TitleForm = parse_form(b"title=Buy+milk").unwrap();
        assert_eq!(form.title, "Buy milk");
    }

    #[test]
    fn test_parse_form_map() {
        let map = parse_form_map(b"title=a&_csrf_token=xyz").unwrap();
        assert_eq!(map.get("_csrf_token"), Some(&"xyz".to_string()));
    }

    #[test]
    fn test_encode_form_round_trips_unicode() {
        let body = encode_form(&[("title", "テスト用のTodo")]).unwrap();
        let map = parse_form_map(body.as_bytes()).unwrap();
        assert_eq!(map.get("title"), Some(&"テスト用のTodo".to_string()));
    }
}
