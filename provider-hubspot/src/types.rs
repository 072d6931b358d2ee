use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A CRM object as returned by the list endpoints
///
/// Only the requested `properties` are present. Values are passed through
/// untouched; HubSpot sends unset properties as `null`.
///
/// API Reference: https://developers.hubspot.com/docs/api/crm/contacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubSpotObject {
    pub id: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl HubSpotObject {
    /// Property as a string, with `null`, non-string and empty values treated
    /// as absent
    pub fn text(&self, name: &str) -> Option<&str> {
        self.properties
            .get(name)
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Property value, `null` if HubSpot did not send it
    pub fn property(&self, name: &str) -> Value {
        self.properties.get(name).cloned().unwrap_or(Value::Null)
    }
}

/// One page of a list call
///
/// API Reference: https://developers.hubspot.com/docs/api/crm/understanding-the-crm#paging
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListObjectsResponse {
    #[serde(default)]
    pub results: Vec<HubSpotObject>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

impl ListObjectsResponse {
    /// Cursor for the following page, if any
    pub fn next_cursor(&self) -> Option<&str> {
        self.paging
            .as_ref()
            .and_then(|p| p.next.as_ref())
            .map(|n| n.after.as_str())
            .filter(|after| !after.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub next: Option<NextPage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NextPage {
    #[serde(default)]
    pub after: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_with_cursor() {
        let body = r#"{
            "results": [
                {"id": "1", "properties": {"email": "a@b.com", "firstname": null}},
                {"id": "2"}
            ],
            "paging": {"next": {"after": "c1", "link": "ignored"}}
        }"#;

        let page: ListObjectsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.next_cursor(), Some("c1"));
        assert_eq!(page.results[0].text("email"), Some("a@b.com"));
        assert_eq!(page.results[0].text("firstname"), None);
        assert_eq!(page.results[0].property("firstname"), Value::Null);
        assert!(page.results[1].properties.is_empty());
    }

    #[test]
    fn test_last_page_has_no_cursor() {
        let page: ListObjectsResponse = serde_json::from_str(r#"{"results": []}"#).unwrap();
        assert_eq!(page.next_cursor(), None);

        let page: ListObjectsResponse =
            serde_json::from_str(r#"{"paging": {"next": {"after": ""}}}"#).unwrap();
        assert!(page.results.is_empty());
        assert_eq!(page.next_cursor(), None);
    }
}
