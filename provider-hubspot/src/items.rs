//! Object types and their mapping onto [`IntegrationItem`]
//!
//! Normalization is pure: no property type validation, and every declared
//! parameter is present, `null` when HubSpot did not send it.

use crate::types::HubSpotObject;
use bridge_traits::IntegrationItem;
use std::fmt;

/// CRM object types that are synchronized, in output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Contacts,
    Companies,
    Deals,
}

impl ObjectType {
    pub const ALL: [ObjectType; 3] = [
        ObjectType::Contacts,
        ObjectType::Companies,
        ObjectType::Deals,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Contacts => "contacts",
            ObjectType::Companies => "companies",
            ObjectType::Deals => "deals",
        }
    }

    /// List endpoint, relative to the API base
    pub fn path(&self) -> &'static str {
        match self {
            ObjectType::Contacts => "/crm/v3/objects/contacts",
            ObjectType::Companies => "/crm/v3/objects/companies",
            ObjectType::Deals => "/crm/v3/objects/deals",
        }
    }

    /// Comma-separated `properties` query value
    pub fn properties(&self) -> &'static str {
        match self {
            ObjectType::Contacts => "firstname,lastname,email",
            ObjectType::Companies => "name,domain",
            ObjectType::Deals => "dealname,amount,dealstage",
        }
    }

    pub fn error_item_id(&self) -> &'static str {
        match self {
            ObjectType::Contacts => "error_contacts",
            ObjectType::Companies => "error_companies",
            ObjectType::Deals => "error_deals",
        }
    }

    pub fn error_title(&self) -> &'static str {
        match self {
            ObjectType::Contacts => "Contacts fetch error",
            ObjectType::Companies => "Companies fetch error",
            ObjectType::Deals => "Deals fetch error",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn normalize(object_type: ObjectType, object: &HubSpotObject) -> IntegrationItem {
    match object_type {
        ObjectType::Contacts => normalize_contact(object),
        ObjectType::Companies => normalize_company(object),
        ObjectType::Deals => normalize_deal(object),
    }
}

/// Synthetic item standing in for an object type whose fetch failed
pub fn error_item(object_type: ObjectType, message: impl Into<String>) -> IntegrationItem {
    IntegrationItem::new(object_type.error_item_id(), object_type.error_title())
        .with_parameter("error", message.into())
}

fn normalize_contact(object: &HubSpotObject) -> IntegrationItem {
    let full_name = format!(
        "{} {}",
        object.text("firstname").unwrap_or_default(),
        object.text("lastname").unwrap_or_default()
    );
    let full_name = full_name.trim();

    let title = if !full_name.is_empty() {
        full_name
    } else {
        object.text("email").unwrap_or(object.id.as_str())
    };

    IntegrationItem::new(object.id.clone(), title)
        .with_parameter("email", object.property("email"))
        .with_parameter("firstName", object.property("firstname"))
        .with_parameter("lastName", object.property("lastname"))
        .with_parameter("hubspotId", object.id.clone())
        .with_parameter("objectType", "contact")
}

fn normalize_company(object: &HubSpotObject) -> IntegrationItem {
    let title = object
        .text("name")
        .or_else(|| object.text("domain"))
        .unwrap_or(object.id.as_str());

    IntegrationItem::new(object.id.clone(), title)
        .with_parameter("name", object.property("name"))
        .with_parameter("domain", object.property("domain"))
        .with_parameter("hubspotId", object.id.clone())
        .with_parameter("objectType", "company")
}

fn normalize_deal(object: &HubSpotObject) -> IntegrationItem {
    let title = match object.text("dealname") {
        Some(name) => name.to_string(),
        None => format!("Deal {}", object.id),
    };

    IntegrationItem::new(object.id.clone(), title)
        .with_parameter("dealName", object.property("dealname"))
        .with_parameter("amount", object.property("amount"))
        .with_parameter("dealStage", object.property("dealstage"))
        .with_parameter("hubspotId", object.id.clone())
        .with_parameter("objectType", "deal")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn object(id: &str, properties: Value) -> HubSpotObject {
        serde_json::from_value(json!({"id": id, "properties": properties})).unwrap()
    }

    #[test]
    fn test_contact_title_prefers_full_name() {
        let item = normalize(
            ObjectType::Contacts,
            &object(
                "101",
                json!({"firstname": "Ada", "lastname": "Lovelace", "email": "ada@example.com"}),
            ),
        );

        assert_eq!(item.id, "101");
        assert_eq!(item.title, "Ada Lovelace");
        assert_eq!(item.parameter("firstName"), Some(&json!("Ada")));
        assert_eq!(item.parameter("hubspotId"), Some(&json!("101")));
        assert_eq!(item.parameter("objectType"), Some(&json!("contact")));
    }

    #[test]
    fn test_contact_single_name_is_trimmed() {
        let item = normalize(
            ObjectType::Contacts,
            &object("7", json!({"firstname": null, "lastname": "Hopper"})),
        );
        assert_eq!(item.title, "Hopper");
    }

    #[test]
    fn test_contact_falls_back_to_email_then_id() {
        let item = normalize(
            ObjectType::Contacts,
            &object("8", json!({"firstname": "", "lastname": "", "email": "a@b.com"})),
        );
        assert_eq!(item.title, "a@b.com");

        let item = normalize(ObjectType::Contacts, &object("9", json!({})));
        assert_eq!(item.title, "9");
        assert_eq!(item.parameter("email"), Some(&Value::Null));
        assert_eq!(item.parameter("lastName"), Some(&Value::Null));
    }

    #[test]
    fn test_company_title_fallbacks() {
        let named = normalize(
            ObjectType::Companies,
            &object("1", json!({"name": "Acme", "domain": "acme.io"})),
        );
        assert_eq!(named.title, "Acme");

        let domain_only = normalize(ObjectType::Companies, &object("2", json!({"domain": "acme.io"})));
        assert_eq!(domain_only.title, "acme.io");
        assert_eq!(domain_only.parameter("name"), Some(&Value::Null));

        let bare = normalize(ObjectType::Companies, &object("3", json!({})));
        assert_eq!(bare.title, "3");
        assert_eq!(bare.parameter("objectType"), Some(&json!("company")));
    }

    #[test]
    fn test_deal_without_name_uses_id() {
        let item = normalize(
            ObjectType::Deals,
            &object("42", json!({"amount": "1500", "dealstage": "closedwon"})),
        );

        assert_eq!(item.title, "Deal 42");
        assert_eq!(item.parameter("dealName"), Some(&Value::Null));
        assert_eq!(item.parameter("amount"), Some(&json!("1500")));
        assert_eq!(item.parameter("dealStage"), Some(&json!("closedwon")));
        assert_eq!(item.parameter("objectType"), Some(&json!("deal")));
    }

    #[test]
    fn test_error_item_shape() {
        let item = error_item(ObjectType::Companies, "HubSpot API error (status 500): boom");
        assert_eq!(item.id, "error_companies");
        assert_eq!(item.title, "Companies fetch error");
        assert_eq!(
            item.parameter("error"),
            Some(&json!("HubSpot API error (status 500): boom"))
        );
    }

    #[test]
    fn test_object_type_order_and_paths() {
        let names: Vec<_> = ObjectType::ALL.iter().map(ObjectType::as_str).collect();
        assert_eq!(names, ["contacts", "companies", "deals"]);
        assert_eq!(ObjectType::Deals.path(), "/crm/v3/objects/deals");
        assert_eq!(ObjectType::Companies.properties(), "name,domain");
    }
}
