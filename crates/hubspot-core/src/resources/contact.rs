//! Contacts.

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::Result;
use crate::connection::Connection;
use crate::endpoint::Endpoint;
use crate::error::DecodeError;
use crate::paged::{Page, PageConfig, PagedCollection};
use crate::properties::{self, PROPERTY_KEY, Properties};

use super::{array, flag, integer, optional_integer};

const ALL_PATH: &str = "/contacts/v1/lists/all/contacts/all";
const CREATE_PATH: &str = "/contacts/v1/contact";
const CREATE_OR_UPDATE_PATH: &str = "/contacts/v1/contact/createOrUpdate/email/:email";
const DELETE_PATH: &str = "/contacts/v1/contact/vid/:id";
const FIND_PATH: &str = "/contacts/v1/contact/vid/:id/profile";
const FIND_BY_EMAIL_PATH: &str = "/contacts/v1/contact/email/:email/profile";
const FIND_BY_USER_TOKEN_PATH: &str = "/contacts/v1/contact/utk/:token/profile";
const MERGE_PATH: &str = "/contacts/v1/contact/merge-vids/:id/";
const SEARCH_PATH: &str = "/contacts/v1/search/query";
const UPDATE_PATH: &str = "/contacts/v1/contact/vid/:id/profile";

/// Largest page the contact list endpoints accept.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A contact record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contact {
    /// Contact id.
    pub vid: i64,

    /// Decoded properties.
    pub properties: Properties,

    /// `is-contact` as reported by the API, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_contact: Option<bool>,

    /// Raw `list-memberships` entries.
    pub list_memberships: Vec<Value>,

    /// Set when create-or-update created the contact.
    pub is_new: bool,

    #[serde(skip)]
    destroyed: bool,
}

impl Contact {
    /// Build a contact from an API response object.
    ///
    /// # Errors
    ///
    /// Returns an error if `vid` is missing or not an integer.
    pub fn from_value(value: &Value) -> std::result::Result<Self, DecodeError> {
        Ok(Self {
            vid: integer(value, "vid")?,
            properties: properties::decode(value.get("properties"), PROPERTY_KEY),
            is_contact: value.get("is-contact").and_then(Value::as_bool),
            list_memberships: value
                .get("list-memberships")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
            is_new: value.get("isNew").and_then(Value::as_bool).unwrap_or(false),
            destroyed: false,
        })
    }

    /// A single property value.
    pub fn get(&self, property: &str) -> Option<&Value> {
        self.properties.get(property)
    }

    pub fn email(&self) -> Option<&str> {
        self.get("email").and_then(Value::as_str)
    }

    /// The user token (`usertoken` property).
    pub fn utk(&self) -> Option<&str> {
        self.get("usertoken").and_then(Value::as_str)
    }

    /// First and last name joined by a space.
    ///
    /// Absent or non-text parts are skipped. An empty part is kept, so a blank
    /// first name leaves a leading space.
    pub fn name(&self) -> String {
        ["firstname", "lastname"]
            .iter()
            .filter_map(|p| self.get(p).and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Update the contact remotely, then merge `properties` into this record.
    pub fn update(&mut self, client: &Contacts<'_>, properties: Properties) -> Result<&mut Self> {
        client.update(self.vid, &properties)?;
        self.properties.extend(properties);
        Ok(self)
    }

    /// Delete the contact and mark this record as destroyed.
    pub fn destroy(&mut self, client: &Contacts<'_>) -> Result<()> {
        client.delete(self.vid)?;
        self.destroyed = true;
        Ok(())
    }

    /// Merge `other` into this contact.
    pub fn merge<'c>(&self, client: &Contacts<'_>, other: impl Into<ContactRef<'c>>) -> Result<()> {
        client.merge(self.vid, other)
    }
}

/// A contact given either by id or by record.
#[derive(Debug, Clone, Copy)]
pub enum ContactRef<'c> {
    ById(i64),
    ByRecord(&'c Contact),
}

impl ContactRef<'_> {
    pub fn vid(&self) -> i64 {
        match self {
            ContactRef::ById(vid) => *vid,
            ContactRef::ByRecord(contact) => contact.vid,
        }
    }
}

impl From<i64> for ContactRef<'_> {
    fn from(vid: i64) -> Self {
        ContactRef::ById(vid)
    }
}

impl<'c> From<&'c Contact> for ContactRef<'c> {
    fn from(contact: &'c Contact) -> Self {
        ContactRef::ByRecord(contact)
    }
}

/// Contact operations.
#[derive(Debug, Clone, Copy)]
pub struct Contacts<'a> {
    conn: &'a Connection,
}

impl<'a> Contacts<'a> {
    pub(crate) fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Every contact in the portal, paged by `vidOffset`.
    pub fn all(&self, config: PageConfig<i64>) -> PagedCollection<'a, Contact, i64> {
        let conn = self.conn;
        PagedCollection::new(config, MAX_PAGE_SIZE, move |options, offset, limit| {
            let endpoint = Endpoint::new(ALL_PATH)
                .extend_query(options)
                .query("count", limit)
                .query_opt("vidOffset", offset);
            let response = conn.get_json(&endpoint)?;

            Ok(Page::new(
                contacts_in(&response, "contacts")?,
                optional_integer(&response, "vid-offset")?,
                flag(&response, "has-more")?,
            ))
        })
    }

    /// Full-text search over contacts.
    pub fn search(
        &self,
        query: &str,
        config: PageConfig<i64>,
    ) -> PagedCollection<'a, Contact, i64> {
        let conn = self.conn;
        let query = query.to_string();
        PagedCollection::new(config, MAX_PAGE_SIZE, move |options, offset, limit| {
            let endpoint = Endpoint::new(SEARCH_PATH)
                .extend_query(options)
                .query("q", &query)
                .query_opt("offset", offset)
                .query("count", limit);
            let response = conn.get_json(&endpoint)?;

            Ok(Page::new(
                contacts_in(&response, "contacts")?,
                optional_integer(&response, "offset")?,
                flag(&response, "has-more")?,
            ))
        })
    }

    #[instrument(skip(self))]
    pub fn find(&self, vid: i64) -> Result<Contact> {
        let response = self
            .conn
            .get_json(&Endpoint::new(FIND_PATH).param("id", vid))?;
        Ok(Contact::from_value(&response)?)
    }

    #[instrument(skip(self))]
    pub fn find_by_email(&self, email: &str) -> Result<Contact> {
        let response = self
            .conn
            .get_json(&Endpoint::new(FIND_BY_EMAIL_PATH).param("email", email))?;
        Ok(Contact::from_value(&response)?)
    }

    #[instrument(skip(self, token))]
    pub fn find_by_user_token(&self, token: &str) -> Result<Contact> {
        let response = self
            .conn
            .get_json(&Endpoint::new(FIND_BY_USER_TOKEN_PATH).param("token", token))?;
        Ok(Contact::from_value(&response)?)
    }

    /// Create a contact. `email` overrides any `email` in `properties`.
    #[instrument(skip(self, properties))]
    pub fn create(&self, email: &str, properties: &Properties) -> Result<Contact> {
        let mut properties = properties.clone();
        properties.insert("email".to_string(), Value::String(email.to_string()));

        let body = json!({ "properties": properties::encode(&properties, PROPERTY_KEY) });
        let response = self.conn.post_json(&Endpoint::new(CREATE_PATH), body)?;
        let contact = Contact::from_value(&response)?;

        debug!(vid = contact.vid, "contact created");
        Ok(contact)
    }

    /// Create the contact for `email`, or update it if it exists.
    ///
    /// The returned record carries `vid` and `is_new`; properties are only
    /// present if the API echoed them.
    #[instrument(skip(self, properties))]
    pub fn create_or_update(&self, email: &str, properties: &Properties) -> Result<Contact> {
        let body = json!({ "properties": properties::encode(properties, PROPERTY_KEY) });
        let response = self.conn.post_json(
            &Endpoint::new(CREATE_OR_UPDATE_PATH).param("email", email),
            body,
        )?;
        Ok(Contact::from_value(&response)?)
    }

    #[instrument(skip(self, properties))]
    pub fn update(&self, vid: i64, properties: &Properties) -> Result<()> {
        let body = json!({ "properties": properties::encode(properties, PROPERTY_KEY) });
        self.conn
            .post_json(&Endpoint::new(UPDATE_PATH).param("id", vid), body)?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn delete(&self, vid: i64) -> Result<()> {
        self.conn
            .delete_json(&Endpoint::new(DELETE_PATH).param("id", vid))?;
        Ok(())
    }

    /// Merge `secondary` into `primary`.
    pub fn merge<'c>(&self, primary: i64, secondary: impl Into<ContactRef<'c>>) -> Result<()> {
        let secondary = secondary.into().vid();
        debug!(primary, secondary, "merging contacts");
        self.conn.post_unparsed(
            &Endpoint::new(MERGE_PATH).param("id", primary),
            json!({ "vidToMerge": secondary }),
        )
    }
}

fn contacts_in(response: &Value, name: &str) -> std::result::Result<Vec<Contact>, DecodeError> {
    array(response, name)?
        .iter()
        .map(Contact::from_value)
        .collect()
}
