//! Companies.

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::Result;
use crate::connection::Connection;
use crate::endpoint::Endpoint;
use crate::error::{DecodeError, Error};
use crate::paged::{Page, PageConfig, PagedCollection};
use crate::properties::{self, NAME_KEY, Properties};

use super::contact::{Contact, ContactRef};
use super::{array, flag, integer, optional_integer};

const ADD_CONTACT_PATH: &str = "/companies/v2/companies/:id/contacts/:contact_id";
const ALL_PATH: &str = "/companies/v2/companies/paged";
const BATCH_UPDATE_PATH: &str = "/companies/v1/batch-async/update";
const CONTACTS_PATH: &str = "/companies/v2/companies/:id/contacts";
const CONTACT_IDS_PATH: &str = "/companies/v2/companies/:id/vids";
const CREATE_PATH: &str = "/companies/v2/companies/";
const DELETE_PATH: &str = "/companies/v2/companies/:id";
const FIND_PATH: &str = "/companies/v2/companies/:id";
const RECENTLY_CREATED_PATH: &str = "/companies/v2/companies/recent/created";
const RECENTLY_MODIFIED_PATH: &str = "/companies/v2/companies/recent/modified";
const REMOVE_CONTACT_PATH: &str = "/companies/v2/companies/:id/contacts/:contact_id";
const SEARCH_DOMAIN_PATH: &str = "/companies/v2/domains/:domain/companies";
const UPDATE_PATH: &str = "/companies/v2/companies/:id";

/// Largest page for the full company listing.
pub const MAX_PAGE_SIZE: u32 = 250;

/// Largest page for the recent, domain and contact-id listings.
pub const MAX_SECONDARY_PAGE_SIZE: u32 = 100;

/// Companies per batch update request.
pub const BATCH_SIZE: usize = 100;

/// A company record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Company {
    /// Company id (`companyId`).
    pub id: i64,

    /// Decoded properties.
    pub properties: Properties,

    /// The `name` property, when it is a string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip)]
    destroyed: bool,
}

impl Company {
    /// Build a company from an API response object.
    ///
    /// # Errors
    ///
    /// Returns an error if `companyId` is missing or not an integer.
    pub fn from_value(value: &Value) -> std::result::Result<Self, DecodeError> {
        let properties = properties::decode(value.get("properties"), NAME_KEY);
        let name = properties
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            id: integer(value, "companyId")?,
            properties,
            name,
            destroyed: false,
        })
    }

    pub fn get(&self, property: &str) -> Option<&Value> {
        self.properties.get(property)
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Update the company remotely, then merge `properties` into this record.
    pub fn update(&mut self, client: &Companies<'_>, properties: Properties) -> Result<&mut Self> {
        client.update(self.id, &properties)?;
        self.properties.extend(properties);
        self.name = self.properties.get("name").and_then(Value::as_str).map(str::to_string);
        Ok(self)
    }

    /// Delete the company and mark this record as destroyed.
    pub fn destroy(&mut self, client: &Companies<'_>) -> Result<()> {
        client.delete(self.id)?;
        self.destroyed = true;
        Ok(())
    }

    /// Associate a contact with this company.
    pub fn add_contact<'c>(
        &self,
        client: &Companies<'_>,
        contact: impl Into<ContactRef<'c>>,
    ) -> Result<()> {
        client.add_contact(self.id, contact)
    }

    /// Contact ids associated with this company.
    pub fn contact_ids<'a>(
        &self,
        client: &Companies<'a>,
        config: PageConfig<i64>,
    ) -> PagedCollection<'a, i64, i64> {
        client.contact_ids(self.id, config)
    }
}

/// How a batch update identifies its company.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanyId {
    /// Given as `vid`, as the rest of the API names record ids.
    Vid(i64),
    /// Given as `objectId`, as the batch endpoint names it.
    ObjectId(i64),
}

impl CompanyId {
    /// The id sent as `objectId`.
    pub fn object_id(&self) -> i64 {
        match self {
            CompanyId::Vid(id) | CompanyId::ObjectId(id) => *id,
        }
    }
}

/// One entry of a batch update.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyUpdate {
    pub id: CompanyId,
    pub properties: Properties,
}

impl CompanyUpdate {
    pub fn new(id: CompanyId, properties: Properties) -> Self {
        Self { id, properties }
    }

    /// Split the identifier out of a flat property map.
    ///
    /// Exactly one of `vid` or `objectId` must be present (null counts as
    /// absent). It is removed from the properties that get sent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParams`] when both or neither are present, or
    /// the id is not an integer.
    pub fn from_properties(mut properties: Properties) -> Result<Self> {
        let vid = properties.remove("vid").filter(|v| !v.is_null());
        let object_id = properties.remove("objectId").filter(|v| !v.is_null());

        let id = match (vid, object_id) {
            (Some(_), Some(_)) => {
                return Err(Error::InvalidParams(
                    "ambiguous company id: both vid and objectId given".to_string(),
                ));
            }
            (Some(vid), None) => CompanyId::Vid(parse_id(&vid, "vid")?),
            (None, Some(id)) => CompanyId::ObjectId(parse_id(&id, "objectId")?),
            (None, None) => {
                return Err(Error::InvalidParams(
                    "expecting vid or objectId for company".to_string(),
                ));
            }
        };

        Ok(Self { id, properties })
    }

    fn to_json(&self) -> Value {
        json!({
            "objectId": self.id.object_id(),
            "properties": properties::encode(&self.properties, NAME_KEY),
        })
    }
}

fn parse_id(value: &Value, name: &str) -> Result<i64> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        Error::InvalidParams(format!("'{name}' must be an integer id, got {value}"))
    })
}

/// Company operations.
#[derive(Debug, Clone, Copy)]
pub struct Companies<'a> {
    conn: &'a Connection,
}

impl<'a> Companies<'a> {
    pub(crate) fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Every company in the portal.
    pub fn all(&self, config: PageConfig<i64>) -> PagedCollection<'a, Company, i64> {
        let conn = self.conn;
        PagedCollection::new(config, MAX_PAGE_SIZE, move |options, offset, limit| {
            let endpoint = Endpoint::new(ALL_PATH)
                .extend_query(options)
                .query_opt("offset", offset)
                .query("limit", limit);
            let response = conn.get_json(&endpoint)?;

            Ok(Page::new(
                companies_in(&response, "companies")?,
                optional_integer(&response, "offset")?,
                flag(&response, "has-more")?,
            ))
        })
    }

    /// Companies whose domain matches `domain`.
    ///
    /// The endpoint takes its paging in the body, with a composite offset of
    /// which only `companyId` carries over between pages.
    pub fn search_domain(
        &self,
        domain: &str,
        config: PageConfig<i64>,
    ) -> PagedCollection<'a, Company, i64> {
        let conn = self.conn;
        let domain = domain.to_string();
        PagedCollection::new(config, MAX_SECONDARY_PAGE_SIZE, move |options, offset, limit| {
            let body = json!({
                "limit": limit,
                "requestOptions": options.to_json(),
                "offset": {
                    "isPrimary": true,
                    "companyId": offset,
                },
            });
            let response = conn.post_json(
                &Endpoint::new(SEARCH_DOMAIN_PATH).param("domain", &domain),
                body,
            )?;

            let next_offset = match response.get("offset") {
                Some(composite) if !composite.is_null() => {
                    optional_integer(composite, "companyId")?
                }
                _ => None,
            };

            Ok(Page::new(
                companies_in(&response, "results")?,
                next_offset,
                flag(&response, "hasMore")?,
            ))
        })
    }

    /// Recently created companies, newest first.
    pub fn recently_created(&self, config: PageConfig<i64>) -> PagedCollection<'a, Company, i64> {
        self.recent(RECENTLY_CREATED_PATH, config)
    }

    /// Recently modified companies, newest first.
    pub fn recently_modified(&self, config: PageConfig<i64>) -> PagedCollection<'a, Company, i64> {
        self.recent(RECENTLY_MODIFIED_PATH, config)
    }

    fn recent(
        &self,
        template: &'static str,
        config: PageConfig<i64>,
    ) -> PagedCollection<'a, Company, i64> {
        let conn = self.conn;
        PagedCollection::new(config, MAX_SECONDARY_PAGE_SIZE, move |options, offset, limit| {
            let endpoint = Endpoint::new(template)
                .extend_query(options)
                .query_opt("offset", offset)
                .query("count", limit);
            let response = conn.get_json(&endpoint)?;

            Ok(Page::new(
                companies_in(&response, "results")?,
                optional_integer(&response, "offset")?,
                flag(&response, "hasMore")?,
            ))
        })
    }

    #[instrument(skip(self))]
    pub fn find(&self, id: i64) -> Result<Company> {
        let response = self.conn.get_json(&Endpoint::new(FIND_PATH).param("id", id))?;
        Ok(Company::from_value(&response)?)
    }

    #[instrument(skip(self, properties))]
    pub fn create(&self, properties: &Properties) -> Result<Company> {
        let body = json!({ "properties": properties::encode(properties, NAME_KEY) });
        let response = self.conn.post_json(&Endpoint::new(CREATE_PATH), body)?;
        let company = Company::from_value(&response)?;

        debug!(id = company.id, "company created");
        Ok(company)
    }

    #[instrument(skip(self, properties))]
    pub fn update(&self, id: i64, properties: &Properties) -> Result<Company> {
        let body = json!({ "properties": properties::encode(properties, NAME_KEY) });
        let response = self
            .conn
            .put_json(&Endpoint::new(UPDATE_PATH).param("id", id), Some(body))?;
        Ok(Company::from_value(&response)?)
    }

    #[instrument(skip(self))]
    pub fn delete(&self, id: i64) -> Result<()> {
        self.conn.delete_json(&Endpoint::new(DELETE_PATH).param("id", id))?;
        Ok(())
    }

    /// Update many companies, [`BATCH_SIZE`] per request.
    ///
    /// Batches are sent in order; the first failure stops the remaining ones.
    #[instrument(skip(self, updates), fields(count = updates.len()))]
    pub fn batch_update(&self, updates: &[CompanyUpdate]) -> Result<()> {
        for (index, chunk) in updates.chunks(BATCH_SIZE).enumerate() {
            debug!(batch = index + 1, size = chunk.len(), "sending batch update");
            let body = Value::Array(chunk.iter().map(CompanyUpdate::to_json).collect());
            self.conn.post_json(&Endpoint::new(BATCH_UPDATE_PATH), body)?;
        }
        Ok(())
    }

    /// Associate a contact with a company.
    #[instrument(skip(self, contact))]
    pub fn add_contact<'c>(&self, id: i64, contact: impl Into<ContactRef<'c>>) -> Result<()> {
        let contact_id = contact.into().vid();
        self.conn.put_json(
            &Endpoint::new(ADD_CONTACT_PATH)
                .param("id", id)
                .param("contact_id", contact_id),
            None,
        )?;
        Ok(())
    }

    /// Remove a contact from a company.
    #[instrument(skip(self, contact))]
    pub fn remove_contact<'c>(&self, id: i64, contact: impl Into<ContactRef<'c>>) -> Result<()> {
        let contact_id = contact.into().vid();
        self.conn.delete_json(
            &Endpoint::new(REMOVE_CONTACT_PATH)
                .param("id", id)
                .param("contact_id", contact_id),
        )?;
        Ok(())
    }

    /// Ids of the contacts associated with a company.
    pub fn contact_ids(&self, id: i64, config: PageConfig<i64>) -> PagedCollection<'a, i64, i64> {
        let conn = self.conn;
        PagedCollection::new(config, MAX_SECONDARY_PAGE_SIZE, move |options, offset, limit| {
            let endpoint = Endpoint::new(CONTACT_IDS_PATH)
                .param("id", id)
                .extend_query(options)
                .query_opt("vidOffset", offset)
                .query("count", limit);
            let response = conn.get_json(&endpoint)?;

            let vids = array(&response, "vids")?
                .iter()
                .map(|v| {
                    v.as_i64()
                        .ok_or_else(|| DecodeError::invalid("vids", "a list of integers"))
                })
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(Page::new(
                vids,
                optional_integer(&response, "vidOffset")?,
                flag(&response, "hasMore")?,
            ))
        })
    }

    /// Full contact records for a company's first page of contacts.
    ///
    /// Issues one profile request per contact.
    #[instrument(skip(self))]
    pub fn contacts(&self, id: i64) -> Result<Vec<Contact>> {
        let response = self
            .conn
            .get_json(&Endpoint::new(CONTACTS_PATH).param("id", id))?;

        let contacts = self.conn.contacts();
        array(&response, "contacts")?
            .iter()
            .map(|entry| {
                let vid = integer(entry, "vid")?;
                contacts.find(vid)
            })
            .collect()
    }
}

fn companies_in(response: &Value, name: &str) -> std::result::Result<Vec<Company>, DecodeError> {
    array(response, name)?
        .iter()
        .map(Company::from_value)
        .collect()
}
