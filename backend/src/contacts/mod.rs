//! Contact operations outside of CSV import: create one, list, export.

use serde::{Deserialize, Serialize};

use crate::error::PipelineResult;
use crate::export::export_contacts;
use crate::models::{Contact, NewContact, Owner};
use crate::parser::trim_cell;
use crate::storage::{ContactPage, ContactQuery, ContactStore, DEFAULT_LIMIT};
use crate::validation::{optional_text, validate_organisation};

/// Body of a single-contact creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInput {
    #[serde(default)]
    pub organisation: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Listing parameters, as found in a query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub skip: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl ListParams {
    /// Turn into a store query scoped to what `owner` may see.
    pub fn to_query(&self, owner: &Owner) -> ContactQuery {
        ContactQuery::visible_to(owner)
            .with_search(self.q.clone().unwrap_or_default())
            .with_page(self.skip.unwrap_or(0), self.limit.unwrap_or(DEFAULT_LIMIT))
    }
}

/// Validate and store a single contact.
pub fn create_contact<S>(input: ContactInput, owner: &Owner, store: &S) -> PipelineResult<Contact>
where
    S: ContactStore + ?Sized,
{
    let organisation = trim_cell(&input.organisation);
    validate_organisation(organisation)?;

    let new = NewContact {
        organisation: organisation.to_string(),
        description: input.description.as_deref().and_then(optional_text),
        owner_id: owner.id.clone(),
    };

    Ok(store.insert(owner, new)?)
}

/// List the contacts `owner` may see.
pub fn list_contacts<S>(params: &ListParams, owner: &Owner, store: &S) -> PipelineResult<ContactPage>
where
    S: ContactStore + ?Sized,
{
    Ok(store.list(&params.to_query(owner))?)
}

/// Export every contact `owner` may see, newest first.
pub fn export_for<S>(owner: &Owner, store: &S) -> PipelineResult<String>
where
    S: ContactStore + ?Sized,
{
    let page = store.list(&ContactQuery::visible_to(owner))?;
    Ok(export_contacts(&page.data))
}
