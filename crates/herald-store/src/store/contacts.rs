//! Contacts: lookup by phone, batch insert for campaigns, and the
//! upsert-with-merge path used by imports.

use super::{new_id, now_ts, parse_ts, Store};
use herald_core::{
    error::HeraldError,
    model::{
        generate_lead_id, merge_custom_fields, Contact, CustomFields, ImportContact, NewContact,
        DEFAULT_LEAD_STATUS,
    },
    tenant::TenantContext,
};
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite};
use std::collections::HashSet;
use tracing::warn;

/// SQLite bind-variable headroom per `IN (...)` lookup.
const PHONE_LOOKUP_CHUNK: usize = 500;

#[derive(sqlx::FromRow)]
struct ContactRow {
    id: String,
    lead_id: String,
    name: String,
    phone_number: String,
    custom_fields: String,
    lead_status: String,
    created_date: String,
    updated_date: String,
}

impl TryFrom<ContactRow> for Contact {
    type Error = HeraldError;

    fn try_from(row: ContactRow) -> Result<Self, Self::Error> {
        let custom_fields: CustomFields = if row.custom_fields.trim().is_empty() {
            CustomFields::new()
        } else {
            serde_json::from_str(&row.custom_fields)?
        };
        Ok(Contact {
            created_date: parse_ts(&row.created_date)?,
            updated_date: parse_ts(&row.updated_date)?,
            id: row.id,
            lead_id: row.lead_id,
            name: row.name,
            phone_number: row.phone_number,
            custom_fields,
            lead_status: row.lead_status,
        })
    }
}

const CONTACT_COLUMNS: &str =
    "id, lead_id, name, phone_number, custom_fields, lead_status, created_date, updated_date";

/// New-versus-existing split of a campaign's contact list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContactStats {
    pub total: usize,
    pub new: usize,
    pub existing: usize,
}

/// Result of upserting a single imported contact.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertOutcome {
    pub contact: Contact,
    pub created: bool,
}

/// Aggregate result of an import batch. Failed contacts do not stop the
/// batch; their errors are collected here.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub contacts: Vec<Contact>,
    pub created: usize,
    pub updated: usize,
    pub errors: Vec<String>,
}

impl Store {
    /// Existing contacts among the given phone numbers.
    pub async fn find_contacts_by_phones(
        &self,
        tenant: &TenantContext,
        phones: &[String],
    ) -> Result<Vec<Contact>, HeraldError> {
        let mut found = Vec::new();
        for chunk in phones.chunks(PHONE_LOOKUP_CHUNK) {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
                "SELECT {CONTACT_COLUMNS} FROM contacts WHERE schema_name = "
            ));
            qb.push_bind(tenant.schema_name());
            qb.push(" AND phone_number IN (");
            let mut sep = qb.separated(", ");
            for phone in chunk {
                sep.push_bind(phone);
            }
            sep.push_unseparated(")");

            let rows: Vec<ContactRow> = qb
                .build_query_as::<ContactRow>()
                .fetch_all(&self.pool)
                .await
                .map_err(|e| HeraldError::Store(format!("find_contacts_by_phones failed: {e}")))?;
            for row in rows {
                found.push(Contact::try_from(row)?);
            }
        }
        Ok(found)
    }

    /// Insert contacts in one transaction. All or nothing.
    pub async fn insert_contacts(
        &self,
        tenant: &TenantContext,
        contacts: &[NewContact],
    ) -> Result<Vec<Contact>, HeraldError> {
        if contacts.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| HeraldError::Store(format!("insert_contacts begin failed: {e}")))?;

        let mut ids = Vec::with_capacity(contacts.len());
        for contact in contacts {
            let id = new_id();
            let now = now_ts();
            sqlx::query(
                "INSERT INTO contacts \
                 (id, schema_name, lead_id, name, phone_number, custom_fields, lead_status, \
                  created_date, updated_date) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&id)
            .bind(tenant.schema_name())
            .bind(&contact.lead_id)
            .bind(&contact.name)
            .bind(&contact.phone_number)
            .bind(serde_json::to_string(&contact.custom_fields)?)
            .bind(DEFAULT_LEAD_STATUS)
            .bind(&now)
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                HeraldError::Store(format!(
                    "insert contact {} failed: {e}",
                    contact.phone_number
                ))
            })?;
            ids.push(id);
        }

        tx.commit()
            .await
            .map_err(|e| HeraldError::Store(format!("insert_contacts commit failed: {e}")))?;

        let mut inserted = Vec::with_capacity(ids.len());
        for id in &ids {
            inserted.push(self.get_contact_by_id(tenant, id).await?);
        }
        Ok(inserted)
    }

    /// Resolve a campaign's contact list: reuse contacts whose phone already
    /// exists, insert the rest. Duplicate phones in the input collapse to the
    /// first occurrence. Returned list is new contacts followed by existing.
    pub async fn ensure_contacts(
        &self,
        tenant: &TenantContext,
        contacts: Vec<NewContact>,
    ) -> Result<(Vec<Contact>, ContactStats), HeraldError> {
        let mut seen = HashSet::new();
        let unique: Vec<NewContact> = contacts
            .into_iter()
            .filter(|c| seen.insert(c.phone_number.clone()))
            .collect();

        let phones: Vec<String> = unique.iter().map(|c| c.phone_number.clone()).collect();
        let existing = self.find_contacts_by_phones(tenant, &phones).await?;
        let known: HashSet<&str> = existing.iter().map(|c| c.phone_number.as_str()).collect();

        let fresh: Vec<NewContact> = unique
            .into_iter()
            .filter(|c| !known.contains(c.phone_number.as_str()))
            .collect();
        let inserted = self.insert_contacts(tenant, &fresh).await?;

        let stats = ContactStats {
            total: inserted.len() + existing.len(),
            new: inserted.len(),
            existing: existing.len(),
        };
        let mut all = inserted;
        all.extend(existing);
        Ok((all, stats))
    }

    async fn get_contact_by_id(
        &self,
        tenant: &TenantContext,
        id: &str,
    ) -> Result<Contact, HeraldError> {
        let row: Option<ContactRow> = sqlx::query_as(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts WHERE schema_name = ? AND id = ?"
        ))
        .bind(tenant.schema_name())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| HeraldError::Store(format!("get_contact failed: {e}")))?;

        row.ok_or_else(|| HeraldError::NotFound("Contact not found".into()))?
            .try_into()
    }

    /// Fetch a contact by lead id.
    pub async fn get_contact(
        &self,
        tenant: &TenantContext,
        lead_id: &str,
    ) -> Result<Contact, HeraldError> {
        let row: Option<ContactRow> = sqlx::query_as(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts WHERE schema_name = ? AND lead_id = ?"
        ))
        .bind(tenant.schema_name())
        .bind(lead_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| HeraldError::Store(format!("get_contact failed: {e}")))?;

        row.ok_or_else(|| HeraldError::NotFound("Contact not found".into()))?
            .try_into()
    }

    async fn find_contact_by_phone(
        &self,
        tenant: &TenantContext,
        phone: &str,
    ) -> Result<Option<Contact>, HeraldError> {
        let row: Option<ContactRow> = sqlx::query_as(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts WHERE schema_name = ? AND phone_number = ?"
        ))
        .bind(tenant.schema_name())
        .bind(phone)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| HeraldError::Store(format!("find_contact_by_phone failed: {e}")))?;

        row.map(Contact::try_from).transpose()
    }

    /// All contacts for the tenant, newest first.
    pub async fn list_contacts(&self, tenant: &TenantContext) -> Result<Vec<Contact>, HeraldError> {
        let rows: Vec<ContactRow> = sqlx::query_as(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts WHERE schema_name = ? \
             ORDER BY created_date DESC, rowid DESC"
        ))
        .bind(tenant.schema_name())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| HeraldError::Store(format!("list_contacts failed: {e}")))?;

        rows.into_iter().map(Contact::try_from).collect()
    }

    /// Set a contact's free-text lead status.
    pub async fn update_lead_status(
        &self,
        tenant: &TenantContext,
        lead_id: &str,
        lead_status: &str,
    ) -> Result<Contact, HeraldError> {
        let result = sqlx::query(
            "UPDATE contacts SET lead_status = ?, updated_date = ? \
             WHERE schema_name = ? AND lead_id = ?",
        )
        .bind(lead_status)
        .bind(now_ts())
        .bind(tenant.schema_name())
        .bind(lead_id)
        .execute(&self.pool)
        .await
        .map_err(|e| HeraldError::Store(format!("update_lead_status failed: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(HeraldError::NotFound("Contact not found".into()));
        }
        self.get_contact(tenant, lead_id).await
    }

    /// Insert or update one imported contact keyed by phone number.
    ///
    /// On conflict the lead id is preserved and custom fields are merged.
    /// The name is replaced only when `update_name` is set (or the stored
    /// name is empty) and the import carries a non-empty name.
    pub async fn upsert_contact(
        &self,
        tenant: &TenantContext,
        contact: &ImportContact,
        update_name: bool,
    ) -> Result<UpsertOutcome, HeraldError> {
        match self.find_contact_by_phone(tenant, &contact.phone_number).await? {
            Some(existing) => {
                let merged = merge_custom_fields(&existing.custom_fields, &contact.custom_fields);
                let name = if !contact.name.is_empty()
                    && (update_name || existing.name.is_empty())
                {
                    contact.name.clone()
                } else {
                    existing.name.clone()
                };

                sqlx::query(
                    "UPDATE contacts SET name = ?, custom_fields = ?, updated_date = ? \
                     WHERE schema_name = ? AND id = ?",
                )
                .bind(&name)
                .bind(serde_json::to_string(&merged)?)
                .bind(now_ts())
                .bind(tenant.schema_name())
                .bind(&existing.id)
                .execute(&self.pool)
                .await
                .map_err(|e| HeraldError::Store(format!("upsert_contact update failed: {e}")))?;

                Ok(UpsertOutcome {
                    contact: self.get_contact_by_id(tenant, &existing.id).await?,
                    created: false,
                })
            }
            None => {
                let new = NewContact {
                    lead_id: generate_lead_id(),
                    name: contact.name.clone(),
                    phone_number: contact.phone_number.clone(),
                    custom_fields: contact.custom_fields.clone(),
                };
                let mut inserted = self.insert_contacts(tenant, &[new]).await?;
                let contact = inserted
                    .pop()
                    .ok_or_else(|| HeraldError::Store("upsert_contact insert returned nothing".into()))?;
                Ok(UpsertOutcome {
                    contact,
                    created: true,
                })
            }
        }
    }

    /// Upsert a batch of imported contacts, collecting per-contact errors.
    pub async fn import_contacts(
        &self,
        tenant: &TenantContext,
        contacts: &[ImportContact],
        update_names: bool,
    ) -> ImportReport {
        let mut report = ImportReport::default();
        for contact in contacts {
            match self.upsert_contact(tenant, contact, update_names).await {
                Ok(outcome) => {
                    if outcome.created {
                        report.created += 1;
                    } else {
                        report.updated += 1;
                    }
                    report.contacts.push(outcome.contact);
                }
                Err(e) => {
                    warn!("import: contact {} failed: {e}", contact.phone_number);
                    report
                        .errors
                        .push(format!("{}: {e}", contact.phone_number));
                }
            }
        }
        report
    }
}
