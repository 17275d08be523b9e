//! Reference data: companies, units of measure and clients.

use common::{ClientId, CompanyId, UnitId};
use serde::{Deserialize, Serialize};
use store::{
    Client, Company, DEFAULT_BRAND_COLOR, NewClient, NewCompany, NewUnit, Store, StoreError, Unit,
    UnitOfWork, constraints,
};

use crate::error::{DomainError, ValidationError, max_len, optional, require};

/// Returns true for colors of the form `#rrggbb`.
pub fn is_brand_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].bytes().all(|b| b.is_ascii_hexdigit())
}

fn default_true() -> bool {
    true
}

/// Company fields as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyInput {
    pub name: String,
    #[serde(default)]
    pub tax_id: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub logo_path: Option<String>,
    #[serde(default)]
    pub brand_color: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl CompanyInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tax_id: None,
            address: None,
            phone: None,
            email: None,
            logo_path: None,
            brand_color: None,
            active: true,
        }
    }

    pub fn validate(&self) -> Result<NewCompany, ValidationError> {
        let name = require("name", &self.name)?;
        max_len("name", &name, 100)?;

        let tax_id = optional(self.tax_id.as_deref());
        if let Some(tax_id) = &tax_id {
            max_len("tax_id", tax_id, 18)?;
        }
        let phone = optional(self.phone.as_deref());
        if let Some(phone) = &phone {
            max_len("phone", phone, 20)?;
        }

        let brand_color = match optional(self.brand_color.as_deref()) {
            None => DEFAULT_BRAND_COLOR.to_string(),
            Some(color) if is_brand_color(&color) => color.to_ascii_lowercase(),
            Some(color) => return Err(ValidationError::InvalidColor(color)),
        };

        Ok(NewCompany {
            name,
            tax_id,
            address: optional(self.address.as_deref()),
            phone,
            email: optional(self.email.as_deref()),
            logo_path: optional(self.logo_path.as_deref()),
            brand_color,
            active: self.active,
        })
    }
}

/// Unit of measure fields as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitInput {
    pub code: String,
    pub description: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl UnitInput {
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            active: true,
        }
    }

    pub fn validate(&self) -> Result<NewUnit, ValidationError> {
        let code = require("code", &self.code)?;
        max_len("code", &code, 10)?;
        let description = require("description", &self.description)?;
        max_len("description", &description, 50)?;

        Ok(NewUnit {
            code,
            description,
            active: self.active,
        })
    }
}

/// Changes to an existing unit. The code is fixed once created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitPatch {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

/// Client fields as submitted alongside a quote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInput {
    pub name: String,
    pub tax_id: String,
    pub address: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl ClientInput {
    pub fn new(
        name: impl Into<String>,
        tax_id: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            tax_id: tax_id.into(),
            address: address.into(),
            phone: None,
            email: None,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn validate(&self) -> Result<NewClient, ValidationError> {
        let name = require("client_name", &self.name)?;
        max_len("client_name", &name, 200)?;
        let tax_id = require("client_tax_id", &self.tax_id)?;
        max_len("client_tax_id", &tax_id, 18)?;
        let phone = optional(self.phone.as_deref());
        if let Some(phone) = &phone {
            max_len("client_phone", phone, 20)?;
        }

        Ok(NewClient {
            name,
            tax_id,
            address: require("client_address", &self.address)?,
            phone,
            email: optional(self.email.as_deref()),
        })
    }
}

fn tax_id_conflict(e: StoreError, tax_id: &str) -> DomainError {
    if e.is_unique_violation_of(constraints::CLIENT_TAX_ID) {
        return ValidationError::DuplicateTaxId(tax_id.to_string()).into();
    }
    e.into()
}

fn unit_code_conflict(e: StoreError, code: &str) -> DomainError {
    if e.is_unique_violation_of(constraints::UNIT_CODE) {
        return ValidationError::DuplicateUnitCode(code.to_string()).into();
    }
    e.into()
}

/// Maps a refused or missing delete target.
pub(crate) fn delete_error(e: StoreError, entity: &'static str, id: i64) -> DomainError {
    match e {
        StoreError::ForeignKeyViolation { .. } => DomainError::Protected { entity, id },
        StoreError::NotFound { .. } => DomainError::NotFound { entity, id },
        other => other.into(),
    }
}

/// Finds the client by tax id and refreshes its details, or creates it.
///
/// An email is only overwritten when one is submitted.
pub(crate) async fn upsert_client_in<T: UnitOfWork>(
    tx: &mut T,
    input: &ClientInput,
) -> Result<Client, DomainError> {
    let new = input.validate()?;

    match tx.find_client_by_tax_id(&new.tax_id).await? {
        Some(mut existing) => {
            existing.name = new.name;
            existing.address = new.address;
            existing.phone = new.phone;
            if new.email.is_some() {
                existing.email = new.email;
            }
            Ok(tx.update_client(&existing).await?)
        }
        None => {
            let tax_id = new.tax_id.clone();
            tx.insert_client(new)
                .await
                .map_err(|e| tax_id_conflict(e, &tax_id))
        }
    }
}

/// Overwrites a quote's linked client, tax id included.
pub(crate) async fn update_linked_client<T: UnitOfWork>(
    tx: &mut T,
    client_id: ClientId,
    input: &ClientInput,
) -> Result<Client, DomainError> {
    let new = input.validate()?;
    let mut client = tx
        .get_client(client_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Client", client_id))?;

    client.name = new.name;
    client.tax_id = new.tax_id;
    client.address = new.address;
    client.phone = new.phone;
    if new.email.is_some() {
        client.email = new.email;
    }

    tx.update_client(&client)
        .await
        .map_err(|e| tax_id_conflict(e, &client.tax_id))
}

/// Service for companies, units of measure and clients.
pub struct CatalogService<S: Store> {
    store: S,
}

impl<S: Store> CatalogService<S> {
    /// Creates a new catalog service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_company(&self, input: CompanyInput) -> Result<Company, DomainError> {
        let new = input.validate()?;
        let mut tx = self.store.begin().await?;
        let company = tx.insert_company(new).await?;
        tx.commit().await?;

        tracing::info!(company_id = %company.id, "Company created");
        Ok(company)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_company(&self, id: CompanyId) -> Result<Company, DomainError> {
        let mut tx = self.store.begin().await?;
        tx.get_company(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Company", id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_companies(&self, active_only: bool) -> Result<Vec<Company>, DomainError> {
        let mut tx = self.store.begin().await?;
        Ok(tx.list_companies(active_only).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_company(
        &self,
        id: CompanyId,
        input: CompanyInput,
    ) -> Result<Company, DomainError> {
        let new = input.validate()?;
        let mut tx = self.store.begin().await?;
        let mut company = tx
            .get_company(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Company", id))?;

        company.name = new.name;
        company.tax_id = new.tax_id;
        company.address = new.address;
        company.phone = new.phone;
        company.email = new.email;
        company.logo_path = new.logo_path;
        company.brand_color = new.brand_color;
        company.active = new.active;

        tx.update_company(&company).await?;
        tx.commit().await?;
        Ok(company)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_company(&self, id: CompanyId) -> Result<(), DomainError> {
        let mut tx = self.store.begin().await?;
        tx.delete_company(id)
            .await
            .map_err(|e| delete_error(e, "Company", id.as_i64()))?;
        tx.commit().await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_unit(&self, input: UnitInput) -> Result<Unit, DomainError> {
        let new = input.validate()?;
        let code = new.code.clone();
        let mut tx = self.store.begin().await?;
        let unit = tx
            .insert_unit(new)
            .await
            .map_err(|e| unit_code_conflict(e, &code))?;
        tx.commit().await?;
        Ok(unit)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_unit(&self, id: UnitId) -> Result<Unit, DomainError> {
        let mut tx = self.store.begin().await?;
        tx.get_unit(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Unit", id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_units(&self, active_only: bool) -> Result<Vec<Unit>, DomainError> {
        let mut tx = self.store.begin().await?;
        Ok(tx.list_units(active_only).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_unit(&self, id: UnitId, patch: UnitPatch) -> Result<Unit, DomainError> {
        let mut tx = self.store.begin().await?;
        let mut unit = tx
            .get_unit(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Unit", id))?;

        if let Some(description) = &patch.description {
            let description = require("description", description)?;
            max_len("description", &description, 50)?;
            unit.description = description;
        }
        if let Some(active) = patch.active {
            unit.active = active;
        }

        tx.update_unit(&unit).await?;
        tx.commit().await?;
        Ok(unit)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_unit(&self, id: UnitId) -> Result<(), DomainError> {
        let mut tx = self.store.begin().await?;
        tx.delete_unit(id)
            .await
            .map_err(|e| delete_error(e, "Unit", id.as_i64()))?;
        tx.commit().await?;
        Ok(())
    }

    /// Creates the client, or updates the one holding the same tax id.
    #[tracing::instrument(skip(self))]
    pub async fn upsert_client(&self, input: ClientInput) -> Result<Client, DomainError> {
        let mut tx = self.store.begin().await?;
        let client = upsert_client_in(&mut tx, &input).await?;
        tx.commit().await?;
        Ok(client)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_client(&self, id: ClientId) -> Result<Client, DomainError> {
        let mut tx = self.store.begin().await?;
        tx.get_client(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Client", id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_clients(&self) -> Result<Vec<Client>, DomainError> {
        let mut tx = self.store.begin().await?;
        Ok(tx.list_clients().await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_client(&self, id: ClientId) -> Result<(), DomainError> {
        let mut tx = self.store.begin().await?;
        tx.delete_client(id)
            .await
            .map_err(|e| delete_error(e, "Client", id.as_i64()))?;
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::InMemoryStore;

    #[test]
    fn test_brand_color_format() {
        assert!(is_brand_color("#2563eb"));
        assert!(is_brand_color("#ABCDEF"));
        assert!(!is_brand_color("2563eb"));
        assert!(!is_brand_color("#2563e"));
        assert!(!is_brand_color("#25g3eb"));
    }

    #[test]
    fn test_company_defaults_brand_color() {
        let new = CompanyInput::new("Acme").validate().unwrap();
        assert_eq!(new.brand_color, "#2563eb");
        assert!(new.active);
    }

    #[test]
    fn test_company_rejects_bad_color() {
        let mut input = CompanyInput::new("Acme");
        input.brand_color = Some("blue".to_string());
        assert_eq!(
            input.validate().unwrap_err(),
            ValidationError::InvalidColor("blue".to_string())
        );
    }

    #[tokio::test]
    async fn test_upsert_client_updates_existing() {
        let service = CatalogService::new(InMemoryStore::new());

        let first = service
            .upsert_client(ClientInput::new("Old Name", "123", "Rua 1"))
            .await
            .unwrap();
        let second = service
            .upsert_client(ClientInput::new("New Name", "123", "Rua 2").with_phone("555"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "New Name");
        assert_eq!(second.address, "Rua 2");
        assert_eq!(second.phone.as_deref(), Some("555"));
        assert_eq!(service.list_clients().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_unit_code() {
        let service = CatalogService::new(InMemoryStore::new());
        service.create_unit(UnitInput::new("UN", "Unidade")).await.unwrap();

        let err = service
            .create_unit(UnitInput::new("UN", "Outra"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Validation(ValidationError::DuplicateUnitCode(_))
        ));
    }

    #[tokio::test]
    async fn test_update_unit_patch() {
        let service = CatalogService::new(InMemoryStore::new());
        let unit = service.create_unit(UnitInput::new("CX", "Caixa")).await.unwrap();

        let updated = service
            .update_unit(
                unit.id,
                UnitPatch {
                    description: Some("Caixa com 12".to_string()),
                    active: Some(false),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.code, "CX");
        assert_eq!(updated.description, "Caixa com 12");
        assert!(!updated.active);
        assert!(service.list_units(true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_active_companies() {
        let service = CatalogService::new(InMemoryStore::new());
        service.create_company(CompanyInput::new("Beta")).await.unwrap();
        let mut inactive = CompanyInput::new("Alpha");
        inactive.active = false;
        service.create_company(inactive).await.unwrap();

        let all = service.list_companies(false).await.unwrap();
        assert_eq!(
            all.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            vec!["Alpha", "Beta"]
        );
        assert_eq!(service.list_companies(true).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_records() {
        let service = CatalogService::new(InMemoryStore::new());
        assert!(matches!(
            service.get_company(CompanyId::new(99)).await,
            Err(DomainError::NotFound { entity: "Company", id: 99 })
        ));
        assert!(matches!(
            service.delete_client(ClientId::new(5)).await,
            Err(DomainError::NotFound { entity: "Client", id: 5 })
        ));
    }
}
