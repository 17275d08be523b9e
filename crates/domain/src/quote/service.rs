//! Quote service: runs each quote operation inside one unit of work.

use std::collections::HashMap;

use chrono::Utc;
use common::{QuoteId, QuoteStatus};
use rust_decimal::Decimal;
use store::{NewQuote, QuoteFilter, QuoteRow, Store, UnitOfWork, constraints};

use crate::catalog::{upsert_client_in, update_linked_client};
use crate::error::{DomainError, ValidationError};

use super::{
    ConversionOutcome, CreateQuote, LineItemInput, Quote, QuoteError, QuoteSheet, SheetItem,
    UpdateQuote, format_number, next_sequence,
};

/// How many times a create is attempted when its number collides.
pub const DEFAULT_NUMBER_ATTEMPTS: u32 = 3;

impl From<QuoteError> for DomainError {
    fn from(e: QuoteError) -> Self {
        DomainError::Quote(e)
    }
}

/// Logs and counts refused mutations of locked quotes.
fn note_refusal(e: &DomainError) {
    if e.is_policy_violation() {
        tracing::warn!(error = %e, "Refused change to a locked quote");
        metrics::counter!("quote_policy_violations_total").increment(1);
    }
}

async fn load<T: UnitOfWork>(tx: &mut T, quote_id: QuoteId) -> Result<Quote, DomainError> {
    let row = tx
        .get_quote(quote_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Quote", quote_id))?;
    let items = tx.list_quote_items(quote_id).await?;
    Ok(Quote::from_parts(row, items))
}

/// Writes the header back, keeping the loaded items.
async fn save_header<T: UnitOfWork>(tx: &mut T, quote: Quote) -> Result<Quote, DomainError> {
    let (row, items) = quote.into_parts();
    let row = tx.update_quote(&row).await?;
    Ok(Quote::from_parts(row, items))
}

/// Saves items in the given order through [`Quote::prepare_item`].
///
/// Any existing unit is accepted, active or not.
async fn save_items<T: UnitOfWork>(
    tx: &mut T,
    quote: &mut Quote,
    items: &[LineItemInput],
) -> Result<(), DomainError> {
    for input in items {
        let new = quote.prepare_item(input)?;
        if tx.get_unit(new.unit_id).await?.is_none() {
            return Err(ValidationError::UnknownUnit(new.unit_id.to_string()).into());
        }
        let row = tx.insert_quote_item(new).await?;
        quote.push_item(row);
    }
    Ok(())
}

/// Service for managing quotes.
pub struct QuoteService<S: Store> {
    store: S,
    number_attempts: u32,
}

impl<S: Store> QuoteService<S> {
    /// Creates a new quote service with the given store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            number_attempts: DEFAULT_NUMBER_ATTEMPTS,
        }
    }

    /// Sets how many times a create is attempted on number collisions.
    pub fn with_number_attempts(mut self, attempts: u32) -> Self {
        self.number_attempts = attempts.max(1);
        self
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates a quote with its client and items.
    ///
    /// The number is assigned once, inside the same unit of work. When the
    /// insert collides on the number the whole create is retried.
    #[tracing::instrument(skip(self), fields(company_id = %cmd.company_id))]
    pub async fn create_quote(&self, cmd: CreateQuote) -> Result<Quote, DomainError> {
        for attempt in 1..=self.number_attempts {
            match self.try_create(&cmd).await {
                Err(DomainError::Store(e)) if e.is_unique_violation_of(constraints::QUOTE_NUMBER) => {
                    tracing::warn!(attempt, "Quote number collision, retrying");
                    metrics::counter!("quote_number_retries_total").increment(1);
                }
                Ok(quote) => {
                    tracing::info!(quote_id = %quote.id(), number = quote.number(), "Quote created");
                    metrics::counter!("quotes_created_total").increment(1);
                    return Ok(quote);
                }
                Err(e) => return Err(e),
            }
        }

        Err(QuoteError::NumberExhausted {
            attempts: self.number_attempts,
        }
        .into())
    }

    async fn try_create(&self, cmd: &CreateQuote) -> Result<Quote, DomainError> {
        let mut tx = self.store.begin().await?;

        let company = tx
            .get_company(cmd.company_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Company", cmd.company_id))?;
        if !company.active {
            return Err(QuoteError::CompanyInactive {
                company_id: company.id.as_i64(),
            }
            .into());
        }

        let fields = cmd.fields.normalized()?;
        let client = upsert_client_in(&mut tx, &cmd.client).await?;

        let numbers = tx.quote_numbers_for_company(company.id).await?;
        let sequence = next_sequence(numbers.iter().map(String::as_str));

        let row = tx
            .insert_quote(NewQuote {
                company_id: company.id,
                client_id: client.id,
                number: format_number(company.id, sequence),
                issue_date: Utc::now().date_naive(),
                expiry_date: fields.expiry_date,
                validity_days: fields.validity_days,
                delivery_terms: fields.delivery_terms,
                status: QuoteStatus::Draft,
                notes: fields.notes,
                discount: fields.discount,
                total: Decimal::ZERO,
            })
            .await?;

        let mut quote = Quote::from_parts(row, Vec::new());
        save_items(&mut tx, &mut quote, &cmd.items).await?;
        quote.recompute_total()?;
        let quote = save_header(&mut tx, quote).await?;

        tx.commit().await?;
        Ok(quote)
    }

    /// Edits a quote: updates the linked client, replaces every item and
    /// recomputes the total once.
    #[tracing::instrument(skip(self), fields(quote_id = %cmd.quote_id))]
    pub async fn update_quote(&self, cmd: UpdateQuote) -> Result<Quote, DomainError> {
        self.try_update(cmd).await.inspect_err(note_refusal)
    }

    async fn try_update(&self, cmd: UpdateQuote) -> Result<Quote, DomainError> {
        let mut tx = self.store.begin().await?;
        let mut quote = load(&mut tx, cmd.quote_id).await?;
        quote.ensure_editable()?;

        let client = update_linked_client(&mut tx, quote.client_id(), &cmd.client).await?;
        quote.apply_fields(client.id, &cmd.fields)?;

        quote.clear_items()?;
        tx.delete_quote_items(quote.id()).await?;
        save_items(&mut tx, &mut quote, &cmd.items).await?;

        quote.recompute_total()?;
        let quote = save_header(&mut tx, quote).await?;

        tx.commit().await?;
        Ok(quote)
    }

    /// Adds one item and recomputes the total.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(
        &self,
        quote_id: QuoteId,
        item: LineItemInput,
    ) -> Result<Quote, DomainError> {
        async {
            let mut tx = self.store.begin().await?;
            let mut quote = load(&mut tx, quote_id).await?;

            save_items(&mut tx, &mut quote, std::slice::from_ref(&item)).await?;
            quote.recompute_total()?;
            let quote = save_header(&mut tx, quote).await?;

            tx.commit().await?;
            Ok::<_, DomainError>(quote)
        }
        .await
        .inspect_err(note_refusal)
    }

    /// Removes one item by sequence and recomputes the total.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(&self, quote_id: QuoteId, sequence: i32) -> Result<Quote, DomainError> {
        async {
            let mut tx = self.store.begin().await?;
            let mut quote = load(&mut tx, quote_id).await?;

            quote.remove_item(sequence)?;
            tx.delete_quote_item(quote_id, sequence).await?;
            quote.recompute_total()?;
            let quote = save_header(&mut tx, quote).await?;

            tx.commit().await?;
            Ok::<_, DomainError>(quote)
        }
        .await
        .inspect_err(note_refusal)
    }

    /// Changes the discount and recomputes the total.
    #[tracing::instrument(skip(self))]
    pub async fn set_discount(
        &self,
        quote_id: QuoteId,
        discount: Decimal,
    ) -> Result<Quote, DomainError> {
        async {
            let mut tx = self.store.begin().await?;
            let mut quote = load(&mut tx, quote_id).await?;

            quote.set_discount(discount)?;
            quote.recompute_total()?;
            let quote = save_header(&mut tx, quote).await?;

            tx.commit().await?;
            Ok::<_, DomainError>(quote)
        }
        .await
        .inspect_err(note_refusal)
    }

    /// Applies a manual status change.
    #[tracing::instrument(skip(self))]
    pub async fn change_status(
        &self,
        quote_id: QuoteId,
        status: QuoteStatus,
    ) -> Result<Quote, DomainError> {
        async {
            let mut tx = self.store.begin().await?;
            let mut quote = load(&mut tx, quote_id).await?;

            quote.change_status(status)?;
            let quote = save_header(&mut tx, quote).await?;

            tx.commit().await?;
            Ok::<_, DomainError>(quote)
        }
        .await
        .inspect_err(note_refusal)
    }

    /// Converts a quote into an order and locks it.
    ///
    /// A quote that is already locked is returned unchanged with
    /// [`ConversionOutcome::AlreadyConverted`].
    #[tracing::instrument(skip(self))]
    pub async fn generate_order(
        &self,
        quote_id: QuoteId,
    ) -> Result<(Quote, ConversionOutcome), DomainError> {
        let mut tx = self.store.begin().await?;
        let mut quote = load(&mut tx, quote_id).await?;

        let outcome = quote.generate_order()?;
        if outcome == ConversionOutcome::AlreadyConverted {
            tracing::warn!(number = quote.number(), "Quote was already converted into an order");
            return Ok((quote, outcome));
        }

        let quote = save_header(&mut tx, quote).await?;
        tx.commit().await?;

        tracing::info!(number = quote.number(), total = %quote.total(), "Quote converted into an order");
        metrics::counter!("quotes_converted_total").increment(1);
        Ok((quote, outcome))
    }

    /// Deletes a quote with its items. Refused while the quote is locked.
    #[tracing::instrument(skip(self))]
    pub async fn delete_quote(&self, quote_id: QuoteId) -> Result<(), DomainError> {
        async {
            let mut tx = self.store.begin().await?;
            let quote = load(&mut tx, quote_id).await?;

            quote.ensure_editable()?;
            tx.delete_quote(quote_id).await?;
            tx.commit().await?;

            tracing::info!(number = quote.number(), "Quote deleted");
            Ok::<_, DomainError>(())
        }
        .await
        .inspect_err(note_refusal)
    }

    /// Loads a quote with its items.
    #[tracing::instrument(skip(self))]
    pub async fn get_quote(&self, quote_id: QuoteId) -> Result<Quote, DomainError> {
        let mut tx = self.store.begin().await?;
        load(&mut tx, quote_id).await
    }

    /// Lists quote headers, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_quotes(&self, filter: QuoteFilter) -> Result<Vec<QuoteRow>, DomainError> {
        let mut tx = self.store.begin().await?;
        Ok(tx.list_quotes(filter).await?)
    }

    /// Loads the quote together with its company, client and unit codes.
    #[tracing::instrument(skip(self))]
    pub async fn load_sheet(&self, quote_id: QuoteId) -> Result<QuoteSheet, DomainError> {
        let mut tx = self.store.begin().await?;
        let quote = load(&mut tx, quote_id).await?;

        let company = tx
            .get_company(quote.company_id())
            .await?
            .ok_or_else(|| DomainError::not_found("Company", quote.company_id()))?;
        let client = tx
            .get_client(quote.client_id())
            .await?
            .ok_or_else(|| DomainError::not_found("Client", quote.client_id()))?;

        let mut unit_codes = HashMap::new();
        let (row, rows) = quote.into_parts();
        let mut items = Vec::with_capacity(rows.len());
        for item in rows {
            let code = match unit_codes.get(&item.unit_id) {
                Some(code) => String::clone(code),
                None => {
                    let unit = tx
                        .get_unit(item.unit_id)
                        .await?
                        .ok_or_else(|| DomainError::not_found("Unit", item.unit_id))?;
                    unit_codes.insert(item.unit_id, unit.code.clone());
                    unit.code
                }
            };
            items.push(SheetItem {
                sequence: item.sequence,
                unit_code: code,
                quantity: item.quantity,
                description: item.description,
                brand: item.brand,
                unit_price: item.unit_price,
                total: item.total,
            });
        }

        Ok(QuoteSheet {
            quote: row,
            company,
            client,
            items,
        })
    }
}
