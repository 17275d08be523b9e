//! URL-encoded quote forms.
//!
//! Line items arrive as `items[<index>][<field>]` keys. Rows whose fields
//! are all blank are dropped; the rest are kept in ascending index order and
//! must be complete.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use common::UnitId;
use domain::money::parse_amount;
use domain::{ClientInput, LineItemInput, QuoteFields, ValidationError};

const ITEM_FIELDS: [&str; 5] = ["unit", "quantity", "description", "brand", "unit_price"];
const REQUIRED_ITEM_FIELDS: [&str; 4] = ["unit", "quantity", "description", "unit_price"];

/// A decoded quote form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteForm {
    pub client: ClientInput,
    pub fields: QuoteFields,
    pub items: Vec<LineItemInput>,
}

/// Splits `items[3][unit]` into `(3, "unit")`.
fn item_key(key: &str) -> Option<(u32, &str)> {
    let rest = key.strip_prefix("items[")?;
    let (index, rest) = rest.split_once("][")?;
    let field = rest.strip_suffix(']')?;
    Some((index.parse().ok()?, field))
}

fn blank_to_none(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn parse_item(index: u32, row: &HashMap<&str, &str>) -> Result<Option<LineItemInput>, ValidationError> {
    let value = |field: &str| {
        row.get(field)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    };

    if ITEM_FIELDS.into_iter().all(|field| value(field).is_none()) {
        return Ok(None);
    }
    if let Some(missing) = REQUIRED_ITEM_FIELDS
        .into_iter()
        .find(|field| value(*field).is_none())
    {
        return Err(ValidationError::IncompleteItem {
            index: index.to_string(),
            field: missing.to_string(),
        });
    }

    let unit = value("unit").unwrap_or_default();
    let unit_id = unit
        .parse::<i64>()
        .map(UnitId::new)
        .map_err(|_| ValidationError::UnknownUnit(unit.to_string()))?;

    let mut item = LineItemInput::new(
        unit_id,
        parse_amount("quantity", value("quantity").unwrap_or_default())?,
        value("description").unwrap_or_default(),
        parse_amount("unit_price", value("unit_price").unwrap_or_default())?,
    );
    if let Some(brand) = value("brand") {
        item = item.with_brand(brand);
    }
    Ok(Some(item))
}

impl QuoteForm {
    pub fn parse(pairs: &[(String, String)]) -> Result<Self, ValidationError> {
        let mut scalars: HashMap<&str, &String> = HashMap::new();
        let mut rows: BTreeMap<u32, HashMap<&str, &str>> = BTreeMap::new();
        for (key, value) in pairs {
            match item_key(key) {
                Some((index, field)) => {
                    rows.entry(index).or_default().insert(field, value.as_str());
                }
                None => {
                    scalars.insert(key.as_str(), value);
                }
            }
        }
        let scalar = |key: &str| scalars.get(key).copied();

        let client = ClientInput {
            name: scalar("client_name").cloned().unwrap_or_default(),
            tax_id: scalar("client_tax_id").cloned().unwrap_or_default(),
            address: scalar("client_address").cloned().unwrap_or_default(),
            phone: blank_to_none(scalar("client_phone")).map(str::to_string),
            email: blank_to_none(scalar("client_email")).map(str::to_string),
        };

        let mut fields = QuoteFields::default();
        if let Some(raw) = blank_to_none(scalar("discount")) {
            fields.discount = parse_amount("discount", raw)?;
        }
        if let Some(raw) = blank_to_none(scalar("validity_days")) {
            fields.validity_days = raw.parse().map_err(|_| ValidationError::InvalidInteger {
                field: "validity_days".to_string(),
                value: raw.to_string(),
            })?;
        }
        if let Some(terms) = scalar("delivery_terms") {
            fields.delivery_terms = terms.clone();
        }
        if let Some(notes) = scalar("notes") {
            fields.notes = notes.clone();
        }
        if let Some(raw) = blank_to_none(scalar("expiry_date")) {
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                ValidationError::InvalidDate {
                    field: "expiry_date".to_string(),
                    value: raw.to_string(),
                }
            })?;
            fields.expiry_date = Some(date);
        }

        let mut items = Vec::with_capacity(rows.len());
        for (index, row) in &rows {
            if let Some(item) = parse_item(*index, row)? {
                items.push(item);
            }
        }

        Ok(Self {
            client,
            fields,
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn base() -> Vec<(&'static str, &'static str)> {
        vec![
            ("client_name", "Escola Municipal"),
            ("client_tax_id", "12345678000190"),
            ("client_address", "Rua A, 1"),
            ("client_phone", ""),
            ("discount", "1,00"),
        ]
    }

    #[test]
    fn test_item_key() {
        assert_eq!(item_key("items[0][unit]"), Some((0, "unit")));
        assert_eq!(item_key("items[12][unit_price]"), Some((12, "unit_price")));
        assert_eq!(item_key("items[x][unit]"), None);
        assert_eq!(item_key("client_name"), None);
    }

    #[test]
    fn test_parse_header_fields() {
        let mut raw = base();
        raw.push(("validity_days", "30"));
        raw.push(("delivery_terms", "5 dias úteis"));
        raw.push(("expiry_date", "2024-12-31"));

        let form = QuoteForm::parse(&pairs(&raw)).unwrap();

        assert_eq!(form.client.name, "Escola Municipal");
        assert_eq!(form.client.phone, None);
        assert_eq!(form.fields.discount, Decimal::new(100, 2));
        assert_eq!(form.fields.validity_days, 30);
        assert_eq!(form.fields.delivery_terms, "5 dias úteis");
        assert_eq!(
            form.fields.expiry_date,
            NaiveDate::from_ymd_opt(2024, 12, 31)
        );
        assert!(form.items.is_empty());
    }

    #[test]
    fn test_items_in_index_order_and_blank_rows_skipped() {
        let mut raw = base();
        raw.extend([
            ("items[2][unit]", "1"),
            ("items[2][quantity]", "1"),
            ("items[2][description]", "Borracha"),
            ("items[2][unit_price]", "5,50"),
            ("items[1][unit]", ""),
            ("items[1][quantity]", " "),
            ("items[1][description]", ""),
            ("items[1][brand]", ""),
            ("items[1][unit_price]", ""),
            ("items[0][unit]", "1"),
            ("items[0][quantity]", "2"),
            ("items[0][description]", "Caneta"),
            ("items[0][brand]", "Bic"),
            ("items[0][unit_price]", "10.00"),
        ]);

        let form = QuoteForm::parse(&pairs(&raw)).unwrap();

        assert_eq!(form.items.len(), 2);
        assert_eq!(form.items[0].description, "Caneta");
        assert_eq!(form.items[0].brand.as_deref(), Some("Bic"));
        assert_eq!(form.items[1].description, "Borracha");
        assert_eq!(form.items[1].unit_price, Decimal::new(550, 2));
    }

    #[test]
    fn test_partial_row_is_rejected() {
        let mut raw = base();
        raw.extend([("items[0][unit]", "1"), ("items[0][description]", "Caneta")]);

        let err = QuoteForm::parse(&pairs(&raw)).unwrap_err();

        assert_eq!(
            err,
            ValidationError::IncompleteItem {
                index: "0".to_string(),
                field: "quantity".to_string(),
            }
        );
    }

    #[test]
    fn test_malformed_values() {
        let mut raw = base();
        raw.push(("validity_days", "quinze"));
        assert!(matches!(
            QuoteForm::parse(&pairs(&raw)),
            Err(ValidationError::InvalidInteger { .. })
        ));

        let mut raw = base();
        raw[4] = ("discount", "1.000,00");
        assert!(matches!(
            QuoteForm::parse(&pairs(&raw)),
            Err(ValidationError::InvalidDecimal { .. })
        ));

        let mut raw = base();
        raw.push(("expiry_date", "31/12/2024"));
        assert!(matches!(
            QuoteForm::parse(&pairs(&raw)),
            Err(ValidationError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_non_numeric_unit() {
        let mut raw = base();
        raw.extend([
            ("items[0][unit]", "UN"),
            ("items[0][quantity]", "1"),
            ("items[0][description]", "Caneta"),
            ("items[0][unit_price]", "1"),
        ]);

        assert_eq!(
            QuoteForm::parse(&pairs(&raw)).unwrap_err(),
            ValidationError::UnknownUnit("UN".to_string())
        );
    }
}
