//! Printed content of a quote, in page order.

use domain::QuoteSheet;
use store::DEFAULT_BRAND_COLOR;

use crate::format::{brl, date_br, decimal_br, parse_hex_color, truncate_chars};

/// Fixed text above the signature.
pub const ACCEPTANCE_CLAUSE: &str = "Proponho o fornecimento dos produtos nos valores mencionados, \
sob as condições gerais e específicas, indicadas neste formulário com as quais concordo.";

pub const SIGNATURE_CAPTION: &str = "Assinatura e Carimbo";

/// Column headings of the items table.
pub const ITEM_COLUMNS: [&str; 7] = ["#", "Und", "Qtd", "Descrição", "Marca", "Valor Unit.", "Total"];

const DESCRIPTION_WIDTH: usize = 50;

/// One row of the items table, already formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemLine {
    pub sequence: String,
    pub unit: String,
    pub quantity: String,
    pub description: String,
    pub brand: String,
    pub unit_price: String,
    pub total: String,
}

impl ItemLine {
    pub fn cells(&self) -> [&str; 7] {
        [
            &self.sequence,
            &self.unit,
            &self.quantity,
            &self.description,
            &self.brand,
            &self.unit_price,
            &self.total,
        ]
    }
}

/// Layout model of a printed quote.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteDocument {
    /// Brand color as unit RGB; the default when the stored value is invalid.
    pub brand_rgb: (f32, f32, f32),
    /// Logo path relative to the media root.
    pub logo_path: Option<String>,
    pub company_name: String,
    pub company_lines: Vec<String>,
    pub title: String,
    pub client_rows: Vec<(&'static str, String)>,
    pub proposal_rows: Vec<(&'static str, String)>,
    pub items: Vec<ItemLine>,
    pub total: String,
    pub signatory: String,
}

fn brand_rgb(value: &str) -> (f32, f32, f32) {
    parse_hex_color(value)
        .or_else(|| parse_hex_color(DEFAULT_BRAND_COLOR))
        .unwrap_or((0.0, 0.0, 0.0))
}

fn with_tax_id(name: &str, tax_id: Option<&str>) -> String {
    match tax_id {
        Some(tax_id) => format!("{name} - CNPJ: {tax_id}"),
        None => name.to_string(),
    }
}

impl QuoteDocument {
    pub fn from_sheet(sheet: &QuoteSheet) -> Self {
        let company = &sheet.company;
        let quote = &sheet.quote;
        let client = &sheet.client;

        let mut company_lines = Vec::new();
        if let Some(tax_id) = &company.tax_id {
            company_lines.push(format!("CNPJ: {tax_id}"));
        }
        if let Some(address) = &company.address {
            company_lines.push(address.clone());
        }
        if company.phone.is_some() || company.email.is_some() {
            company_lines.push(format!(
                "Tel: {} | Email: {}",
                company.phone.as_deref().unwrap_or("-"),
                company.email.as_deref().unwrap_or("-"),
            ));
        }

        let kind = if sheet.is_order() { "PEDIDO" } else { "ORÇAMENTO" };

        let mut client_rows = vec![
            ("Cliente:", client.name.clone()),
            ("CPF/CNPJ:", client.tax_id.clone()),
            ("Endereço:", client.address.clone()),
        ];
        if let Some(phone) = &client.phone {
            client_rows.push(("Telefone:", phone.clone()));
        }

        let proposal_rows = vec![
            ("Data de Emissão:", date_br(quote.issue_date)),
            ("Validade da Proposta:", format!("{} dias", quote.validity_days)),
            ("Prazo de Entrega:", quote.delivery_terms.clone()),
        ];

        let items = sheet
            .items
            .iter()
            .map(|item| ItemLine {
                sequence: item.sequence.to_string(),
                unit: item.unit_code.clone(),
                quantity: decimal_br(item.quantity),
                description: truncate_chars(&item.description, DESCRIPTION_WIDTH),
                brand: item.brand.clone().unwrap_or_else(|| "-".to_string()),
                unit_price: brl(item.unit_price),
                total: brl(item.total),
            })
            .collect();

        Self {
            brand_rgb: brand_rgb(&company.brand_color),
            logo_path: company.logo_path.clone(),
            company_name: company.name.clone(),
            company_lines,
            title: format!("{kind} Nº {}", quote.number),
            client_rows,
            proposal_rows,
            items,
            total: brl(quote.total),
            signatory: with_tax_id(&company.name, company.tax_id.as_deref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use common::{ClientId, CompanyId, QuoteId, QuoteStatus};
    use domain::SheetItem;
    use rust_decimal_macros::dec;
    use store::{Client, Company, QuoteRow};

    fn sheet(status: QuoteStatus) -> QuoteSheet {
        let now = Utc::now();
        QuoteSheet {
            quote: QuoteRow {
                id: QuoteId::new(1),
                company_id: CompanyId::new(3),
                client_id: ClientId::new(2),
                number: "ORC-3-00001".to_string(),
                issue_date: NaiveDate::from_ymd_opt(2024, 8, 5).unwrap(),
                expiry_date: None,
                validity_days: 15,
                delivery_terms: "A Combinar".to_string(),
                status,
                notes: String::new(),
                discount: dec!(1.00),
                total: dec!(24.50),
                locked: status == QuoteStatus::OrderGenerated,
                created_at: now,
                updated_at: now,
            },
            company: Company {
                id: CompanyId::new(3),
                name: "Papelaria Central".to_string(),
                tax_id: Some("12.345.678/0001-90".to_string()),
                address: Some("Rua XV, 100".to_string()),
                phone: Some("(41) 3333-0000".to_string()),
                email: None,
                logo_path: None,
                brand_color: "not a color".to_string(),
                active: true,
                created_at: now,
            },
            client: Client {
                id: ClientId::new(2),
                name: "Escola Municipal".to_string(),
                tax_id: "98.765.432/0001-10".to_string(),
                address: "Av. Sete, 7".to_string(),
                phone: None,
                email: None,
                created_at: now,
                updated_at: now,
            },
            items: vec![
                SheetItem {
                    sequence: 1,
                    unit_code: "UN".to_string(),
                    quantity: dec!(2.00),
                    description: "Caneta esferográfica azul ".repeat(4),
                    brand: Some("Bic".to_string()),
                    unit_price: dec!(10.00),
                    total: dec!(20.00),
                },
                SheetItem {
                    sequence: 2,
                    unit_code: "CX".to_string(),
                    quantity: dec!(1.00),
                    description: "Borracha".to_string(),
                    brand: None,
                    unit_price: dec!(5.50),
                    total: dec!(5.50),
                },
            ],
        }
    }

    #[test]
    fn test_title_follows_status() {
        let quote = QuoteDocument::from_sheet(&sheet(QuoteStatus::Sent));
        assert_eq!(quote.title, "ORÇAMENTO Nº ORC-3-00001");

        let order = QuoteDocument::from_sheet(&sheet(QuoteStatus::OrderGenerated));
        assert_eq!(order.title, "PEDIDO Nº ORC-3-00001");
    }

    #[test]
    fn test_items_are_formatted() {
        let doc = QuoteDocument::from_sheet(&sheet(QuoteStatus::Draft));

        assert_eq!(doc.items.len(), 2);
        assert_eq!(doc.items[0].quantity, "2,00");
        assert_eq!(doc.items[0].description.chars().count(), 50);
        assert_eq!(doc.items[0].unit_price, "R$ 10,00");
        assert_eq!(doc.items[1].brand, "-");
        assert_eq!(doc.total, "R$ 24,50");
    }

    #[test]
    fn test_header_blocks() {
        let doc = QuoteDocument::from_sheet(&sheet(QuoteStatus::Draft));

        assert_eq!(
            doc.company_lines,
            vec![
                "CNPJ: 12.345.678/0001-90".to_string(),
                "Rua XV, 100".to_string(),
                "Tel: (41) 3333-0000 | Email: -".to_string(),
            ]
        );
        assert_eq!(doc.client_rows.len(), 3);
        assert_eq!(doc.proposal_rows[0].1, "05/08/2024");
        assert_eq!(doc.proposal_rows[1].1, "15 dias");
        assert_eq!(doc.signatory, "Papelaria Central - CNPJ: 12.345.678/0001-90");
    }

    #[test]
    fn test_invalid_brand_color_falls_back() {
        let doc = QuoteDocument::from_sheet(&sheet(QuoteStatus::Draft));
        assert_eq!(Some(doc.brand_rgb), parse_hex_color(DEFAULT_BRAND_COLOR));
    }
}
