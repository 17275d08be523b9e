//! Integration tests for PDF rendering.
//!
//! These tests render complete quote sheets, with and without logos, and
//! check the produced bytes are a PDF document.

use chrono::{NaiveDate, Utc};
use common::{ClientId, CompanyId, QuoteId, QuoteStatus};
use domain::{QuoteSheet, SheetItem};
use render::{LogoStore, QuoteDocument, Renderer, render_pdf};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use store::{Client, Company, QuoteRow};

/// True when a hex string operand in the page content starts with `prefix`,
/// given as the uppercase hex of its WinAnsi bytes.
fn shows_hex_text(pdf: &[u8], prefix: &str) -> bool {
    let needle = format!("<{prefix}").into_bytes();
    pdf.to_ascii_uppercase()
        .windows(needle.len())
        .any(|window| window == needle.as_slice())
}

fn sheet(items: usize, logo_path: Option<&str>) -> QuoteSheet {
    let now = Utc::now();
    let items: Vec<SheetItem> = (1..=items)
        .map(|i| SheetItem {
            sequence: i as i32,
            unit_code: "UN".to_string(),
            quantity: Decimal::from(i as i64),
            description: format!("Produto de teste número {i}"),
            brand: (i % 2 == 0).then(|| "Marca".to_string()),
            unit_price: dec!(1.25),
            total: dec!(1.25) * Decimal::from(i as i64),
        })
        .collect();
    let total = items.iter().map(|item| item.total).sum();

    QuoteSheet {
        quote: QuoteRow {
            id: QuoteId::new(10),
            company_id: CompanyId::new(1),
            client_id: ClientId::new(4),
            number: "ORC-1-00010".to_string(),
            issue_date: NaiveDate::from_ymd_opt(2024, 11, 20).unwrap(),
            expiry_date: None,
            validity_days: 15,
            delivery_terms: "A Combinar".to_string(),
            status: QuoteStatus::Draft,
            notes: String::new(),
            discount: Decimal::ZERO,
            total,
            locked: false,
            created_at: now,
            updated_at: now,
        },
        company: Company {
            id: CompanyId::new(1),
            name: "Distribuidora Paraná".to_string(),
            tax_id: Some("11.222.333/0001-44".to_string()),
            address: Some("Rua Marechal, 55".to_string()),
            phone: Some("(41) 9999-0000".to_string()),
            email: Some("vendas@example.com".to_string()),
            logo_path: logo_path.map(str::to_string),
            brand_color: "#0f766e".to_string(),
            active: true,
            created_at: now,
        },
        client: Client {
            id: ClientId::new(4),
            name: "Hospital Regional".to_string(),
            tax_id: "55.666.777/0001-88".to_string(),
            address: "Av. Central, 1000".to_string(),
            phone: Some("(41) 3000-1000".to_string()),
            email: None,
            created_at: now,
            updated_at: now,
        },
        items,
    }
}

#[test]
fn renders_pdf_without_logo() {
    let document = QuoteDocument::from_sheet(&sheet(3, None));

    let bytes = render_pdf(&document, None).unwrap();

    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn long_tables_break_across_pages() {
    let short = render_pdf(&QuoteDocument::from_sheet(&sheet(2, None)), None).unwrap();
    let long = render_pdf(&QuoteDocument::from_sheet(&sheet(120, None)), None).unwrap();

    assert!(long.starts_with(b"%PDF"));
    assert!(long.len() > short.len());
}

#[test]
fn renderer_embeds_logo_from_media_root() {
    let media = tempfile::tempdir().unwrap();
    let img = printpdf::image_crate::ImageBuffer::from_pixel(
        60,
        30,
        printpdf::image_crate::Rgba([10u8, 120, 110, 255]),
    );
    img.save(media.path().join("logo.png")).unwrap();

    let renderer = Renderer::new(LogoStore::new(media.path()));
    let with_logo = renderer.render(&sheet(1, Some("logo.png"))).unwrap();
    let without_logo = renderer.render(&sheet(1, None)).unwrap();

    assert!(with_logo.starts_with(b"%PDF"));
    assert!(with_logo.len() > without_logo.len());
}

#[test]
fn missing_logo_does_not_fail_rendering() {
    let media = tempfile::tempdir().unwrap();
    let renderer = Renderer::new(LogoStore::new(media.path()));

    let bytes = renderer.render(&sheet(1, Some("logos/gone.png"))).unwrap();

    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn order_sheet_is_titled_as_order() {
    let mut converted = sheet(1, None);
    converted.quote.status = QuoteStatus::OrderGenerated;
    converted.quote.locked = true;

    let document = QuoteDocument::from_sheet(&converted);
    let bytes = render_pdf(&document, None).unwrap();

    assert!(document.title.starts_with("PEDIDO"));
    // "PEDIDO"
    assert!(shows_hex_text(&bytes, "50454449444F"));
    // "ORÇAMENTO"
    assert!(!shows_hex_text(&bytes, "4F52C7414D454E544F"));
}

#[test]
fn draft_sheet_is_titled_as_quote() {
    let bytes = render_pdf(&QuoteDocument::from_sheet(&sheet(1, None)), None).unwrap();

    // "ORÇAMENTO", with the cedilla as WinAnsi 0xC7
    assert!(shows_hex_text(&bytes, "4F52C7414D454E544F"));
    assert!(!shows_hex_text(&bytes, "50454449444F"));
}
