//! # Invoice Formatter
//!
//! Turns a materialized [`SaleRecord`] plus store identity into a
//! fixed-width textual receipt. Pure and deterministic: no I/O, no clock,
//! no locale lookups. Where the text ends up (file, spooler, export) is the
//! caller's business.
//!
//! ## Layout (42 columns)
//! ```text
//! ==========================================
//!             COLMADO DONA ROSA
//!        Calle Duarte #12, Santiago
//!              RNC: 131-12345-6
//! ==========================================
//! Invoice No. 00042
//! Date: 2026-08-30 14:05:09
//! Customer: Walk-in Customer
//! ------------------------------------------
//! Qty    Product            ITBIS/u    Total
//! ------------------------------------------
//! 2      Arroz Selecto 5lb     0.00   150.00
//! ...
//! ------------------------------------------
//! ```
//! Monetary values are rounded to 2 decimals here, at the display boundary;
//! the aggregates inside the record keep full precision until this point.

use serde::{Deserialize, Serialize};

use crate::types::SaleRecord;
use crate::WALK_IN_CUSTOMER;

/// Receipt width in columns (58 mm thermal paper, font A).
const WIDTH: usize = 42;

/// Width reserved for the product name column.
const NAME_WIDTH: usize = 18;

/// The store's identity block printed on every invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreIdentity {
    pub name: String,
    pub address: String,
    /// Dominican tax registration number (RNC).
    pub rnc: String,
}

/// Renders the invoice text for a completed sale.
///
/// `customer_name` is the display name resolved by the caller; `None` (or an
/// explicit `"None"` coming from a form default) prints as
/// "Walk-in Customer".
pub fn format_invoice(
    record: &SaleRecord,
    customer_name: Option<&str>,
    store: &StoreIdentity,
) -> String {
    let sale = &record.sale;
    let mut out = String::new();

    let rule = "=".repeat(WIDTH);
    let thin_rule = "-".repeat(WIDTH);

    // Header block
    out.push_str(&rule);
    out.push('\n');
    out.push_str(&center(&store.name));
    out.push('\n');
    out.push_str(&center(&store.address));
    out.push('\n');
    out.push_str(&center(&format!("RNC: {}", store.rnc)));
    out.push('\n');
    out.push_str(&rule);
    out.push('\n');

    out.push_str(&format!("Invoice No. {:05}\n", sale.id));
    out.push_str(&format!(
        "Date: {}\n",
        sale.created_at.format("%Y-%m-%d %H:%M:%S")
    ));
    out.push_str(&format!("Customer: {}\n", display_customer(customer_name)));

    // Line items
    out.push_str(&thin_rule);
    out.push('\n');
    out.push_str(&format!(
        "{:<6} {:<width$} {:>7} {:>8}\n",
        "Qty",
        "Product",
        "ITBIS/u",
        "Total",
        width = NAME_WIDTH
    ));
    out.push_str(&thin_rule);
    out.push('\n');

    for line in &record.lines {
        let unit_itbis = if line.quantity > 0.0 {
            line.line_itbis / line.quantity
        } else {
            0.0
        };
        out.push_str(&format!(
            "{:<6} {:<width$} {:>7.2} {:>8.2}\n",
            format_qty(line.quantity),
            truncate(&line.name_snapshot, NAME_WIDTH),
            unit_itbis,
            line.line_subtotal,
            width = NAME_WIDTH
        ));
    }

    // Totals block
    out.push_str(&thin_rule);
    out.push('\n');
    push_total(&mut out, "Subtotal (excl. ITBIS)", sale.subtotal_excl_itbis);
    push_total(&mut out, "ITBIS", sale.total_itbis);
    push_total(&mut out, "Subtotal", sale.subtotal_incl_itbis);
    if sale.discount > 0.0 {
        push_total(&mut out, "Discount", sale.discount);
    }
    push_total(&mut out, "TOTAL", sale.net_total);
    push_total(&mut out, "Tendered", sale.tendered);
    push_total(&mut out, "Change", sale.change_due);
    out.push_str(&rule);
    out.push('\n');
    out.push_str(&center("Thank you for your purchase!"));
    out.push('\n');

    out
}

/// Resolves the printed customer name.
fn display_customer(name: Option<&str>) -> &str {
    match name {
        Some(n) if !n.trim().is_empty() && n.trim() != "None" => n,
        _ => WALK_IN_CUSTOMER,
    }
}

/// Right-aligned label/amount row of the totals block.
fn push_total(out: &mut String, label: &str, amount: f64) {
    out.push_str(&format!(
        "{:<width$}{:>10.2}\n",
        format!("{label}:"),
        amount,
        width = WIDTH - 10
    ));
}

/// Centers `text` within the receipt width (left-biased on odd padding).
fn center(text: &str) -> String {
    let len = text.chars().count();
    if len >= WIDTH {
        return text.to_string();
    }
    let pad = (WIDTH - len) / 2;
    format!("{}{}", " ".repeat(pad), text)
}

/// Truncates a product name to the column width.
fn truncate(name: &str, width: usize) -> String {
    if name.chars().count() <= width {
        name.to_string()
    } else {
        name.chars().take(width).collect()
    }
}

/// Quantities print without a decimal point when whole (2, not 2.00), with
/// two decimals otherwise (1.50 lb).
fn format_qty(qty: f64) -> String {
    if (qty.fract()).abs() < 1e-9 {
        format!("{}", qty as i64)
    } else {
        format!("{qty:.2}")
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Sale, SaleLine};
    use chrono::TimeZone;

    fn store() -> StoreIdentity {
        StoreIdentity {
            name: "COLMADO DONA ROSA".to_string(),
            address: "Calle Duarte #12, Santiago".to_string(),
            rnc: "131-12345-6".to_string(),
        }
    }

    fn sample_record() -> SaleRecord {
        // The worked example: 2 × RD$ 100.00 excl. at 18%, 10% discount,
        // RD$ 250.00 tendered.
        SaleRecord {
            sale: Sale {
                id: 42,
                customer_id: None,
                created_at: chrono::Utc.with_ymd_and_hms(2026, 8, 30, 14, 5, 9).unwrap(),
                subtotal_excl_itbis: 200.0,
                total_itbis: 36.0,
                subtotal_incl_itbis: 236.0,
                discount: 23.6,
                net_total: 212.4,
                tendered: 250.0,
                change_due: 37.6,
            },
            lines: vec![SaleLine {
                id: 1,
                sale_id: 42,
                product_id: 7,
                name_snapshot: "Producto A".to_string(),
                quantity: 2.0,
                unit_price: 118.0,
                line_subtotal: 236.0,
                line_itbis: 36.0,
            }],
        }
    }

    #[test]
    fn test_invoice_totals_block() {
        let text = format_invoice(&sample_record(), None, &store());

        assert!(text.contains("Invoice No. 00042"));
        assert!(text.contains("Date: 2026-08-30 14:05:09"));
        assert!(text.contains("Customer: Walk-in Customer"));
        assert!(text.contains("200.00"));
        assert!(text.contains("36.00"));
        assert!(text.contains("236.00"));
        assert!(text.contains("23.60"));
        assert!(text.contains("212.40"));
        assert!(text.contains("250.00"));
        assert!(text.contains("37.60"));
    }

    #[test]
    fn test_invoice_is_fixed_width() {
        let text = format_invoice(&sample_record(), Some("Juan Perez"), &store());
        for line in text.lines() {
            assert!(
                line.chars().count() <= WIDTH,
                "line wider than {WIDTH}: {line:?}"
            );
        }
    }

    #[test]
    fn test_invoice_deterministic() {
        let a = format_invoice(&sample_record(), Some("Juan Perez"), &store());
        let b = format_invoice(&sample_record(), Some("Juan Perez"), &store());
        assert_eq!(a, b);
    }

    #[test]
    fn test_customer_name_fallbacks() {
        assert_eq!(display_customer(None), WALK_IN_CUSTOMER);
        assert_eq!(display_customer(Some("")), WALK_IN_CUSTOMER);
        assert_eq!(display_customer(Some("None")), WALK_IN_CUSTOMER);
        assert_eq!(display_customer(Some("Maria")), "Maria");
    }

    #[test]
    fn test_discount_row_omitted_when_zero() {
        let mut record = sample_record();
        record.sale.discount = 0.0;
        record.sale.net_total = 236.0;
        let text = format_invoice(&record, None, &store());
        assert!(!text.contains("Discount"));
    }

    #[test]
    fn test_long_name_truncated() {
        let mut record = sample_record();
        record.lines[0].name_snapshot =
            "Aceite de Oliva Extra Virgen Importado 1L".to_string();
        let text = format_invoice(&record, None, &store());
        assert!(text.contains("Aceite de Oliva Ex"));
        assert!(!text.contains("Importado"));
    }

    #[test]
    fn test_fractional_quantity_rendering() {
        let mut record = sample_record();
        record.lines[0].quantity = 1.5;
        let text = format_invoice(&record, None, &store());
        assert!(text.contains("1.50"));
    }
}
