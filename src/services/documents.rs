//! Invoice and bill document rendering.
//!
//! Rendering is split into a thin data-access layer ([`DocumentService`]) and
//! pure formatting functions, so the HTML output for a given set of orders is
//! deterministic and testable without a database.

use crate::{
    entities::order::{self, Entity as OrderEntity, LineItem},
    errors::ServiceError,
    services::bills,
};
use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

/// Tax rate assumed when an order predates the explicit tax columns.
const DEFAULT_TAX_RATE: Decimal = dec!(18);

pub struct DocumentService {
    db: Arc<DatabaseConnection>,
}

impl DocumentService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Renders the invoice for the group of orders sharing this order's
    /// invoice number. Orders paid in one checkout batch carry one invoice
    /// number, so the invoice lists all of them under a single total.
    #[instrument(skip(self), fields(order_id = %order_id, user_id = %user_id))]
    pub async fn render_invoice(
        &self,
        user_id: Uuid,
        order_id: Uuid,
    ) -> Result<String, ServiceError> {
        let anchor = self.fetch_owned(user_id, order_id).await?;
        let invoice_number = anchor
            .invoice_number
            .clone()
            .ok_or_else(|| ServiceError::ValidationError("Order has no invoice yet".to_string()))?;

        // The group lookup is an enrichment; if it fails we still render the
        // anchor order rather than returning an error for a paid invoice.
        let group = match OrderEntity::find()
            .filter(order::Column::InvoiceNumber.eq(invoice_number.clone()))
            .filter(order::Column::UserId.eq(user_id))
            .order_by_asc(order::Column::CreatedAt)
            .all(&*self.db)
            .await
        {
            Ok(orders) if !orders.is_empty() => orders,
            Ok(_) => vec![anchor],
            Err(e) => {
                warn!(error = %e, invoice_number = %invoice_number, "Invoice group lookup failed; rendering single order");
                vec![anchor]
            }
        };

        Ok(render_invoice_html(&group))
    }

    #[instrument(skip(self), fields(order_id = %order_id, user_id = %user_id))]
    pub async fn render_bill(&self, user_id: Uuid, order_id: Uuid) -> Result<String, ServiceError> {
        let model = self.fetch_owned(user_id, order_id).await?;
        Ok(render_bill_html(&model))
    }

    async fn fetch_owned(&self, user_id: Uuid, order_id: Uuid) -> Result<order::Model, ServiceError> {
        OrderEntity::find()
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))
    }
}

/// Formats an amount with two decimal places and Indian digit grouping:
/// the last three integer digits stand alone, every earlier pair gets a
/// comma (1234567.5 -> "12,34,567.50").
pub fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let raw = format!("{:.2}", rounded);
    let (sign, digits) = match raw.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", raw.as_str()),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, "00"));

    if int_part.len() <= 3 {
        return format!("{}{}.{}", sign, int_part, frac_part);
    }

    let (head, tail) = int_part.split_at(int_part.len() - 3);
    let mut grouped = String::new();
    let head_bytes = head.as_bytes();
    let lead = head_bytes.len() % 2;
    if lead == 1 {
        grouped.push(head_bytes[0] as char);
    }
    for pair in head_bytes[lead..].chunks(2) {
        if !grouped.is_empty() {
            grouped.push(',');
        }
        grouped.push(pair[0] as char);
        grouped.push(pair[1] as char);
    }

    format!("{}{},{}.{}", sign, grouped, tail, frac_part)
}

/// "5 June 2026" style dates for document headers.
pub fn format_date(date: DateTime<Utc>) -> String {
    const MONTHS: [&str; 12] = [
        "January", "February", "March", "April", "May", "June", "July", "August", "September",
        "October", "November", "December",
    ];
    format!(
        "{} {} {}",
        date.day(),
        MONTHS[date.month0() as usize],
        date.year()
    )
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn subtotal_of(model: &order::Model) -> Decimal {
    model.subtotal.unwrap_or(model.amount)
}

fn tax_of(model: &order::Model) -> Decimal {
    model.tax.unwrap_or(Decimal::ZERO)
}

fn tax_rate_of(model: &order::Model) -> Decimal {
    model.tax_rate.unwrap_or(DEFAULT_TAX_RATE)
}

fn line_item_rows(items: &[LineItem]) -> String {
    let mut rows = String::new();
    for item in items {
        let line_total = item.unit_price * Decimal::from(item.quantity);
        let area = item
            .area
            .as_deref()
            .map(|a| format!(" <span class=\"area\">({})</span>", escape_html(a)))
            .unwrap_or_default();
        rows.push_str(&format!(
            "<tr><td>{}{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td></tr>\n",
            escape_html(&item.title),
            area,
            item.quantity,
            format_money(item.unit_price),
            format_money(line_total),
        ));
    }
    rows
}

/// Renders the invoice page for a group of orders that share one invoice
/// number. Pure function of its input; same orders, same bytes.
///
/// Callers must pass at least one order; [`DocumentService::render_invoice`]
/// always supplies the anchor order even when the group lookup fails.
pub(crate) fn render_invoice_html(orders: &[order::Model]) -> String {
    let first = &orders[0];
    let invoice_number = first.invoice_number.as_deref().unwrap_or("-");
    let invoice_date = first
        .invoice_date
        .map(format_date)
        .unwrap_or_else(|| "-".to_string());
    let currency = escape_html(&first.currency);

    let mut subtotal = Decimal::ZERO;
    let mut discount = Decimal::ZERO;
    let mut tax = Decimal::ZERO;
    let mut total = Decimal::ZERO;
    let mut item_rows = String::new();
    for model in orders {
        subtotal += subtotal_of(model);
        discount += model.discount.unwrap_or(Decimal::ZERO);
        tax += tax_of(model);
        total += model.amount;
        item_rows.push_str(&line_item_rows(&model.items.0));
    }
    let tax_rate = tax_rate_of(first);

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Invoice {number}</title>\n<style>\n\
body {{ font-family: sans-serif; margin: 40px; color: #222; }}\n\
table {{ width: 100%; border-collapse: collapse; margin-top: 24px; }}\n\
th, td {{ border-bottom: 1px solid #ddd; padding: 8px; text-align: left; }}\n\
td.num, th.num {{ text-align: right; }}\n\
.totals td {{ border: none; }}\n\
.area {{ color: #777; font-size: 0.9em; }}\n\
</style>\n</head>\n<body>\n\
<h1>Tax Invoice</h1>\n\
<p><strong>Invoice No:</strong> {number}<br>\n\
<strong>Invoice Date:</strong> {date}<br>\n\
<strong>Currency:</strong> {currency}</p>\n\
<table>\n<thead><tr><th>Description</th><th class=\"num\">Qty</th><th class=\"num\">Rate</th><th class=\"num\">Amount</th></tr></thead>\n\
<tbody>\n{rows}</tbody>\n\
<tbody class=\"totals\">\n\
<tr><td colspan=\"3\" class=\"num\">Subtotal</td><td class=\"num\">{subtotal}</td></tr>\n\
<tr><td colspan=\"3\" class=\"num\">Discount</td><td class=\"num\">{discount}</td></tr>\n\
<tr><td colspan=\"3\" class=\"num\">Tax ({rate}%)</td><td class=\"num\">{tax}</td></tr>\n\
<tr><td colspan=\"3\" class=\"num\"><strong>Total</strong></td><td class=\"num\"><strong>{total}</strong></td></tr>\n\
</tbody>\n</table>\n</body>\n</html>\n",
        number = escape_html(invoice_number),
        date = invoice_date,
        currency = currency,
        rows = item_rows,
        subtotal = format_money(subtotal),
        discount = format_money(discount),
        rate = tax_rate,
        tax = format_money(tax),
        total = format_money(total),
    )
}

/// Renders the bill-of-supply page for a single order, using the order's own
/// subtotal/tax fields with their documented defaults.
pub fn render_bill_html(model: &order::Model) -> String {
    let file_name = bills::display_file_name(model.id);
    let bill_date = format_date(model.paid_at.unwrap_or(model.created_at));
    let discount = model.discount.unwrap_or(Decimal::ZERO);

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{name}</title>\n<style>\n\
body {{ font-family: sans-serif; margin: 40px; color: #222; }}\n\
table {{ width: 100%; border-collapse: collapse; margin-top: 24px; }}\n\
th, td {{ border-bottom: 1px solid #ddd; padding: 8px; text-align: left; }}\n\
td.num, th.num {{ text-align: right; }}\n\
.totals td {{ border: none; }}\n\
.area {{ color: #777; font-size: 0.9em; }}\n\
</style>\n</head>\n<body>\n\
<h1>Bill</h1>\n\
<p><strong>Bill No:</strong> {name}<br>\n\
<strong>Date:</strong> {date}<br>\n\
<strong>Status:</strong> {status}<br>\n\
<strong>Currency:</strong> {currency}</p>\n\
<table>\n<thead><tr><th>Description</th><th class=\"num\">Qty</th><th class=\"num\">Rate</th><th class=\"num\">Amount</th></tr></thead>\n\
<tbody>\n{rows}</tbody>\n\
<tbody class=\"totals\">\n\
<tr><td colspan=\"3\" class=\"num\">Subtotal</td><td class=\"num\">{subtotal}</td></tr>\n\
<tr><td colspan=\"3\" class=\"num\">Discount</td><td class=\"num\">{discount}</td></tr>\n\
<tr><td colspan=\"3\" class=\"num\">Tax ({rate}%)</td><td class=\"num\">{tax}</td></tr>\n\
<tr><td colspan=\"3\" class=\"num\"><strong>Total</strong></td><td class=\"num\"><strong>{total}</strong></td></tr>\n\
</tbody>\n</table>\n</body>\n</html>\n",
        name = escape_html(&file_name),
        date = bill_date,
        status = escape_html(&model.status),
        currency = escape_html(&model.currency),
        rows = line_item_rows(&model.items.0),
        subtotal = format_money(subtotal_of(model)),
        discount = format_money(discount),
        rate = tax_rate_of(model),
        tax = format_money(tax_of(model)),
        total = format_money(model.amount),
    )
}
