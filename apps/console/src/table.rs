//! Plain-text tables for products, coins and sales.

use vendo_core::{CoinStock, Money, Product};
use vendo_db::{SaleRecord, SalesTotals};

/// Renders rows under a header, columns padded to their widest cell.
pub fn render(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = vec![line(headers.iter().copied(), &widths)];
    out.push(
        widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("+"),
    );
    for row in rows {
        out.push(line(row.iter().map(String::as_str), &widths));
    }
    out.join("\n")
}

fn line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, width)| format!(" {:<width$} ", cell, width = *width))
        .collect::<Vec<_>>()
        .join("|")
        .trim_end()
        .to_string()
}

pub fn products(products: &[Product]) -> String {
    if products.is_empty() {
        return "No products loaded.".to_string();
    }

    let rows: Vec<Vec<String>> = products
        .iter()
        .map(|p| {
            vec![
                p.code.clone(),
                p.name.clone(),
                p.price.to_string(),
                if p.in_stock() {
                    p.quantity.to_string()
                } else {
                    "sold out".to_string()
                },
            ]
        })
        .collect();
    render(&["Code", "Name", "Price", "Quantity"], &rows)
}

pub fn coins(stock: &[CoinStock]) -> String {
    let rows: Vec<Vec<String>> = stock
        .iter()
        .map(|s| {
            vec![
                s.denomination.to_string(),
                s.quantity.to_string(),
                s.reserve.to_string(),
                s.available().to_string(),
            ]
        })
        .collect();
    let total: Money = stock
        .iter()
        .map(|s| s.denomination.value() * s.quantity)
        .sum();

    format!(
        "{}\nTotal in till: {}",
        render(&["Coin", "Quantity", "Reserve", "Available"], &rows),
        total
    )
}

pub fn sales(recent: &[SaleRecord], totals: &SalesTotals) -> String {
    let summary = format!(
        "Sales: {}, revenue: {}, change not returned: {}",
        totals.count, totals.revenue, totals.unpayable
    );
    if recent.is_empty() {
        return summary;
    }

    let rows: Vec<Vec<String>> = recent
        .iter()
        .map(|s| {
            vec![
                s.created_at.format("%Y-%m-%d %H:%M").to_string(),
                s.product_code.clone(),
                s.product_name.clone(),
                s.price.to_string(),
                s.inserted.to_string(),
                s.returned.to_string(),
                s.unpayable.to_string(),
            ]
        })
        .collect();

    format!(
        "{}\n{}",
        render(
            &["When", "Code", "Product", "Price", "Paid", "Change", "Unpaid"],
            &rows
        ),
        summary
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_pads_columns() {
        let table = render(
            &["Code", "Name"],
            &[
                vec!["A1".into(), "Water".into()],
                vec!["B12".into(), "Chips".into()],
            ],
        );
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], " Code | Name");
        assert_eq!(lines[1], "------+-------");
        assert_eq!(lines[2], " A1   | Water");
        assert_eq!(lines[3], " B12  | Chips");
    }

    #[test]
    fn test_products_marks_sold_out() {
        let table = products(&[Product::new("a1", "Water", Money::from_stotinki(90), 0)]);
        assert!(table.contains("A1"));
        assert!(table.contains("0.90lv"));
        assert!(table.contains("sold out"));
        assert_eq!(products(&[]), "No products loaded.");
    }
}
