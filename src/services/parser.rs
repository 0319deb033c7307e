// src/services/parser.rs

//! Parser for the bank's vale vista results page.
//!
//! The upstream page comes in three fixed error/empty shapes recognized
//! by marker phrases, plus a results shape holding a nested payments
//! table. Anything else is a hard parse failure: silently returning an
//! empty result would poison the change-detection cache with a false
//! "nothing here" baseline.

use log::{debug, error};
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{Event, ResultKind, WebResult};

/// Marker phrase: the form only answers for non-clients.
const CLIENT_ONLY_MARKER: &str = "Para clientes del Banco de Chile";

/// Marker phrase: the service is temporarily unavailable.
const UNAVAILABLE_MARKER: &str = "Por ahora no podemos atenderle.";

/// Marker phrase: no payments registered for this RUT.
const NO_PAYMENTS_MARKER: &str = "Actualmente no registra pagos a su favor";

/// Expected header cell of the payments table.
const HEADER_CELL: &str = "Fecha de Pago";

/// Parse a raw page into a [`WebResult`].
///
/// Marker checks run in strict priority order before structured
/// extraction is attempted; the checks are substring-based so the order
/// matters if a page ever carried more than one phrase.
pub fn parse(raw_page: &str) -> Result<WebResult> {
    if raw_page.contains(CLIENT_ONLY_MARKER) {
        debug!("Parsed client-restricted page");
        return Ok(WebResult::error(ResultKind::ClientRestricted));
    }
    if raw_page.contains(UNAVAILABLE_MARKER) {
        debug!("Parsed temporarily-unavailable page");
        return Ok(WebResult::error(ResultKind::RetryLater));
    }
    if raw_page.contains(NO_PAYMENTS_MARKER) {
        debug!("Parsed empty payments page");
        return Ok(WebResult::with_events(Vec::new()));
    }

    let events = extract_events(raw_page).inspect_err(|_| {
        error!("Unexpected page shape:\n{raw_page}");
    })?;
    Ok(WebResult::with_events(events))
}

fn selector(css: &'static str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| AppError::selector(css, e))
}

/// Concatenated text of an element with whitespace runs collapsed.
///
/// The source markup embeds newlines and indentation inside cells; the
/// cached text is the change-detection key, so cell text must be stable
/// across cosmetic upstream reformatting.
fn cell_text(cell: ElementRef<'_>) -> String {
    let text: String = cell.text().collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract events from the results shape.
///
/// The payments live in the second table of the page, inside the sixth
/// row, as a nested row set: one header row, one row per payment, and a
/// trailing filler row.
fn extract_events(raw_page: &str) -> Result<Vec<Event>> {
    let document = Html::parse_document(raw_page);
    let table_sel = selector("table")?;
    let row_sel = selector("tr")?;
    let cell_sel = selector("td")?;

    let table = document
        .select(&table_sel)
        .nth(1)
        .ok_or_else(|| AppError::parse("results table not found"))?;
    let row = table
        .select(&row_sel)
        .nth(5)
        .ok_or_else(|| AppError::parse("payments row not found"))?;
    let rows: Vec<ElementRef<'_>> = row.select(&row_sel).collect();

    let header = rows
        .first()
        .and_then(|r| r.select(&cell_sel).next())
        .ok_or_else(|| AppError::parse("payments header not found"))?;
    if cell_text(header) != HEADER_CELL {
        return Err(AppError::parse(format!(
            "unexpected payments header: {:?}",
            cell_text(header)
        )));
    }

    // Skip the header row and the trailing filler row.
    let body_rows = if rows.len() > 2 {
        &rows[1..rows.len() - 1]
    } else {
        &[]
    };

    let mut events = Vec::with_capacity(body_rows.len());
    for row in body_rows {
        let cells: Vec<String> = row.select(&cell_sel).map(cell_text).collect();
        let [date, medium, office, status, ..] = cells.as_slice() else {
            return Err(AppError::parse(format!(
                "expected 4 cells in payment row, got {}",
                cells.len()
            )));
        };
        events.push(Event::new(
            date.as_str(),
            medium.as_str(),
            office.as_str(),
            status.as_str(),
        ));
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventKind;

    const CLIENT_PAGE: &str = r#"<html><body>
        <p>Para clientes del Banco de Chile existe un canal privado.</p>
    </body></html>"#;

    const UNAVAILABLE_PAGE: &str = r#"<html><body>
        <b>Por ahora no podemos atenderle.</b> Intente mas tarde.
    </body></html>"#;

    const NO_PAYMENTS_PAGE: &str = r#"<html><body><form>
        <table><tr><td>Consulta de Vale Vista</td></tr></table>
        <table><tr><td>Actualmente no registra pagos a su favor</td></tr></table>
    </form></body></html>"#;

    /// Mirror of the bank's results shape: second table, sixth row,
    /// nested table with header + payments + trailing filler row.
    fn results_page(payment_rows: &str) -> String {
        format!(
            r#"<html><body><form>
            <table><tr><td>Banco de Chile</td></tr></table>
            <table>
              <tr><td>Consulta Pago de Beneficios</td></tr>
              <tr><td>RUT Beneficiario</td></tr>
              <tr><td>12.345.678-5</td></tr>
              <tr><td>Periodo: 90 dias</td></tr>
              <tr><td>Detalle de pagos</td></tr>
              <tr><td>
                <table>
                  <tr><td>
Fecha de Pago</td><td>Medio de Pago</td><td>Oficina/Banco</td><td>Estado</td></tr>
                  {payment_rows}
                  <tr><td colspan="4">&nbsp;</td></tr>
                </table>
              </td></tr>
            </table>
            </form></body></html>"#
        )
    }

    const SINGLE_PAID_ROW: &str = r#"<tr>
        <td>15/07/2026</td>
        <td>Vale Vista Virtual</td>
        <td>Huérfanos 740</td>
        <td>Pagado /
Rendido</td></tr>"#;

    #[test]
    fn test_client_restricted_page() {
        let result = parse(CLIENT_PAGE).unwrap();
        assert_eq!(result.kind(), ResultKind::ClientRestricted);
        assert!(result.events().is_empty());
    }

    #[test]
    fn test_unavailable_page() {
        let result = parse(UNAVAILABLE_PAGE).unwrap();
        assert_eq!(result.kind(), ResultKind::RetryLater);
        assert!(result.events().is_empty());
    }

    #[test]
    fn test_no_payments_page() {
        let result = parse(NO_PAYMENTS_PAGE).unwrap();
        assert_eq!(result.kind(), ResultKind::NoError);
        assert!(result.events().is_empty());
    }

    #[test]
    fn test_results_page_single_row() {
        let page = results_page(SINGLE_PAID_ROW);
        let result = parse(&page).unwrap();
        assert_eq!(result.kind(), ResultKind::NoError);
        assert_eq!(result.events().len(), 1);

        let event = &result.events()[0];
        assert_eq!(event.date(), "15/07/2026");
        // Embedded newline inside the status cell is normalized away.
        assert_eq!(event.status(), "Pagado / Rendido");
        assert_eq!(event.kind(), EventKind::PaidRendered);
        assert!(!result.any_actionable());
    }

    #[test]
    fn test_results_page_preserves_row_order() {
        let rows = r#"
            <tr><td>01/08/2026</td><td>Vale Vista</td><td>Oficina A</td><td>Vigente / Rendido</td></tr>
            <tr><td>15/07/2026</td><td>Vale Vista</td><td>Oficina B</td><td>Pagado / Rendido</td></tr>
        "#;
        let result = parse(&results_page(rows)).unwrap();
        assert_eq!(result.events().len(), 2);
        assert_eq!(result.events()[0].date(), "01/08/2026");
        assert_eq!(result.events()[1].date(), "15/07/2026");
        assert!(result.any_actionable());
    }

    #[test]
    fn test_header_only_table_yields_no_events() {
        let result = parse(&results_page("")).unwrap();
        assert_eq!(result.kind(), ResultKind::NoError);
        assert!(result.events().is_empty());
    }

    #[test]
    fn test_unrecognized_page_is_a_hard_failure() {
        let err = parse("<html><body><p>something else entirely</p></body></html>").unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
        assert_eq!(err.public_message(), crate::messages::PARSER_ERROR);
    }

    #[test]
    fn test_wrong_header_is_a_hard_failure() {
        let page = results_page(SINGLE_PAID_ROW).replace("Fecha de Pago<", "Fecha<");
        assert!(parse(&page).is_err());
    }
}
