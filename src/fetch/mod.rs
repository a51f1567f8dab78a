use crate::error::FetchError;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::debug;

/// One scraped HTML table: ordered rows of ordered cells. `None` models an
/// empty cell so downstream null checks don't have to sniff empty strings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawTable {
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    /// First cell of the first row, where category tables carry their title.
    pub fn first_cell(&self) -> Option<&str> {
        self.rows.first()?.first()?.as_deref()
    }

    /// First cell of the last row, where the newest month label sits.
    pub fn last_row_first_cell(&self) -> Option<&str> {
        self.rows.last()?.first()?.as_deref()
    }
}

/// Build the one client used for the whole invocation.
pub fn build_client(timeout: Duration, accept_invalid_certs: bool) -> Result<Client, FetchError> {
    Ok(Client::builder()
        .timeout(timeout)
        .danger_accept_invalid_certs(accept_invalid_certs)
        .build()?)
}

/// Fetch `url` once and parse every `<table>` element in the body.
///
/// A 200 response with zero tables is `FetchError::NoTables` — the page has
/// nothing published yet. No retries; one failure ends the run.
pub async fn fetch_tables(client: &Client, url: &str) -> Result<Vec<RawTable>, FetchError> {
    let body = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let tables = parse_tables(&body);
    debug!(url, count = tables.len(), "parsed tables");
    if tables.is_empty() {
        return Err(FetchError::NoTables {
            url: url.to_string(),
        });
    }
    Ok(tables)
}

/// Convert every `<table>` in `html` to a `RawTable`, preserving document
/// order of rows and cells. Cell text is whitespace-collapsed; empty cells
/// become `None`.
pub fn parse_tables(html: &str) -> Vec<RawTable> {
    let table_sel = Selector::parse("table").expect("CSS selector for tables should be valid");
    let row_sel = Selector::parse("tr").expect("CSS selector for rows should be valid");
    let cell_sel = Selector::parse("th, td").expect("CSS selector for cells should be valid");

    let doc = Html::parse_document(html);
    doc.select(&table_sel)
        .map(|table| RawTable {
            rows: table
                .select(&row_sel)
                .map(|row| row.select(&cell_sel).map(cell_text).collect())
                .collect(),
        })
        .collect()
}

fn cell_text(cell: scraper::ElementRef<'_>) -> Option<String> {
    let text = cell
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

// ----- Tests -----
#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    const PAGE: &str = r#"
        <html><body>
        <table>
            <tr><td>2025 Natural Gas</td><td></td></tr>
            <tr><td>January</td><td>  5.23  </td></tr>
        </table>
        <table>
            <tr><th>Plan</th><th>Rate
                per GJ</th></tr>
        </table>
        </body></html>"#;

    #[test]
    fn parses_tables_in_document_order() {
        let tables = parse_tables(PAGE);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].first_cell(), Some("2025 Natural Gas"));
        assert_eq!(tables[0].last_row_first_cell(), Some("January"));
    }

    #[test]
    fn cell_text_is_trimmed_and_collapsed() {
        let tables = parse_tables(PAGE);
        assert_eq!(tables[0].rows[1][1].as_deref(), Some("5.23"));
        assert_eq!(tables[1].rows[0][1].as_deref(), Some("Rate per GJ"));
    }

    #[test]
    fn empty_cells_become_none() {
        let tables = parse_tables(PAGE);
        assert_eq!(tables[0].rows[0][1], None);
    }

    #[test]
    fn document_without_tables_parses_to_empty() {
        assert!(parse_tables("<html><body><p>soon</p></body></html>").is_empty());
    }

    #[tokio::test]
    async fn fetch_returns_parsed_tables() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/rates");
                then.status(200)
                    .header("content-type", "text/html")
                    .body(PAGE);
            })
            .await;

        let client = build_client(Duration::from_secs(5), false).unwrap();
        let tables = fetch_tables(&client, &server.url("/rates")).await.unwrap();
        mock.assert_async().await;
        assert_eq!(tables.len(), 2);
    }

    #[tokio::test]
    async fn fetch_maps_empty_page_to_no_tables() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/rates");
                then.status(200).body("<html><body></body></html>");
            })
            .await;

        let client = build_client(Duration::from_secs(5), false).unwrap();
        let err = fetch_tables(&client, &server.url("/rates"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::NoTables { .. }));
    }

    #[tokio::test]
    async fn fetch_surfaces_http_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/rates");
                then.status(503);
            })
            .await;

        let client = build_client(Duration::from_secs(5), false).unwrap();
        let err = fetch_tables(&client, &server.url("/rates"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Request(_)));
    }
}
