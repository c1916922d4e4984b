use crate::core::json::{format_json_object, get_list, json_decode};
use crate::core::markup::{format_xml, MarkupConverter, MarkupOptions};
use crate::core::table::TableGenerator;
use crate::domain::model::{AcceptKind, OutputFormat, Record, ServiceRequest};
use crate::domain::ports::ApiTransport;
use crate::utils::error::Result;
use serde_json::Value;

/// 輸出相關的選項
#[derive(Debug, Clone, Default)]
pub struct ViewOptions {
    pub format: OutputFormat,
    pub columns: Vec<String>,
    pub root_key: Option<String>,
    pub dedup_rows: bool,
    pub markup: MarkupOptions,
}

pub struct QueryEngine<T: ApiTransport> {
    transport: T,
}

impl<T: ApiTransport> QueryEngine<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Runs one request and renders the response for the terminal.
    pub async fn run(&self, request: ServiceRequest, view: &ViewOptions) -> Result<String> {
        let download = request.download_to.clone();
        let accept = request.accept;

        tracing::info!("Requesting {} {}", request.method, request.uri);
        let response = self.transport.service_json_request(request).await?;

        if let Some(path) = download {
            return Ok(format!("Saved response to {}\n", path.display()));
        }

        if response.body.trim().is_empty() {
            tracing::info!("Empty response body (status {})", response.status);
            return Ok(String::new());
        }

        if accept == AcceptKind::Xml {
            return format_xml(&response.body);
        }

        let payload = json_decode(&response.body)?;
        render(&payload, view)
    }
}

/// Records carried by a decoded payload: a top-level array, the list under
/// `root_key`, or the payload object itself.
pub fn select_records(payload: &Value, root_key: Option<&str>) -> Result<Vec<Record>> {
    let items = match (root_key, payload) {
        (Some(key), _) => get_list(payload, key, None)?,
        (None, Value::Array(items)) => items.clone(),
        (None, single) => vec![single.clone()],
    };

    items.into_iter().map(Record::try_from).collect()
}

pub fn render(payload: &Value, view: &ViewOptions) -> Result<String> {
    if view.format == OutputFormat::Json {
        let mut out = format_json_object(payload)?;
        out.push('\n');
        return Ok(out);
    }

    let records = select_records(payload, view.root_key.as_deref())?;
    tracing::debug!("Rendering {} records as {:?}", records.len(), view.format);

    let columns = if view.columns.is_empty() {
        default_columns(&records)
    } else {
        view.columns.clone()
    };

    let converter = MarkupConverter::new(view.markup.clone());
    let table =
        TableGenerator::with_converter(records, columns, converter).dedup_rows(view.dedup_rows);

    match view.format {
        OutputFormat::Xml => table.render_xml(),
        _ => Ok(table.render_table()),
    }
}

/// Scalar fields of the first record, in order.
fn default_columns(records: &[Record]) -> Vec<String> {
    records
        .first()
        .map(|record| {
            record
                .data
                .iter()
                .filter(|(_, v)| !v.is_object() && !v.is_array())
                .map(|(k, _)| k.clone())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_select_records_variants() {
        let list = json!([{"a": 1}, {"a": 2}]);
        assert_eq!(select_records(&list, None).unwrap().len(), 2);

        let wrapped = json!({"volume": [{"a": 1}, {"a": 2}, {"a": 3}]});
        assert_eq!(select_records(&wrapped, Some("volume")).unwrap().len(), 3);

        let single = json!({"a": 1});
        assert_eq!(select_records(&single, None).unwrap().len(), 1);

        let scalars = json!(["x", "y"]);
        assert_eq!(select_records(&scalars, None).unwrap_err().code(), 4);
    }

    #[test]
    fn test_render_table_with_default_columns() {
        let payload = json!([{"name": "vol1", "size": "1GB", "tags": ["t"]}]);
        let out = render(&payload, &ViewOptions::default()).unwrap();
        assert_eq!(out, "  NAME SIZE \n  vol1 1GB  \n");
    }

    #[test]
    fn test_render_json_sorted() {
        let view = ViewOptions {
            format: OutputFormat::Json,
            ..ViewOptions::default()
        };
        let out = render(&json!({"b": 1, "a": 2}), &view).unwrap();
        assert_eq!(out, "{\n   \"a\": 2,\n   \"b\": 1\n}\n");
    }

    #[test]
    fn test_render_xml() {
        let view = ViewOptions {
            format: OutputFormat::Xml,
            ..ViewOptions::default()
        };
        let out = render(&json!([{"a": "1"}]), &view).unwrap();
        assert!(out.contains("<item>\n  <a>1</a>\n</item>"));
    }
}
