use crate::core::json::json_decode;
use crate::domain::model::{Record, ServiceRequest};
use crate::domain::ports::ApiTransport;
use crate::utils::error::{Result, SosError};
use serde_json::Value;

/// `{"link": {"href": "..."}}` -> the href.
fn link_href(link: &Value) -> Result<&str> {
    link.get("link")
        .and_then(|l| l.get("href"))
        .and_then(Value::as_str)
        .ok_or_else(|| SosError::value(format!("Resource reference has no link.href: {}", link)))
}

fn is_inactive(obj: &Value) -> bool {
    obj.get("inactive").and_then(Value::as_bool).unwrap_or(false)
}

async fn fetch_href<T: ApiTransport + ?Sized>(transport: &T, href: &str) -> Result<Value> {
    let response = transport
        .service_json_request(ServiceRequest::get(href))
        .await?;
    json_decode(&response.body)
}

/// Follows every link of a list response and returns the active objects.
pub async fn list_by_hrefs<T: ApiTransport + ?Sized>(
    transport: &T,
    hrefs: &[Value],
) -> Result<Vec<Record>> {
    let mut output = Vec::new();
    for link in hrefs {
        let href = link_href(link)?;
        let obj = fetch_href(transport, href).await?;
        if is_inactive(&obj) {
            tracing::debug!("Skipping inactive resource {}", href);
            continue;
        }
        output.push(Record::try_from(obj)?);
    }
    Ok(output)
}

/// Details of one linked object, `None` when it is inactive.
pub async fn show_by_href<T: ApiTransport + ?Sized>(
    transport: &T,
    link: &Value,
) -> Result<Option<Record>> {
    let href = link_href(link)?;
    let obj = fetch_href(transport, href).await?;
    if is_inactive(&obj) {
        return Ok(None);
    }
    Ok(Some(Record::try_from(obj)?))
}
