/// Product name embedded in resource URNs.
pub const PROD_NAME: &str = "storageos";
pub const TENANT_PROVIDER: &str = "urn:storageos:TenantOrg:provider:";

/// Whether `name` is a resource URN (`urn:storageos:...`) rather than a label.
pub fn is_uri(name: &str) -> bool {
    let mut parts = name.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(urn), Some(prod), Some(_)) => urn == "urn" && prod == PROD_NAME,
        _ => false,
    }
}

/// Splits `project/volume` style paths into `(Some("project"), "volume")`.
pub fn parent_child_from_xpath(name: &str) -> (Option<&str>, &str) {
    match name.rsplit_once('/') {
        Some((parent, label)) => (Some(parent), label),
        None => (None, name),
    }
}
