use crate::model::scope::Scope;
use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationStatus {
    Pending,
    Running,
    Done,
}

impl OperationStatus {
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Pending => Self::Running,
            Self::Running | Self::Done => Self::Done,
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Running => write!(f, "RUNNING"),
            Self::Done => write!(f, "DONE"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct OperationErrorDetail {
    code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl OperationErrorDetail {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            location: None,
            message: Some(message.into()),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct OperationError {
    #[serde(default)]
    errors: Vec<OperationErrorDetail>,
}

impl OperationError {
    pub const fn new(errors: Vec<OperationErrorDetail>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[OperationErrorDetail] {
        &self.errors
    }
}

/// A Compute long-running operation (`compute#operation`).
///
/// Fields the client does not model are kept in `extra` so that decoding
/// then encoding a payload preserves it.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    kind: String,
    name: String,
    operation_type: String,
    status: OperationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    self_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    progress: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    insert_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<OperationError>,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

impl Operation {
    pub const KIND: &'static str = "compute#operation";

    pub const DELETE_OPERATION_TYPE: &'static str = "delete";
    pub const INSERT_OPERATION_TYPE: &'static str = "insert";

    pub fn new_operation(
        name: impl Into<String>,
        operation_type: impl Into<String>,
        scope: &Scope,
        self_link: impl Into<String>,
        target_link: impl Into<String>,
    ) -> Self {
        let (zone, region) = match scope {
            Scope::Global => (None, None),
            Scope::Zone(zone) => (Some(zone.clone()), None),
            Scope::Region(region) => (None, Some(region.clone())),
        };

        Self {
            kind: Self::KIND.to_string(),
            name: name.into(),
            operation_type: operation_type.into(),
            status: OperationStatus::Pending,
            status_message: None,
            target_link: Some(target_link.into()),
            self_link: Some(self_link.into()),
            zone,
            region,
            progress: Some(0),
            insert_time: None,
            start_time: None,
            end_time: None,
            error: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operation_type(&self) -> &str {
        &self.operation_type
    }

    pub const fn status(&self) -> OperationStatus {
        self.status
    }

    pub fn is_done(&self) -> bool {
        self.status == OperationStatus::Done
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn target_link(&self) -> Option<&str> {
        self.target_link.as_deref()
    }

    /// Last path segment of the target link, the name of the mutated resource.
    pub fn target_name(&self) -> Option<&str> {
        self.target_link
            .as_deref()
            .and_then(|link| link.rsplit('/').next())
    }

    pub fn self_link(&self) -> Option<&str> {
        self.self_link.as_deref()
    }

    pub fn zone(&self) -> Option<&str> {
        self.zone.as_deref()
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub const fn progress(&self) -> Option<u32> {
        self.progress
    }

    pub fn insert_time(&self) -> Option<&str> {
        self.insert_time.as_deref()
    }

    pub fn end_time(&self) -> Option<&str> {
        self.end_time.as_deref()
    }

    pub const fn error(&self) -> Option<&OperationError> {
        self.error.as_ref()
    }

    pub fn has_error(&self) -> bool {
        self.error
            .as_ref()
            .is_some_and(|error| !error.errors().is_empty())
    }

    pub const fn extra(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.extra
    }

    pub const fn set_status(&mut self, status: OperationStatus) {
        self.status = status;
        self.progress = Some(match status {
            OperationStatus::Pending => 0,
            OperationStatus::Running => 50,
            OperationStatus::Done => 100,
        });
    }

    pub fn set_status_message(&mut self, status_message: impl Into<String>) {
        self.status_message = Some(status_message.into());
    }

    pub fn set_error(&mut self, error: OperationError) {
        self.error = Some(error);
    }

    pub fn set_insert_time(&mut self, time: impl Into<String>) {
        self.insert_time = Some(time.into());
    }

    pub fn set_start_time(&mut self, time: impl Into<String>) {
        self.start_time = Some(time.into());
    }

    pub fn set_end_time(&mut self, time: impl Into<String>) {
        self.end_time = Some(time.into());
    }
}

/// A page of operations (`compute#operationList`).
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationList {
    kind: String,
    #[serde(default)]
    items: Vec<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    next_page_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    self_link: Option<String>,
}

impl OperationList {
    pub const KIND: &'static str = "compute#operationList";

    pub fn new(items: Vec<Operation>, self_link: impl Into<String>) -> Self {
        Self {
            kind: Self::KIND.to_string(),
            items,
            next_page_token: None,
            self_link: Some(self_link.into()),
        }
    }

    pub fn items(&self) -> &[Operation] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Operation> {
        self.items
    }

    pub fn next_page_token(&self) -> Option<&str> {
        self.next_page_token.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_wire_operation_and_keeps_unknown_fields() {
        let payload = serde_json::json!({
            "kind": "compute#operation",
            "id": "4212",
            "name": "operation-1",
            "operationType": "insert",
            "status": "RUNNING",
            "targetLink": "https://example.test/compute/v1/projects/p/zones/z/instances/vm-1",
            "selfLink": "https://example.test/compute/v1/projects/p/zones/z/operations/operation-1",
            "zone": "z",
            "progress": 50,
            "user": "someone@example.test"
        });

        let operation: Operation = serde_json::from_value(payload.clone()).unwrap();

        assert_eq!(operation.status(), OperationStatus::Running);
        assert_eq!(operation.target_name(), Some("vm-1"));
        assert_eq!(operation.zone(), Some("z"));
        assert_eq!(operation.extra()["user"], "someone@example.test");
        assert_eq!(serde_json::to_value(&operation).unwrap(), payload);
    }

    #[test]
    fn status_only_moves_forward() {
        assert_eq!(OperationStatus::Pending.next(), OperationStatus::Running);
        assert_eq!(OperationStatus::Running.next(), OperationStatus::Done);
        assert_eq!(OperationStatus::Done.next(), OperationStatus::Done);
    }

    #[test]
    fn has_error_ignores_empty_error_lists() {
        let mut operation = Operation::new_operation(
            "operation-2",
            Operation::DELETE_OPERATION_TYPE,
            &Scope::Global,
            "self",
            "target",
        );
        assert!(!operation.has_error());

        operation.set_error(OperationError::default());
        assert!(!operation.has_error());

        operation.set_error(OperationError::new(vec![OperationErrorDetail::new(
            "RESOURCE_NOT_FOUND",
            "The resource was not found",
        )]));
        assert!(operation.has_error());
    }
}
