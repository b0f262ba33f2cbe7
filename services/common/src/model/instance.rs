/// A Compute virtual machine (`compute#instance`).
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    kind: String,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    machine_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    self_link: Option<String>,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

impl Instance {
    pub const KIND: &'static str = "compute#instance";

    pub fn new_instance(
        name: impl Into<String>,
        zone: impl Into<String>,
        machine_type: impl Into<String>,
        self_link: impl Into<String>,
    ) -> Self {
        Self {
            kind: Self::KIND.to_string(),
            name: name.into(),
            zone: Some(zone.into()),
            machine_type: Some(machine_type.into()),
            status: Some("PROVISIONING".to_string()),
            self_link: Some(self_link.into()),
            extra: serde_json::Map::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn zone(&self) -> Option<&str> {
        self.zone.as_deref()
    }

    pub fn machine_type(&self) -> Option<&str> {
        self.machine_type.as_deref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }
}
