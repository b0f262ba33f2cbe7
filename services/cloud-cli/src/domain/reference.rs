use crate::error::Error;
use crate::error::Result;
use common::model::Operation;
use common::model::Scope;
use core::fmt;

/// Identifies a pending Compute operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationReference {
    project: String,
    scope: Scope,
    name: String,
}

impl OperationReference {
    pub fn new(project: impl Into<String>, scope: Scope, name: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            scope,
            name: name.into(),
        }
    }

    /// Reference of a submitted operation, scoped by its self link.
    ///
    /// Falls back to the `zone`/`region` fields, then to the global scope, when
    /// the self link is missing or does not name a scope.
    pub fn from_operation(operation: &Operation, project: impl Into<String>) -> Result<Self> {
        if operation.name().is_empty() {
            return Err(Error::Interface(
                "Operation returned by the server has no name".to_string(),
            ));
        }

        let scope = operation
            .self_link()
            .and_then(Scope::from_self_link)
            .or_else(|| {
                operation
                    .zone()
                    .map(|zone| Scope::Zone(Self::last_segment(zone)))
            })
            .or_else(|| {
                operation
                    .region()
                    .map(|region| Scope::Region(Self::last_segment(region)))
            })
            .unwrap_or(Scope::Global);

        Ok(Self::new(project, scope, operation.name()))
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub const fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn last_segment(value: &str) -> String {
        value.rsplit('/').next().unwrap_or(value).to_string()
    }
}

impl fmt::Display for OperationReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "projects/{}/{}/operations/{}",
            self.project, self.scope, self.name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_from_zonal_operation() {
        let operation = Operation::new_operation(
            "operation-1",
            Operation::INSERT_OPERATION_TYPE,
            &Scope::Zone("z".to_string()),
            "http://host/compute/v1/projects/p/zones/z/operations/operation-1",
            "http://host/compute/v1/projects/p/zones/z/instances/vm",
        );

        let reference = OperationReference::from_operation(&operation, "p").unwrap();

        assert_eq!(reference.scope(), &Scope::Zone("z".to_string()));
        assert_eq!(
            reference.to_string(),
            "projects/p/zones/z/operations/operation-1"
        );
    }

    #[test]
    fn reference_falls_back_on_region_field() {
        let payload = serde_json::json!({
            "kind": "compute#operation",
            "name": "operation-2",
            "operationType": "delete",
            "status": "PENDING",
            "region": "https://host/compute/v1/projects/p/regions/r"
        });
        let operation: Operation = serde_json::from_value(payload).unwrap();

        let reference = OperationReference::from_operation(&operation, "p").unwrap();

        assert_eq!(reference.scope(), &Scope::Region("r".to_string()));
    }
}
