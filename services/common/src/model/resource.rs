use crate::model::instance::Instance;
use crate::model::job::Job;
use crate::model::job::JobList;
use crate::model::operation::Operation;
use crate::model::operation::OperationList;

/// Any payload returned by the REST services, decoded from its `kind` field.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Operation(Operation),
    OperationList(OperationList),
    Instance(Instance),
    Job(Job),
    JobList(JobList),
    Other(serde_json::Value),
}

impl Resource {
    const KIND_FIELD: &'static str = "kind";
    const NAME_FIELD: &'static str = "name";

    pub fn kind(&self) -> &str {
        match self {
            Self::Operation(_) => Operation::KIND,
            Self::OperationList(_) => OperationList::KIND,
            Self::Instance(_) => Instance::KIND,
            Self::Job(_) => Job::KIND,
            Self::JobList(_) => JobList::KIND,
            Self::Other(value) => value
                .get(Self::KIND_FIELD)
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default(),
        }
    }

    /// Name used by the `names` output format.
    pub fn name(&self) -> Option<String> {
        match self {
            Self::Operation(operation) => Some(operation.name().to_string()),
            Self::Instance(instance) => Some(instance.name().to_string()),
            Self::Job(job) => Some(job.job_reference().job_id().to_string()),
            Self::OperationList(_) | Self::JobList(_) => None,
            Self::Other(value) => value
                .get(Self::NAME_FIELD)
                .and_then(serde_json::Value::as_str)
                .map(ToString::to_string),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::OperationList(_) | Self::JobList(_)) || self.kind().ends_with("List")
    }

    pub fn to_value(&self) -> serde_json::Value {
        let value = match self {
            Self::Operation(operation) => serde_json::to_value(operation),
            Self::OperationList(list) => serde_json::to_value(list),
            Self::Instance(instance) => serde_json::to_value(instance),
            Self::Job(job) => serde_json::to_value(job),
            Self::JobList(list) => serde_json::to_value(list),
            Self::Other(value) => return value.clone(),
        };

        value.unwrap_or_default()
    }
}

impl TryFrom<serde_json::Value> for Resource {
    type Error = serde_json::Error;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        let kind = value
            .get(Self::KIND_FIELD)
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default();

        Ok(match kind {
            Operation::KIND => Self::Operation(serde_json::from_value(value)?),
            OperationList::KIND => Self::OperationList(serde_json::from_value(value)?),
            Instance::KIND => Self::Instance(serde_json::from_value(value)?),
            Job::KIND => Self::Job(serde_json::from_value(value)?),
            JobList::KIND => Self::JobList(serde_json::from_value(value)?),
            _ => Self::Other(value),
        })
    }
}

impl From<Operation> for Resource {
    fn from(operation: Operation) -> Self {
        Self::Operation(operation)
    }
}

impl From<OperationList> for Resource {
    fn from(list: OperationList) -> Self {
        Self::OperationList(list)
    }
}

impl From<Instance> for Resource {
    fn from(instance: Instance) -> Self {
        Self::Instance(instance)
    }
}

impl From<Job> for Resource {
    fn from(job: Job) -> Self {
        Self::Job(job)
    }
}

impl From<JobList> for Resource {
    fn from(list: JobList) -> Self {
        Self::JobList(list)
    }
}

impl serde::Serialize for Resource {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Operation(operation) => operation.serialize(serializer),
            Self::OperationList(list) => list.serialize(serializer),
            Self::Instance(instance) => instance.serialize(serializer),
            Self::Job(job) => job.serialize(serializer),
            Self::JobList(list) => list.serialize(serializer),
            Self::Other(value) => value.serialize(serializer),
        }
    }
}
