use crate::error::Error;
use crate::error::Result;
use crate::output::OutputFormat;
use comfy_table::ContentArrangement;
use comfy_table::Table;
use comfy_table::presets::UTF8_FULL;
use common::model::Instance;
use common::model::Job;
use common::model::Operation;
use common::model::Resource;
use std::io::Write;

const OPERATION_COLUMNS: &[&str] = &[
    "name",
    "operation-type",
    "status",
    "target",
    "scope",
    "error",
];
const INSTANCE_COLUMNS: &[&str] = &["name", "zone", "machine-type", "status"];
const JOB_COLUMNS: &[&str] = &["job-id", "type", "state", "error"];
const OTHER_COLUMNS: &[&str] = &["name", "kind"];

/// Writes command results in the selected [`OutputFormat`].
#[derive(Debug, Clone, Copy)]
pub struct OutputRenderer {
    format: OutputFormat,
}

impl OutputRenderer {
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn render<W: Write>(&self, resources: &[Resource], writer: &mut W) -> Result<()> {
        match self.format {
            OutputFormat::Json => Self::render_json(resources, writer),
            OutputFormat::Yaml => Self::render_yaml(resources, writer),
            OutputFormat::Csv => Self::render_csv(resources, writer),
            OutputFormat::Names => Self::render_names(resources, writer),
            OutputFormat::Table => Self::render_table(resources, writer),
        }
    }

    /// A single resource is printed as an object, several as an array.
    fn passthrough(resources: &[Resource]) -> serde_json::Value {
        match resources {
            [resource] => resource.to_value(),
            _ => serde_json::Value::Array(resources.iter().map(Resource::to_value).collect()),
        }
    }

    fn render_json<W: Write>(resources: &[Resource], writer: &mut W) -> Result<()> {
        serde_json::to_writer_pretty(&mut *writer, &Self::passthrough(resources))
            .map_err(|err| Error::Output(err.to_string()))?;
        writeln!(writer).map_err(output_error)
    }

    fn render_yaml<W: Write>(resources: &[Resource], writer: &mut W) -> Result<()> {
        serde_yaml::to_writer(writer, &Self::passthrough(resources))
            .map_err(|err| Error::Output(err.to_string()))
    }

    fn render_names<W: Write>(resources: &[Resource], writer: &mut W) -> Result<()> {
        for resource in flatten(resources) {
            if let Some(name) = resource.name() {
                writeln!(writer, "{name}").map_err(output_error)?;
            }
        }

        Ok(())
    }

    fn render_csv<W: Write>(resources: &[Resource], writer: &mut W) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(writer);

        for (columns, rows) in group_rows(resources) {
            csv_writer
                .write_record(columns)
                .map_err(|err| Error::Output(err.to_string()))?;
            for row in rows {
                csv_writer
                    .write_record(&row)
                    .map_err(|err| Error::Output(err.to_string()))?;
            }
        }

        csv_writer.flush().map_err(output_error)
    }

    fn render_table<W: Write>(resources: &[Resource], writer: &mut W) -> Result<()> {
        for (columns, rows) in group_rows(resources) {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(columns.to_vec());
            for row in rows {
                table.add_row(row);
            }

            writeln!(writer, "{table}").map_err(output_error)?;
        }

        Ok(())
    }
}

fn output_error(err: std::io::Error) -> Error {
    Error::Output(err.to_string())
}

/// Expands list resources into their items.
fn flatten(resources: &[Resource]) -> Vec<Resource> {
    resources
        .iter()
        .flat_map(|resource| match resource {
            Resource::OperationList(list) => list
                .items()
                .iter()
                .cloned()
                .map(Resource::from)
                .collect::<Vec<_>>(),
            Resource::JobList(list) => list.jobs().iter().cloned().map(Resource::from).collect(),
            Resource::Other(value) if resource.is_list() => value
                .get("items")
                .and_then(serde_json::Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .cloned()
                        .map(|item| {
                            Resource::try_from(item.clone()).unwrap_or(Resource::Other(item))
                        })
                        .collect()
                })
                .unwrap_or_default(),
            _ => vec![resource.clone()],
        })
        .collect()
}

/// Summary rows grouped by column set, in order of first appearance.
fn group_rows(resources: &[Resource]) -> Vec<(&'static [&'static str], Vec<Vec<String>>)> {
    let mut groups: Vec<(&'static [&'static str], Vec<Vec<String>>)> = Vec::new();

    for resource in flatten(resources) {
        let (columns, row) = summary(&resource);
        match groups.iter_mut().find(|(existing, _)| *existing == columns) {
            Some((_, rows)) => rows.push(row),
            None => groups.push((columns, vec![row])),
        }
    }

    groups
}

fn summary(resource: &Resource) -> (&'static [&'static str], Vec<String>) {
    match resource {
        Resource::Operation(operation) => (OPERATION_COLUMNS, operation_row(operation)),
        Resource::Instance(instance) => (INSTANCE_COLUMNS, instance_row(instance)),
        Resource::Job(job) => (JOB_COLUMNS, job_row(job)),
        Resource::OperationList(_) | Resource::JobList(_) | Resource::Other(_) => (
            OTHER_COLUMNS,
            vec![
                resource.name().unwrap_or_default(),
                resource.kind().to_string(),
            ],
        ),
    }
}

fn last_segment(link: Option<&str>) -> String {
    link.and_then(|link| link.rsplit('/').next())
        .unwrap_or_default()
        .to_string()
}

fn operation_row(operation: &Operation) -> Vec<String> {
    let scope = match (operation.zone(), operation.region()) {
        (Some(zone), _) => last_segment(Some(zone)),
        (None, Some(region)) => last_segment(Some(region)),
        (None, None) => "global".to_string(),
    };
    let error = operation
        .error()
        .and_then(|error| error.errors().first())
        .map(|detail| detail.code().to_string())
        .unwrap_or_default();

    vec![
        operation.name().to_string(),
        operation.operation_type().to_string(),
        operation.status().to_string(),
        operation.target_name().unwrap_or_default().to_string(),
        scope,
        error,
    ]
}

fn instance_row(instance: &Instance) -> Vec<String> {
    vec![
        instance.name().to_string(),
        last_segment(instance.zone()),
        last_segment(instance.machine_type()),
        instance.status().unwrap_or_default().to_string(),
    ]
}

fn job_row(job: &Job) -> Vec<String> {
    let error = job
        .status()
        .error_result()
        .and_then(|error| error.reason())
        .unwrap_or_default()
        .to_string();

    vec![
        job.job_reference().job_id().to_string(),
        job.job_type().unwrap_or_default().to_string(),
        job.state().to_string(),
        error,
    ]
}
