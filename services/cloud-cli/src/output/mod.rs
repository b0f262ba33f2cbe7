pub mod renderer;

pub use renderer::OutputRenderer;

/// Format selected with `--format`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Summary table of the most relevant fields.
    #[default]
    Table,
    /// Resources exactly as returned by the server.
    Json,
    Yaml,
    Csv,
    /// One resource name per line.
    Names,
}
