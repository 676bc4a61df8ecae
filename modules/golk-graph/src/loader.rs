//! Bulk CSV import: `LOAD CSV` statements generated from the schema table.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use golk_common::schema::{self, NodeImport, Property, PropertyType, RelationshipImport, SourceFile};
use neo4rs::query;
use thiserror::Error;
use tracing::info;

use crate::GraphClient;

pub const DEFAULT_BATCH_SIZE: usize = 10_000;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("invalid load plan: {0}")]
    Plan(String),

    #[error("step {step} ({description}) failed: {source}")]
    Step {
        step: usize,
        description: String,
        #[source]
        source: neo4rs::Error,
    },
}

/// Where the CSVs live and how to import them.
#[derive(Debug, Clone)]
pub struct LoadPlan {
    /// Prefix the server resolves file names against, e.g. `file:///`.
    pub file_root: String,
    pub files: HashMap<SourceFile, String>,
    pub batch_size: usize,
    /// Key values excluded from node imports.
    pub ids_to_skip: Vec<String>,
}

impl Default for LoadPlan {
    fn default() -> Self {
        Self {
            file_root: "file:///".to_string(),
            files: SourceFile::ALL
                .iter()
                .map(|f| (*f, f.default_name().to_string()))
                .collect(),
            batch_size: DEFAULT_BATCH_SIZE,
            ids_to_skip: Vec::new(),
        }
    }
}

impl LoadPlan {
    pub fn file(&self, source: SourceFile) -> &str {
        self.files
            .get(&source)
            .map(String::as_str)
            .unwrap_or_else(|| source.default_name())
    }

    pub fn with_file(mut self, source: SourceFile, name: impl Into<String>) -> Self {
        self.files.insert(source, name.into());
        self
    }

    fn validate(&self) -> Result<(), LoadError> {
        if self.batch_size == 0 {
            return Err(LoadError::Plan("batch size must be positive".into()));
        }
        if self.file_root.is_empty() {
            return Err(LoadError::Plan("file root must not be empty".into()));
        }
        Ok(())
    }
}

/// One executable statement in a load run.
#[derive(Debug, Clone)]
pub struct LoadStep {
    pub description: String,
    pub cypher: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub steps_executed: usize,
    pub elapsed: Duration,
}

fn quote(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

fn column(name: &str) -> String {
    format!("row.{}", quote(name))
}

fn value_expr(prop: &Property, col: &str) -> String {
    match prop.ty {
        PropertyType::String => column(col),
        PropertyType::Integer => format!("toInteger(trim({}))", column(col)),
        PropertyType::Float => format!("toFloat(trim({}))", column(col)),
    }
}

fn set_clauses(var: &str, props: &[Property]) -> Vec<String> {
    props
        .iter()
        .filter_map(|p| {
            p.column
                .map(|col| format!("  SET {var}.{} = {}", quote(p.name), value_expr(p, col)))
        })
        .collect()
}

fn load_header(file: SourceFile) -> String {
    format!(
        "LOAD CSV WITH HEADERS FROM ($file_path_root + ${}) AS row\nWITH row",
        file.param()
    )
}

fn in_transactions(body: &[String], batch_size: usize) -> String {
    format!(
        "CALL {{\n  WITH row\n{}\n}} IN TRANSACTIONS OF {batch_size} ROWS",
        body.join("\n")
    )
}

pub fn node_statement(import: &NodeImport, batch_size: usize) -> String {
    let key_col = column(import.key_column());
    let mut body = vec![format!(
        "  MERGE (n:{} {{{}: {key_col}}})",
        quote(import.label),
        quote(import.key.name)
    )];
    body.extend(set_clauses("n", import.properties));

    format!(
        "{}\nWHERE NOT {key_col} IN $idsToSkip AND {key_col} IS NOT NULL\n{}",
        load_header(import.file),
        in_transactions(&body, batch_size)
    )
}

pub fn relationship_statement(import: &RelationshipImport, batch_size: usize) -> String {
    let source_col = column(import.source.column);
    let target_col = column(import.target.column);
    let mut body = vec![
        format!(
            "  MATCH (source:{} {{{}: {source_col}}})",
            quote(import.source.label),
            quote(import.source.key)
        ),
        format!(
            "  MATCH (target:{} {{{}: {target_col}}})",
            quote(import.target.label),
            quote(import.target.key)
        ),
        format!("  MERGE (source)-[r:{}]->(target)", quote(import.rel_type)),
    ];
    body.extend(set_clauses("r", import.properties));

    format!(
        "{}\nWHERE {source_col} IS NOT NULL AND {target_col} IS NOT NULL\n{}",
        load_header(import.file),
        in_transactions(&body, batch_size)
    )
}

/// Every import statement, nodes before relationships. Constraints belong to [`crate::migrate`].
pub fn load_steps(plan: &LoadPlan) -> Vec<LoadStep> {
    let nodes = schema::NODES.iter().map(|n| LoadStep {
        description: format!("{} nodes from {}", n.label, plan.file(n.file)),
        cypher: node_statement(n, plan.batch_size),
    });
    let rels = schema::RELATIONSHIPS.iter().map(|r| LoadStep {
        description: format!("{} relationships from {}", r.rel_type, plan.file(r.file)),
        cypher: relationship_statement(r, plan.batch_size),
    });
    nodes.chain(rels).collect()
}

pub struct BulkLoader {
    client: GraphClient,
}

impl BulkLoader {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    /// Execute every step; stops at the first failure.
    pub async fn run(&self, plan: &LoadPlan) -> Result<LoadReport, LoadError> {
        plan.validate()?;
        let started = Instant::now();
        let steps = load_steps(plan);

        info!(steps = steps.len(), root = %plan.file_root, "Starting bulk load");

        for (i, step) in steps.iter().enumerate() {
            let mut q = query(&step.cypher)
                .param("file_path_root", plan.file_root.clone())
                .param("idsToSkip", plan.ids_to_skip.clone());
            for file in SourceFile::ALL {
                q = q.param(&file.param(), plan.file(file).to_string());
            }

            self.client
                .graph
                .run(q)
                .await
                .map_err(|source| LoadError::Step {
                    step: i + 1,
                    description: step.description.clone(),
                    source,
                })?;
            info!(step = i + 1, "{}", step.description);
        }

        let report = LoadReport {
            steps_executed: steps.len(),
            elapsed: started.elapsed(),
        };
        info!(
            steps = report.steps_executed,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Bulk load complete"
        );
        Ok(report)
    }
}
