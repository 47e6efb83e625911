use std::fmt::Write as _;

use indexmap::IndexMap;

use crate::oracle::ProgramConfiguration;

/// What a program model knows about one of its execution contexts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContextSummary {
    /// Id of the command about to run; `None` once the context terminated.
    pub executing_command: Option<String>,
    pub elapsed_time: i64,
    pub power: i64,
    pub terminating: bool,
}

/// Read-only view of a program model, used for visualisation only.
pub trait ModelInspector {
    fn execution_context(&self, context_id: usize) -> Option<ExecutionContextSummary>;

    /// The literal observations behind an observation-set id.
    fn observations(&self, observations_id: i64) -> Option<Vec<String>>;
}

impl<M: ModelInspector + ?Sized> ModelInspector for &M {
    fn execution_context(&self, context_id: usize) -> Option<ExecutionContextSummary> {
        (**self).execution_context(context_id)
    }

    fn observations(&self, observations_id: i64) -> Option<Vec<String>> {
        (**self).observations(observations_id)
    }
}

/// Node label plus extra graph attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decoration {
    pub label: String,
    pub attributes: IndexMap<String, String>,
}

impl Decoration {
    /// Graphviz attribute list, e.g. `[label="...", peripheries=2]`.
    pub fn to_dot_attributes(&self) -> String {
        let mut out = format!("[label=\"{}\"", escape_dot(&self.label));
        for (key, value) in &self.attributes {
            let _ = write!(out, ", {key}={value}");
        }
        out.push(']');
        out
    }
}

fn escape_dot(label: &str) -> String {
    label
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Renders program-model states for a graph view.
pub struct StateDecorator<'a, M: ?Sized> {
    inspector: &'a M,
    secret_names: &'a [String],
    show_observations: bool,
}

impl<'a, M: ModelInspector + ?Sized> StateDecorator<'a, M> {
    pub fn new(inspector: &'a M, secret_names: &'a [String], show_observations: bool) -> Self {
        Self {
            inspector,
            secret_names,
            show_observations,
        }
    }

    pub fn decorate(&self, state_index: usize, configuration: &ProgramConfiguration) -> Decoration {
        let mut decoration = Decoration::default();
        let context = self.inspector.execution_context(configuration.context_id);
        let label = &mut decoration.label;

        let _ = writeln!(label, "P: {state_index} / C: {}", configuration.context_id);

        match &context {
            Some(c) if c.terminating => {
                decoration
                    .attributes
                    .insert("peripheries".to_string(), "2".to_string());
            }
            Some(c) => {
                let command = c.executing_command.as_deref().unwrap_or("?");
                let _ = writeln!(label, "→ {command}");
            }
            None => {}
        }

        for (name, value) in self.secret_names.iter().zip(&configuration.secrets) {
            match value {
                Some(v) => {
                    let _ = writeln!(label, "{name} = {v}");
                }
                None => {
                    let _ = writeln!(label, "{name} = undef");
                }
            }
        }

        let observations = self
            .show_observations
            .then(|| self.inspector.observations(configuration.observations))
            .flatten();
        match observations {
            Some(list) => {
                let _ = writeln!(label, "obs: [{}]", list.join(", "));
            }
            None => {
                let _ = writeln!(label, "obs: {}", configuration.observations);
            }
        }

        let (time, power) = match &context {
            Some(c) => (c.elapsed_time.to_string(), c.power.to_string()),
            None => (
                render_optional(configuration.elapsed_time),
                render_optional(configuration.power),
            ),
        };
        let _ = write!(label, "◷ {time}  ⚡ {power}");
        decoration
    }
}

fn render_optional(value: Option<i64>) -> String {
    value.map_or_else(|| "?".to_string(), |v| v.to_string())
}
