//! Assembly of a network from a sequence of declarations.
//!
//! The builder favours recovery over abort: a malformed field is replaced by [`SENTINEL`]
//! and reported, a declaration reusing a name is discarded and reported, and the following
//! declarations are processed as usual. Any warning prevents the assembled network from being
//! simulated (see [`crate::simulation::Simulation::run`]).
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostics, WarningKind};
use crate::error::NetError;
use crate::network::Network;
use crate::neuron::Neuron;
use crate::output::Reporter;
use crate::parser::is_name;
use crate::scheduler::{Action, Scheduler};
use crate::simulation::Simulation;
use crate::synapse::{Synapse, SynapseKind};
use crate::{ANONYMOUS, SENTINEL};

/// The name field of a synapse declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynapseName {
    /// The synapse is declared without name (`-`).
    Anonymous,
    Named(String),
    /// The name token is not a valid name.
    Invalid,
}

/// A declaration, with `None` standing for a missing or malformed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Declaration {
    Neuron {
        name: Option<String>,
        threshold: Option<f64>,
        potential: Option<f64>,
    },
    Synapse {
        name: SynapseName,
        source: Option<String>,
        destination: Option<String>,
        delay: Option<f64>,
        strength: Option<f64>,
    },
    /// Periodic activity output every `interval` until `end`.
    Output {
        interval: Option<f64>,
        end: Option<f64>,
    },
    /// A declaration with an unknown keyword; the rest of it is ignored.
    Unknown { keyword: String },
}

fn or_unknown<T: fmt::Debug>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map_or_else(|| "???".to_string(), |v| format!("{:?}", v))
}

fn name_or_unknown(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("???")
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Declaration::Neuron {
                name,
                threshold,
                potential,
            } => write!(
                f,
                "neuron {} {} {}",
                name_or_unknown(name),
                or_unknown(threshold),
                or_unknown(potential)
            ),
            Declaration::Synapse {
                name,
                source,
                destination,
                delay,
                strength,
            } => {
                let name = match name {
                    SynapseName::Anonymous => ANONYMOUS,
                    SynapseName::Named(name) => name,
                    SynapseName::Invalid => "???",
                };
                write!(
                    f,
                    "synapse {} {} {} {} {}",
                    name,
                    name_or_unknown(source),
                    name_or_unknown(destination),
                    or_unknown(delay),
                    or_unknown(strength)
                )
            }
            Declaration::Output { interval, end } => {
                write!(f, "output {} {}", or_unknown(interval), or_unknown(end))
            }
            Declaration::Unknown { keyword } => write!(f, "{}", keyword),
        }
    }
}

/// A declaration with its position in the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    /// The line of the declaration (1-based), or 0 when it does not come from a text.
    #[serde(default)]
    pub line: usize,
    #[serde(flatten)]
    pub declaration: Declaration,
    /// Tokens found after the last expected field.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trailing: Vec<String>,
}

impl Statement {
    pub fn new(line: usize, declaration: Declaration) -> Self {
        Statement {
            line,
            declaration,
            trailing: vec![],
        }
    }

    /// The human-readable context used in warnings.
    pub fn context(&self) -> String {
        match self.line {
            0 => self.declaration.to_string(),
            line => format!("line {}: {}", line, self.declaration),
        }
    }
}

/// Load a list of statements from a JSON file.
pub fn load_statements<P: AsRef<Path>>(path: P) -> Result<Vec<Statement>, NetError> {
    let display = path.as_ref().display().to_string();
    let file = File::open(&path).map_err(|e| NetError::from_io(e, &display))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|e| NetError::InvalidFormat(format!("{}: {}", display, e)))
}

/// Incrementally assembles a network and schedules its self-initiated activity.
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    network: Network,
    scheduler: Scheduler,
    diagnostics: Diagnostics,
    reporter: Option<Reporter>,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        NetworkBuilder::default()
    }

    /// Returns the network assembled so far.
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Returns the warnings recorded so far.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Apply every statement in order.
    pub fn extend<I: IntoIterator<Item = Statement>>(mut self, statements: I) -> Self {
        for statement in statements {
            self.apply(&statement);
        }
        self
    }

    /// Apply a single statement.
    pub fn apply(&mut self, statement: &Statement) {
        let context = statement.context();
        match &statement.declaration {
            Declaration::Neuron {
                name,
                threshold,
                potential,
            } => self.declare_neuron(&context, name, *threshold, *potential),
            Declaration::Synapse {
                name,
                source,
                destination,
                delay,
                strength,
            } => self.declare_synapse(&context, name, source, destination, *delay, *strength),
            Declaration::Output { interval, end } => self.declare_output(&context, *interval, *end),
            Declaration::Unknown { .. } => {
                self.diagnostics.warn(WarningKind::UnknownKeyword, context.as_str());
                return;
            }
        }
        if !statement.trailing.is_empty() {
            self.diagnostics
                .warn(WarningKind::ExpectedNewline, context.as_str());
        }
    }

    /// Returns the value of a numeric field, or the sentinel if it is missing.
    fn number(&mut self, context: &str, value: Option<f64>) -> f64 {
        value.unwrap_or_else(|| {
            self.diagnostics.warn(WarningKind::ExpectedNumber, context);
            SENTINEL
        })
    }

    fn declare_neuron(
        &mut self,
        context: &str,
        name: &Option<String>,
        threshold: Option<f64>,
        potential: Option<f64>,
    ) {
        let Some(name) = name.as_ref().filter(|name| is_name(name)) else {
            self.diagnostics.warn(WarningKind::ExpectedName, context);
            return;
        };
        if self.network.contains_name(name) {
            self.diagnostics.warn(WarningKind::DuplicateName, context);
            return;
        }
        let threshold = self.number(context, threshold);
        let potential = self.number(context, potential);

        match self.network.add_neuron(Neuron::new(name.as_str(), threshold, potential)) {
            Ok(id) => {
                if self.network.neuron(id).is_above_threshold() {
                    self.scheduler.submit(0.0, Action::Fire { neuron: id });
                }
            }
            Err(_) => self.diagnostics.warn(WarningKind::DuplicateName, context),
        }
    }

    fn declare_synapse(
        &mut self,
        context: &str,
        name: &SynapseName,
        source: &Option<String>,
        destination: &Option<String>,
        delay: Option<f64>,
        strength: Option<f64>,
    ) {
        let name = match name {
            SynapseName::Anonymous => None,
            SynapseName::Named(name) if !is_name(name) => {
                self.diagnostics.warn(WarningKind::ExpectedName, context);
                return;
            }
            SynapseName::Named(name) if self.network.contains_name(name) => {
                self.diagnostics.warn(WarningKind::DuplicateName, context);
                return;
            }
            SynapseName::Named(name) => Some(name.clone()),
            SynapseName::Invalid => {
                self.diagnostics.warn(WarningKind::ExpectedName, context);
                return;
            }
        };

        let source = match source {
            Some(source) => {
                let found = self.network.find_neuron(source);
                if found.is_none() {
                    self.diagnostics.warn(WarningKind::NoSuchSource, context);
                }
                found
            }
            None => {
                self.diagnostics.warn(WarningKind::ExpectedName, context);
                None
            }
        };

        let kind = match destination {
            Some(destination) => self.resolve_destination(context, destination),
            None => {
                self.diagnostics.warn(WarningKind::ExpectedName, context);
                SynapseKind::Secondary { target: None }
            }
        };

        let delay = self.number(context, delay);
        let strength = self.number(context, strength);
        let synapse = match Synapse::build(name.clone(), source, kind, delay, strength) {
            Ok(synapse) => synapse,
            Err(_) => {
                let reason = if delay < 0.0 {
                    WarningKind::NegativeDelay
                } else {
                    WarningKind::InvalidDelay
                };
                self.diagnostics.warn(reason, context);
                Synapse::new(name, source, kind, SENTINEL, strength)
            }
        };

        if self.network.add_synapse(synapse).is_err() {
            self.diagnostics.warn(WarningKind::DuplicateName, context);
        }
    }

    /// Resolve a destination name, neurons first, then synapses.
    /// Only a primary synapse may be the destination of a synapse.
    fn resolve_destination(&mut self, context: &str, destination: &str) -> SynapseKind {
        if let Some(neuron_id) = self.network.find_neuron(destination) {
            return SynapseKind::Primary {
                target: Some(neuron_id),
            };
        }
        match self.network.find_synapse(destination) {
            Some(synapse_id) if self.network.synapse(synapse_id).is_primary() => {
                SynapseKind::Secondary {
                    target: Some(synapse_id),
                }
            }
            Some(_) => {
                self.diagnostics.warn(WarningKind::SecondaryTarget, context);
                SynapseKind::Secondary { target: None }
            }
            None => {
                self.diagnostics
                    .warn(WarningKind::NoSuchDestination, context);
                SynapseKind::Secondary { target: None }
            }
        }
    }

    fn declare_output(&mut self, context: &str, interval: Option<f64>, end: Option<f64>) {
        if self.reporter.is_some() {
            self.diagnostics.warn(WarningKind::DuplicateOutput, context);
            return;
        }
        let mut interval = self.number(context, interval);
        let end = self.number(context, end);
        if !(interval.is_finite() && interval > 0.0) {
            self.diagnostics.warn(WarningKind::InvalidInterval, context);
            interval = SENTINEL;
        }

        self.reporter = Some(Reporter::new(interval, end));
        self.scheduler.submit(0.0, Action::Report);
    }

    /// Finish the assembly into a simulation writing its activity output to `out`.
    pub fn finish<W: Write>(self, out: W) -> Simulation<W> {
        Simulation::new(
            self.network,
            self.scheduler,
            self.diagnostics,
            self.reporter,
            out,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synapse::SynapseId;

    fn neuron(name: &str, threshold: f64, potential: f64) -> Statement {
        Statement::new(
            0,
            Declaration::Neuron {
                name: Some(name.to_string()),
                threshold: Some(threshold),
                potential: Some(potential),
            },
        )
    }

    fn synapse(name: Option<&str>, source: &str, destination: &str, delay: f64, strength: f64) -> Statement {
        Statement::new(
            0,
            Declaration::Synapse {
                name: match name {
                    Some(name) => SynapseName::Named(name.to_string()),
                    None => SynapseName::Anonymous,
                },
                source: Some(source.to_string()),
                destination: Some(destination.to_string()),
                delay: Some(delay),
                strength: Some(strength),
            },
        )
    }

    #[test]
    fn test_neuron_above_threshold_fires_at_zero() {
        let builder = NetworkBuilder::new().extend(vec![neuron("X", 1.0, 2.0), neuron("Y", 1.0, 1.0)]);
        let mut scheduler = builder.scheduler;
        let events = scheduler.drain_ordered();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].time, 0.0);
        assert!(matches!(events[0].action, Action::Fire { .. }));
    }

    #[test]
    fn test_duplicate_neuron_is_discarded() {
        let builder = NetworkBuilder::new().extend(vec![neuron("X", 1.0, 0.5), neuron("X", 7.0, 8.0)]);

        assert_eq!(builder.diagnostics().count(), 1);
        assert_eq!(builder.diagnostics().count_of(WarningKind::DuplicateName), 1);
        assert_eq!(builder.network().num_neurons(), 1);
        let x = builder.network().find_neuron("X").unwrap();
        assert_eq!(builder.network().neuron(x).threshold(), 1.0);
        assert_eq!(builder.network().neuron(x).potential(), 0.5);
        assert!(builder.scheduler.is_empty());
    }

    #[test]
    fn test_duplicate_synapse_name_is_discarded() {
        let builder = NetworkBuilder::new().extend(vec![
            neuron("X", 1.0, 0.0),
            neuron("Y", 1.0, 0.0),
            synapse(Some("p"), "X", "Y", 1.0, 0.2),
            synapse(Some("p"), "Y", "X", 3.0, 0.9),
            synapse(Some("X"), "Y", "X", 3.0, 0.9),
        ]);

        assert_eq!(builder.diagnostics().count_of(WarningKind::DuplicateName), 2);
        assert_eq!(builder.network().num_synapses(), 1);
        let p = builder.network().find_synapse("p").unwrap();
        assert_eq!(builder.network().synapse(p).delay(), 1.0);
        assert_eq!(builder.network().synapse(p).strength(), 0.2);
    }

    #[test]
    fn test_negative_delay_is_replaced() {
        let builder = NetworkBuilder::new().extend(vec![
            neuron("X", 1.0, 0.0),
            neuron("Y", 1.0, 0.0),
            synapse(None, "X", "Y", -1.0, 0.2),
        ]);

        assert_eq!(builder.diagnostics().count(), 1);
        assert_eq!(builder.diagnostics().count_of(WarningKind::NegativeDelay), 1);
        let synapse = builder.network().synapse(SynapseId::new(0));
        assert_eq!(synapse.delay(), SENTINEL);
        assert_eq!(synapse.strength(), 0.2);
        let x = builder.network().find_neuron("X").unwrap();
        assert_eq!(builder.network().neuron(x).outputs(), &[SynapseId::new(0)]);
    }

    #[test]
    fn test_non_finite_delay_is_replaced() {
        let mut statements = vec![neuron("X", 1.0, 0.0), neuron("Y", 1.0, 0.0)];
        for delay in [f64::NAN, -f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            statements.push(synapse(None, "X", "Y", delay, 0.2));
        }
        let builder = NetworkBuilder::new().extend(statements);

        assert_eq!(builder.diagnostics().count(), 4);
        assert_eq!(builder.diagnostics().count_of(WarningKind::InvalidDelay), 3);
        assert_eq!(builder.diagnostics().count_of(WarningKind::NegativeDelay), 1);
        assert_eq!(builder.network().num_synapses(), 4);
        assert!(builder
            .network()
            .synapses_iter()
            .all(|synapse| synapse.delay() == SENTINEL));
    }

    #[test]
    fn test_malformed_names_are_rejected() {
        let builder = NetworkBuilder::new().extend(vec![
            neuron("", 1.0, 0.0),
            neuron("a b", 1.0, 0.0),
            neuron("X", 1.0, 0.0),
            synapse(Some("-"), "X", "X", 1.0, 0.2),
            synapse(Some("p q"), "X", "X", 1.0, 0.2),
        ]);

        assert_eq!(builder.diagnostics().count_of(WarningKind::ExpectedName), 4);
        assert_eq!(builder.network().num_neurons(), 1);
        assert_eq!(builder.network().num_synapses(), 0);
        assert!(!builder.network().contains_name("a b"));
    }

    #[test]
    fn test_destination_resolution() {
        let builder = NetworkBuilder::new().extend(vec![
            neuron("X", 1.0, 0.0),
            neuron("Y", 1.0, 0.0),
            synapse(Some("p"), "X", "Y", 1.0, 0.2),
            synapse(Some("q"), "X", "p", 0.0, 0.1),
            synapse(None, "Y", "q", 0.0, 0.1),
            synapse(None, "Y", "nowhere", 0.0, 0.1),
        ]);
        let network = builder.network();

        let p = network.find_synapse("p").unwrap();
        let q = network.find_synapse("q").unwrap();
        assert!(network.synapse(p).is_primary());
        assert_eq!(
            network.synapse(q).kind(),
            SynapseKind::Secondary { target: Some(p) }
        );
        assert_eq!(
            network.synapse(SynapseId::new(2)).kind(),
            SynapseKind::Secondary { target: None }
        );
        assert_eq!(
            network.synapse(SynapseId::new(3)).kind(),
            SynapseKind::Secondary { target: None }
        );
        assert_eq!(builder.diagnostics().count_of(WarningKind::SecondaryTarget), 1);
        assert_eq!(builder.diagnostics().count_of(WarningKind::NoSuchDestination), 1);
        assert_eq!(builder.diagnostics().count(), 2);
    }

    #[test]
    fn test_unknown_source_is_not_attached() {
        let builder = NetworkBuilder::new().extend(vec![
            neuron("Y", 1.0, 0.0),
            synapse(None, "X", "Y", 1.0, 0.2),
        ]);

        assert_eq!(builder.diagnostics().count_of(WarningKind::NoSuchSource), 1);
        assert_eq!(builder.network().num_synapses(), 1);
        assert_eq!(builder.network().synapse(SynapseId::new(0)).source(), None);
        let y = builder.network().find_neuron("Y").unwrap();
        assert!(builder.network().neuron(y).outputs().is_empty());
    }

    #[test]
    fn test_missing_fields_use_sentinel() {
        let builder = NetworkBuilder::new().extend(vec![Statement::new(
            3,
            Declaration::Neuron {
                name: Some("X".to_string()),
                threshold: None,
                potential: Some(1.0),
            },
        )]);

        assert_eq!(builder.diagnostics().count_of(WarningKind::ExpectedNumber), 1);
        let warning = builder.diagnostics().iter().next().unwrap();
        assert_eq!(warning.context(), "line 3: neuron X ??? 1.0");
        let x = builder.network().find_neuron("X").unwrap();
        assert_eq!(builder.network().neuron(x).threshold(), SENTINEL);
    }

    #[test]
    fn test_missing_name_discards_declaration() {
        let builder = NetworkBuilder::new().extend(vec![
            Statement::new(
                1,
                Declaration::Neuron {
                    name: None,
                    threshold: Some(1.0),
                    potential: Some(1.0),
                },
            ),
            Statement::new(
                2,
                Declaration::Synapse {
                    name: SynapseName::Invalid,
                    source: None,
                    destination: None,
                    delay: Some(1.0),
                    strength: Some(1.0),
                },
            ),
        ]);

        assert_eq!(builder.diagnostics().count_of(WarningKind::ExpectedName), 2);
        assert_eq!(builder.network().num_neurons(), 0);
        assert_eq!(builder.network().num_synapses(), 0);
    }

    #[test]
    fn test_output_declaration() {
        let output = |interval: f64, end: f64| {
            Statement::new(
                0,
                Declaration::Output {
                    interval: Some(interval),
                    end: Some(end),
                },
            )
        };
        let builder = NetworkBuilder::new().extend(vec![output(1.0, 10.0), output(2.0, 5.0)]);

        assert_eq!(builder.diagnostics().count_of(WarningKind::DuplicateOutput), 1);
        assert_eq!(builder.reporter, Some(Reporter::new(1.0, 10.0)));
        assert_eq!(builder.scheduler.len(), 1);

        let builder = NetworkBuilder::new().extend(vec![output(0.0, 10.0)]);
        assert_eq!(builder.diagnostics().count_of(WarningKind::InvalidInterval), 1);
        assert_eq!(builder.reporter, Some(Reporter::new(SENTINEL, 10.0)));
    }

    #[test]
    fn test_unknown_and_trailing() {
        let mut statement = neuron("X", 1.0, 0.0);
        statement.trailing = vec!["extra".to_string()];
        let builder = NetworkBuilder::new().extend(vec![
            statement,
            Statement::new(
                2,
                Declaration::Unknown {
                    keyword: "nueron".to_string(),
                },
            ),
        ]);

        assert_eq!(builder.diagnostics().count_of(WarningKind::ExpectedNewline), 1);
        assert_eq!(builder.diagnostics().count_of(WarningKind::UnknownKeyword), 1);
        assert_eq!(builder.network().num_neurons(), 1);
    }

    #[test]
    fn test_statement_json() {
        let statement = synapse(Some("p"), "X", "Y", 1.0, 0.5);
        let json = serde_json::to_string(&statement).unwrap();
        let decoded: Statement = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, statement);

        let decoded: Statement =
            serde_json::from_str(r#"{"kind": "neuron", "name": "A", "threshold": 1.0, "potential": null}"#)
                .unwrap();
        assert_eq!(decoded.line, 0);
        assert_eq!(
            decoded.declaration,
            Declaration::Neuron {
                name: Some("A".to_string()),
                threshold: Some(1.0),
                potential: None
            }
        );
    }
}
