//! Simulation of an assembled network.
//!
//! A [`Simulation`] owns everything a run needs: the network, the pending events, the warnings
//! of the assembly, the optional activity reporter and the sink the reporter writes to. It is
//! single-threaded: each event runs to completion before the next one is popped.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::ops::ControlFlow;
use std::path::Path;

use crate::builder::{Declaration, NetworkBuilder, Statement};
use crate::diagnostics::Diagnostics;
use crate::error::NetError;
use crate::network::Network;
use crate::output::Reporter;
use crate::parser;
use crate::scheduler::{Action, Event, EventHandler, RunOutcome, Scheduler};

/// The result of a call to [`Simulation::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The assembly recorded warnings: the network was printed instead of simulated.
    Blocked,
    /// The events were executed until the given outcome.
    Ran(RunOutcome),
}

/// Executes the events popped by the scheduler against the network.
struct Dispatcher<'a, W: Write> {
    network: &'a mut Network,
    reporter: &'a mut Option<Reporter>,
    out: &'a mut W,
    error: Option<NetError>,
}

impl<W: Write> EventHandler for Dispatcher<'_, W> {
    fn handle(&mut self, scheduler: &mut Scheduler, event: Event) -> ControlFlow<()> {
        match event.action {
            Action::Fire { neuron } => self.network.fire_neuron(neuron, event.time, scheduler),
            Action::Deliver { synapse, fired_at } => {
                self.network.fire_synapse(synapse, fired_at, scheduler)
            }
            Action::Report => match self.reporter.as_mut() {
                Some(reporter) => {
                    match reporter.sample(event.time, &mut *self.network, scheduler, &mut *self.out) {
                        Ok(flow) => return flow,
                        Err(e) => {
                            self.error = Some(e);
                            return ControlFlow::Break(());
                        }
                    }
                }
                None => log::warn!("{}: report requested without output", event.id),
            },
            Action::Stop => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }
}

/// A network ready to be simulated, with its pending events.
pub struct Simulation<W: Write> {
    network: Network,
    scheduler: Scheduler,
    diagnostics: Diagnostics,
    reporter: Option<Reporter>,
    out: W,
    horizon: f64,
    stopped: bool,
}

impl<W: Write> Simulation<W> {
    /// Create a simulation from its assembled parts, see [`NetworkBuilder::finish`].
    pub fn new(
        network: Network,
        scheduler: Scheduler,
        diagnostics: Diagnostics,
        reporter: Option<Reporter>,
        out: W,
    ) -> Self {
        Simulation {
            network,
            scheduler,
            diagnostics,
            reporter,
            out,
            horizon: f64::INFINITY,
            stopped: false,
        }
    }

    /// Assemble a simulation from a list of statements.
    pub fn from_statements<I: IntoIterator<Item = Statement>>(statements: I, out: W) -> Self {
        NetworkBuilder::new().extend(statements).finish(out)
    }

    /// Assemble a simulation from a text in the declaration language.
    pub fn from_source(source: &str, out: W) -> Self {
        Simulation::from_statements(parser::parse_str(source), out)
    }

    /// Assemble a simulation from a file, see [`parser::load_file`].
    /// Returns an error if the file cannot be read.
    pub fn from_file<P: AsRef<Path>>(path: P, out: W) -> Result<Self, NetError> {
        Ok(Simulation::from_statements(parser::load_file(path)?, out))
    }

    /// Stop the simulation before executing any event later than `horizon`.
    pub fn set_horizon(&mut self, horizon: f64) -> Result<(), NetError> {
        if horizon.is_nan() {
            return Err(NetError::InvalidParameter(
                "The horizon must be a number".to_string(),
            ));
        }
        self.horizon = horizon;
        Ok(())
    }

    /// Request the simulation to stop once every event submitted before, up to `time`, was executed.
    pub fn stop_at(&mut self, time: f64) {
        self.scheduler.submit(time, Action::Stop);
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut Network {
        &mut self.network
    }

    /// The scheduler, e.g., to submit additional events before running.
    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Returns the warnings recorded while assembling the network.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Returns true if a stop was requested by an executed event.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Returns the output sink.
    pub fn output(&self) -> &W {
        &self.out
    }

    /// Consume the simulation and return its output sink.
    pub fn into_output(self) -> W {
        self.out
    }

    /// Execute the next pending event, unless the assembly recorded warnings, a stop was requested,
    /// or the event lies beyond the horizon. Returns true if an event was executed.
    pub fn step(&mut self) -> Result<bool, NetError> {
        if !self.diagnostics.is_clean() || self.stopped {
            return Ok(false);
        }
        match self.scheduler.peek_next() {
            Some(event) if event.time <= self.horizon => {}
            _ => return Ok(false),
        }

        let mut dispatcher = Dispatcher {
            network: &mut self.network,
            reporter: &mut self.reporter,
            out: &mut self.out,
            error: None,
        };
        let flow = self.scheduler.step(&mut dispatcher);
        if let Some(e) = dispatcher.error {
            return Err(e);
        }
        if flow == Some(ControlFlow::Break(())) {
            self.stopped = true;
            log::info!("Simulation stopped at {}", self.scheduler.now());
        }
        Ok(true)
    }

    /// Run the simulation until no event remains, a stop is requested, or the horizon is reached.
    ///
    /// If the assembly recorded any warning, no event is executed: the network is printed to the
    /// output sink instead. Returns an error if the output cannot be written.
    pub fn run(&mut self) -> Result<RunStatus, NetError> {
        if !self.diagnostics.is_clean() {
            log::warn!(
                "{} warning(s) while assembling the network, printing it instead of simulating it",
                self.diagnostics.count()
            );
            write!(self.out, "{}", self.network).map_err(|e| NetError::IOError(e.to_string()))?;
            self.out
                .flush()
                .map_err(|e| NetError::IOError(e.to_string()))?;
            return Ok(RunStatus::Blocked);
        }
        if self.stopped {
            return Ok(RunStatus::Ran(RunOutcome::Stopped));
        }

        log::info!(
            "Starting simulation of {} neurons and {} synapses...",
            self.network.num_neurons(),
            self.network.num_synapses()
        );
        let mut dispatcher = Dispatcher {
            network: &mut self.network,
            reporter: &mut self.reporter,
            out: &mut self.out,
            error: None,
        };
        let outcome = self.scheduler.run_until(self.horizon, &mut dispatcher);
        if let Some(e) = dispatcher.error {
            return Err(e);
        }

        match outcome {
            RunOutcome::Idle => log::info!("Network activity has ceased..."),
            RunOutcome::Stopped => {
                self.stopped = true;
                log::info!("Simulation stopped at {}", self.scheduler.now());
            }
            RunOutcome::HorizonReached => {
                log::info!("Simulation reached its horizon {}", self.horizon)
            }
        }
        log::info!("{} events processed", self.scheduler.processed());
        self.out
            .flush()
            .map_err(|e| NetError::IOError(e.to_string()))?;
        Ok(RunStatus::Ran(outcome))
    }

    /// The current state of the simulation as a list of declarations.
    pub fn to_statements(&self) -> Vec<Statement> {
        let mut statements = self.network.to_statements();
        if let Some(reporter) = &self.reporter {
            statements.push(Statement::new(
                statements.len() + 1,
                Declaration::Output {
                    interval: Some(reporter.interval()),
                    end: Some(reporter.end()),
                },
            ));
        }
        statements
    }

    /// Save the current state of the simulation to a JSON file, loadable with [`Simulation::from_file`].
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), NetError> {
        let display = path.as_ref().display().to_string();
        let file = File::create(&path).map_err(|e| NetError::from_io(e, &display))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.to_statements())
            .map_err(|e| NetError::IOError(e.to_string()))?;
        writer
            .flush()
            .map_err(|e| NetError::IOError(e.to_string()))?;
        Ok(())
    }
}
