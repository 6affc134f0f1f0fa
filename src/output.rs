//! Periodic text output of the network activity.
//!
//! At time zero the reporter prints a header with the (truncated) neuron names. Then, every
//! `interval`, it prints one column per neuron telling whether it fired zero, one, or several
//! times during the elapsed interval. Once a sample is taken at or after `end`, it requests the
//! simulation to stop.
use std::io::Write;
use std::ops::ControlFlow;

use itertools::Itertools;

use crate::error::NetError;
use crate::network::Network;
use crate::scheduler::{Action, Scheduler};

/// The width of a neuron column.
pub const COLUMN_WIDTH: usize = 5;

const NO_FIRE: &str = "  |   ";
const ONE_FIRE: &str = "  |-  ";
const MULTIPLE_FIRES: &str = "  |=  ";

/// Samples the fire counts of a network at regular intervals.
#[derive(Debug, Clone, PartialEq)]
pub struct Reporter {
    interval: f64,
    end: f64,
    header_printed: bool,
}

impl Reporter {
    pub fn new(interval: f64, end: f64) -> Self {
        Reporter {
            interval,
            end,
            header_printed: false,
        }
    }

    /// Returns the time between two samples.
    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Returns the time of the last sample.
    pub fn end(&self) -> f64 {
        self.end
    }

    /// The header line: every neuron name truncated or padded to the column width, each followed by a space.
    pub fn header(network: &Network) -> String {
        network
            .neurons_iter()
            .map(|neuron| format!("{:<width$.width$} ", neuron.name(), width = COLUMN_WIDTH))
            .join("")
    }

    /// The activity line for the given fire counts.
    pub fn activity(counts: &[u32]) -> String {
        counts
            .iter()
            .map(|&count| match count {
                0 => NO_FIRE,
                1 => ONE_FIRE,
                _ => MULTIPLE_FIRES,
            })
            .join("")
    }

    /// Take a sample at `time`: print the header first if needed, print the activity since the previous
    /// sample (except at time zero), then schedule the next sample or request a stop.
    pub fn sample<W: Write>(
        &mut self,
        time: f64,
        network: &mut Network,
        scheduler: &mut Scheduler,
        out: &mut W,
    ) -> Result<ControlFlow<()>, NetError> {
        if !self.header_printed {
            writeln!(out, "{}", Reporter::header(network))
                .map_err(|e| NetError::IOError(e.to_string()))?;
            self.header_printed = true;
        }

        if time > 0.0 {
            let counts = network.read_and_reset_fire_counts();
            writeln!(out, "{}", Reporter::activity(&counts))
                .map_err(|e| NetError::IOError(e.to_string()))?;
        }

        if time < self.end {
            scheduler.submit(time + self.interval, Action::Report);
            Ok(ControlFlow::Continue(()))
        } else {
            log::info!("Output ends at {}", time);
            Ok(ControlFlow::Break(()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neuron::Neuron;

    fn network() -> Network {
        let mut network = Network::new();
        network.add_neuron(Neuron::new("A", 1.0, 0.0)).unwrap();
        network.add_neuron(Neuron::new("Neuronal", 1.0, 0.0)).unwrap();
        network.add_neuron(Neuron::new("Hello", 1.0, 0.0)).unwrap();
        network
    }

    #[test]
    fn test_header() {
        assert_eq!(Reporter::header(&network()), "A     Neuro Hello ");
    }

    #[test]
    fn test_activity() {
        assert_eq!(
            Reporter::activity(&[0, 1, 2, 7]),
            "  |     |-    |=    |=  "
        );
    }

    #[test]
    fn test_sample_sequence() {
        let mut network = network();
        let mut scheduler = Scheduler::new();
        let mut reporter = Reporter::new(1.0, 2.0);
        let mut out: Vec<u8> = vec![];

        let flow = reporter.sample(0.0, &mut network, &mut scheduler, &mut out).unwrap();
        assert_eq!(flow, ControlFlow::Continue(()));
        assert_eq!(scheduler.len(), 1);

        let a = network.find_neuron("A").unwrap();
        network.neuron_mut(a).fire();
        let flow = reporter.sample(1.0, &mut network, &mut scheduler, &mut out).unwrap();
        assert_eq!(flow, ControlFlow::Continue(()));
        assert_eq!(network.neuron(a).fire_count(), 0);

        let flow = reporter.sample(2.0, &mut network, &mut scheduler, &mut out).unwrap();
        assert_eq!(flow, ControlFlow::Break(()));

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "A     Neuro Hello \n  |-    |     |   \n  |     |     |   \n"
        );
        let times: Vec<f64> = scheduler.drain_ordered().iter().map(|e| e.time).collect();
        assert_eq!(times, vec![1.0, 2.0]);
    }
}
