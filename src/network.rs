//! Network (with neurons and synapses) structure and firing logic.
//!
//! The network owns every neuron and synapse in declaration order. Neurons and synapses refer
//! to each other through [`NeuronId`] and [`SynapseId`] handles, so that feedback loops need no
//! shared ownership.
use std::collections::HashMap;
use std::fmt;

use crate::builder::{Declaration, Statement, SynapseName};
use crate::error::NetError;
use crate::neuron::{Neuron, NeuronId};
use crate::scheduler::{Action, Scheduler};
use crate::synapse::{Synapse, SynapseId, SynapseKind};
use crate::{ANONYMOUS, UNRESOLVED};

/// A named entity of the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Neuron(NeuronId),
    Synapse(SynapseId),
}

/// The registry of neurons and synapses.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Network {
    neurons: Vec<Neuron>,
    synapses: Vec<Synapse>,
    // Neuron and synapse names share a single namespace.
    names: HashMap<String, Entity>,
}

impl Network {
    /// Create an empty network.
    pub fn new() -> Self {
        Network::default()
    }

    /// Add a neuron to the network.
    /// Returns an error if its name is already used by a neuron or a synapse; the network is then left unchanged.
    pub fn add_neuron(&mut self, neuron: Neuron) -> Result<NeuronId, NetError> {
        if self.contains_name(neuron.name()) {
            return Err(NetError::DuplicateName(neuron.name().to_string()));
        }
        let id = NeuronId::new(self.neurons.len());
        self.names
            .insert(neuron.name().to_string(), Entity::Neuron(id));
        self.neurons.push(neuron);
        Ok(id)
    }

    /// Add a synapse to the network and attach it to its source neuron, if any.
    /// Returns an error if its name is already used by a neuron or a synapse; the network is then left unchanged.
    pub fn add_synapse(&mut self, synapse: Synapse) -> Result<SynapseId, NetError> {
        if let Some(name) = synapse.name() {
            if self.contains_name(name) {
                return Err(NetError::DuplicateName(name.to_string()));
            }
        }
        if let Some(source) = synapse.source() {
            if source.index() >= self.neurons.len() {
                return Err(NetError::InvalidParameter(format!(
                    "Unknown source neuron {}",
                    source
                )));
            }
        }

        let id = SynapseId::new(self.synapses.len());
        if let Some(name) = synapse.name() {
            self.names.insert(name.to_string(), Entity::Synapse(id));
        }
        if let Some(source) = synapse.source() {
            self.neurons[source.index()].add_output(id);
        }
        self.synapses.push(synapse);
        Ok(id)
    }

    /// Returns true if a neuron or a synapse already bears this name.
    pub fn contains_name(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Look up a neuron by name.
    pub fn find_neuron(&self, name: &str) -> Option<NeuronId> {
        match self.names.get(name) {
            Some(Entity::Neuron(id)) => Some(*id),
            _ => None,
        }
    }

    /// Look up a synapse by name.
    pub fn find_synapse(&self, name: &str) -> Option<SynapseId> {
        match self.names.get(name) {
            Some(Entity::Synapse(id)) => Some(*id),
            _ => None,
        }
    }

    /// A reference to a specific neuron in the network.
    pub fn neuron(&self, id: NeuronId) -> &Neuron {
        &self.neurons[id.index()]
    }

    /// A mutable reference to a specific neuron in the network.
    pub fn neuron_mut(&mut self, id: NeuronId) -> &mut Neuron {
        &mut self.neurons[id.index()]
    }

    /// A reference to a specific synapse in the network.
    pub fn synapse(&self, id: SynapseId) -> &Synapse {
        &self.synapses[id.index()]
    }

    /// An iterator over the neurons in the network, in order of declaration.
    pub fn neurons_iter(&self) -> impl Iterator<Item = &Neuron> + '_ {
        self.neurons.iter()
    }

    /// An iterator over the synapses in the network, in order of declaration.
    pub fn synapses_iter(&self) -> impl Iterator<Item = &Synapse> + '_ {
        self.synapses.iter()
    }

    /// The number of neurons in the network.
    pub fn num_neurons(&self) -> usize {
        self.neurons.len()
    }

    /// The number of synapses in the network.
    pub fn num_synapses(&self) -> usize {
        self.synapses.len()
    }

    /// Kick a neuron at `time` with `strength`, firing it if its threshold is exceeded.
    pub fn kick(&mut self, id: NeuronId, time: f64, strength: f64, scheduler: &mut Scheduler) {
        if self.neurons[id.index()].kick(time, strength) {
            self.fire_neuron(id, time, scheduler);
        }
    }

    /// Fire a neuron at `time`: one delivery per outgoing synapse is scheduled at `time + delay`.
    /// Each delivery carries `time`, not its own execution time.
    pub fn fire_neuron(&mut self, id: NeuronId, time: f64, scheduler: &mut Scheduler) {
        let neuron = &mut self.neurons[id.index()];
        neuron.fire();
        log::debug!("neuron {} fires at {}", neuron.name(), time);
        for &synapse_id in neuron.outputs() {
            let delay = self.synapses[synapse_id.index()].delay();
            scheduler.submit(
                time + delay,
                Action::Deliver {
                    synapse: synapse_id,
                    fired_at: time,
                },
            );
        }
    }

    /// Fire a synapse with the firing time of its source.
    /// A primary synapse kicks its target neuron, a secondary synapse strengthens its target synapse.
    /// A synapse without target does nothing.
    pub fn fire_synapse(&mut self, id: SynapseId, time: f64, scheduler: &mut Scheduler) {
        let synapse = &self.synapses[id.index()];
        let strength = synapse.strength();
        match synapse.kind() {
            SynapseKind::Primary {
                target: Some(neuron_id),
            } => self.kick(neuron_id, time, strength, scheduler),
            SynapseKind::Secondary {
                target: Some(synapse_id),
            } => self.synapses[synapse_id.index()].strengthen(strength),
            _ => log::warn!("{} -- fired without destination", self.describe_synapse(id)),
        }
    }

    /// Returns the fire count of every neuron, in order of declaration, and resets them.
    pub fn read_and_reset_fire_counts(&mut self) -> Vec<u32> {
        self.neurons
            .iter_mut()
            .map(|neuron| neuron.read_and_reset_fire_count())
            .collect()
    }

    /// Render a synapse as `synapse NAME SOURCE DESTINATION DELAY STRENGTH`.
    pub fn describe_synapse(&self, id: SynapseId) -> String {
        let synapse = self.synapse(id);
        format!(
            "synapse {} {} {} {:?} {:?}",
            synapse.name().unwrap_or(ANONYMOUS),
            self.source_name(synapse).unwrap_or(UNRESOLVED),
            self.destination_name(synapse).unwrap_or(UNRESOLVED),
            synapse.delay(),
            synapse.strength()
        )
    }

    fn source_name(&self, synapse: &Synapse) -> Option<&str> {
        synapse.source().map(|id| self.neuron(id).name())
    }

    fn destination_name(&self, synapse: &Synapse) -> Option<&str> {
        match synapse.kind() {
            SynapseKind::Primary { target } => target.map(|id| self.neuron(id).name()),
            SynapseKind::Secondary { target } => target.and_then(|id| self.synapse(id).name()),
        }
    }

    /// The current state of the network as a list of declarations, neurons first.
    pub fn to_statements(&self) -> Vec<Statement> {
        let neurons = self.neurons.iter().map(|neuron| Declaration::Neuron {
            name: Some(neuron.name().to_string()),
            threshold: Some(neuron.threshold()),
            potential: Some(neuron.potential()),
        });
        let synapses = self.synapses.iter().map(|synapse| Declaration::Synapse {
            name: match synapse.name() {
                Some(name) => SynapseName::Named(name.to_string()),
                None => SynapseName::Anonymous,
            },
            source: self.source_name(synapse).map(str::to_string),
            destination: self.destination_name(synapse).map(str::to_string),
            delay: Some(synapse.delay()),
            strength: Some(synapse.strength()),
        });
        neurons
            .chain(synapses)
            .enumerate()
            .map(|(i, declaration)| Statement::new(i + 1, declaration))
            .collect()
    }
}

/// One line per neuron, then one line per synapse, with `---` for unresolved references.
impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for neuron in self.neurons.iter() {
            writeln!(f, "{}", neuron)?;
        }
        for id in (0..self.synapses.len()).map(SynapseId::new) {
            writeln!(f, "{}", self.describe_synapse(id))?;
        }
        Ok(())
    }
}
