use crate::error::{Error, Result};
use itertools::Itertools;
use log::debug;
use petgraph::{
    algo::toposort,
    graph::{Graph, NodeIndex},
    visit::EdgeRef,
    Direction,
};
use std::collections::HashMap;

/// the agents of a session, one per pipeline stage
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Stage {
    Mesh,
    Globe,
    Grid,
    Renderer,
    Field,
    Animator,
    Overlay,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::Mesh,
        Stage::Globe,
        Stage::Grid,
        Stage::Renderer,
        Stage::Field,
        Stage::Animator,
        Stage::Overlay,
    ];
}

/// what a stage announces to its dependents
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Signal {
    /// a new task was submitted
    Submit,
    /// a task resolved with a current value
    Update,
    /// a move began, so in-flight work is stale
    Start,
    /// the map was redrawn mid-move
    Redraw,
    /// the map settled and can be sampled
    Render,
}

/// what a dependent does on hearing a signal
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Reaction {
    Submit,
    Cancel,
    /// stop the animation, optionally wiping its trails
    Stop { clear: bool },
    /// redraw with the overlay hidden
    Blank,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Link {
    pub on: Signal,
    pub then: Reaction,
}

/// directed acyclic dependency graph between stages
#[derive(Debug)]
pub struct Pipeline {
    graph: Graph<Stage, Link>,
    nodes: HashMap<Stage, NodeIndex>,
}

impl Pipeline {
    pub fn new() -> Self {
        let mut graph = Graph::<Stage, Link>::new();
        let nodes = Stage::ALL
            .iter()
            .map(|stage| (*stage, graph.add_node(*stage)))
            .collect();
        Self { graph, nodes }
    }

    pub fn link(mut self, from: Stage, on: Signal, to: Stage, then: Reaction) -> Self {
        let _ = self
            .graph
            .add_edge(self.nodes[&from], self.nodes[&to], Link { on, then });
        self
    }

    /// fails with a stage on a cycle, if any
    pub fn validate(self) -> Result<Self> {
        match toposort(&self.graph, None) {
            Ok(_) => Ok(self),
            Err(cycle) => Err(Error::Cycle(self.graph[cycle.node_id()])),
        }
    }

    /// mesh, globe and grid feed the renderer, which feeds the field, which feeds animator and overlay
    pub fn standard() -> Result<Self> {
        Self::new()
            .link(Stage::Mesh, Signal::Update, Stage::Renderer, Reaction::Submit)
            .link(Stage::Globe, Signal::Update, Stage::Renderer, Reaction::Submit)
            .link(Stage::Grid, Signal::Update, Stage::Field, Reaction::Submit)
            .link(Stage::Renderer, Signal::Render, Stage::Field, Reaction::Submit)
            .link(Stage::Renderer, Signal::Start, Stage::Field, Reaction::Cancel)
            .link(Stage::Renderer, Signal::Redraw, Stage::Field, Reaction::Cancel)
            .link(Stage::Field, Signal::Update, Stage::Animator, Reaction::Submit)
            .link(
                Stage::Renderer,
                Signal::Start,
                Stage::Animator,
                Reaction::Stop { clear: true },
            )
            .link(
                Stage::Grid,
                Signal::Submit,
                Stage::Animator,
                Reaction::Stop { clear: false },
            )
            .link(
                Stage::Field,
                Signal::Submit,
                Stage::Animator,
                Reaction::Stop { clear: false },
            )
            .link(Stage::Field, Signal::Update, Stage::Overlay, Reaction::Submit)
            .link(Stage::Renderer, Signal::Start, Stage::Overlay, Reaction::Blank)
            .validate()
    }

    /// dependents of a stage listening for a signal, in the order they were linked
    pub fn reactions(&self, stage: Stage, signal: Signal) -> Vec<(Stage, Reaction)> {
        let reactions = self
            .graph
            .edges_directed(self.nodes[&stage], Direction::Outgoing)
            .filter(|edge| edge.weight().on == signal)
            .sorted_by_key(|edge| edge.id())
            .map(|edge| (self.graph[edge.target()], edge.weight().then))
            .collect::<Vec<(Stage, Reaction)>>();
        debug!("{:?} {:?} reaches {} stages", stage, signal, reactions.len());
        reactions
    }

    /// stages with every dependency before its dependents
    pub fn order(&self) -> Vec<Stage> {
        toposort(&self.graph, None)
            .map(|nodes| nodes.into_iter().map(|node| self.graph[node]).collect())
            .unwrap_or_default()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn standard_is_acyclic() {
        let pipeline = Pipeline::standard().expect("standard pipeline is acyclic");
        let order = pipeline.order();
        let position = |stage| order.iter().position(|s| *s == stage).expect("every stage");
        assert!(position(Stage::Globe) < position(Stage::Renderer));
        assert!(position(Stage::Renderer) < position(Stage::Field));
        assert!(position(Stage::Field) < position(Stage::Animator));
        assert!(position(Stage::Field) < position(Stage::Overlay));
    }

    #[test]
    fn cycles_are_rejected() {
        let result = Pipeline::new()
            .link(Stage::Field, Signal::Update, Stage::Animator, Reaction::Submit)
            .link(Stage::Animator, Signal::Update, Stage::Field, Reaction::Submit)
            .validate();
        assert!(matches!(result, Err(Error::Cycle(_))));
    }

    #[test]
    fn renderer_start_fans_out() {
        let pipeline = Pipeline::standard().expect("standard pipeline is acyclic");
        let reactions = pipeline.reactions(Stage::Renderer, Signal::Start);
        assert_eq!(
            reactions,
            vec![
                (Stage::Field, Reaction::Cancel),
                (Stage::Animator, Reaction::Stop { clear: true }),
                (Stage::Overlay, Reaction::Blank),
            ]
        );
        assert!(pipeline.reactions(Stage::Overlay, Signal::Update).is_empty());
    }

    #[test]
    fn reactions_follow_link_order() {
        let pipeline = Pipeline::new()
            .link(Stage::Grid, Signal::Update, Stage::Overlay, Reaction::Submit)
            .link(Stage::Grid, Signal::Submit, Stage::Animator, Reaction::Cancel)
            .link(Stage::Grid, Signal::Update, Stage::Field, Reaction::Submit)
            .link(Stage::Grid, Signal::Update, Stage::Animator, Reaction::Cancel);
        assert_eq!(
            pipeline.reactions(Stage::Grid, Signal::Update),
            vec![
                (Stage::Overlay, Reaction::Submit),
                (Stage::Field, Reaction::Submit),
                (Stage::Animator, Reaction::Cancel),
            ]
        );
    }
}
