//! Named waypoint graphs used by route navigation.

use crate::error::GraphError;
use glam::{DVec3, IVec3};
use log::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, HashMap};
use std::path::Path;

pub type WaypointId = u32;

/// How the actor gets to a waypoint from the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransportMethod {
    Move,
    Aotv,
    Etherwarp,
}

impl TransportMethod {
    fn cost_factor(&self) -> f64 {
        match self {
            TransportMethod::Move => 1.0,
            TransportMethod::Aotv | TransportMethod::Etherwarp => 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub id: WaypointId,
    pub position: IVec3,
    pub action: TransportMethod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: WaypointId,
    pub to: WaypointId,
    pub bidirectional: bool,
}

impl Edge {
    fn links(&self, a: WaypointId, b: WaypointId) -> bool {
        (self.from == a && self.to == b) || (self.bidirectional && self.from == b && self.to == a)
    }
}

/// Waypoints and the edges between them. Edges only reference existing waypoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    waypoints: Vec<Waypoint>,
    edges: Vec<Edge>,
}

#[derive(Debug, PartialEq)]
struct Candidate {
    estimate: f64,
    id: WaypointId,
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other.estimate.partial_cmp(&self.estimate).unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Graph {
    pub fn new() -> Graph {
        Graph::default()
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn waypoint(&self, id: WaypointId) -> Option<&Waypoint> {
        self.waypoints.iter().find(|waypoint| waypoint.id == id)
    }

    pub fn add_waypoint(&mut self, position: IVec3, action: TransportMethod) -> WaypointId {
        let id = self.waypoints.iter().map(|waypoint| waypoint.id + 1).max().unwrap_or(0);
        self.waypoints.push(Waypoint { id, position, action });
        id
    }

    /// Removes a waypoint and every edge touching it.
    pub fn remove_waypoint(&mut self, id: WaypointId) -> Result<Waypoint, GraphError> {
        let idx = self
            .waypoints
            .iter()
            .position(|waypoint| waypoint.id == id)
            .ok_or(GraphError::UnknownWaypoint(id))?;
        self.edges.retain(|edge| edge.from != id && edge.to != id);
        Ok(self.waypoints.remove(idx))
    }

    pub fn connect(&mut self, from: WaypointId, to: WaypointId, bidirectional: bool) -> Result<(), GraphError> {
        for id in [from, to] {
            if self.waypoint(id).is_none() {
                return Err(GraphError::UnknownWaypoint(id));
            }
        }
        self.edges.retain(|edge| !(edge.from == from && edge.to == to) && !(edge.from == to && edge.to == from));
        self.edges.push(Edge { from, to, bidirectional });
        Ok(())
    }

    pub fn disconnect(&mut self, a: WaypointId, b: WaypointId) {
        self.edges.retain(|edge| !(edge.from == a && edge.to == b) && !(edge.from == b && edge.to == a));
    }

    pub fn is_connected(&self, from: WaypointId, to: WaypointId) -> bool {
        self.edges.iter().any(|edge| edge.links(from, to))
    }

    pub fn neighbors(&self, id: WaypointId) -> Vec<WaypointId> {
        self.edges
            .iter()
            .filter_map(|edge| {
                if edge.from == id {
                    Some(edge.to)
                } else if edge.bidirectional && edge.to == id {
                    Some(edge.from)
                } else {
                    None
                }
            })
            .collect()
    }

    pub fn closest(&self, position: DVec3) -> Option<&Waypoint> {
        self.waypoints.iter().min_by(|a, b| {
            let a = a.position.as_dvec3().distance_squared(position);
            let b = b.position.as_dvec3().distance_squared(position);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        })
    }

    /// A* over the edges. The returned route starts with `from` and ends with `to`.
    pub fn find_route(&self, from: WaypointId, to: WaypointId) -> Option<Vec<Waypoint>> {
        let goal = self.waypoint(to)?.position.as_dvec3();
        self.waypoint(from)?;

        let mut costs: HashMap<WaypointId, f64> = HashMap::new();
        let mut parents: HashMap<WaypointId, WaypointId> = HashMap::new();
        let mut open = BinaryHeap::new();
        costs.insert(from, 0.0);
        open.push(Candidate { estimate: 0.0, id: from });

        while let Some(Candidate { id, .. }) = open.pop() {
            if id == to {
                let mut route = vec![*self.waypoint(to)?];
                let mut current = to;
                while let Some(parent) = parents.get(&current) {
                    route.push(*self.waypoint(*parent)?);
                    current = *parent;
                }
                route.reverse();
                return Some(route);
            }
            let position = self.waypoint(id)?.position.as_dvec3();
            let cost = costs.get(&id).copied().unwrap_or(f64::INFINITY);
            for neighbor in self.neighbors(id) {
                let next = match self.waypoint(neighbor) {
                    Some(next) => next,
                    None => continue,
                };
                let next_position = next.position.as_dvec3();
                let tentative = cost + position.distance(next_position) * next.action.cost_factor();
                if tentative < costs.get(&neighbor).copied().unwrap_or(f64::INFINITY) {
                    costs.insert(neighbor, tentative);
                    parents.insert(neighbor, id);
                    open.push(Candidate {
                        estimate: tentative + next_position.distance(goal) * 0.5,
                        id: neighbor,
                    });
                }
            }
        }
        None
    }
}

#[derive(Debug)]
struct Recording {
    graph: String,
    last: Option<WaypointId>,
    spacing: f64,
    action: TransportMethod,
}

/// Every named graph, plus the edit and record modes that gate mutation.
#[derive(Debug, Default)]
pub struct GraphStore {
    graphs: BTreeMap<String, Graph>,
    editing: Option<String>,
    recording: Option<Recording>,
}

impl GraphStore {
    pub fn new() -> GraphStore {
        GraphStore::default()
    }

    pub fn from_json(raw: &str) -> Result<GraphStore, GraphError> {
        Ok(GraphStore {
            graphs: serde_json::from_str(raw)?,
            ..GraphStore::default()
        })
    }

    pub fn to_json(&self) -> Result<String, GraphError> {
        Ok(serde_json::to_string_pretty(&self.graphs)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<GraphStore, GraphError> {
        let store = GraphStore::from_json(&std::fs::read_to_string(path)?)?;
        info!("Loaded {} graphs", store.graphs.len());
        Ok(store)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), GraphError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn list(&self) -> Vec<&str> {
        self.graphs.keys().map(|name| name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Graph> {
        self.graphs.get(name)
    }

    pub fn create(&mut self, name: &str) {
        self.graphs.entry(name.to_string()).or_default();
    }

    pub fn insert(&mut self, name: &str, graph: Graph) {
        self.graphs.insert(name.to_string(), graph);
    }

    pub fn delete(&mut self, name: &str) -> Result<Graph, GraphError> {
        if self.editing.as_deref() == Some(name) {
            self.editing = None;
            self.recording = None;
        }
        self.graphs.remove(name).ok_or_else(|| GraphError::UnknownGraph(name.to_string()))
    }

    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    /// Enters edit mode on `name` (creating it) or leaves it if already editing it.
    /// Returns whether edit mode is now on.
    pub fn toggle_edit(&mut self, name: &str) -> bool {
        if self.editing.as_deref() == Some(name) {
            self.editing = None;
            self.recording = None;
            false
        } else {
            self.create(name);
            self.editing = Some(name.to_string());
            true
        }
    }

    fn editable(&mut self, name: &str) -> Result<&mut Graph, GraphError> {
        if self.editing.as_deref() != Some(name) {
            return Err(GraphError::NotEditing(name.to_string()));
        }
        self.graphs
            .get_mut(name)
            .ok_or_else(|| GraphError::UnknownGraph(name.to_string()))
    }

    pub fn add_waypoint(&mut self, name: &str, position: IVec3, action: TransportMethod) -> Result<WaypointId, GraphError> {
        Ok(self.editable(name)?.add_waypoint(position, action))
    }

    pub fn remove_waypoint(&mut self, name: &str, id: WaypointId) -> Result<Waypoint, GraphError> {
        self.editable(name)?.remove_waypoint(id)
    }

    pub fn connect(&mut self, name: &str, from: WaypointId, to: WaypointId, bidirectional: bool) -> Result<(), GraphError> {
        self.editable(name)?.connect(from, to, bidirectional)
    }

    pub fn disconnect(&mut self, name: &str, a: WaypointId, b: WaypointId) -> Result<(), GraphError> {
        self.editable(name)?.disconnect(a, b);
        Ok(())
    }

    /// Starts appending waypoints to `name` as the actor moves.
    pub fn start_recording(&mut self, name: &str, spacing: f64, action: TransportMethod) {
        if self.editing.as_deref() != Some(name) {
            self.toggle_edit(name);
        }
        self.recording = Some(Recording {
            graph: name.to_string(),
            last: None,
            spacing,
            action,
        });
    }

    pub fn stop_recording(&mut self) {
        self.recording = None;
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    /// Adds a waypoint connected to the previous one once the actor moved
    /// `spacing` blocks away from it.
    pub fn record(&mut self, position: DVec3) -> Option<WaypointId> {
        let recording = self.recording.as_mut()?;
        let graph = self.graphs.get_mut(&recording.graph)?;
        let footing = position.floor().as_ivec3();
        if let Some(last) = recording.last.and_then(|id| graph.waypoint(id)) {
            if last.position.as_dvec3().distance(footing.as_dvec3()) < recording.spacing {
                return None;
            }
        }
        let id = graph.add_waypoint(footing, recording.action);
        if let Some(last) = recording.last {
            if let Err(e) = graph.connect(last, id, true) {
                warn!("Failed to connect recorded waypoint: {}", e);
            }
        }
        trace!("Recorded waypoint {} at {}", id, footing);
        recording.last = Some(id);
        Some(id)
    }

    /// Route inside `name` from the waypoint closest to `from` to `to`.
    pub fn route_to(&self, name: &str, from: DVec3, to: WaypointId) -> Option<Vec<Waypoint>> {
        let graph = self.graphs.get(name)?;
        let start = graph.closest(from)?.id;
        graph.find_route(start, to)
    }

    /// Route through every waypoint of `name` from the one closest to `from`
    /// to the one with the highest id, used for linear recorded routes.
    pub fn route_to_end(&self, name: &str, from: DVec3) -> Option<Vec<Waypoint>> {
        let graph = self.graphs.get(name)?;
        let end = graph.waypoints().iter().map(|waypoint| waypoint.id).max()?;
        self.route_to(name, from, end)
    }
}
