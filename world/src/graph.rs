//! Navigation graph of vertices joined by paired, directionally opposite arcs.

use std::collections::VecDeque;

use glam::Vec3;
use maze_descent_core::{ArcId, VertexId};
use rand::Rng;

/// Largest deviation from unit length tolerated for arc directions.
const UNIT_TOLERANCE: f32 = 1.0e-3;

/// Point of the navigation graph together with the arcs leaving it.
#[derive(Clone, Debug)]
pub struct Vertex {
    description: String,
    location: Vec3,
    arcs: Vec<ArcId>,
}

impl Vertex {
    /// Human readable label assigned when the vertex was created.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Position of the vertex in world space.
    #[must_use]
    pub const fn location(&self) -> Vec3 {
        self.location
    }

    /// Outgoing arcs in insertion order.
    #[must_use]
    pub fn arcs(&self) -> &[ArcId] {
        &self.arcs
    }
}

/// Directed connection between two vertices.
///
/// Arcs only ever exist in pairs: the reciprocal runs the other way with the
/// same length and the negated direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Arc {
    from: VertexId,
    to: VertexId,
    length: f32,
    direction: Vec3,
    reciprocal: ArcId,
}

impl Arc {
    /// Vertex the arc leaves.
    #[must_use]
    pub const fn from(&self) -> VertexId {
        self.from
    }

    /// Vertex the arc arrives at.
    #[must_use]
    pub const fn to(&self) -> VertexId {
        self.to
    }

    /// Path length travelled along the arc.
    #[must_use]
    pub const fn length(&self) -> f32 {
        self.length
    }

    /// Unit vector pointing the way one sets off when following the arc.
    #[must_use]
    pub const fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Arc running in the opposite direction between the same vertices.
    #[must_use]
    pub const fn reciprocal(&self) -> ArcId {
        self.reciprocal
    }
}

/// Topology container shared by every level of the maze.
///
/// Arcs are stored per vertex as directed adjacency lists. Mutation only
/// happens through [`NavGraph::add_arc_pair`] and [`NavGraph::remove_pair`],
/// so an arc without its reciprocal can never be observed.
#[derive(Clone, Debug, Default)]
pub struct NavGraph {
    vertices: Vec<Vertex>,
    arcs: Vec<Option<Arc>>,
    live_arcs: usize,
}

impl NavGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new vertex. Locations are not checked for duplicates.
    pub fn add_vertex(&mut self, description: impl Into<String>, location: Vec3) -> VertexId {
        let id = VertexId::new(next_id(self.vertices.len()));
        self.vertices.push(Vertex {
            description: description.into(),
            location,
            arcs: Vec::new(),
        });
        id
    }

    /// Creates an arc from `from` to `to` and its reciprocal, returning the former.
    ///
    /// # Panics
    ///
    /// Panics when either vertex is unknown, the endpoints coincide, `length`
    /// is not positive, or `direction` is not a unit vector.
    pub fn add_arc_pair(
        &mut self,
        from: VertexId,
        to: VertexId,
        length: f32,
        direction: Vec3,
    ) -> ArcId {
        assert!(
            from.index() < self.vertices.len() && to.index() < self.vertices.len(),
            "arc endpoints {from:?} -> {to:?} must be registered vertices"
        );
        assert_ne!(from, to, "arc endpoints must differ");
        assert!(
            length.is_finite() && length > 0.0,
            "arc length must be positive, got {length}"
        );
        assert!(
            (direction.length() - 1.0).abs() <= UNIT_TOLERANCE,
            "arc direction must be a unit vector, got {direction}"
        );

        let forward = ArcId::new(next_id(self.arcs.len()));
        let backward = ArcId::new(next_id(self.arcs.len() + 1));
        self.arcs.push(Some(Arc {
            from,
            to,
            length,
            direction,
            reciprocal: backward,
        }));
        self.arcs.push(Some(Arc {
            from: to,
            to: from,
            length,
            direction: -direction,
            reciprocal: forward,
        }));
        self.vertices[from.index()].arcs.push(forward);
        self.vertices[to.index()].arcs.push(backward);
        self.live_arcs += 2;
        forward
    }

    /// Joins two vertices with an arc pair whose length and direction follow
    /// their offset in world space.
    ///
    /// # Panics
    ///
    /// Panics when the vertices share a location.
    pub fn connect(&mut self, from: VertexId, to: VertexId) -> ArcId {
        let offset = self.vertex(to).location - self.vertex(from).location;
        let length = offset.length();
        assert!(
            length > 0.0,
            "cannot connect coincident vertices {from:?} and {to:?}"
        );
        self.add_arc_pair(from, to, length, offset / length)
    }

    /// Removes an arc together with its reciprocal.
    ///
    /// # Panics
    ///
    /// Panics when the arc or its reciprocal is not part of the graph.
    pub fn remove_pair(&mut self, arc: ArcId) {
        let removed = self
            .arcs
            .get_mut(arc.index())
            .and_then(Option::take)
            .unwrap_or_else(|| panic!("arc {arc:?} is not part of the graph"));
        let reciprocal_id = removed.reciprocal;
        let reciprocal = self
            .arcs
            .get_mut(reciprocal_id.index())
            .and_then(Option::take)
            .unwrap_or_else(|| panic!("arc {arc:?} has no reciprocal {reciprocal_id:?}"));

        self.vertices[removed.from.index()]
            .arcs
            .retain(|id| *id != arc);
        self.vertices[reciprocal.from.index()]
            .arcs
            .retain(|id| *id != reciprocal_id);
        self.live_arcs -= 2;
    }

    /// Retrieves a vertex.
    ///
    /// # Panics
    ///
    /// Panics when the vertex is unknown.
    #[must_use]
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.index()]
    }

    /// Retrieves an arc that is currently part of the graph.
    ///
    /// # Panics
    ///
    /// Panics when the arc is unknown or was removed.
    #[must_use]
    pub fn arc(&self, id: ArcId) -> &Arc {
        self.get_arc(id)
            .unwrap_or_else(|| panic!("arc {id:?} is not part of the graph"))
    }

    /// Retrieves an arc, returning `None` for unknown or removed identifiers.
    #[must_use]
    pub fn get_arc(&self, id: ArcId) -> Option<&Arc> {
        self.arcs.get(id.index()).and_then(Option::as_ref)
    }

    /// Number of vertices in the graph.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of directed arcs currently present.
    #[must_use]
    pub fn arc_count(&self) -> usize {
        self.live_arcs
    }

    /// Number of arc pairs currently present.
    #[must_use]
    pub fn pair_count(&self) -> usize {
        self.live_arcs / 2
    }

    /// Iterator over every vertex identifier in creation order.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> {
        (0..next_id(self.vertices.len())).map(VertexId::new)
    }

    /// Iterator over every arc currently present, ordered by identifier.
    pub fn arcs(&self) -> impl Iterator<Item = (ArcId, &Arc)> + '_ {
        self.arcs.iter().enumerate().filter_map(|(index, arc)| {
            arc.as_ref()
                .map(|arc| (ArcId::new(next_id(index)), arc))
        })
    }

    /// Iterator over the arcs leaving a vertex in insertion order.
    pub fn outgoing(&self, vertex: VertexId) -> impl Iterator<Item = (ArcId, &Arc)> + '_ {
        self.vertex(vertex)
            .arcs
            .iter()
            .map(move |id| (*id, self.arc(*id)))
    }

    /// Finds the arc leading directly from `from` to `to`.
    #[must_use]
    pub fn find_arc(&self, from: VertexId, to: VertexId) -> Option<ArcId> {
        self.outgoing(from)
            .find(|(_, arc)| arc.to == to)
            .map(|(id, _)| id)
    }

    /// Finds the outgoing arc whose start direction best matches `direction`.
    ///
    /// Alignment is the dot product of the two vectors. Ties keep the arc that
    /// was inserted first.
    #[must_use]
    pub fn find_least_turn(&self, from: VertexId, direction: Vec3) -> Option<ArcId> {
        let mut best: Option<(ArcId, f32)> = None;
        for (id, arc) in self.outgoing(from) {
            let alignment = arc.direction.dot(direction);
            if best.map_or(true, |(_, current)| alignment > current) {
                best = Some((id, alignment));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Reports whether every vertex is reachable from every other one.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        match self.vertices.first() {
            None => true,
            Some(_) => self.reachable(VertexId::new(0), None).iter().all(|seen| *seen),
        }
    }

    /// Reports whether the graph stays connected once the pair containing
    /// `arc` is ignored.
    #[must_use]
    pub fn is_connected_without(&self, arc: ArcId) -> bool {
        match self.vertices.first() {
            None => true,
            Some(_) => self
                .reachable(VertexId::new(0), Some(arc))
                .iter()
                .all(|seen| *seen),
        }
    }

    /// Reports whether every vertex of `scope` is reachable from its first
    /// vertex.
    #[must_use]
    pub fn spans(&self, scope: &[VertexId]) -> bool {
        self.scope_reachable(scope, None)
    }

    /// Reports whether every vertex of `scope` stays reachable from its first
    /// vertex once the pair containing `arc` is ignored.
    #[must_use]
    pub fn spans_without(&self, arc: ArcId, scope: &[VertexId]) -> bool {
        self.scope_reachable(scope, Some(arc))
    }

    /// Hop distance from `from` to every vertex, `None` where unreachable.
    #[must_use]
    pub fn hop_distances(&self, from: VertexId) -> Vec<Option<u32>> {
        let mut distances = vec![None; self.vertices.len()];
        for (vertex, hops) in self.breadth_first(from) {
            distances[vertex.index()] = Some(hops);
        }
        distances
    }

    /// Finds the vertex with the largest hop distance from `from`.
    ///
    /// When `candidates` is provided only those vertices are considered. Ties
    /// resolve to the vertex discovered first by the breadth-first search,
    /// which visits neighbours in arc insertion order.
    ///
    /// # Panics
    ///
    /// Panics when `candidates` is empty or none of them is reachable.
    #[must_use]
    pub fn find_furthest(&self, from: VertexId, candidates: Option<&[VertexId]>) -> VertexId {
        let mask = candidates.map(|candidates| {
            assert!(
                !candidates.is_empty(),
                "furthest-vertex search needs at least one candidate"
            );
            let mut mask = vec![false; self.vertices.len()];
            for candidate in candidates {
                mask[candidate.index()] = true;
            }
            mask
        });

        let mut best: Option<(VertexId, u32)> = None;
        for (vertex, hops) in self.breadth_first(from) {
            if let Some(mask) = &mask {
                if !mask[vertex.index()] {
                    continue;
                }
            }

            if best.map_or(true, |(_, furthest)| hops > furthest) {
                best = Some((vertex, hops));
            }
        }

        best.map(|(vertex, _)| vertex)
            .unwrap_or_else(|| panic!("no candidate vertex is reachable from {from:?}"))
    }

    /// Lists the vertices exactly `hops` arcs away from `from`, in discovery order.
    #[must_use]
    pub fn find_by_hops(&self, hops: u32, from: VertexId) -> Vec<VertexId> {
        self.breadth_first(from)
            .into_iter()
            .skip_while(|(_, distance)| *distance < hops)
            .take_while(|(_, distance)| *distance == hops)
            .map(|(vertex, _)| vertex)
            .collect()
    }

    /// Picks one of the arcs currently present with uniform probability.
    ///
    /// # Panics
    ///
    /// Panics when the graph holds no arcs.
    pub fn random_arc<R: Rng + ?Sized>(&self, rng: &mut R) -> ArcId {
        let arcs: Vec<ArcId> = self.arcs().map(|(id, _)| id).collect();
        choose_arc(&arcs, rng)
    }

    /// Picks one of the arcs leaving the `scope` vertices with uniform probability.
    ///
    /// # Panics
    ///
    /// Panics when no arc leaves the scope.
    pub fn random_arc_among<R: Rng + ?Sized>(&self, rng: &mut R, scope: &[VertexId]) -> ArcId {
        let arcs: Vec<ArcId> = scope
            .iter()
            .flat_map(|vertex| self.vertex(*vertex).arcs.iter().copied())
            .collect();
        choose_arc(&arcs, rng)
    }

    /// Vertices reachable from `from` paired with their hop distance, in
    /// breadth-first discovery order.
    fn breadth_first(&self, from: VertexId) -> Vec<(VertexId, u32)> {
        let mut distances: Vec<Option<u32>> = vec![None; self.vertices.len()];
        let mut order = Vec::new();
        let mut queue = VecDeque::new();

        distances[from.index()] = Some(0);
        queue.push_back(from);

        while let Some(vertex) = queue.pop_front() {
            let Some(hops) = distances[vertex.index()] else {
                continue;
            };
            order.push((vertex, hops));

            for (_, arc) in self.outgoing(vertex) {
                if distances[arc.to.index()].is_some() {
                    continue;
                }
                distances[arc.to.index()] = Some(hops + 1);
                queue.push_back(arc.to);
            }
        }

        order
    }

    fn reachable(&self, root: VertexId, ignored: Option<ArcId>) -> Vec<bool> {
        let ignored_pair = ignored.map(|arc| (arc, self.arc(arc).reciprocal));
        let mut visited = vec![false; self.vertices.len()];
        let mut queue = VecDeque::new();

        visited[root.index()] = true;
        queue.push_back(root);

        while let Some(vertex) = queue.pop_front() {
            for (id, arc) in self.outgoing(vertex) {
                if let Some((first, second)) = ignored_pair {
                    if id == first || id == second {
                        continue;
                    }
                }

                if visited[arc.to.index()] {
                    continue;
                }
                visited[arc.to.index()] = true;
                queue.push_back(arc.to);
            }
        }

        visited
    }

    fn scope_reachable(&self, scope: &[VertexId], ignored: Option<ArcId>) -> bool {
        let Some(root) = scope.first() else {
            return true;
        };
        let visited = self.reachable(*root, ignored);
        scope.iter().all(|vertex| visited[vertex.index()])
    }
}

fn choose_arc<R: Rng + ?Sized>(arcs: &[ArcId], rng: &mut R) -> ArcId {
    assert!(!arcs.is_empty(), "cannot choose an arc from an empty selection");
    // Sampling through u32 keeps the stream identical on 32- and 64-bit targets.
    let bound = next_id(arcs.len());
    arcs[rng.gen_range(0..bound) as usize]
}

fn next_id(len: usize) -> u32 {
    u32::try_from(len).expect("navigation graph exceeds u32 identifiers")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Builds a straight corridor of `count` vertices spaced one unit apart on X.
    fn corridor(count: u32) -> (NavGraph, Vec<VertexId>) {
        let mut graph = NavGraph::new();
        let vertices: Vec<VertexId> = (0..count)
            .map(|index| graph.add_vertex(format!("v{index}"), Vec3::new(index as f32, 0.0, 0.0)))
            .collect();
        for pair in vertices.windows(2) {
            let _ = graph.connect(pair[0], pair[1]);
        }
        (graph, vertices)
    }

    #[test]
    fn connect_creates_antiparallel_pair() {
        let mut graph = NavGraph::new();
        let a = graph.add_vertex("a", Vec3::ZERO);
        let b = graph.add_vertex("b", Vec3::new(0.0, 0.0, 2.0));

        let forward = graph.connect(a, b);
        let arc = *graph.arc(forward);
        let back = *graph.arc(arc.reciprocal());

        assert_eq!(arc.from(), a);
        assert_eq!(arc.to(), b);
        assert_eq!(arc.length(), 2.0);
        assert_eq!(arc.direction(), Vec3::Z);
        assert_eq!(back.from(), b);
        assert_eq!(back.to(), a);
        assert_eq!(back.length(), arc.length());
        assert_eq!(back.direction(), -Vec3::Z);
        assert_eq!(back.reciprocal(), forward);
        assert_eq!(graph.pair_count(), 1);
    }

    #[test]
    fn remove_pair_drops_both_directions() {
        let (mut graph, vertices) = corridor(3);
        let arc = graph.find_arc(vertices[1], vertices[2]).expect("corridor arc");

        graph.remove_pair(arc);

        assert_eq!(graph.pair_count(), 1);
        assert!(graph.find_arc(vertices[1], vertices[2]).is_none());
        assert!(graph.find_arc(vertices[2], vertices[1]).is_none());
        assert!(graph.vertex(vertices[2]).arcs().is_empty());
        assert!(graph.get_arc(arc).is_none());
    }

    #[test]
    #[should_panic(expected = "not part of the graph")]
    fn removing_a_missing_pair_panics() {
        let (mut graph, vertices) = corridor(2);
        let arc = graph.find_arc(vertices[0], vertices[1]).expect("corridor arc");
        graph.remove_pair(arc);
        graph.remove_pair(arc);
    }

    #[test]
    #[should_panic(expected = "unit vector")]
    fn add_arc_pair_rejects_unnormalised_direction() {
        let mut graph = NavGraph::new();
        let a = graph.add_vertex("a", Vec3::ZERO);
        let b = graph.add_vertex("b", Vec3::X);
        let _ = graph.add_arc_pair(a, b, 1.0, Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    #[should_panic(expected = "length must be positive")]
    fn add_arc_pair_rejects_zero_length() {
        let mut graph = NavGraph::new();
        let a = graph.add_vertex("a", Vec3::ZERO);
        let b = graph.add_vertex("b", Vec3::X);
        let _ = graph.add_arc_pair(a, b, 0.0, Vec3::X);
    }

    #[test]
    fn least_turn_prefers_best_alignment_then_insertion_order() {
        let mut graph = NavGraph::new();
        let hub = graph.add_vertex("hub", Vec3::ZERO);
        let north = graph.add_vertex("north", Vec3::X);
        let east = graph.add_vertex("east", Vec3::Z);
        let west = graph.add_vertex("west", -Vec3::Z);
        let to_north = graph.connect(hub, north);
        let to_east = graph.connect(hub, east);
        let _ = graph.connect(hub, west);

        assert_eq!(graph.find_least_turn(hub, Vec3::new(0.9, 0.0, 0.1)), Some(to_north));
        assert_eq!(graph.find_least_turn(hub, Vec3::new(0.1, 0.0, 0.9)), Some(to_east));
        // East and west tie against a southward query; east was inserted first.
        assert_eq!(graph.find_least_turn(hub, -Vec3::X), Some(to_east));
        assert_eq!(graph.find_least_turn(north, Vec3::X), graph.find_arc(north, hub));
    }

    #[test]
    fn connectivity_check_distinguishes_cycles_from_bridges() {
        let mut graph = NavGraph::new();
        let corners: Vec<VertexId> = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]
            .into_iter()
            .map(|(x, z)| graph.add_vertex("corner", Vec3::new(x, 0.0, z)))
            .collect();
        let tail = graph.add_vertex("tail", Vec3::new(-1.0, 0.0, 0.0));
        for index in 0..corners.len() {
            let _ = graph.connect(corners[index], corners[(index + 1) % corners.len()]);
        }
        let bridge = graph.connect(corners[0], tail);

        assert!(graph.is_connected());
        assert!(!graph.is_connected_without(bridge));
        let cycle_arc = graph.find_arc(corners[1], corners[2]).expect("cycle arc");
        assert!(graph.is_connected_without(cycle_arc));
        assert!(graph.spans_without(bridge, &corners));
        assert!(!graph.spans_without(bridge, &[corners[2], tail]));
    }

    #[test]
    fn furthest_vertex_follows_hop_count() {
        let (graph, vertices) = corridor(5);
        assert_eq!(graph.find_furthest(vertices[1], None), vertices[4]);
        assert_eq!(
            graph.find_furthest(vertices[4], Some(&vertices[1..3])),
            vertices[1]
        );
    }

    #[test]
    fn furthest_vertex_ties_resolve_to_first_discovered() {
        let mut graph = NavGraph::new();
        let hub = graph.add_vertex("hub", Vec3::ZERO);
        let east = graph.add_vertex("east", Vec3::Z);
        let west = graph.add_vertex("west", -Vec3::Z);
        let _ = graph.connect(hub, west);
        let _ = graph.connect(hub, east);

        assert_eq!(graph.find_furthest(hub, None), west);
        assert_eq!(graph.find_furthest(hub, Some(&[east, west])), west);
    }

    #[test]
    #[should_panic(expected = "at least one candidate")]
    fn furthest_vertex_requires_candidates() {
        let (graph, vertices) = corridor(2);
        let _ = graph.find_furthest(vertices[0], Some(&[]));
    }

    #[test]
    #[should_panic(expected = "reachable")]
    fn furthest_vertex_rejects_disconnected_candidates() {
        let (mut graph, vertices) = corridor(2);
        let island = graph.add_vertex("island", Vec3::new(0.0, 0.0, 9.0));
        let _ = graph.find_furthest(vertices[0], Some(&[island]));
    }

    #[test]
    fn find_by_hops_returns_bfs_frontier() {
        let (graph, vertices) = corridor(5);
        assert_eq!(graph.find_by_hops(0, vertices[2]), vec![vertices[2]]);
        assert_eq!(graph.find_by_hops(1, vertices[2]), vec![vertices[1], vertices[3]]);
        assert_eq!(graph.find_by_hops(2, vertices[2]), vec![vertices[0], vertices[4]]);
        assert!(graph.find_by_hops(3, vertices[2]).is_empty());
    }

    #[test]
    fn hop_distances_mark_unreachable_vertices() {
        let (mut graph, vertices) = corridor(3);
        let island = graph.add_vertex("island", Vec3::new(0.0, 0.0, 9.0));
        let distances = graph.hop_distances(vertices[0]);
        assert_eq!(distances[vertices[2].index()], Some(2));
        assert_eq!(distances[island.index()], None);
    }

    #[test]
    fn random_arc_is_reproducible_and_present() {
        let (graph, _) = corridor(6);
        let mut first = ChaCha8Rng::seed_from_u64(7);
        let mut second = ChaCha8Rng::seed_from_u64(7);

        for _ in 0..20 {
            let arc = graph.random_arc(&mut first);
            assert_eq!(arc, graph.random_arc(&mut second));
            assert!(graph.get_arc(arc).is_some());
        }
    }

    #[test]
    fn random_arc_among_stays_within_scope() {
        let (graph, vertices) = corridor(6);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let scope = &vertices[..2];

        for _ in 0..20 {
            let arc = graph.random_arc_among(&mut rng, scope);
            assert!(scope.contains(&graph.arc(arc).from()));
        }
    }

    #[test]
    #[should_panic(expected = "empty selection")]
    fn random_arc_requires_arcs() {
        let mut graph = NavGraph::new();
        let _ = graph.add_vertex("lonely", Vec3::ZERO);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let _ = graph.random_arc(&mut rng);
    }
}
