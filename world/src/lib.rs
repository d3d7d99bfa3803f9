#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative stand-in world for exercising the horde director.
//!
//! The world stores connected players, static spawn markers, occluding boxes
//! and the actors the director asked for. It implements no behaviour: actors
//! stay where they were placed until a command removes them.

use std::time::Duration;

use horde_director_core::{
    ActorId, Command, Event, Occluder, PlayerSnapshot, SpawnPoint, SpawnRejection, Species, Vec3,
    MAX_PLAYERS,
};

const DEFAULT_ACTOR_LIMIT: usize = 256;

/// Represents the authoritative world state.
#[derive(Debug)]
pub struct World {
    players: Vec<PlayerSnapshot>,
    markers: Vec<SpawnPoint>,
    occluders: Vec<Occluder>,
    actors: Vec<Actor>,
    next_actor: u32,
    actor_limit: usize,
    elapsed: Duration,
}

impl World {
    /// Creates an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::with_actor_limit(DEFAULT_ACTOR_LIMIT)
    }

    /// Creates an empty world that refuses spawns beyond `actor_limit` live actors.
    #[must_use]
    pub fn with_actor_limit(actor_limit: usize) -> Self {
        Self {
            players: Vec::new(),
            markers: Vec::new(),
            occluders: Vec::new(),
            actors: Vec::new(),
            next_actor: 0,
            actor_limit,
            elapsed: Duration::ZERO,
        }
    }

    fn spawn_actor(&mut self, species: Species, position: Vec3) -> Result<ActorId, SpawnRejection> {
        if !position.is_finite() {
            return Err(SpawnRejection::InvalidPosition);
        }
        if self.actors.len() >= self.actor_limit {
            return Err(SpawnRejection::ActorLimit);
        }
        let id = ActorId::new(self.next_actor);
        self.next_actor = self.next_actor.wrapping_add(1);
        self.actors.push(Actor {
            id,
            species,
            position,
        });
        Ok(id)
    }

    fn place_player(&mut self, player: PlayerSnapshot) -> bool {
        if let Some(existing) = self.players.iter_mut().find(|slot| slot.id == player.id) {
            *existing = player;
            return true;
        }
        if self.players.len() >= MAX_PLAYERS {
            return false;
        }
        self.players.push(player);
        true
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.elapsed = world.elapsed.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::PlacePlayer { player } => {
            if world.place_player(player) {
                out_events.push(Event::PlayerUpdated { player: player.id });
            }
        }
        Command::RemovePlayer { player } => {
            if let Some(index) = world.players.iter().position(|slot| slot.id == player) {
                let _ = world.players.remove(index);
                out_events.push(Event::PlayerRemoved { player });
            }
        }
        Command::RegisterSpawnMarker { point } => world.markers.push(point),
        Command::PlaceOccluder { occluder } => world.occluders.push(occluder),
        Command::SpawnActor { species, position } => {
            match world.spawn_actor(species, position) {
                Ok(actor) => out_events.push(Event::ActorSpawned {
                    actor,
                    species,
                    position,
                }),
                Err(reason) => out_events.push(Event::SpawnRejected {
                    species,
                    position,
                    reason,
                }),
            }
        }
        Command::RemoveActor { actor, cause } => {
            if let Some(index) = world.actors.iter().position(|slot| slot.id == actor) {
                let removed = world.actors.remove(index);
                out_events.push(Event::ActorRemoved {
                    actor,
                    species: removed.species,
                    cause,
                });
            }
        }
        Command::ReportStimulus { stimulus } => {
            out_events.push(Event::StimulusObserved { stimulus });
        }
        Command::StartSession { opening } => out_events.push(Event::SessionStarted { opening }),
        Command::EndSession => out_events.push(Event::SessionEnded),
        Command::EnterSafeArea => out_events.push(Event::SafeAreaEntered),
        Command::ExitSafeArea => out_events.push(Event::SafeAreaExited),
        Command::StartCrescendo { config } => {
            out_events.push(Event::CrescendoRequested { config });
        }
        Command::CancelCrescendo => out_events.push(Event::CrescendoCancelled),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::{segment_hits_box, World};
    use horde_director_core::{ActorId, Occluder, PlayerView, SpawnPoint, Species, Vec3};

    /// Captures a read-only view of the connected players.
    #[must_use]
    pub fn players(world: &World) -> PlayerView {
        PlayerView::from_snapshots(world.players.clone())
    }

    /// Provides read-only access to the registered spawn markers.
    #[must_use]
    pub fn spawn_markers(world: &World) -> &[SpawnPoint] {
        &world.markers
    }

    /// Provides read-only access to the occluding geometry.
    #[must_use]
    pub fn occluders(world: &World) -> &[Occluder] {
        &world.occluders
    }

    /// Captures the live actors in allocation order.
    #[must_use]
    pub fn actors(world: &World) -> Vec<ActorSnapshot> {
        world
            .actors
            .iter()
            .map(|actor| ActorSnapshot {
                id: actor.id,
                species: actor.species,
                position: actor.position,
            })
            .collect()
    }

    /// Number of live actors of `species`.
    #[must_use]
    pub fn actor_count(world: &World, species: Species) -> usize {
        world
            .actors
            .iter()
            .filter(|actor| actor.species == species)
            .count()
    }

    /// Reports whether any occluder blocks the segment between `from` and `to`.
    #[must_use]
    pub fn is_occluded(world: &World, from: Vec3, to: Vec3) -> bool {
        world
            .occluders
            .iter()
            .any(|occluder| segment_hits_box(from, to, occluder.min(), occluder.max()))
    }

    /// Reports whether any live actor is within `radius` of any player.
    #[must_use]
    pub fn combat_engaged(world: &World, radius: f32) -> bool {
        let radius_sq = radius * radius;
        world.players.iter().any(|player| {
            world
                .actors
                .iter()
                .any(|actor| actor.position.distance_squared(player.position) <= radius_sq)
        })
    }

    /// Total simulated time applied through [`Command::Tick`](horde_director_core::Command::Tick).
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }

    /// Immutable representation of a live actor used for queries.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct ActorSnapshot {
        /// Handle allocated when the actor spawned.
        pub id: ActorId,
        /// Archetype of the actor.
        pub species: Species,
        /// Position the actor was placed at.
        pub position: Vec3,
    }
}

#[derive(Clone, Copy, Debug)]
struct Actor {
    id: ActorId,
    species: Species,
    position: Vec3,
}

fn segment_hits_box(from: Vec3, to: Vec3, min: Vec3, max: Vec3) -> bool {
    let delta = to - from;
    let mut t_enter = 0.0_f32;
    let mut t_exit = 1.0_f32;

    for axis in 0..3 {
        let origin = from[axis];
        let direction = delta[axis];
        if direction.abs() <= f32::EPSILON {
            if origin < min[axis] || origin > max[axis] {
                return false;
            }
            continue;
        }

        let inverse = 1.0 / direction;
        let mut near = (min[axis] - origin) * inverse;
        let mut far = (max[axis] - origin) * inverse;
        if near > far {
            std::mem::swap(&mut near, &mut far);
        }
        t_enter = t_enter.max(near);
        t_exit = t_exit.min(far);
        if t_enter > t_exit {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use horde_director_core::{PlayerId, RemovalCause, SpecialKind, Stimulus};

    fn wall() -> Occluder {
        Occluder::from_corners(Vec3::new(10.0, -5.0, -5.0), Vec3::new(12.0, 5.0, 5.0))
    }

    #[test]
    fn segment_through_box_is_occluded() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceOccluder { occluder: wall() },
            &mut events,
        );

        assert!(query::is_occluded(&world, Vec3::ZERO, Vec3::new(20.0, 0.0, 0.0)));
        assert!(!query::is_occluded(&world, Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0)));
        assert!(!query::is_occluded(&world, Vec3::ZERO, Vec3::new(0.0, 0.0, 20.0)));
        assert!(!query::is_occluded(
            &world,
            Vec3::new(0.0, 10.0, 0.0),
            Vec3::new(20.0, 10.0, 0.0)
        ));
        assert!(events.is_empty());
    }

    #[test]
    fn spawned_actors_receive_sequential_handles() {
        let mut world = World::new();
        let mut events = Vec::new();
        for _ in 0..2 {
            apply(
                &mut world,
                Command::SpawnActor {
                    species: Species::Common,
                    position: Vec3::ONE,
                },
                &mut events,
            );
        }

        let handles: Vec<u32> = events
            .iter()
            .filter_map(|event| match event {
                Event::ActorSpawned { actor, .. } => Some(actor.get()),
                _ => None,
            })
            .collect();
        assert_eq!(handles, vec![0, 1]);
        assert_eq!(query::actor_count(&world, Species::Common), 2);
    }

    #[test]
    fn spawn_rejections_are_reported() {
        let mut world = World::with_actor_limit(1);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnActor {
                species: Species::Boss,
                position: Vec3::new(f32::NAN, 0.0, 0.0),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::SpawnActor {
                species: Species::Boss,
                position: Vec3::ZERO,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::SpawnActor {
                species: Species::Boss,
                position: Vec3::ZERO,
            },
            &mut events,
        );

        assert!(matches!(
            events[0],
            Event::SpawnRejected {
                reason: SpawnRejection::InvalidPosition,
                ..
            }
        ));
        assert!(matches!(events[1], Event::ActorSpawned { .. }));
        assert!(matches!(
            events[2],
            Event::SpawnRejected {
                reason: SpawnRejection::ActorLimit,
                ..
            }
        ));
    }

    #[test]
    fn removal_reports_species_once() {
        let mut world = World::new();
        let mut events = Vec::new();
        let species = Species::Special(SpecialKind::Spitter);
        apply(
            &mut world,
            Command::SpawnActor {
                species,
                position: Vec3::ZERO,
            },
            &mut events,
        );
        events.clear();

        for _ in 0..2 {
            apply(
                &mut world,
                Command::RemoveActor {
                    actor: ActorId::new(0),
                    cause: RemovalCause::Killed,
                },
                &mut events,
            );
        }

        assert_eq!(
            events,
            vec![Event::ActorRemoved {
                actor: ActorId::new(0),
                species,
                cause: RemovalCause::Killed,
            }]
        );
    }

    #[test]
    fn player_slots_are_limited() {
        let mut world = World::new();
        let mut events = Vec::new();
        for id in 0..6 {
            apply(
                &mut world,
                Command::PlacePlayer {
                    player: PlayerSnapshot::alive(PlayerId::new(id), Vec3::ZERO, Vec3::Z),
                },
                &mut events,
            );
        }
        assert_eq!(query::players(&world).len(), MAX_PLAYERS);
        assert_eq!(events.len(), MAX_PLAYERS);

        apply(
            &mut world,
            Command::PlacePlayer {
                player: PlayerSnapshot::alive(PlayerId::new(0), Vec3::ONE, Vec3::Z),
            },
            &mut events,
        );
        let moved = query::players(&world)
            .iter()
            .find(|player| player.id == PlayerId::new(0))
            .map(|player| player.position);
        assert_eq!(moved, Some(Vec3::ONE));
    }

    #[test]
    fn combat_requires_actor_near_a_player() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlacePlayer {
                player: PlayerSnapshot::alive(PlayerId::new(1), Vec3::ZERO, Vec3::Z),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::SpawnActor {
                species: Species::Common,
                position: Vec3::new(50.0, 0.0, 0.0),
            },
            &mut events,
        );
        assert!(!query::combat_engaged(&world, 30.0));

        apply(
            &mut world,
            Command::SpawnActor {
                species: Species::Common,
                position: Vec3::new(25.0, 0.0, 0.0),
            },
            &mut events,
        );
        assert!(query::combat_engaged(&world, 30.0));
    }

    #[test]
    fn stimuli_and_overrides_are_relayed() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ReportStimulus {
                stimulus: Stimulus::NearbyKill,
            },
            &mut events,
        );
        apply(&mut world, Command::EnterSafeArea, &mut events);
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(250),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![
                Event::StimulusObserved {
                    stimulus: Stimulus::NearbyKill
                },
                Event::SafeAreaEntered,
                Event::TimeAdvanced {
                    dt: Duration::from_millis(250)
                },
            ]
        );
        assert_eq!(query::elapsed(&world), Duration::from_millis(250));
    }
}
