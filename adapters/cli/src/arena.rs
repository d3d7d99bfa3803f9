use std::f32::consts::TAU;

use horde_director_core::{
    Command, Occluder, PlayerId, PlayerSnapshot, SpawnCategory, SpawnPoint, Vec3,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const ARENA_SALT: u64 = 0xa7e0_a5a1;
const SURVIVORS: u32 = 4;
const PILLARS: usize = 48;
const COMMON_MARKERS: usize = 80;
const SPECIAL_MARKERS: usize = 24;
const AMBIENT_MARKERS: usize = 12;

/// Commands that build a procedurally generated open arena.
///
/// Survivors start in a tight square at the origin facing `+Z`, surrounded by
/// pillars that break sightlines and by spawn markers scattered around them.
pub(crate) fn generate(seed: u64) -> Vec<Command> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ ARENA_SALT);
    let mut commands = Vec::new();

    for index in 0..SURVIVORS {
        let offset = Vec3::new((index % 2) as f32 * 3.0, 0.0, (index / 2) as f32 * 3.0);
        commands.push(Command::PlacePlayer {
            player: PlayerSnapshot::alive(PlayerId::new(index), offset, Vec3::Z),
        });
    }

    for _ in 0..PILLARS {
        let centre = ring_position(&mut rng, 25.0, 160.0);
        let half = Vec3::new(rng.gen_range(2.0..8.0), 6.0, rng.gen_range(2.0..8.0));
        commands.push(Command::PlaceOccluder {
            occluder: Occluder::from_corners(centre - half, centre + half),
        });
    }

    let markers = [
        (SpawnCategory::Common, COMMON_MARKERS, 30.0),
        (SpawnCategory::Special, SPECIAL_MARKERS, 50.0),
        (SpawnCategory::Ambient, AMBIENT_MARKERS, 30.0),
    ];
    for (category, count, inner) in markers {
        for _ in 0..count {
            let position = ring_position(&mut rng, inner, 180.0);
            commands.push(Command::RegisterSpawnMarker {
                point: SpawnPoint::new(position, category),
            });
        }
    }

    commands
}

fn ring_position(rng: &mut ChaCha8Rng, inner: f32, outer: f32) -> Vec3 {
    let angle = rng.gen_range(0.0..TAU);
    let radius = rng.gen_range(inner..outer);
    Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius)
}
