use std::time::Duration;

use horde_director_core::CrescendoConfig;
use horde_director_system_crescendo::{
    CrescendoError, CrescendoRequest, CrescendoScheduler, CrescendoTick,
};

fn run_for(scheduler: &mut CrescendoScheduler, total: Duration, dt: Duration) -> Vec<CrescendoTick> {
    let mut elapsed = Duration::ZERO;
    let mut ticks = Vec::new();
    while elapsed < total {
        ticks.push(scheduler.tick(dt));
        elapsed += dt;
    }
    ticks
}

fn requests(ticks: &[CrescendoTick]) -> Vec<CrescendoRequest> {
    ticks
        .iter()
        .flat_map(|tick| tick.requests.iter().copied())
        .collect()
}

#[test]
fn four_waves_fire_by_one_hundred_twenty_five_seconds() {
    let mut scheduler = CrescendoScheduler::new(5);
    scheduler
        .start(CrescendoConfig::default())
        .expect("default crescendo starts");

    let ticks = run_for(
        &mut scheduler,
        Duration::from_secs(125),
        Duration::from_millis(100),
    );
    let fired = requests(&ticks);

    let waves: Vec<u32> = fired
        .iter()
        .filter_map(|request| match request {
            CrescendoRequest::CommonWave { wave, .. } => Some(*wave),
            _ => None,
        })
        .collect();
    assert_eq!(waves, vec![1, 2, 3, 4]);

    let bosses: Vec<&CrescendoRequest> = fired
        .iter()
        .filter(|request| matches!(request, CrescendoRequest::Boss { .. }))
        .collect();
    assert_eq!(bosses, vec![&CrescendoRequest::Boss { wave: 4 }]);

    assert!(fired.contains(&CrescendoRequest::Special { wave: 2 }));
    assert!(ticks.iter().all(|tick| !tick.completed));

    let progress = scheduler.progress().expect("crescendo still running");
    assert_eq!(progress.waves_fired, 4, "wave five is still pending");
    assert!(progress.boss_requested);
}

#[test]
fn wave_sizes_stay_within_the_configured_range() {
    let config = CrescendoConfig {
        wave_size_min: 3,
        wave_size_max: 6,
        ..CrescendoConfig::default()
    };
    for seed in 0..20 {
        let mut scheduler = CrescendoScheduler::new(seed);
        scheduler.start(config.clone()).expect("valid config");
        let ticks = run_for(&mut scheduler, Duration::from_secs(180), Duration::from_secs(1));
        for request in requests(&ticks) {
            if let CrescendoRequest::CommonWave { size, .. } = request {
                assert!((3..=6).contains(&size), "wave size {size} out of range");
            }
        }
    }
}

#[test]
fn completion_drops_the_runtime() {
    let mut scheduler = CrescendoScheduler::new(1);
    scheduler
        .start(CrescendoConfig::default())
        .expect("default crescendo starts");

    let ticks = run_for(&mut scheduler, Duration::from_secs(180), Duration::from_secs(1));
    let completed: Vec<usize> = ticks
        .iter()
        .enumerate()
        .filter(|(_, tick)| tick.completed)
        .map(|(index, _)| index)
        .collect();
    assert_eq!(completed, vec![179], "completion reported exactly once at 180 s");
    assert_eq!(
        requests(&ticks)
            .iter()
            .filter(|request| matches!(request, CrescendoRequest::CommonWave { .. }))
            .count(),
        5
    );
    assert!(!scheduler.is_running());
    assert_eq!(scheduler.tick(Duration::from_secs(30)), CrescendoTick::default());
}

#[test]
fn wave_count_bounds_firing_even_with_time_left() {
    let config = CrescendoConfig {
        duration_secs: 300.0,
        wave_count: 2,
        wave_interval_secs: 10.0,
        ..CrescendoConfig::default()
    };
    let mut scheduler = CrescendoScheduler::new(2);
    scheduler.start(config).expect("valid config");

    let tick = scheduler.tick(Duration::from_secs(100));
    let waves = tick
        .requests
        .iter()
        .filter(|request| matches!(request, CrescendoRequest::CommonWave { .. }))
        .count();
    assert_eq!(waves, 2);
    assert!(!tick.completed);
}

#[test]
fn long_tick_fires_every_overdue_wave_in_order() {
    let mut scheduler = CrescendoScheduler::new(3);
    scheduler
        .start(CrescendoConfig::default())
        .expect("default crescendo starts");

    let tick = scheduler.tick(Duration::from_secs(200));
    let waves: Vec<u32> = tick
        .requests
        .iter()
        .filter_map(|request| match request {
            CrescendoRequest::CommonWave { wave, .. } => Some(*wave),
            _ => None,
        })
        .collect();
    assert_eq!(waves, vec![1, 2, 3, 4, 5]);
    assert!(tick.completed);
}

#[test]
fn second_start_is_rejected_while_running() {
    let mut scheduler = CrescendoScheduler::new(4);
    scheduler
        .start(CrescendoConfig::default())
        .expect("default crescendo starts");
    let _ = scheduler.tick(Duration::from_secs(40));

    assert_eq!(
        scheduler.start(CrescendoConfig::default()),
        Err(CrescendoError::AlreadyRunning)
    );
    let progress = scheduler.progress().expect("first crescendo continues");
    assert_eq!(progress.elapsed, Duration::from_secs(40));
    assert_eq!(progress.waves_fired, 1);
}

#[test]
fn cancel_discards_state_and_allows_a_fresh_run() {
    let mut scheduler = CrescendoScheduler::new(6);
    scheduler
        .start(CrescendoConfig::default())
        .expect("default crescendo starts");
    let _ = scheduler.tick(Duration::from_secs(125));

    assert!(scheduler.cancel());
    assert!(!scheduler.cancel());
    assert!(scheduler.progress().is_none());

    scheduler
        .start(CrescendoConfig::default())
        .expect("restart after cancel");
    let tick = scheduler.tick(Duration::from_secs(125));
    assert!(
        tick.requests.contains(&CrescendoRequest::Boss { wave: 4 }),
        "boss flag does not survive across runs"
    );
}

#[test]
fn invalid_configs_do_not_start() {
    let mut scheduler = CrescendoScheduler::new(8);
    let config = CrescendoConfig {
        duration_secs: 0.0,
        ..CrescendoConfig::default()
    };
    assert!(matches!(
        scheduler.start(config),
        Err(CrescendoError::InvalidConfig(_))
    ));
    assert!(!scheduler.is_running());
}
