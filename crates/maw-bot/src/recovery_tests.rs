#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Duration as ChronoDuration;
    use maw_store::{EntityStore, MemoryStore, MockClock, WallClock};
    use maw_types::{
        Participant, ParticipantId, ParticipantStats, Relationship, RelationshipStatus, Role,
    };

    use crate::recovery::{health_gain, Recovery, RecoveryJob, SweepGuard, SweepReport};

    const PRED: ParticipantId = ParticipantId(1);
    const PREY: ParticipantId = ParticipantId(2);

    fn stats(id: ParticipantId) -> ParticipantStats {
        ParticipantStats {
            participant: id,
            health: 100,
            arousal: 0,
            digestion: 5,
            defiance: 5,
            euphoria: 0,
            resistance: 0,
            acids: 0,
            strength: 0,
        }
    }

    // ── health_gain ───────────────────────────────────────────────────────────

    #[test]
    fn test_gain_tiers() {
        let pred = stats(PRED);
        let mut prey = stats(PREY);

        prey.defiance = 10;
        assert_eq!(health_gain(&prey, &pred), Recovery::Gain(5));
        prey.defiance = 5;
        assert_eq!(health_gain(&prey, &pred), Recovery::Gain(3));
        prey.defiance = 3;
        assert_eq!(health_gain(&prey, &pred), Recovery::Gain(1));
    }

    #[test]
    fn test_gain_clamped_to_max() {
        let pred = stats(PRED);
        let mut prey = stats(PREY);
        prey.defiance = 10;
        prey.health = 110;
        assert_eq!(health_gain(&prey, &pred), Recovery::Gain(5));
        prey.health = 112;
        assert_eq!(health_gain(&prey, &pred), Recovery::Gain(3));
    }

    #[test]
    fn test_full_health_gains_nothing() {
        let pred = stats(PRED);
        let mut prey = stats(PREY);
        prey.health = 115;
        for defiance in [0, 5, 10] {
            prey.defiance = defiance;
            assert_eq!(health_gain(&prey, &pred), Recovery::AtFull);
        }
    }

    #[test]
    fn test_arousal_suppresses_healing() {
        let mut pred = stats(PRED);
        let mut prey = stats(PREY);
        pred.resistance = 10;
        prey.arousal = 50;
        prey.euphoria = 20;
        for (defiance, digestion) in [(10, 5), (5, 5), (3, 5)] {
            prey.defiance = defiance;
            pred.digestion = digestion;
            assert_eq!(health_gain(&prey, &pred), Recovery::Suppressed);
        }
    }

    #[test]
    fn test_euphoric_prey_still_heals_when_aroused() {
        let mut pred = stats(PRED);
        let mut prey = stats(PREY);
        pred.resistance = 10;
        prey.arousal = 50;
        prey.defiance = 0;
        prey.euphoria = 60;
        pred.digestion = 5;
        assert_eq!(health_gain(&prey, &pred), Recovery::Gain(1));
    }

    #[test]
    fn test_arousal_at_threshold_does_not_suppress() {
        let mut pred = stats(PRED);
        let mut prey = stats(PREY);
        pred.resistance = 10;
        prey.arousal = 35;
        assert_eq!(health_gain(&prey, &pred), Recovery::Gain(3));
    }

    // ── sweep ─────────────────────────────────────────────────────────────────

    fn participant(id: ParticipantId, name: &str, user_id: u64) -> Participant {
        Participant {
            id,
            user_id,
            active: true,
            busy: false,
            name: name.into(),
            role: Role::Switch,
            description: String::new(),
            gender: String::new(),
            species: String::new(),
            weight: 0,
            height: 0,
            whitelist: vec![],
            blacklist: vec![],
            autodigest: false,
        }
    }

    async fn seeded(prey_stats: ParticipantStats, idle: ChronoDuration) -> (Arc<MemoryStore>, Relationship) {
        let store = Arc::new(MemoryStore::new());
        store.put_participant(&participant(PRED, "Rex", 11)).await.unwrap();
        store.put_participant(&participant(PREY, "Mira", 22)).await.unwrap();
        store.put_stats(&stats(PRED)).await.unwrap();
        store.put_stats(&prey_stats).await.unwrap();

        let rel = Relationship::begin(PRED, PREY, store.clock().now() - idle);
        store.seed_relationship(rel.clone());
        (store, rel)
    }

    fn job(store: &Arc<MemoryStore>) -> RecoveryJob<MemoryStore, MockClock> {
        RecoveryJob::new(store.clone(), store.clock().clone(), ChronoDuration::hours(6), 4)
    }

    async fn prey_health(store: &MemoryStore) -> i32 {
        store.stats(PREY).await.unwrap().unwrap().health
    }

    #[tokio::test]
    async fn test_sweep_heals_idle_prey() {
        let mut prey = stats(PREY);
        prey.defiance = 10;
        let (store, rel) = seeded(prey, ChronoDuration::hours(7)).await;

        let report = job(&store).sweep().await.unwrap().unwrap();

        assert_eq!(
            report,
            SweepReport {
                examined: 1,
                healed: 1,
                ..SweepReport::default()
            }
        );
        assert_eq!(prey_health(&store).await, 105);
        // Status and timestamp untouched.
        assert_eq!(store.relationship(rel.id).await.unwrap(), Some(rel));
    }

    #[tokio::test]
    async fn test_sweep_ignores_recent_and_inactive() {
        let (store, _) = seeded(stats(PREY), ChronoDuration::hours(5)).await;
        let mut resolved = Relationship::begin(PRED, PREY, store.clock().now() - ChronoDuration::days(1));
        resolved.status = RelationshipStatus::Resolved;
        store.seed_relationship(resolved);

        let report = job(&store).sweep().await.unwrap().unwrap();

        assert_eq!(report.examined, 0);
        assert_eq!(prey_health(&store).await, 100);
    }

    #[tokio::test]
    async fn test_sweep_threshold_is_inclusive() {
        let (store, _) = seeded(stats(PREY), ChronoDuration::hours(6)).await;
        let report = job(&store).sweep().await.unwrap().unwrap();
        assert_eq!(report.healed, 1);
    }

    #[tokio::test]
    async fn test_sweep_isolates_item_failures() {
        let (store, _) = seeded(stats(PREY), ChronoDuration::hours(7)).await;
        // A second pairing whose prey stats cannot be read.
        let broken = ParticipantId(3);
        store.put_participant(&participant(broken, "Ash", 33)).await.unwrap();
        store.fail_stats_for(broken);
        store.seed_relationship(Relationship::begin(
            PRED,
            broken,
            store.clock().now() - ChronoDuration::hours(8),
        ));

        let report = job(&store).sweep().await.unwrap().unwrap();

        assert_eq!(report.examined, 2);
        assert_eq!(report.healed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(prey_health(&store).await, 103);
    }

    #[tokio::test]
    async fn test_sweep_counts_suppressed_and_full() {
        let mut prey = stats(PREY);
        prey.health = 115;
        let (store, _) = seeded(prey, ChronoDuration::hours(7)).await;
        let report = job(&store).sweep().await.unwrap().unwrap();
        assert_eq!(report.at_full, 1);
        assert_eq!(prey_health(&store).await, 115);

        let mut prey = stats(PREY);
        prey.arousal = 80;
        let (store, _) = seeded(prey, ChronoDuration::hours(7)).await;
        let report = job(&store).sweep().await.unwrap().unwrap();
        assert_eq!(report.suppressed, 1);
        assert_eq!(prey_health(&store).await, 100);
    }

    #[tokio::test]
    async fn test_overlapping_sweep_is_skipped() {
        let (store, _) = seeded(stats(PREY), ChronoDuration::hours(7)).await;
        let job = job(&store);

        let guard = SweepGuard::acquire(&job.running).unwrap();
        assert_eq!(job.sweep().await.unwrap(), None);
        drop(guard);

        assert!(job.sweep().await.unwrap().is_some());
        assert_eq!(prey_health(&store).await, 103);
    }

    #[tokio::test]
    async fn test_sweep_records_last_sweep() {
        let (store, _) = seeded(stats(PREY), ChronoDuration::hours(7)).await;
        let last = crate::recovery::LastSweep::default();
        let job = job(&store).with_last_sweep(last.clone());
        job.sweep().await.unwrap();
        assert_eq!(*last.read().await, Some(store.clock().now()));
    }

    // ── run loop ──────────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_run_sweeps_each_interval_until_shutdown() {
        let (store, _) = seeded(stats(PREY), ChronoDuration::hours(7)).await;
        let job = Arc::new(job(&store));
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

        let handle = tokio::spawn(job.run(Duration::from_secs(60), async move {
            let _ = stop_rx.await;
        }));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(prey_health(&store).await, 100);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(prey_health(&store).await, 103);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(prey_health(&store).await, 106);

        stop_tx.send(()).unwrap();
        handle.await.unwrap();
    }
}
