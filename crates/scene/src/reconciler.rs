use citygrid_common::{BuildingTier, TileCoord, VisualKind};
use citygrid_kernel::{CityId, CitySnapshot};
use std::collections::BTreeMap;

use crate::factory::{FailureSink, SceneHost, TracingSink, VisualFactory, VisualFailure};

/// Errors that stop a sync before any tile is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    #[error("scene has not been materialized")]
    NotMaterialized,
    #[error("snapshot belongs to city {found:?}, scene was built for {expected:?}")]
    ForeignSnapshot { expected: CityId, found: CityId },
}

/// Visuals currently standing for one tile.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualBinding<H> {
    terrain: Option<H>,
    building: Option<H>,
    tier: Option<BuildingTier>,
}

impl<H> VisualBinding<H> {
    fn empty() -> Self {
        Self {
            terrain: None,
            building: None,
            tier: None,
        }
    }

    pub fn terrain(&self) -> Option<&H> {
        self.terrain.as_ref()
    }

    pub fn building(&self) -> Option<&H> {
        self.building.as_ref()
    }

    /// Tier the reconciler last brought this tile to. A tier may be recorded
    /// with no building handle if its visual could not be created.
    pub fn tier(&self) -> Option<BuildingTier> {
        self.tier
    }
}

/// Host operations issued by one reconciler call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: usize,
    pub removed: usize,
    pub failed: usize,
}

impl ReconcileReport {
    /// True when the host was left untouched and nothing failed.
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}

/// Keeps a scene host in step with city snapshots.
///
/// Owns the only copy of the coordinate → handle table. Each `sync` compares
/// a snapshot against the tiers recorded in that table and touches the host
/// only for tiles whose building tier changed. Visual failures are handed to
/// the sink and never stop the remaining tiles.
pub struct SceneReconciler<F: VisualFactory, S = TracingSink> {
    factory: F,
    sink: S,
    city: Option<CityId>,
    bindings: BTreeMap<TileCoord, VisualBinding<F::Handle>>,
}

impl<F: VisualFactory> SceneReconciler<F, TracingSink> {
    /// Reconciler that logs visual failures.
    pub fn new(factory: F) -> Self {
        Self::with_sink(factory, TracingSink)
    }
}

impl<F: VisualFactory, S: FailureSink> SceneReconciler<F, S> {
    pub fn with_sink(factory: F, sink: S) -> Self {
        Self {
            factory,
            sink,
            city: None,
            bindings: BTreeMap::new(),
        }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// City the current bindings were built for.
    pub fn city(&self) -> Option<CityId> {
        self.city
    }

    pub fn binding(&self, coord: TileCoord) -> Option<&VisualBinding<F::Handle>> {
        self.bindings.get(&coord)
    }

    /// All bindings in coordinate order.
    pub fn bindings(&self) -> impl Iterator<Item = (&TileCoord, &VisualBinding<F::Handle>)> {
        self.bindings.iter()
    }

    /// Number of handles currently bound, terrain and building together.
    pub fn bound_count(&self) -> usize {
        self.bindings
            .values()
            .map(|b| b.terrain.is_some() as usize + b.building.is_some() as usize)
            .sum()
    }

    /// Remove every bound visual from `host` and forget all bindings.
    pub fn clear(&mut self, host: &mut impl SceneHost<F::Handle>) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        for binding in std::mem::take(&mut self.bindings).into_values() {
            for handle in [binding.building, binding.terrain].into_iter().flatten() {
                host.remove(&handle);
                report.removed += 1;
            }
        }
        self.city = None;
        report
    }

    /// Build the initial scene: one terrain visual per tile.
    ///
    /// Anything bound from an earlier city is removed first. No building
    /// visuals are created here; recorded tiers start absent, so a snapshot
    /// that already carries buildings is brought up to date by the next
    /// `sync`.
    pub fn materialize_all(
        &mut self,
        snapshot: &CitySnapshot,
        host: &mut impl SceneHost<F::Handle>,
    ) -> ReconcileReport {
        let mut report = self.clear(host);
        let Self {
            factory,
            sink,
            bindings,
            ..
        } = &mut *self;

        for tile in snapshot.tiles() {
            let kind = VisualKind::Terrain(tile.terrain);
            let terrain = match factory.create(kind, tile.coord) {
                Ok(handle) => {
                    host.add(&handle);
                    report.created += 1;
                    Some(handle)
                }
                Err(error) => {
                    sink.report(VisualFailure {
                        coord: tile.coord,
                        kind,
                        error,
                    });
                    report.failed += 1;
                    None
                }
            };
            bindings.insert(
                tile.coord,
                VisualBinding {
                    terrain,
                    ..VisualBinding::empty()
                },
            );
        }
        self.city = Some(snapshot.city_id());

        tracing::info!(
            tiles = snapshot.tiles().len(),
            created = report.created,
            failed = report.failed,
            "scene materialized"
        );
        report
    }

    /// Bring building visuals in line with `snapshot`.
    ///
    /// Tiles whose tier matches the recorded one are skipped. For the rest
    /// the bound building visual (if any) is removed, a visual for the new
    /// tier (if any) is created and added, and the new tier is recorded even
    /// when creation failed. Terrain visuals are never touched.
    pub fn sync(
        &mut self,
        snapshot: &CitySnapshot,
        host: &mut impl SceneHost<F::Handle>,
    ) -> Result<ReconcileReport, SceneError> {
        let expected = self.city.ok_or(SceneError::NotMaterialized)?;
        if snapshot.city_id() != expected {
            return Err(SceneError::ForeignSnapshot {
                expected,
                found: snapshot.city_id(),
            });
        }

        let mut report = ReconcileReport::default();
        let Self {
            factory,
            sink,
            bindings,
            ..
        } = &mut *self;

        for tile in snapshot.tiles() {
            let binding = bindings
                .entry(tile.coord)
                .or_insert_with(VisualBinding::empty);
            if binding.tier == tile.building {
                continue;
            }

            if let Some(old) = binding.building.take() {
                host.remove(&old);
                report.removed += 1;
            }

            if let Some(tier) = tile.building {
                let kind = VisualKind::Building(tier);
                match factory.create(kind, tile.coord) {
                    Ok(handle) => {
                        host.add(&handle);
                        binding.building = Some(handle);
                        report.created += 1;
                    }
                    Err(error) => {
                        sink.report(VisualFailure {
                            coord: tile.coord,
                            kind,
                            error,
                        });
                        report.failed += 1;
                    }
                }
            }
            binding.tier = tile.building;
        }

        if !report.is_noop() {
            tracing::debug!(
                tick = snapshot.tick(),
                created = report.created,
                removed = report.removed,
                failed = report.failed,
                "scene synced"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::VisualError;
    use citygrid_kernel::{City, CityConfig};
    use std::cell::RefCell;
    use std::collections::HashSet;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    struct FakeVisual {
        kind: VisualKind,
        coord: TileCoord,
    }

    /// Factory that records every request and fails for `missing` kinds.
    #[derive(Default)]
    struct FakeFactory {
        missing: Vec<VisualKind>,
        calls: RefCell<Vec<(VisualKind, TileCoord)>>,
    }

    impl FakeFactory {
        fn without(kind: VisualKind) -> Self {
            Self {
                missing: vec![kind],
                ..Self::default()
            }
        }

        fn take_calls(&self) -> Vec<(VisualKind, TileCoord)> {
            std::mem::take(&mut *self.calls.borrow_mut())
        }
    }

    impl VisualFactory for FakeFactory {
        type Handle = FakeVisual;

        fn create(&self, kind: VisualKind, coord: TileCoord) -> Result<FakeVisual, VisualError> {
            self.calls.borrow_mut().push((kind, coord));
            if self.missing.contains(&kind) {
                return Err(VisualError::UnknownKind(kind));
            }
            Ok(FakeVisual { kind, coord })
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Add(FakeVisual),
        Remove(FakeVisual),
    }

    /// Host that records operations and checks it is never asked to remove
    /// something it does not hold.
    #[derive(Default)]
    struct RecordingHost {
        live: HashSet<FakeVisual>,
        ops: Vec<Op>,
    }

    impl RecordingHost {
        fn take_ops(&mut self) -> Vec<Op> {
            std::mem::take(&mut self.ops)
        }
    }

    impl SceneHost<FakeVisual> for RecordingHost {
        fn add(&mut self, handle: &FakeVisual) {
            assert!(self.live.insert(handle.clone()), "duplicate add {handle:?}");
            self.ops.push(Op::Add(handle.clone()));
        }

        fn remove(&mut self, handle: &FakeVisual) {
            assert!(self.live.remove(handle), "removed unbound {handle:?}");
            self.ops.push(Op::Remove(handle.clone()));
        }
    }

    fn tier1() -> VisualKind {
        VisualKind::Building(BuildingTier::Tier1)
    }

    fn building(tier: BuildingTier, x: u32, y: u32) -> FakeVisual {
        FakeVisual {
            kind: VisualKind::Building(tier),
            coord: TileCoord::new(x, y),
        }
    }

    fn materialized(
        size: u32,
        factory: FakeFactory,
    ) -> (
        CitySnapshot,
        SceneReconciler<FakeFactory, Vec<VisualFailure>>,
        RecordingHost,
    ) {
        let snap = City::new(size).unwrap().snapshot();
        let mut rec = SceneReconciler::with_sink(factory, Vec::new());
        let mut host = RecordingHost::default();
        rec.materialize_all(&snap, &mut host);
        rec.factory().take_calls();
        host.take_ops();
        (snap, rec, host)
    }

    #[test]
    fn materialize_creates_one_terrain_per_tile() {
        let snap = City::new(3).unwrap().snapshot();
        let mut rec = SceneReconciler::with_sink(FakeFactory::default(), Vec::new());
        let mut host = RecordingHost::default();
        let report = rec.materialize_all(&snap, &mut host);

        assert_eq!(report.created, 9);
        assert_eq!(report.removed, 0);
        assert_eq!(host.live.len(), 9);
        assert!(host.live.iter().all(|v| matches!(v.kind, VisualKind::Terrain(_))));
        assert_eq!(rec.bound_count(), 9);
        assert_eq!(rec.city(), Some(snap.city_id()));
        for tile in snap.tiles() {
            let b = rec.binding(tile.coord).unwrap();
            assert!(b.terrain().is_some());
            assert!(b.building().is_none());
            assert_eq!(b.tier(), None);
        }
    }

    #[test]
    fn sync_before_materialize_fails() {
        let snap = City::new(2).unwrap().snapshot();
        let mut rec = SceneReconciler::with_sink(FakeFactory::default(), Vec::new());
        let mut host = RecordingHost::default();
        assert_eq!(rec.sync(&snap, &mut host), Err(SceneError::NotMaterialized));
        assert!(host.ops.is_empty());
    }

    #[test]
    fn sync_rejects_snapshot_from_another_city() {
        let (snap, mut rec, mut host) = materialized(2, FakeFactory::default());
        let other = City::new(2).unwrap().snapshot();
        assert_eq!(
            rec.sync(&other, &mut host),
            Err(SceneError::ForeignSnapshot {
                expected: snap.city_id(),
                found: other.city_id(),
            })
        );
        assert!(host.ops.is_empty());
    }

    #[test]
    fn new_building_is_created_and_added_once() {
        let (snap, mut rec, mut host) = materialized(2, FakeFactory::default());
        let next = snap.with_building(TileCoord::new(0, 0), Some(BuildingTier::Tier1)).unwrap();

        let report = rec.sync(&next, &mut host).unwrap();

        assert_eq!(
            rec.factory().take_calls(),
            vec![(tier1(), TileCoord::new(0, 0))]
        );
        assert_eq!(
            host.take_ops(),
            vec![Op::Add(building(BuildingTier::Tier1, 0, 0))]
        );
        assert_eq!(
            report,
            ReconcileReport {
                created: 1,
                removed: 0,
                failed: 0
            }
        );
    }

    #[test]
    fn demolished_building_is_removed_once() {
        let (snap, mut rec, mut host) = materialized(2, FakeFactory::default());
        let coord = TileCoord::new(1, 1);
        let built = snap.with_building(coord, Some(BuildingTier::Tier2)).unwrap();
        rec.sync(&built, &mut host).unwrap();
        rec.factory().take_calls();
        host.take_ops();

        let cleared = built.with_building(coord, None).unwrap();
        let report = rec.sync(&cleared, &mut host).unwrap();

        assert!(rec.factory().take_calls().is_empty());
        assert_eq!(
            host.take_ops(),
            vec![Op::Remove(building(BuildingTier::Tier2, 1, 1))]
        );
        assert_eq!(report.removed, 1);
        assert_eq!(report.created, 0);
        assert!(rec.binding(coord).unwrap().building().is_none());
        assert_eq!(rec.binding(coord).unwrap().tier(), None);
    }

    #[test]
    fn tier_upgrade_replaces_visual() {
        let (snap, mut rec, mut host) = materialized(2, FakeFactory::default());
        let coord = TileCoord::new(0, 1);
        let t1 = snap.with_building(coord, Some(BuildingTier::Tier1)).unwrap();
        let t2 = t1.with_building(coord, Some(BuildingTier::Tier2)).unwrap();
        rec.sync(&t1, &mut host).unwrap();
        host.take_ops();

        rec.sync(&t2, &mut host).unwrap();
        assert_eq!(
            host.take_ops(),
            vec![
                Op::Remove(building(BuildingTier::Tier1, 0, 1)),
                Op::Add(building(BuildingTier::Tier2, 0, 1)),
            ]
        );
        assert_eq!(
            rec.binding(coord).unwrap().building(),
            Some(&building(BuildingTier::Tier2, 0, 1))
        );
    }

    #[test]
    fn resync_of_unchanged_snapshot_is_noop() {
        let (snap, mut rec, mut host) = materialized(3, FakeFactory::default());
        let next = snap
            .with_building(TileCoord::new(0, 0), Some(BuildingTier::Tier1)).unwrap()
            .with_building(TileCoord::new(2, 1), Some(BuildingTier::Tier3)).unwrap();
        rec.sync(&next, &mut host).unwrap();
        rec.factory().take_calls();
        host.take_ops();

        let report = rec.sync(&next, &mut host).unwrap();
        assert!(report.is_noop());
        assert!(rec.factory().take_calls().is_empty());
        assert!(host.ops.is_empty());
    }

    #[test]
    fn reverting_restores_the_same_bindings() {
        let (snap, mut rec, mut host) = materialized(3, FakeFactory::default());
        let s1 = snap
            .with_building(TileCoord::new(0, 0), Some(BuildingTier::Tier1)).unwrap()
            .with_building(TileCoord::new(1, 2), Some(BuildingTier::Tier2)).unwrap();
        let s2 = s1
            .with_building(TileCoord::new(0, 0), Some(BuildingTier::Tier2)).unwrap()
            .with_building(TileCoord::new(1, 2), None).unwrap()
            .with_building(TileCoord::new(2, 2), Some(BuildingTier::Tier1)).unwrap();

        let mut reference = SceneReconciler::with_sink(FakeFactory::default(), Vec::new());
        let mut reference_host = RecordingHost::default();
        reference.materialize_all(&snap, &mut reference_host);
        reference.sync(&s1, &mut reference_host).unwrap();

        rec.sync(&s1, &mut host).unwrap();
        rec.sync(&s2, &mut host).unwrap();
        rec.sync(&s1, &mut host).unwrap();

        let table = |r: &SceneReconciler<FakeFactory, Vec<VisualFailure>>| {
            r.bindings()
                .map(|(c, b)| (*c, b.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(table(&rec), table(&reference));
        assert_eq!(host.live, reference_host.live);
    }

    #[test]
    fn factory_failure_is_isolated_to_its_tile() {
        let (snap, mut rec, mut host) = materialized(2, FakeFactory::without(tier1()));
        let failing = TileCoord::new(0, 0);
        let next = snap
            .with_building(failing, Some(BuildingTier::Tier1)).unwrap()
            .with_building(TileCoord::new(1, 0), Some(BuildingTier::Tier2)).unwrap()
            .with_building(TileCoord::new(1, 1), Some(BuildingTier::Tier3)).unwrap();

        let report = rec.sync(&next, &mut host).unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.created, 2);
        assert_eq!(
            rec.sink().as_slice(),
            &[VisualFailure {
                coord: failing,
                kind: tier1(),
                error: VisualError::UnknownKind(tier1()),
            }]
        );
        let b = rec.binding(failing).unwrap();
        assert!(b.building().is_none());
        assert!(b.terrain().is_some());
        assert_eq!(b.tier(), Some(BuildingTier::Tier1));
        assert!(rec.binding(TileCoord::new(1, 0)).unwrap().building().is_some());
        assert!(rec.binding(TileCoord::new(1, 1)).unwrap().building().is_some());

        // The failure is reported once, not on every later sync.
        assert!(rec.sync(&next, &mut host).unwrap().is_noop());
        assert_eq!(rec.sink().len(), 1);
    }

    #[test]
    fn failed_tile_recovers_on_next_tier() {
        let (snap, mut rec, mut host) = materialized(1, FakeFactory::without(tier1()));
        let coord = TileCoord::new(0, 0);
        let t1 = snap.with_building(coord, Some(BuildingTier::Tier1)).unwrap();
        let t2 = t1.with_building(coord, Some(BuildingTier::Tier2)).unwrap();
        rec.sync(&t1, &mut host).unwrap();
        host.take_ops();

        rec.sync(&t2, &mut host).unwrap();
        // Nothing was bound for tier 1, so nothing is removed.
        assert_eq!(
            host.take_ops(),
            vec![Op::Add(building(BuildingTier::Tier2, 0, 0))]
        );
    }

    #[test]
    fn terrain_failures_leave_tiles_bare() {
        let grass = VisualKind::Terrain(citygrid_common::TerrainKind::Grass);
        let snap = City::new(2).unwrap().snapshot();
        let mut rec = SceneReconciler::with_sink(FakeFactory::without(grass), Vec::new());
        let mut host = RecordingHost::default();
        let report = rec.materialize_all(&snap, &mut host);

        assert_eq!(report.failed, 4);
        assert_eq!(rec.sink().len(), 4);
        assert!(host.live.is_empty());
        assert_eq!(rec.bound_count(), 0);
        // Buildings still sync on a bare tile.
        let next = snap.with_building(TileCoord::new(0, 0), Some(BuildingTier::Tier2)).unwrap();
        assert_eq!(rec.sync(&next, &mut host).unwrap().created, 1);
    }

    #[test]
    fn rematerialize_removes_everything_from_previous_city() {
        let (snap, mut rec, mut host) = materialized(2, FakeFactory::default());
        let built = snap
            .with_building(TileCoord::new(0, 0), Some(BuildingTier::Tier3)).unwrap()
            .with_building(TileCoord::new(1, 0), Some(BuildingTier::Tier1)).unwrap();
        rec.sync(&built, &mut host).unwrap();
        assert_eq!(host.live.len(), 6);

        let replacement = City::new(3).unwrap().snapshot();
        let report = rec.materialize_all(&replacement, &mut host);
        assert_eq!(report.removed, 6);
        assert_eq!(report.created, 9);
        assert_eq!(host.live.len(), 9);
        assert_eq!(rec.city(), Some(replacement.city_id()));
        assert_eq!(
            rec.sync(&built, &mut host),
            Err(SceneError::ForeignSnapshot {
                expected: replacement.city_id(),
                found: built.city_id(),
            })
        );
    }

    #[test]
    fn materialize_ignores_existing_buildings_until_sync() {
        let mut city = City::from_config(&CityConfig {
            size: 2,
            growth_probability: 1.0,
            ..CityConfig::default()
        })
        .unwrap();
        city.tick();
        let snap = city.snapshot();
        let mut rec = SceneReconciler::with_sink(FakeFactory::default(), Vec::new());
        let mut host = RecordingHost::default();

        assert_eq!(rec.materialize_all(&snap, &mut host).created, 4);
        assert_eq!(rec.sync(&snap, &mut host).unwrap().created, 4);
        assert_eq!(host.live.len(), 8);
    }

    #[test]
    fn clear_removes_all_bound_visuals() {
        let (snap, mut rec, mut host) = materialized(2, FakeFactory::default());
        let built = snap.with_building(TileCoord::new(1, 1), Some(BuildingTier::Tier1)).unwrap();
        rec.sync(&built, &mut host).unwrap();

        let report = rec.clear(&mut host);
        assert_eq!(report.removed, 5);
        assert!(host.live.is_empty());
        assert_eq!(rec.bound_count(), 0);
        assert_eq!(rec.city(), None);
    }
}
