use super::revolution::RevolutionMap;
use crate::config::{AngleArc, LidarConfig, Zone};
use crate::internals::LIDAR_MAX_RESOLUTION_SHIFT;
use crate::types::{ObstacleState, Sample, SampleBatch, ZoneTransition};
use log::{debug, info, trace, warn};

/// Per-zone hazard state machine.
///
/// Samples escalate zones immediately (`quick_check`). De-escalation only happens in
/// `full_check`, once a revolution's worth of buckets has accumulated.
#[derive(Debug, Clone)]
pub struct ObstacleDetector {
    zones: Vec<Zone>,
    pole_exclusion: Option<AngleArc>,
    full_rev_count: usize,
    revolution: RevolutionMap,
    states: Vec<ObstacleState>,
    last_states: Vec<ObstacleState>,
}

impl ObstacleDetector {
    /// Builds a detector with every zone clear.
    ///
    /// Buckets lying entirely behind `pole_exclusion` never receive samples, so they are left
    /// out of the revolution threshold. The shift is clamped to `LIDAR_MAX_RESOLUTION_SHIFT`.
    pub fn new(
        zones: Vec<Zone>,
        resolution_shift: u8,
        pole_exclusion: Option<AngleArc>,
    ) -> ObstacleDetector {
        if resolution_shift > LIDAR_MAX_RESOLUTION_SHIFT {
            warn!(
                "Resolution shift {} is too wide, using {}",
                resolution_shift, LIDAR_MAX_RESOLUTION_SHIFT
            );
        }
        let revolution = RevolutionMap::new(resolution_shift);
        let full_rev_count = zones
            .iter()
            .map(|zone| {
                let hidden = sweep_buckets(zone, &revolution)
                    .filter(|bucket| hidden_by_pole(pole_exclusion, &revolution, *bucket))
                    .count();
                if hidden > 0 {
                    debug!(
                        "Zone '{}': {} buckets behind the pole",
                        zone.direction, hidden
                    );
                }
                zone.bucket_span(revolution.resolution_shift())
                    .saturating_sub(hidden)
            })
            .sum();
        let states = vec![ObstacleState::Clear; zones.len()];
        ObstacleDetector {
            last_states: states.clone(),
            states,
            full_rev_count,
            revolution,
            pole_exclusion,
            zones,
        }
    }

    pub fn from_config(config: &LidarConfig) -> ObstacleDetector {
        ObstacleDetector::new(
            config.zones.clone(),
            config.resolution_shift,
            config.pole_exclusion,
        )
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Current state of every zone, in zone order.
    pub fn states(&self) -> &[ObstacleState] {
        &self.states
    }

    /// Number of populated buckets that completes a revolution.
    pub fn full_rev_count(&self) -> usize {
        self.full_rev_count
    }

    pub fn revolution(&self) -> &RevolutionMap {
        &self.revolution
    }

    /// Records `sample` and escalates every zone containing it.
    pub fn quick_check(&mut self, sample: &Sample) {
        let angle = sample.whole_degrees();
        let bucket = self.revolution.bucket_of(angle);
        if self.revolution.has_closer(bucket, sample.distance) {
            return;
        }

        for index in 0..self.zones.len() {
            let zone = &self.zones[index];
            if !zone.arc.contains(angle) {
                continue;
            }
            self.revolution.record(bucket, sample.distance);

            if self.states[index] == ObstacleState::Stop {
                continue;
            }
            if sample.distance < zone.stop_distance {
                debug!(
                    "Zone '{}' stop: {} mm at {}°",
                    zone.direction, sample.distance, angle
                );
                self.states[index] = ObstacleState::Stop;
                self.revolution.clear();
            } else if sample.distance < zone.warn_distance {
                self.states[index] = ObstacleState::Warning;
            }
        }
    }

    /// `true` once enough buckets are populated to verify the zones.
    #[inline]
    pub fn revolution_complete(&self) -> bool {
        self.revolution.len() >= self.full_rev_count
    }

    /// Re-sweeps every non-clear zone over the finished revolution and overwrites its state.
    pub fn full_check(&mut self) {
        let revolution = self.revolution.take();
        if self.states.iter().all(|s| *s == ObstacleState::Clear) {
            return;
        }
        trace!(
            "Verifying zones over {} populated buckets",
            revolution.len()
        );

        for index in 0..self.zones.len() {
            if self.states[index] == ObstacleState::Clear {
                continue;
            }
            let verified = self.sweep(&self.zones[index], &revolution);
            if verified != self.states[index] {
                debug!(
                    "Zone '{}' verified {} (was {})",
                    self.zones[index].direction, verified, self.states[index]
                );
            }
            self.states[index] = verified;
        }
    }

    fn sweep(&self, zone: &Zone, revolution: &RevolutionMap) -> ObstacleState {
        let mut result = ObstacleState::Clear;
        for bucket in sweep_buckets(zone, revolution) {
            if hidden_by_pole(self.pole_exclusion, revolution, bucket) {
                continue;
            }
            // buckets without a sample this revolution count as clear
            let Some(distance) = revolution.get(bucket) else {
                continue;
            };
            if distance < zone.stop_distance {
                return ObstacleState::Stop;
            }
            if distance < zone.warn_distance {
                result = ObstacleState::Warning;
            }
        }
        result
    }

    /// Runs one processing cycle over `batch` and returns the zones whose state changed since
    /// the previous cycle.
    pub fn process(&mut self, batch: &SampleBatch) -> Vec<ZoneTransition> {
        for sample in &batch.samples {
            self.quick_check(sample);
        }
        if self.revolution_complete() {
            self.full_check();
        }
        self.transitions()
    }

    /// Zones whose state differs from the last snapshot.
    pub fn transitions(&self) -> Vec<ZoneTransition> {
        self.zones
            .iter()
            .enumerate()
            .filter(|(index, _)| self.states[*index] != self.last_states[*index])
            .map(|(index, zone)| ZoneTransition {
                zone: index,
                direction: zone.direction.clone(),
                previous: self.last_states[index],
                state: self.states[index],
            })
            .collect()
    }

    /// Takes the current states as the snapshot the next cycle is compared against.
    pub fn commit(&mut self) {
        self.last_states.copy_from_slice(&self.states);
    }

    /// Clears states, the snapshot and the revolution map.
    pub fn reset(&mut self) {
        info!("Resetting obstacle zones");
        self.revolution.clear();
        self.states.iter_mut().for_each(|s| *s = ObstacleState::Clear);
        self.last_states.iter_mut().for_each(|s| *s = ObstacleState::Clear);
    }
}

/// Buckets from `min >> shift` to `max >> shift`, continuing through 0 for wrapping arcs.
fn sweep_buckets(zone: &Zone, revolution: &RevolutionMap) -> impl Iterator<Item = usize> {
    let bucket_count = revolution.bucket_count();
    let start = zone.arc.min as usize >> revolution.resolution_shift();
    let mut end = zone.arc.max as usize >> revolution.resolution_shift();
    if zone.arc.wraps() {
        end += bucket_count;
    }
    (start..=end).map(move |position| position % bucket_count)
}

fn hidden_by_pole(pole: Option<AngleArc>, revolution: &RevolutionMap, bucket: usize) -> bool {
    let Some(pole) = pole else {
        return false;
    };
    let (lo, hi) = revolution.bucket_degrees(bucket);
    (lo..=hi).all(|degree| pole.contains_half_open(degree as f32))
}
