use crate::base::{Error, Result};
use crate::config::Zone;
use crate::types::{ObstacleState, ZoneTransition};
use log::{debug, error};
use std::fmt;
use std::str::FromStr;

/// Collision-avoidance actions a zone can be wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerId {
    FrontStop,
    BackStop,
    LeftStop,
    RightStop,
}

impl HandlerId {
    pub fn name(&self) -> &'static str {
        match self {
            HandlerId::FrontStop => "front_stop",
            HandlerId::BackStop => "back_stop",
            HandlerId::LeftStop => "left_stop",
            HandlerId::RightStop => "right_stop",
        }
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HandlerId {
    type Err = Error;

    fn from_str(s: &str) -> Result<HandlerId> {
        match s {
            "front_stop" => Ok(HandlerId::FrontStop),
            "back_stop" => Ok(HandlerId::BackStop),
            "left_stop" => Ok(HandlerId::LeftStop),
            "right_stop" => Ok(HandlerId::RightStop),
            other => Err(Error::OperationFail {
                description: format!("unknown handler '{}'", other),
            }),
        }
    }
}

/// Receives zone state changes. Every action defaults to doing nothing.
pub trait AvoidanceHandler {
    fn front_stop(&mut self, _state: ObstacleState) -> Result<()> {
        Ok(())
    }

    fn back_stop(&mut self, _state: ObstacleState) -> Result<()> {
        Ok(())
    }

    fn left_stop(&mut self, _state: ObstacleState) -> Result<()> {
        Ok(())
    }

    fn right_stop(&mut self, _state: ObstacleState) -> Result<()> {
        Ok(())
    }
}

/// Handler used when the caller installs none.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandler;

impl AvoidanceHandler for NoopHandler {}

/// Routes `state` to the action named by `id`.
pub fn invoke(
    handler: &mut dyn AvoidanceHandler,
    id: HandlerId,
    state: ObstacleState,
) -> Result<()> {
    match id {
        HandlerId::FrontStop => handler.front_stop(state),
        HandlerId::BackStop => handler.back_stop(state),
        HandlerId::LeftStop => handler.left_stop(state),
        HandlerId::RightStop => handler.right_stop(state),
    }
}

/// Invokes the handler of every transitioned zone that has one.
///
/// A failing handler is logged and does not stop the remaining zones.
/// Returns the number of failed invocations.
pub fn dispatch(
    handler: &mut dyn AvoidanceHandler,
    zones: &[Zone],
    transitions: &[ZoneTransition],
) -> usize {
    let mut failures = 0;
    for transition in transitions {
        let Some(id) = zones.get(transition.zone).and_then(|zone| zone.handler) else {
            continue;
        };
        debug!(
            "Invoking {} for zone '{}' with state {}",
            id, transition.direction, transition.state
        );
        if let Err(err) = invoke(handler, id, transition.state) {
            error!(
                "Error handling autostop action {} for zone '{}': {}",
                id, transition.direction, err
            );
            failures += 1;
        }
    }
    failures
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<(HandlerId, u8)>,
        fail_front: bool,
    }

    impl AvoidanceHandler for Recorder {
        fn front_stop(&mut self, state: ObstacleState) -> Result<()> {
            self.calls.push((HandlerId::FrontStop, state.level()));
            if self.fail_front {
                return Err(Error::HandlerFailed {
                    description: "brake controller offline".to_owned(),
                });
            }
            Ok(())
        }

        fn back_stop(&mut self, state: ObstacleState) -> Result<()> {
            self.calls.push((HandlerId::BackStop, state.level()));
            Ok(())
        }
    }

    fn transition(zone: usize, state: ObstacleState) -> ZoneTransition {
        ZoneTransition {
            zone,
            direction: format!("zone{}", zone),
            previous: ObstacleState::Clear,
            state,
        }
    }

    #[test]
    fn names_round_trip() {
        for id in [
            HandlerId::FrontStop,
            HandlerId::BackStop,
            HandlerId::LeftStop,
            HandlerId::RightStop,
        ] {
            assert_eq!(id.name().parse::<HandlerId>().unwrap(), id);
        }
        assert!("side_stop".parse::<HandlerId>().is_err());
    }

    #[test]
    fn failing_handler_does_not_block_other_zones() {
        let zones = vec![
            Zone::new("front", 155, 205, 750, 1250).with_handler(HandlerId::FrontStop),
            Zone::new("left", 60, 120, 750, 1250),
            Zone::new("back", 345, 15, 850, 1350).with_handler(HandlerId::BackStop),
        ];
        let mut recorder = Recorder {
            fail_front: true,
            ..Recorder::default()
        };
        let failures = dispatch(
            &mut recorder,
            &zones,
            &[
                transition(0, ObstacleState::Stop),
                transition(1, ObstacleState::Warning),
                transition(2, ObstacleState::Warning),
            ],
        );
        assert_eq!(failures, 1);
        assert_eq!(
            recorder.calls,
            vec![(HandlerId::FrontStop, 2), (HandlerId::BackStop, 1)]
        );
    }
}
