//! # rplidar-guard
//!
//! `rplidar_guard` drives an RPLIDAR in express-scan mode over a serial link and watches a set
//! of angular zones around the sensor for obstacles.
//!
//! Inbound bytes are framed into answer descriptors and 84-byte express capsules, the capsules
//! are decoded into angle/distance samples, and every batch of samples runs through a per-zone
//! state machine that escalates immediately and only clears after a full revolution has been
//! verified. Zone transitions are published as events and, when collision stop is enabled,
//! routed to an [`AvoidanceHandler`].
//!
//! Opening the serial port is left to the caller: anything `Read + Write` works.
//!
//! ```ignore
//! let port = serialport::new("/dev/ttyUSB0", 115200).open()?;
//! let mut node = LidarNode::new(LidarConfig::with_port("/dev/ttyUSB0"), port);
//! let events = node.subscribe();
//! node.start_motor()?;
//! node.monitor()?;
//! loop {
//!     node.poll()?;
//!     while let Ok(event) = events.try_recv() {
//!         println!("{:?}", event);
//!     }
//! }
//! ```

extern crate byteorder;
extern crate crossbeam_channel;
extern crate log;

mod answers;
pub mod base;
mod checksum;
pub mod cmds;
pub mod config;
pub mod events;
mod internals;
pub mod obstacle;
mod parsers;
mod protocol;
pub mod types;

pub use crate::answers::{Answer, AnswerDescriptor, ExpressCapsule};
pub use crate::base::{Channel, Error, Message, Result};
pub use crate::config::{AngleArc, LidarConfig, Zone};
pub use crate::events::LidarEvent;
pub use crate::obstacle::{AvoidanceHandler, HandlerId};
pub use crate::protocol::LidarHostProtocol;
pub use crate::types::{ObstacleState, Sample, SampleBatch, ZoneTransition};

use crate::base::ProtocolDecoder;
use crate::cmds::*;
use crate::events::EventBus;
use crate::internals::*;
use crate::obstacle::{NoopHandler, ObstacleDetector};
use crate::parsers::express_parser::CabinDecoder;
use crossbeam_channel::Receiver;
use log::{debug, error, info, trace, warn};
use std::io::{Read, Write};

/// A lidar on a serial stream, with obstacle detection over its express scan.
///
/// All processing runs synchronously inside `handle_input` / `poll`: once a chunk of bytes is
/// handed over, framing, decoding, zone checks and handler dispatch complete before the call
/// returns.
pub struct LidarNode<T: ?Sized> {
    config: LidarConfig,
    channel: Channel<LidarHostProtocol, T>,
    decoder: CabinDecoder,
    detector: ObstacleDetector,
    handler: Box<dyn AvoidanceHandler>,
    collision_stop: bool,
    events: EventBus,
}

impl<T: ?Sized> LidarNode<T>
where
    T: Read + Write,
{
    /// Constructs a node over `stream` without an avoidance handler.
    pub fn new(config: LidarConfig, stream: Box<T>) -> LidarNode<T> {
        LidarNode::with_handler(config, stream, Box::new(NoopHandler))
    }

    /// Constructs a node that routes zone transitions to `handler`.
    pub fn with_handler(
        config: LidarConfig,
        stream: Box<T>,
        handler: Box<dyn AvoidanceHandler>,
    ) -> LidarNode<T> {
        let read_buffer_size = config.read_buffer_size.max(LIDAR_MIN_READ_BUFFER_SIZE);
        if read_buffer_size != config.read_buffer_size {
            warn!(
                "Receive buffer of {} bytes is too small, using {}",
                config.read_buffer_size, read_buffer_size
            );
        }
        info!(
            "Creating lidar node on {} with {} zones",
            config.port,
            config.zones.len()
        );

        let detector = ObstacleDetector::from_config(&config);
        debug!(
            "Full revolution is {} buckets of {}°",
            detector.full_rev_count(),
            1u16 << detector.revolution().resolution_shift()
        );

        LidarNode {
            channel: Channel::with_read_buffer_size(
                LidarHostProtocol::new(),
                stream,
                read_buffer_size,
            ),
            decoder: CabinDecoder::new(config.cabins_per_payload, config.pole_exclusion),
            detector,
            handler,
            collision_stop: config.collision_stop,
            events: EventBus::new(LIDAR_EVENT_CHANNEL_CAPACITY),
            config,
        }
    }

    /// Configuration the node was built with.
    pub fn config(&self) -> &LidarConfig {
        &self.config
    }

    /// Replaces the avoidance handler.
    pub fn set_handler(&mut self, handler: Box<dyn AvoidanceHandler>) {
        self.handler = handler;
    }

    /// Enables or disables handler invocation. Transition events are published either way.
    pub fn set_collision_stop(&mut self, enabled: bool) {
        info!(
            "Collision stop {}",
            if enabled { "enabled" } else { "disabled" }
        );
        self.collision_stop = enabled;
    }

    /// `true` if avoidance handlers are invoked on transitions.
    pub fn collision_stop(&self) -> bool {
        self.collision_stop
    }

    /// Current state of every configured zone, in zone order.
    pub fn obstacle_states(&self) -> &[ObstacleState] {
        self.detector.states()
    }

    /// Returns a receiver for every event published from now on.
    pub fn subscribe(&mut self) -> Receiver<LidarEvent> {
        self.events.subscribe()
    }

    /// `true` while answers of an acknowledged request are streaming in.
    pub fn is_scanning(&self) -> bool {
        self.channel.protocol().active_descriptor().is_some()
    }

    /// Underlying serial stream.
    pub fn stream(&self) -> &T {
        self.channel.stream()
    }

    /// Mutable underlying serial stream.
    pub fn stream_mut(&mut self) -> &mut T {
        self.channel.stream_mut()
    }

    /// Starts streaming with the default express mode.
    pub fn monitor(&mut self) -> Result<()> {
        trace!("Starting monitoring");
        self.start_express_scan()
    }

    /// Requests an express scan. Capsules are decoded as they arrive.
    pub fn start_express_scan(&mut self) -> Result<()> {
        let payload = RplidarPayloadExpressScan::default().to_bytes();
        trace!(
            "Sending EXPRESS_SCAN command ({:02X}) with payload: {:?}",
            RPLIDAR_CMD_EXPRESS_SCAN,
            payload
        );
        if self.decoder.has_reference() {
            debug!("Restarting express scan, previous reference capsule is dropped");
        }
        self.decoder.reset();
        self.request(&Message::with_data(RPLIDAR_CMD_EXPRESS_SCAN, &payload))
    }

    /// Requests a legacy scan. Its 5-byte nodes are published as opaque responses.
    pub fn start_scan(&mut self) -> Result<()> {
        trace!("Sending SCAN command ({:02X})", RPLIDAR_CMD_SCAN);
        self.request(&Message::new(RPLIDAR_CMD_SCAN))
    }

    /// Stops the measurement and, once the transport is flushed, resets the session.
    ///
    /// If the write or flush fails the session is left untouched.
    pub fn stop_scan(&mut self) -> Result<()> {
        trace!("Sending STOP command ({:02X})", RPLIDAR_CMD_STOP);
        self.send(&Message::new(RPLIDAR_CMD_STOP))?;
        self.reset_session();
        Ok(())
    }

    /// Resets the lidar core and, once the transport is flushed, the session.
    pub fn hw_reset(&mut self) -> Result<()> {
        trace!("Sending RESET command ({:02X})", RPLIDAR_CMD_RESET);
        self.send(&Message::new(RPLIDAR_CMD_RESET))?;
        self.reset_session();
        Ok(())
    }

    /// Sets the motor duty cycle, clamped to `0..=1023`.
    pub fn set_motor_pwm(&mut self, pwm: u16) -> Result<()> {
        if pwm > RPLIDAR_MAX_MOTOR_PWM {
            warn!(
                "Motor PWM {} out of range, clamping to {}",
                pwm, RPLIDAR_MAX_MOTOR_PWM
            );
        }
        let payload = motor_pwm_payload(pwm);
        trace!(
            "Sending SET_MOTOR_PWM command ({:02X}) with payload: {:?}",
            RPLIDAR_CMD_SET_MOTOR_PWM,
            payload
        );
        self.send(&Message::with_data(RPLIDAR_CMD_SET_MOTOR_PWM, &payload))
    }

    /// Spins the motor up at the default duty cycle.
    pub fn start_motor(&mut self) -> Result<()> {
        trace!(
            "Starting motor with default PWM ({})",
            LIDAR_DEFAULT_MOTOR_PWM
        );
        self.set_motor_pwm(LIDAR_DEFAULT_MOTOR_PWM)
    }

    /// Stops scanning, then the motor.
    pub fn stop(&mut self) -> Result<()> {
        self.stop_scan()?;
        self.set_motor_pwm(0)
    }

    /// Requests device information. The payload arrives as a `LidarEvent::Response`.
    pub fn get_info(&mut self) -> Result<()> {
        trace!("Sending GET_DEVICE_INFO command ({:02X})", RPLIDAR_CMD_GET_DEVICE_INFO);
        self.request(&Message::new(RPLIDAR_CMD_GET_DEVICE_INFO))
    }

    /// Requests the health status. The payload arrives as a `LidarEvent::Response`.
    pub fn get_health(&mut self) -> Result<()> {
        trace!(
            "Sending GET_DEVICE_HEALTH command ({:02X})",
            RPLIDAR_CMD_GET_DEVICE_HEALTH
        );
        self.request(&Message::new(RPLIDAR_CMD_GET_DEVICE_HEALTH))
    }

    /// Requests the sample periods. The payload arrives as a `LidarEvent::Response`.
    pub fn get_sample_rate(&mut self) -> Result<()> {
        trace!("Sending GET_SAMPLERATE command ({:02X})", RPLIDAR_CMD_GET_SAMPLERATE);
        self.request(&Message::new(RPLIDAR_CMD_GET_SAMPLERATE))
    }

    /// Processes one pushed chunk of inbound bytes.
    ///
    /// Chunks of any size are accepted as long as the decoder keeps up. If the receive buffer
    /// fills with bytes the decoder cannot retire, the session is reset and the scan has to be
    /// restarted.
    pub fn handle_input(&mut self, chunk: &[u8]) -> Result<()> {
        trace!("Handling {} inbound bytes", chunk.len());
        let answers = match self.channel.feed(chunk) {
            Ok(answers) => answers,
            Err(err) => return Err(self.integrity_fault(err)),
        };
        self.process_answers(answers);
        Ok(())
    }

    /// Reads whatever the stream has ready and processes it. Returns the number of bytes read.
    pub fn poll(&mut self) -> Result<usize> {
        let read = match self.channel.fill_from_stream() {
            Ok(read) => read,
            Err(err) => return Err(self.transport_fault(err)),
        };
        let answers = match self.channel.decode_pending() {
            Ok(answers) => answers,
            Err(err) => return Err(self.integrity_fault(err)),
        };
        self.process_answers(answers);
        Ok(read)
    }

    fn process_answers(&mut self, answers: Vec<Answer>) {
        let mut batch = SampleBatch::default();
        for answer in answers {
            match answer {
                Answer::Descriptor(descriptor) => {
                    debug!(
                        "Answer stream started: type {:02X}, {} bytes per response",
                        descriptor.data_type, descriptor.payload_length
                    );
                }
                Answer::ExpressCapsule(capsule) => {
                    batch.samples.extend(self.decoder.push(capsule));
                }
                Answer::Response(msg) => {
                    trace!(
                        "Response type {:02X} with {} bytes",
                        msg.cmd,
                        msg.data.len()
                    );
                    self.events.publish(LidarEvent::Response(msg));
                }
            }
        }

        if !batch.is_empty() {
            self.process_batch(batch);
        }
    }

    fn process_batch(&mut self, batch: SampleBatch) {
        trace!("Processing {} samples", batch.len());
        let transitions = self.detector.process(&batch);
        self.events.publish(LidarEvent::Samples(batch));

        for transition in &transitions {
            info!(
                "Zone '{}' {} -> {}",
                transition.direction, transition.previous, transition.state
            );
            self.events
                .publish(LidarEvent::Transition(transition.clone()));
        }
        if self.collision_stop && !transitions.is_empty() {
            obstacle::dispatch(
                self.handler.as_mut(),
                self.detector.zones(),
                &transitions,
            );
        }
        self.detector.commit();
    }

    /// Sends a command that is answered with a descriptor.
    fn request(&mut self, msg: &Message) -> Result<()> {
        self.channel.clear_input();
        self.channel.protocol_mut().expect_response(msg.cmd);
        if let Err(err) = self.send(msg) {
            self.channel.protocol_mut().reset_decoder();
            return Err(err);
        }
        Ok(())
    }

    fn send(&mut self, msg: &Message) -> Result<()> {
        match self.channel.write(msg) {
            Ok(written) => {
                trace!("Command {:02X} sent ({} bytes)", msg.cmd, written);
                Ok(())
            }
            Err(err) => Err(self.transport_fault(err)),
        }
    }

    /// Drops descriptor expectations, buffered bytes, the reference capsule and zone state.
    fn reset_session(&mut self) {
        debug!("Resetting scan session");
        self.channel.reset();
        self.decoder.reset();
        self.detector.reset();
    }

    fn transport_fault(&mut self, err: Error) -> Error {
        error!("Transport error on {}: {}", self.config.port, err);
        self.events.publish(LidarEvent::Fault(err.to_string()));
        err
    }

    fn integrity_fault(&mut self, err: Error) -> Error {
        error!(
            "Receive stream on {} can no longer be trusted, restart the scan: {}",
            self.config.port, err
        );
        self.events.publish(LidarEvent::Fault(err.to_string()));
        self.reset_session();
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::RPLIDAR_ANS_DESCRIPTOR_SIZE;
    use crate::checksum::Checksum;
    use crate::parsers::express_parser::test_capsule;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::io;
    use std::rc::Rc;

    #[derive(Default)]
    struct MockPort {
        inbound: VecDeque<u8>,
        written: Vec<u8>,
        fail_flush: bool,
    }

    impl Read for MockPort {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.inbound.read(buf)
        }
    }

    impl Write for MockPort {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            if self.fail_flush {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "port closed"));
            }
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct Recorder {
        calls: Rc<RefCell<Vec<(HandlerId, u8)>>>,
    }

    impl AvoidanceHandler for Recorder {
        fn front_stop(&mut self, state: ObstacleState) -> Result<()> {
            self.calls
                .borrow_mut()
                .push((HandlerId::FrontStop, state.level()));
            Ok(())
        }
    }

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn near_zone_config() -> LidarConfig {
        LidarConfig::default().with_zones(vec![
            Zone::new("front", 0, 10, 750, 1250).with_handler(HandlerId::FrontStop)
        ])
    }

    fn node_with_recorder(config: LidarConfig) -> (LidarNode<MockPort>, Recorder) {
        let recorder = Recorder::default();
        let node = LidarNode::with_handler(
            config,
            Box::new(MockPort::default()),
            Box::new(recorder.clone()),
        );
        (node, recorder)
    }

    fn descriptor_for(cmd: u8) -> [u8; RPLIDAR_ANS_DESCRIPTOR_SIZE] {
        expected_descriptor(cmd).unwrap().to_bytes()
    }

    /// Descriptor plus a start capsule with one cabin at `distance`, followed by a second
    /// capsule one degree further.
    fn two_capsule_scan(distance: u16) -> Vec<u8> {
        let mut bytes = descriptor_for(RPLIDAR_CMD_EXPRESS_SCAN).to_vec();
        bytes.extend_from_slice(&test_capsule(true, 0, &[(0, distance, 0)]));
        bytes.extend_from_slice(&test_capsule(false, 64, &[]));
        bytes
    }

    fn drain(events: &Receiver<LidarEvent>) -> Vec<LidarEvent> {
        events.try_iter().collect()
    }

    #[test]
    fn two_capsules_raise_warning_once() {
        init_logger();
        let (mut node, recorder) = node_with_recorder(near_zone_config());
        let events = node.subscribe();

        node.start_express_scan().unwrap();
        node.handle_input(&two_capsule_scan(1000)).unwrap();

        assert_eq!(node.obstacle_states(), &[ObstacleState::Warning]);
        assert_eq!(*recorder.calls.borrow(), vec![(HandlerId::FrontStop, 1)]);

        let events = drain(&events);
        let transitions: Vec<&ZoneTransition> = events
            .iter()
            .filter_map(|e| match e {
                LidarEvent::Transition(t) => Some(t),
                _ => None,
            })
            .collect();
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].direction, "front");
        assert_eq!(transitions[0].state, ObstacleState::Warning);
        match &events[0] {
            LidarEvent::Samples(batch) => {
                assert_eq!(batch.len(), 32);
                assert_eq!(batch.samples[0], Sample::new(0.0, 1000));
            }
            other => panic!("expected samples first, got {:?}", other),
        }
    }

    #[test]
    fn two_capsules_inside_stop_distance() {
        init_logger();
        let (mut node, recorder) = node_with_recorder(near_zone_config());
        node.start_express_scan().unwrap();
        node.handle_input(&two_capsule_scan(500)).unwrap();
        assert_eq!(node.obstacle_states(), &[ObstacleState::Stop]);
        assert_eq!(*recorder.calls.borrow(), vec![(HandlerId::FrontStop, 2)]);
    }

    #[test]
    fn byte_at_a_time_matches_single_chunk() {
        init_logger();
        let (mut node, recorder) = node_with_recorder(near_zone_config());
        node.start_express_scan().unwrap();
        for byte in two_capsule_scan(1000) {
            node.handle_input(&[byte]).unwrap();
        }
        assert_eq!(node.obstacle_states(), &[ObstacleState::Warning]);
        assert_eq!(recorder.calls.borrow().len(), 1);
    }

    #[test]
    fn disabled_collision_stop_still_publishes() {
        init_logger();
        let (mut node, recorder) = node_with_recorder(near_zone_config());
        let events = node.subscribe();
        node.set_collision_stop(false);

        node.start_express_scan().unwrap();
        node.handle_input(&two_capsule_scan(500)).unwrap();

        assert!(recorder.calls.borrow().is_empty());
        assert!(drain(&events)
            .iter()
            .any(|e| matches!(e, LidarEvent::Transition(t) if t.state == ObstacleState::Stop)));
    }

    #[test]
    fn commands_on_the_wire() {
        init_logger();
        let mut node = LidarNode::new(LidarConfig::default(), Box::new(MockPort::default()));
        node.start_express_scan().unwrap();
        node.set_motor_pwm(2000).unwrap();
        node.start_motor().unwrap();
        node.get_health().unwrap();

        let mut expected = vec![0xA5, 0x82, 0x05, 0, 0, 0, 0, 0];
        expected.push(Checksum::of(&expected));
        let mut pwm_max = vec![0xA5, 0xF0, 0x02, 0xFF, 0x03];
        pwm_max.push(Checksum::of(&pwm_max));
        let mut pwm_default = vec![0xA5, 0xF0, 0x02, 0x94, 0x02];
        pwm_default.push(Checksum::of(&pwm_default));
        expected.extend(pwm_max);
        expected.extend(pwm_default);
        expected.extend([0xA5, 0x52]);

        assert_eq!(node.stream().written, expected);
    }

    #[test]
    fn stop_scan_clears_session_after_flush() {
        init_logger();
        let (mut node, _recorder) = node_with_recorder(near_zone_config());
        node.start_express_scan().unwrap();
        node.handle_input(&two_capsule_scan(1000)).unwrap();
        assert!(node.is_scanning());

        node.stop_scan().unwrap();
        assert!(!node.is_scanning());
        assert_eq!(node.obstacle_states(), &[ObstacleState::Clear]);
        assert!(!node.decoder.has_reference());
        assert_eq!(node.channel.buffered_len(), 0);
        assert!(node.stream().written.ends_with(&[0xA5, RPLIDAR_CMD_STOP]));
    }

    #[test]
    fn failed_flush_keeps_session() {
        init_logger();
        let (mut node, _recorder) = node_with_recorder(near_zone_config());
        let events = node.subscribe();
        node.start_express_scan().unwrap();
        node.handle_input(&two_capsule_scan(1000)).unwrap();

        node.stream_mut().fail_flush = true;
        assert!(matches!(node.stop_scan(), Err(Error::IoError(_))));
        assert!(node.is_scanning());
        assert!(node.decoder.has_reference());
        assert_eq!(node.obstacle_states(), &[ObstacleState::Warning]);
        assert!(matches!(drain(&events).last(), Some(LidarEvent::Fault(_))));
    }

    #[test]
    fn stalled_stream_is_fatal_for_the_session() {
        init_logger();
        let config = near_zone_config().with_read_buffer_size(0);
        let (mut node, _recorder) = node_with_recorder(config);
        assert_eq!(node.channel.read_buffer_capacity(), LIDAR_MIN_READ_BUFFER_SIZE);
        let events = node.subscribe();

        node.start_express_scan().unwrap();
        node.handle_input(&two_capsule_scan(1000)[..100]).unwrap();
        assert!(node.decoder.has_reference());

        // an answer type the decoder does not retire piles up in the buffer
        let unknown = AnswerDescriptor {
            payload_length: 84,
            send_mode: 1,
            data_type: 0x99,
        };
        node.start_express_scan().unwrap();
        let mut chunk = unknown.to_bytes().to_vec();
        chunk.extend_from_slice(&[0x11u8; 200]);
        let result = node.handle_input(&chunk);
        assert!(matches!(result, Err(Error::BufferOverflow { .. })));

        assert!(!node.is_scanning());
        assert!(!node.decoder.has_reference());
        assert_eq!(node.channel.buffered_len(), 0);
        assert!(matches!(drain(&events).last(), Some(LidarEvent::Fault(_))));
    }

    #[test]
    fn chunk_larger_than_buffer_is_not_an_overflow() {
        init_logger();
        let (mut node, _recorder) = node_with_recorder(near_zone_config());
        let events = node.subscribe();
        node.start_express_scan().unwrap();

        let mut chunk = descriptor_for(RPLIDAR_CMD_EXPRESS_SCAN).to_vec();
        for n in 0..30u16 {
            chunk.extend_from_slice(&test_capsule(n == 0, n * 64, &[]));
        }
        assert!(chunk.len() > LIDAR_DEFAULT_READ_BUFFER_SIZE);

        node.handle_input(&chunk).unwrap();
        assert!(node.is_scanning());
        assert!(node.decoder.has_reference());
        assert_eq!(node.obstacle_states(), &[ObstacleState::Clear]);

        let events = drain(&events);
        assert!(!events.iter().any(|e| matches!(e, LidarEvent::Fault(_))));
        match events.as_slice() {
            [LidarEvent::Samples(batch)] => assert_eq!(batch.len(), 29 * 32),
            other => panic!("expected one sample batch, got {:?}", other),
        }
    }

    #[test]
    fn poll_reads_owned_stream() {
        init_logger();
        let (mut node, recorder) = node_with_recorder(near_zone_config());
        node.start_express_scan().unwrap();
        node.stream_mut().inbound.extend(two_capsule_scan(1000));

        let read = node.poll().unwrap();
        assert_eq!(read, RPLIDAR_ANS_DESCRIPTOR_SIZE + 2 * 84);
        assert_eq!(node.poll().unwrap(), 0);
        assert_eq!(recorder.calls.borrow().len(), 1);
    }

    #[test]
    fn info_payload_is_published() {
        init_logger();
        let mut node = LidarNode::new(LidarConfig::default(), Box::new(MockPort::default()));
        let events = node.subscribe();
        node.get_info().unwrap();

        let descriptor = expected_descriptor(RPLIDAR_CMD_GET_DEVICE_INFO).unwrap();
        let payload: Vec<u8> = (0..descriptor.payload_length as u8).collect();
        let mut bytes = descriptor.to_bytes().to_vec();
        bytes.extend_from_slice(&payload);
        node.handle_input(&bytes).unwrap();

        assert_eq!(
            drain(&events),
            vec![LidarEvent::Response(Message::with_data(
                descriptor.data_type,
                &payload
            ))]
        );
        assert!(!node.is_scanning());
    }

    #[test]
    fn stop_turns_motor_off() {
        init_logger();
        let mut node = LidarNode::new(LidarConfig::default(), Box::new(MockPort::default()));
        node.stop().unwrap();
        let mut expected = vec![0xA5, RPLIDAR_CMD_STOP, 0xA5, 0xF0, 0x02, 0x00, 0x00];
        expected.push(Checksum::of(&expected[2..]));
        assert_eq!(node.stream().written, expected);
    }
}
