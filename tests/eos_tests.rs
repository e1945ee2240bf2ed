//! End-of-stream draining, port flush and reset behavior

mod common;

use common::{emptied, filled, pictures, Harness};
use softvdec::testing::ScriptedEngine;
use softvdec::{ComponentError, EosStatus};

// ============================================================================
// Draining
// ============================================================================

/// Test that a delaying decoder releases held pictures on EOS
#[test]
fn test_delayed_pictures_drained() {
  let mut h = Harness::new(ScriptedEngine::new().with_delay(2));
  for ts in 0..3 {
    h.data(&[ts as u8 + 1], ts);
  }
  h.eos();
  h.outputs(4);

  let events = h.run();
  assert_eq!(emptied(&events), vec![1, 2, 3, 4]);

  let outputs = filled(&events);
  let stamps: Vec<i64> = pictures(&events).iter().map(|buffer| buffer.timestamp).collect();
  assert_eq!(stamps, vec![0, 1, 2]);
  assert_eq!(outputs.len(), 4);
  assert!(outputs[3].is_eos());
  assert_eq!(h.stats.drain_packets(), 3);
  assert_eq!(h.decoder.eos_status(), EosStatus::FramesFlushed);
}

/// Test that draining waits for output buffers
#[test]
fn test_drain_resumes_with_new_outputs() {
  let mut h = Harness::new(ScriptedEngine::new().with_delay(2));
  for ts in 0..3 {
    h.data(&[1], ts);
  }
  h.eos();
  h.outputs(2);

  let events = h.run();
  assert_eq!(pictures(&events).len(), 2);
  assert_eq!(h.decoder.eos_status(), EosStatus::EosSeen);

  h.outputs(2);
  let events = h.run();
  assert_eq!(pictures(&events).len(), 1);
  assert!(filled(&events).last().unwrap().is_eos());
  assert_eq!(h.decoder.eos_status(), EosStatus::FramesFlushed);
}

/// Test that an EOS buffer carrying a picture is decoded before EOS
#[test]
fn test_eos_buffer_with_payload_decoded() {
  let mut h = Harness::new(ScriptedEngine::new());
  h.data(&[1], 0);
  h.eos_with(&[2], 40);
  h.outputs(3);

  let events = h.run();
  assert_eq!(emptied(&events), vec![1, 2]);
  let outputs = filled(&events);
  assert_eq!(outputs.len(), 3);
  assert_eq!(outputs[0].timestamp, 0);
  assert_eq!(outputs[1].timestamp, 40);
  assert!(outputs[2].is_eos());
}

/// Test that configuration data queued behind EOS is returned undecoded
#[test]
fn test_codec_config_after_eos_not_decoded() {
  let mut h = Harness::new(ScriptedEngine::new());
  h.data(&[1], 10);
  h.eos();
  h.codec_config(&[0x67, 0x42]);
  h.outputs(3);

  let events = h.run();
  assert_eq!(emptied(&events), vec![1, 2, 3]);
  let stamps: Vec<i64> = pictures(&events).iter().map(|buffer| buffer.timestamp).collect();
  assert_eq!(stamps, vec![10]);
  assert!(filled(&events).last().unwrap().is_eos());
  assert_eq!(h.stats.sent_timestamps(), vec![10]);
  assert_eq!(h.decoder.eos_status(), EosStatus::FramesFlushed);
}

/// Test that a delaying decoder drains past configuration data queued after EOS
#[test]
fn test_codec_config_after_eos_with_delay() {
  let mut h = Harness::new(ScriptedEngine::new().with_delay(1));
  h.data(&[1], 10);
  h.eos();
  h.codec_config(&[0x67]);
  h.outputs(3);

  let events = h.run();
  assert_eq!(emptied(&events), vec![1, 2, 3]);
  let stamps: Vec<i64> = pictures(&events).iter().map(|buffer| buffer.timestamp).collect();
  assert_eq!(stamps, vec![10]);
  assert!(filled(&events).last().unwrap().is_eos());
  assert_eq!(h.stats.sent_timestamps(), vec![10]);
}

/// Test that EOS on a never-opened decoder only emits the EOS buffer
#[test]
fn test_eos_before_open() {
  let mut h = Harness::new(ScriptedEngine::new());
  h.eos();
  h.outputs(2);

  let events = h.run();
  assert_eq!(emptied(&events), vec![1]);
  let outputs = filled(&events);
  assert_eq!(outputs.len(), 1);
  assert!(outputs[0].is_eos());
  assert_eq!(h.stats.opens(), 0);
}

/// Test that an EOS buffer waits for an output buffer
#[test]
fn test_eos_waits_for_output() {
  let mut h = Harness::new(ScriptedEngine::new());
  h.eos();
  assert!(h.run().is_empty());

  h.outputs(1);
  let events = h.run();
  assert_eq!(emptied(&events), vec![1]);
  assert!(filled(&events)[0].is_eos());
}

/// Test that a non-delaying decoder flushes on the first empty attempt
#[test]
fn test_flush_without_delay_after_no_frame() {
  let mut h = Harness::new(ScriptedEngine::new().failing_receive());
  h.data(&[1], 0);
  h.eos();
  h.data(&[2], 40);
  h.data(&[3], 80);
  h.outputs(2);

  let events = h.run();
  assert_eq!(emptied(&events), vec![1, 2, 3]);
  let outputs = filled(&events);
  assert_eq!(outputs.len(), 1);
  assert!(outputs[0].is_eos());
  assert_eq!(h.decoder.ports().input_len(), 1);
}

/// Test that a delaying decoder flushes when the head buffer is empty
#[test]
fn test_flush_with_delay_on_empty_head() {
  let mut h = Harness::new(ScriptedEngine::new().with_delay(1).failing_receive());
  h.data(&[1], 0);
  h.eos();
  h.data(&[], 40);
  h.data(&[3], 80);
  h.outputs(2);

  let events = h.run();
  assert_eq!(emptied(&events), vec![1, 2, 3]);
  let outputs = filled(&events);
  assert_eq!(outputs.len(), 1);
  assert!(outputs[0].is_eos());
  assert_eq!(h.decoder.ports().input_len(), 1);
}

/// Test that a delaying decoder keeps decoding payload heads while draining
#[test]
fn test_delay_drain_consumes_payload_heads() {
  let mut h = Harness::new(ScriptedEngine::new().with_delay(1).failing_receive());
  h.data(&[1], 0);
  h.eos();
  h.data(&[2], 40);
  h.data(&[3], 80);
  h.outputs(2);

  let events = h.run();
  assert_eq!(emptied(&events), vec![1, 2, 3, 4]);
  let outputs = filled(&events);
  assert_eq!(outputs.len(), 1);
  assert!(outputs[0].is_eos());
  assert_eq!(h.stats.drain_packets(), 1);
}

// ============================================================================
// After end of stream
// ============================================================================

/// Test that no output is produced after EOS until reset
#[test]
fn test_no_output_after_eos_until_reset() {
  let mut h = Harness::new(ScriptedEngine::new());
  h.data(&[1], 0);
  h.eos();
  h.outputs(2);
  h.run();
  assert_eq!(h.decoder.eos_status(), EosStatus::FramesFlushed);

  h.data(&[2], 40);
  h.outputs(1);
  assert!(h.run().is_empty());

  h.decoder.on_reset().unwrap();
  assert_eq!(h.stats.closes(), 1);
  assert_eq!(h.decoder.eos_status(), EosStatus::DataAvailable);

  let events = h.run();
  assert_eq!(emptied(&events), vec![3]);
  let outputs = pictures(&events);
  assert_eq!(outputs.len(), 1);
  assert_eq!(outputs[0].timestamp, 40);
  assert_eq!(h.stats.opens(), 2);
}

/// Test that an input flush resumes decoding after EOS
#[test]
fn test_input_flush_resumes_decoding() {
  let mut h = Harness::new(ScriptedEngine::new());
  h.data(&[1], 0);
  h.eos();
  h.outputs(2);
  h.run();
  assert_eq!(h.decoder.eos_status(), EosStatus::FramesFlushed);

  h.decoder.on_port_flush_completed(0).unwrap();
  assert_eq!(h.decoder.eos_status(), EosStatus::DataAvailable);
  assert_eq!(h.stats.flushes(), 1);

  h.data(&[2], 80);
  h.outputs(1);
  let events = h.run();
  assert_eq!(pictures(&events).len(), 1);
  assert_eq!(h.stats.opens(), 1);
}

/// Test that an output flush leaves the decoder untouched
#[test]
fn test_output_flush_keeps_state() {
  let mut h = Harness::new(ScriptedEngine::new());
  h.data(&[1], 0);
  h.eos();
  h.outputs(2);
  h.run();

  h.decoder.on_port_flush_completed(1).unwrap();
  assert_eq!(h.decoder.eos_status(), EosStatus::FramesFlushed);
  assert_eq!(h.stats.flushes(), 0);
}

/// Test that flushing an unknown port is rejected
#[test]
fn test_flush_bad_port() {
  let mut h = Harness::new(ScriptedEngine::new());
  let err = h.decoder.on_port_flush_completed(2).unwrap_err();
  assert!(matches!(err, ComponentError::BadPortIndex(2)));
}

/// Test that reset discards configuration data of the old session
#[test]
fn test_reset_releases_configuration_data() {
  let mut h = Harness::new(ScriptedEngine::new());
  h.codec_config(&[1, 2, 3]);
  h.data(&[9], 0);
  h.outputs(1);
  h.run();
  assert_eq!(h.decoder.lifecycle().extradata().len(), 3);

  h.decoder.on_reset().unwrap();
  assert!(h.decoder.lifecycle().extradata().is_empty());
  assert!(!h.decoder.lifecycle().is_open());

  h.codec_config(&[4, 5]);
  h.data(&[9], 40);
  h.outputs(1);
  h.run();
  assert_eq!(h.stats.last_extradata(), vec![4, 5]);
}
