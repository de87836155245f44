//! Property-based tests for the NADA receiver core.
//!
//! These verify the estimator's structural invariants — baseline
//! monotonicity, ratio boundedness, queuing-delay non-negativity — across
//! arbitrary packet arrival patterns.

use proptest::prelude::*;
use quanta::Instant;
use std::time::Duration;

use nada::config::Config;
use nada::receiver::{RateAdaptionMode, Receiver};
use nada::window::PacketWindow;

/// Forward delays in microseconds, bounded well below the 1 s headroom the
/// tests add before subtracting send offsets.
fn forward_delays_us() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(0u64..400_000, 1..64)
}

/// Per-packet (sequence step, ECN mark, size in bits) patterns. Steps of
/// 1 are contiguous; larger steps leave gaps the loss accounting must see.
fn packet_pattern() -> impl Strategy<Value = Vec<(u16, bool, u64)>> {
    prop::collection::vec((1u16..5, any::<bool>(), 100u64..100_000), 1..64)
}

proptest! {
    #[test]
    fn baseline_delay_never_increases(delays in forward_delays_us()) {
        let t0 = Instant::now();
        let mut rx = Receiver::new(t0, Config::default());
        let mut previous = rx.baseline_delay();

        for (i, us) in delays.iter().enumerate() {
            let now = t0 + Duration::from_secs(1) + Duration::from_millis(5 * i as u64);
            let sent = now - Duration::from_micros(*us);
            rx.on_receive_media_packet(now, sent, i as u16, false, 8000).unwrap();

            prop_assert!(rx.baseline_delay() <= previous);
            previous = rx.baseline_delay();
        }
    }

    #[test]
    fn queuing_delay_splits_forward_delay_exactly(delays in forward_delays_us()) {
        let t0 = Instant::now();
        let mut rx = Receiver::new(t0, Config::default());

        for (i, us) in delays.iter().enumerate() {
            let now = t0 + Duration::from_secs(1) + Duration::from_millis(5 * i as u64);
            let sent = now - Duration::from_micros(*us);
            rx.on_receive_media_packet(now, sent, i as u16, false, 8000).unwrap();

            // baseline + queuing reassembles the forward delay, and the
            // queuing component can never go negative.
            prop_assert_eq!(
                rx.baseline_delay() + rx.queuing_delay(),
                Duration::from_micros(*us)
            );
        }
    }

    #[test]
    fn ratio_estimates_stay_in_unit_interval(pattern in packet_pattern()) {
        let t0 = Instant::now();
        let mut rx = Receiver::new(t0, Config::default());
        let mut seq = 0u16;

        for (i, (step, ecn, bits)) in pattern.iter().enumerate() {
            let now = t0 + Duration::from_secs(1) + Duration::from_millis(10 * i as u64);
            let sent = now - Duration::from_millis(20);
            seq = seq.wrapping_add(*step);
            rx.on_receive_media_packet(now, sent, seq, *ecn, *bits).unwrap();

            prop_assert!((0.0..=1.0).contains(&rx.loss_ratio()));
            prop_assert!((0.0..=1.0).contains(&rx.marking_ratio()));
            prop_assert!(rx.receiving_rate_bps() >= 0.0);
            prop_assert!(rx.receiving_rate_bps().is_finite());
        }
    }

    #[test]
    fn mode_matches_window_observations(pattern in packet_pattern()) {
        let t0 = Instant::now();
        let mut rx = Receiver::new(t0, Config::default());
        let mut seq = 0u16;
        let mut any_gap = false;

        for (i, (step, _, bits)) in pattern.iter().enumerate() {
            let now = t0 + Duration::from_secs(1) + Duration::from_millis(i as u64);
            let sent = now - Duration::from_millis(20);
            seq = seq.wrapping_add(*step);
            // A gap ahead of the very first packet is outside the observed
            // sequence range and cannot register as loss.
            any_gap |= i > 0 && *step > 1;
            rx.on_receive_media_packet(now, sent, seq, false, *bits).unwrap();
        }

        // Constant forward delay means zero queuing; only gaps can force
        // the gradual mode. (All arrivals fit inside one log window.)
        if any_gap {
            prop_assert_eq!(rx.mode(), RateAdaptionMode::GradualUpdate);
        } else {
            prop_assert_eq!(rx.mode(), RateAdaptionMode::AcceleratedRampUp);
        }
    }

    #[test]
    fn window_aggregates_are_always_sane(pattern in packet_pattern()) {
        let t0 = Instant::now();
        let mut w = PacketWindow::new(Duration::from_millis(500));
        let mut seq = 0u16;

        for (i, (step, ecn, bits)) in pattern.iter().enumerate() {
            let now = t0 + Duration::from_millis(17 * i as u64);
            seq = seq.wrapping_add(*step);
            w.add(now, seq, *ecn, *bits, false).unwrap();

            let agg = w.prune(now);
            prop_assert!((0.0..=1.0).contains(&agg.loss_ratio));
            prop_assert!((0.0..=1.0).contains(&agg.marking_ratio));
            prop_assert!(agg.receiving_rate_bps >= 0.0);
            prop_assert!(agg.receiving_rate_bps.is_finite());
        }
    }

    #[test]
    fn feedback_signal_never_exceeds_warp_bound(delays in forward_delays_us()) {
        let t0 = Instant::now();
        let config = Config::default();
        let mut rx = Receiver::new(t0, config.clone());

        for (i, us) in delays.iter().enumerate() {
            let now = t0 + Duration::from_secs(1) + Duration::from_millis(5 * i as u64);
            let sent = now - Duration::from_micros(*us);
            rx.on_receive_media_packet(now, sent, i as u16, false, 8000).unwrap();
        }

        let report = rx.build_feedback_report();
        // With no loss or marking the signal is pure (warped) delay, and
        // the warp never exceeds the raw queuing delay.
        prop_assert!(report.aggregated_congestion_signal <= rx.queuing_delay().max(config.delay_warp_threshold));
    }
}
