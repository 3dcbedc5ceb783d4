//! Integration tests for the path router
//!
//! These tests verify end-to-end behavior of routing including:
//! - Explicit routing and n-N alias routing
//! - Packets passing through a chain of digipeaters
//! - Loop prevention and ignored packets
//! - Rule options (hop limits, substitution, explicit aliases)
//! - The text and buffer entry points

use aprs_packet::{Callsign, FormatError, Packet, MAX_HOPS};
use aprs_route::{
    route_packet, try_route_packet, AliasRule, DecrementPolicy, IgnoreReason, RouteError,
    RouteOutcome, Router, RouterConfig,
};

// ============================================================================
// Helper Functions
// ============================================================================

mod helpers {
    use super::*;

    /// Router built from a callsign and rules text
    pub fn router(callsign: &str, rules: &str) -> Router {
        Router::new(RouterConfig::from_rules(callsign, rules).unwrap())
    }

    /// Router with a single hand-built rule
    pub fn router_with(callsign: &str, rule: AliasRule) -> Router {
        let callsign = Callsign::parse(callsign).unwrap();
        Router::new(RouterConfig::new(callsign).with_rule(rule))
    }

    pub fn packet(text: &str) -> Packet {
        Packet::parse(text).unwrap()
    }

    /// Route text and return the routed text or the ignore reason
    pub fn route(router: &Router, text: &str) -> Result<String, IgnoreReason> {
        match router.route(&packet(text)) {
            RouteOutcome::Repeat(routed) => Ok(routed.to_string()),
            RouteOutcome::Ignore(reason) => Err(reason),
        }
    }
}

// ============================================================================
// Routing Scenarios
// ============================================================================

mod routing_tests {
    use super::*;

    #[test]
    fn explicit_address_has_priority() {
        let router = helpers::router("DIGI", "WIDE1");
        assert_eq!(
            helpers::route(&router, "N0CALL>APRS,DIGI,WIDE1-1:data").unwrap(),
            "N0CALL>APRS,DIGI*,WIDE1-1:data"
        );
    }

    #[test]
    fn alias_decrements_to_exhaustion() {
        let router = helpers::router("DIGI", "WIDE");
        assert_eq!(
            helpers::route(&router, "N0CALL>APRS,WIDE1-1,WIDE2-1:data").unwrap(),
            "N0CALL>APRS,DIGI*,WIDE1,WIDE2-1:data"
        );
    }

    #[test]
    fn alias_decrements_without_exhaustion() {
        let router = helpers::router("DIGI", "WIDE");
        assert_eq!(
            helpers::route(&router, "N0CALL>APRS,WIDE2-2:data").unwrap(),
            "N0CALL>APRS,DIGI*,WIDE2-1:data"
        );
    }

    #[test]
    fn later_elements_are_not_consulted() {
        let router = helpers::router("DIGI", "WIDE");
        assert_eq!(
            helpers::route(&router, "N0CALL>APRS,CALLA,DIGI,WIDE1-1:data"),
            Err(IgnoreReason::NoApplicableRoute)
        );
    }

    #[test]
    fn payload_is_preserved() {
        let router = helpers::router("DIGI", "WIDE");
        assert_eq!(
            helpers::route(&router, "N0CALL>APRS,WIDE1-1::BLN1     :a:b:c").unwrap(),
            "N0CALL>APRS,DIGI*,WIDE1::BLN1     :a:b:c"
        );
    }

    #[test]
    fn router_ssid_must_match() {
        let router = helpers::router("DIGI-1", "");
        assert_eq!(
            helpers::route(&router, "N0CALL>APRS,DIGI-1:data").unwrap(),
            "N0CALL>APRS,DIGI-1*:data"
        );
        assert_eq!(
            helpers::route(&router, "N0CALL>APRS,DIGI:data"),
            Err(IgnoreReason::NoApplicableRoute)
        );
    }

    #[test]
    fn chain_of_digipeaters() {
        let digi1 = helpers::router("DIGI1", "WIDE1,WIDE2");
        let digi2 = helpers::router("DIGI2", "WIDE2");
        let digi3 = helpers::router("DIGI3", "WIDE2");
        let digi4 = helpers::router("DIGI4", "WIDE");

        let hop1 = helpers::route(&digi1, "N0CALL>APRS,WIDE1-1,WIDE2-2:data").unwrap();
        assert_eq!(hop1, "N0CALL>APRS,DIGI1*,WIDE1,WIDE2-2:data");

        let hop2 = helpers::route(&digi2, &hop1).unwrap();
        assert_eq!(hop2, "N0CALL>APRS,DIGI1*,WIDE1,DIGI2*,WIDE2-1:data");

        let hop3 = helpers::route(&digi3, &hop2).unwrap();
        assert_eq!(hop3, "N0CALL>APRS,DIGI1*,WIDE1,DIGI2*,DIGI3*,WIDE2:data");

        assert_eq!(
            helpers::route(&digi4, &hop3),
            Err(IgnoreReason::PathExhausted)
        );
        assert_eq!(
            helpers::route(&digi1, &hop3),
            Err(IgnoreReason::AlreadyRelayedOrOwnPacket)
        );
    }
}

// ============================================================================
// Ignored Packets
// ============================================================================

mod ignore_tests {
    use super::*;

    #[test]
    fn already_relayed() {
        let router = helpers::router("DIGI", "WIDE");
        assert_eq!(
            helpers::route(&router, "N0CALL>APRS,DIGI*,WIDE1-1:data"),
            Err(IgnoreReason::AlreadyRelayedOrOwnPacket)
        );
    }

    #[test]
    fn own_packet() {
        let router = helpers::router("DIGI", "WIDE");
        assert_eq!(
            helpers::route(&router, "digi>APRS,WIDE1-1:data"),
            Err(IgnoreReason::AlreadyRelayedOrOwnPacket)
        );
    }

    #[test]
    fn addressed_to_router() {
        let router = helpers::router("DIGI", "WIDE");
        assert_eq!(
            helpers::route(&router, "N0CALL>DIGI,WIDE1-1:data"),
            Err(IgnoreReason::AddressedToRouter)
        );
    }

    #[test]
    fn path_exhausted() {
        let router = helpers::router("DIGI", "WIDE");
        assert_eq!(
            helpers::route(&router, "N0CALL>APRS,CALLA*,CALLB*:data"),
            Err(IgnoreReason::PathExhausted)
        );
    }

    #[test]
    fn unconfigured_alias() {
        let router = helpers::router("DIGI", "WIDE");
        assert_eq!(
            helpers::route(&router, "N0CALL>APRS,TRACE2-2:data"),
            Err(IgnoreReason::NoApplicableRoute)
        );
    }
}

// ============================================================================
// Rule Options
// ============================================================================

mod rule_tests {
    use super::*;

    #[test]
    fn trap_excessive_hops() {
        let router = helpers::router_with(
            "DIGI",
            AliasRule::member("WIDE", 7)
                .with_hop_limit(2)
                .with_policy(DecrementPolicy::Trap),
        );
        assert_eq!(
            helpers::route(&router, "N0CALL>APRS,WIDE7-7,WIDE2-1:data").unwrap(),
            "N0CALL>APRS,DIGI*,WIDE2-1:data"
        );
    }

    #[test]
    fn reject_excessive_hops() {
        let router = helpers::router_with(
            "DIGI",
            AliasRule::family("WIDE")
                .with_hop_limit(2)
                .with_policy(DecrementPolicy::Reject),
        );
        assert_eq!(
            helpers::route(&router, "N0CALL>APRS,WIDE3-3:data"),
            Err(IgnoreReason::HopLimitExceeded)
        );
        assert!(helpers::route(&router, "N0CALL>APRS,WIDE3-2:data").is_ok());
    }

    #[test]
    fn text_hop_limit_routes_past_limit() {
        let router = helpers::router("DIGI", "WIDE3-2");
        assert_eq!(
            helpers::route(&router, "N0CALL>APRS,WIDE3-3:data").unwrap(),
            "N0CALL>APRS,DIGI*,WIDE3-2:data"
        );
    }

    #[test]
    fn substitute_complete_alias() {
        let router =
            helpers::router_with("DIGI", AliasRule::family("WIDE").with_substitute(true));
        assert_eq!(
            helpers::route(&router, "N0CALL>APRS,WIDE1-1,WIDE2-1:data").unwrap(),
            "N0CALL>APRS,DIGI*,WIDE2-1:data"
        );
    }

    #[test]
    fn full_path_decrements_in_place() {
        let router = helpers::router("DIGI", "WIDE");
        let text = "N0CALL>APRS,A*,B*,C*,D*,E*,F*,G*,WIDE3-3:data";
        assert_eq!(
            helpers::route(&router, text).unwrap(),
            "N0CALL>APRS,A*,B*,C*,D*,E*,F*,G*,WIDE3-2:data"
        );
    }

    #[test]
    fn explicit_alias_insert_and_substitute() {
        let router = helpers::router("DIGI", "RELAY");
        assert_eq!(
            helpers::route(&router, "N0CALL>APRS,RELAY,WIDE2-2:data").unwrap(),
            "N0CALL>APRS,DIGI*,RELAY*,WIDE2-2:data"
        );

        let router =
            helpers::router_with("DIGI", AliasRule::family("RELAY").with_substitute(true));
        assert_eq!(
            helpers::route(&router, "N0CALL>APRS,RELAY,WIDE2-2:data").unwrap(),
            "N0CALL>APRS,DIGI*,WIDE2-2:data"
        );
    }

    #[test]
    fn diagnostics_annotate_routed_packet() {
        let router = helpers::router("DIGI", "WIDE");
        let report = router.route_with_diagnostics(&helpers::packet(
            "N0CALL>APRS,WIDE1-1,WIDE2-1:data",
        ));
        let lines = report.annotate();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].message, "Inserted DIGI* at position 0");
        assert_eq!(lines[1].packet, "N0CALL>APRS,DIGI*,WIDE1,WIDE2-1:data");
        assert_eq!(lines[1].underline, format!("{}~~~~~", " ".repeat(12)));
    }
}

// ============================================================================
// Text Entry Points
// ============================================================================

mod boundary_tests {
    use super::*;

    #[test]
    fn route_packet_reports_required_size() {
        let err = route_packet("N0CALL>APRS,WIDE2-2:data", "DIGI", "WIDE2", 10).unwrap_err();
        let expected = "N0CALL>APRS,DIGI*,WIDE2-1:data";
        assert_eq!(
            err,
            RouteError::Format(FormatError::BufferTooSmall {
                required: expected.len(),
                capacity: 10
            })
        );
    }

    #[test]
    fn try_route_packet_exact_fit() {
        let expected = "N0CALL>APRS,DIGI*,WIDE2-1:data";
        let mut out = vec![0u8; expected.len()];
        let mut size = 0;
        assert!(try_route_packet(
            "N0CALL>APRS,WIDE2-2:data",
            "DIGI",
            "WIDE2",
            &mut out,
            &mut size
        ));
        assert_eq!(size, expected.len());
        assert_eq!(out, expected.as_bytes());
    }

    #[test]
    fn try_route_packet_rejects_bad_rules() {
        let mut out = [0u8; 128];
        let mut size = 0;
        assert!(!try_route_packet(
            "N0CALL>APRS,WIDE2-2:data",
            "DIGI",
            "WIDE2-X",
            &mut out,
            &mut size
        ));
        assert_eq!(size, 0);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    fn element() -> impl Strategy<Value = String> {
        let name = prop_oneof![
            Just("WIDE1-1"),
            Just("WIDE2-2"),
            Just("WIDE2-1"),
            Just("WIDE2"),
            Just("TRACE3-3"),
            Just("RELAY"),
            Just("DIGI"),
            Just("CALLA-5"),
            Just("N0CALL"),
        ];
        (name, any::<bool>()).prop_map(|(name, used)| {
            if used {
                format!("{}*", name)
            } else {
                name.to_string()
            }
        })
    }

    fn packet_text(max_path: usize) -> impl Strategy<Value = String> {
        (
            prop_oneof![Just("N1ABC"), Just("K2XYZ-9"), Just("DIGI")],
            prop_oneof![Just("APRS"), Just("APZ001"), Just("DIGI")],
            prop::collection::vec(element(), 0..=max_path),
            "[ -~]{0,20}",
        )
            .prop_map(|(source, dest, path, payload)| {
                let mut text = format!("{}>{}", source, dest);
                for element in path {
                    text.push(',');
                    text.push_str(&element);
                }
                format!("{}:{}", text, payload)
            })
    }

    proptest! {
        #[test]
        fn ignored_packets_format_unchanged(text in packet_text(MAX_HOPS)) {
            let router = helpers::router("DIGI", "WIDE,RELAY");
            let packet = helpers::packet(&text);

            if let RouteOutcome::Ignore(_) = router.route(&packet) {
                prop_assert_eq!(packet.format(text.len()).unwrap(), text);
            }
        }

        #[test]
        fn routed_packets_stay_well_formed(text in packet_text(MAX_HOPS)) {
            let router = helpers::router("DIGI", "WIDE,RELAY");

            if let RouteOutcome::Repeat(routed) = router.route(&helpers::packet(&text)) {
                let original_len = helpers::packet(&text).path.len();
                prop_assert!(routed.path.len() <= MAX_HOPS);
                prop_assert!(routed.path.len() <= original_len + 1);

                let formatted = routed.format(routed.encoded_len()).unwrap();
                prop_assert_eq!(helpers::packet(&formatted), routed);
            }
        }

        #[test]
        fn routed_packets_are_not_routed_again(text in packet_text(MAX_HOPS - 1)) {
            let router = helpers::router("DIGI", "WIDE,RELAY");

            if let RouteOutcome::Repeat(routed) = router.route(&helpers::packet(&text)) {
                prop_assert_eq!(
                    router.route(&routed),
                    RouteOutcome::Ignore(IgnoreReason::AlreadyRelayedOrOwnPacket)
                );
            }
        }

        #[test]
        fn boundary_agrees_with_router(text in packet_text(MAX_HOPS)) {
            let router = helpers::router("DIGI", "WIDE,RELAY");
            let expected = router.route(&helpers::packet(&text)).into_packet();

            let mut out = [0u8; 512];
            let mut size = 0;
            let routed = try_route_packet(&text, "DIGI", "WIDE,RELAY", &mut out, &mut size);

            prop_assert_eq!(routed, expected.is_some());
            if let Some(expected) = expected {
                let expected = expected.to_string();
                prop_assert_eq!(&out[..size], expected.as_bytes());
            }
        }
    }
}
