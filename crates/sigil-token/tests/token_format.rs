//! Wire-format tests through the public API.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use flate2::read::ZlibDecoder;
use proptest::prelude::*;
use sigil_token::{AccessToken, RtcPrivilege, RtmPrivilege, Service, TokenIssuer, VERSION};
use std::io::Read;

const APP_ID: &str = "abcdef1234567890abcdef1234567890";
const APP_CERT: &str = "fedcba0987654321fedcba0987654321";

fn inflate(token: &str) -> Vec<u8> {
    let body = token.strip_prefix(VERSION).expect("version prefix");
    let compressed = STANDARD.decode(body).expect("base64 body");
    let mut out = Vec::new();
    ZlibDecoder::new(compressed.as_slice())
        .read_to_end(&mut out)
        .expect("zlib body");
    out
}

fn pinned() -> AccessToken {
    AccessToken::new(APP_ID, APP_CERT, 900)
        .with_issue_ts(1_700_000_000)
        .with_salt(4242)
}

#[test]
fn room1_scenario_payload_size() {
    let mut service = Service::rtc("room1", 42);
    service.add_privilege(RtcPrivilege::JoinChannel, 3600);

    let mut token = AccessToken::new(APP_ID, APP_CERT, 900);
    token.add_service(service);
    let envelope_len = token.signing_info().unwrap().len();
    assert!((60..=90).contains(&envelope_len));

    let built = token.build().unwrap();
    assert!(built.starts_with("007"));

    let payload = inflate(&built);
    // u16 length + 32-byte signature, then the envelope
    assert_eq!(payload.len(), 2 + 32 + envelope_len);
    assert_eq!(&payload[..2], &[32, 0]);
}

#[test]
fn combined_token_embeds_both_services() {
    let mut rtc = Service::rtc("room1", 101);
    for privilege in RtcPrivilege::ALL {
        rtc.add_privilege(privilege, 86400);
    }
    let mut rtm = Service::rtm("101");
    rtm.add_privilege(RtmPrivilege::Login, 86400);

    let mut token = pinned();
    token.add_service(rtc).add_service(rtm);
    let envelope = token.signing_info().unwrap();
    let payload = inflate(&token.build().unwrap());

    assert_eq!(&payload[34..], envelope.as_slice());
    // app id string, three u32 fields, then the service count
    let count_offset = 2 + APP_ID.len() + 12;
    assert_eq!(&envelope[count_offset..count_offset + 2], &[2, 0]);
}

#[test]
fn issuer_fallback_returns_app_id() {
    let credential = TokenIssuer::new(APP_ID, Some(String::new()))
        .issue("room1", 42)
        .unwrap();
    assert_eq!(credential.token, APP_ID);
}

#[test]
fn distinct_salts_give_distinct_tokens() {
    let build = |salt| {
        let mut token = pinned().with_salt(salt);
        token.add_service(Service::rtm("u"));
        token.build().unwrap()
    };
    assert_ne!(build(1), build(99_999_999));
}

proptest! {
    #[test]
    fn privilege_insertion_order_is_irrelevant(
        privileges in proptest::collection::btree_map(any::<u16>(), any::<u32>(), 0..16),
        seed in any::<u64>(),
    ) {
        let mut forward = Service::rtc("room", 7);
        for (id, expire) in &privileges {
            forward.add_privilege(*id, *expire);
        }

        // Deterministic shuffle of the same entries.
        let mut entries: Vec<_> = privileges.iter().collect();
        entries.sort_by_key(|(id, _)| (u64::from(**id)).wrapping_mul(seed | 1) % 65_521);
        let mut shuffled = Service::rtc("room", 7);
        for (id, expire) in entries {
            shuffled.add_privilege(*id, *expire);
        }

        let mut a = pinned();
        a.add_service(forward).add_service(Service::rtm("x"));
        let mut b = pinned();
        b.add_service(Service::rtm("x")).add_service(shuffled);

        prop_assert_eq!(a.signing_info().unwrap(), b.signing_info().unwrap());
    }
}
