use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use num_bigint::BigInt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use treebind::{
    element, Bind, Binder, DateFormat, DateMode, Element, Error, InetAddress, InetAddressMode,
    InetSocketAddress, ProcessorOptions, RegistryBuilder, UuidMode,
};
use url::Url;
use uuid::Uuid;

fn binder_with(options: ProcessorOptions) -> Binder {
    Binder::builder()
        .with_registry(RegistryBuilder::new(options))
        .build()
        .unwrap()
}

fn round_trip<T: Bind + PartialEq + std::fmt::Debug>(binder: &Binder, value: &T) -> Element {
    let element = binder.to_element(value).unwrap();
    let back: T = binder.to_object(&element).unwrap();
    assert_eq!(&back, value);
    element
}

const UUID_MODES: [UuidMode; 6] = [
    UuidMode::String,
    UuidMode::ByteArray,
    UuidMode::ShortArray,
    UuidMode::IntArray,
    UuidMode::LongArray,
    UuidMode::Number,
];

const INET_MODES: [InetAddressMode; 3] = [
    InetAddressMode::String,
    InetAddressMode::StringFill,
    InetAddressMode::Number,
];

#[test]
fn test_uuid_extremes_in_every_mode() {
    let values = [Uuid::nil(), Uuid::max(), Uuid::new_v4()];
    for mode in UUID_MODES {
        let binder = binder_with(ProcessorOptions::new().with_uuid_mode(mode));
        for value in &values {
            round_trip(&binder, value);
        }
    }
}

#[test]
fn test_uuid_read_is_mode_independent() {
    let value = Uuid::parse_str("e4ec171a-665d-43fa-946e-852cc67cc590").unwrap();
    let writers: Vec<Element> = UUID_MODES
        .iter()
        .map(|mode| {
            binder_with(ProcessorOptions::new().with_uuid_mode(*mode))
                .to_element(&value)
                .unwrap()
        })
        .collect();

    let reader = binder_with(ProcessorOptions::new());
    for element in &writers {
        assert_eq!(reader.to_object::<Uuid>(element).unwrap(), value);
    }
}

#[test]
fn test_uuid_max_as_number() {
    let binder = binder_with(ProcessorOptions::new().with_uuid_mode(UuidMode::Number));
    let element = binder.to_element(&Uuid::max()).unwrap();
    assert_eq!(element, Element::from(BigInt::from(u128::MAX)));
}

#[test]
fn test_uuid_bad_array_length() {
    let binder = binder_with(ProcessorOptions::new());
    let err = binder.to_object::<Uuid>(&element!([1, 2, 3])).unwrap_err();
    assert!(matches!(err, Error::TypeConversion { .. }));
}

#[test]
fn test_ip_addresses_in_every_mode() {
    let v4 = [
        Ipv4Addr::new(0, 0, 0, 0),
        Ipv4Addr::new(192, 168, 0, 1),
        Ipv4Addr::new(255, 255, 255, 255),
    ];
    let v6: Vec<Ipv6Addr> = ["::", "::1", "ffff::", "2001:db8::8a2e:370:7334"]
        .iter()
        .map(|s| s.parse().unwrap())
        .collect();

    for mode in INET_MODES {
        let binder = binder_with(ProcessorOptions::new().with_inet_address_mode(mode));
        for ip in &v4 {
            round_trip(&binder, ip);
            round_trip(&binder, &IpAddr::V4(*ip));
        }
        for ip in &v6 {
            round_trip(&binder, ip);
            round_trip(&binder, &InetAddress::from(*ip));
        }
    }
}

#[test]
fn test_ip_string_forms() {
    let loopback: Ipv6Addr = "::1".parse().unwrap();

    let plain = binder_with(ProcessorOptions::new());
    assert_eq!(plain.to_element(&loopback).unwrap(), Element::from("::1"));
    assert_eq!(
        plain.to_element(&Ipv4Addr::new(10, 0, 0, 1)).unwrap(),
        Element::from("10.0.0.1")
    );

    let filled = binder_with(ProcessorOptions::new().with_inet_address_mode(InetAddressMode::StringFill));
    assert_eq!(
        filled.to_element(&loopback).unwrap(),
        Element::from("0000:0000:0000:0000:0000:0000:0000:0001")
    );
    assert_eq!(
        filled.to_element(&Ipv4Addr::new(10, 0, 0, 1)).unwrap(),
        Element::from("010.000.000.001")
    );
}

#[test]
fn test_ip_numbers_keep_families_apart() {
    let binder = binder_with(ProcessorOptions::new().with_inet_address_mode(InetAddressMode::Number));

    let v4_zero = binder.to_element(&IpAddr::V4(Ipv4Addr::UNSPECIFIED)).unwrap();
    let v6_zero = binder.to_element(&IpAddr::V6(Ipv6Addr::UNSPECIFIED)).unwrap();
    assert_ne!(v4_zero, v6_zero);

    assert_eq!(
        binder.to_object::<IpAddr>(&v6_zero).unwrap(),
        IpAddr::V6(Ipv6Addr::UNSPECIFIED)
    );
    assert!(binder.to_object::<Ipv4Addr>(&v6_zero).is_err());
}

#[test]
fn test_hostnames() {
    let binder = binder_with(ProcessorOptions::new());
    let host = InetAddress::host("db.internal");
    assert_eq!(round_trip(&binder, &host), Element::from("db.internal"));

    // A plain IP type cannot hold a hostname.
    assert!(binder.to_object::<IpAddr>(&Element::from("db.internal")).is_err());

    let numeric = binder_with(ProcessorOptions::new().with_inet_address_mode(InetAddressMode::Number));
    assert!(matches!(
        numeric.to_element(&host).unwrap_err(),
        Error::TypeConversion { .. }
    ));
}

#[test]
fn test_socket_addresses_in_every_mode() {
    let sockets: Vec<SocketAddr> = ["192.168.0.1:8000", "[::1]:443", "0.0.0.0:0", "[ffff::]:65535"]
        .iter()
        .map(|s| s.parse().unwrap())
        .collect();

    for mode in INET_MODES {
        let binder = binder_with(ProcessorOptions::new().with_inet_address_mode(mode));
        for socket in &sockets {
            round_trip(&binder, socket);
            round_trip(&binder, &InetSocketAddress::from(*socket));
        }
    }
}

#[test]
fn test_socket_string_and_number() {
    let socket: SocketAddr = "192.168.0.1:8000".parse().unwrap();

    let plain = binder_with(ProcessorOptions::new());
    assert_eq!(plain.to_element(&socket).unwrap(), Element::from("192.168.0.1:8000"));

    let v6: SocketAddr = "[::1]:443".parse().unwrap();
    assert_eq!(plain.to_element(&v6).unwrap(), Element::from("[::1]:443"));

    let numeric = binder_with(ProcessorOptions::new().with_inet_address_mode(InetAddressMode::Number));
    assert_eq!(
        numeric.to_element(&socket).unwrap(),
        Element::from(BigInt::from(0x1f40_c0a8_0001u64))
    );

    let named = InetSocketAddress::new(InetAddress::host("cache"), 6379);
    assert_eq!(round_trip(&plain, &named), Element::from("cache:6379"));
}

const JULY_FOURTH_NOON: i64 = 1_720_094_400_000;

fn eastern() -> FixedOffset {
    FixedOffset::west_opt(5 * 3600).unwrap()
}

fn instant(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis).unwrap()
}

#[test]
fn test_instants_in_both_modes() {
    let offsets = [FixedOffset::east_opt(0).unwrap(), eastern()];
    for mode in [DateMode::String, DateMode::Number] {
        for offset in offsets {
            let binder = binder_with(
                ProcessorOptions::new()
                    .with_date_mode(mode)
                    .with_date_format(DateFormat::rfc3339().with_offset(offset)),
            );
            for millis in [0, JULY_FOURTH_NOON] {
                round_trip(&binder, &instant(millis));
            }
        }
    }
}

#[test]
fn test_instant_text_uses_offset() {
    let binder = binder_with(
        ProcessorOptions::new().with_date_format(DateFormat::rfc3339().with_offset(eastern())),
    );
    assert_eq!(
        binder.to_element(&instant(JULY_FOURTH_NOON)).unwrap(),
        Element::from("2024-07-04T07:00:00-05:00")
    );
    assert_eq!(
        binder.to_element(&instant(0)).unwrap(),
        Element::from("1969-12-31T19:00:00-05:00")
    );

    let local: DateTime<FixedOffset> = binder
        .to_object(&Element::from("2024-07-04T12:00:00Z"))
        .unwrap();
    assert_eq!(local.offset(), &eastern());
    assert_eq!(local.timestamp_millis(), JULY_FOURTH_NOON);
}

#[test]
fn test_instant_reads_any_form() {
    let binder = binder_with(ProcessorOptions::new().with_date_mode(DateMode::Number));
    assert_eq!(
        binder.to_element(&instant(JULY_FOURTH_NOON)).unwrap(),
        Element::from(JULY_FOURTH_NOON)
    );
    let parsed: DateTime<Utc> = binder
        .to_object(&Element::from("2024-07-04T12:00:00Z"))
        .unwrap();
    assert_eq!(parsed, instant(JULY_FOURTH_NOON));

    assert!(binder.to_object::<DateTime<Utc>>(&Element::from("yesterday")).is_err());
}

#[test]
fn test_system_time() {
    let binder = binder_with(ProcessorOptions::new().with_date_mode(DateMode::Number));
    let time = UNIX_EPOCH + Duration::from_millis(JULY_FOURTH_NOON as u64);
    assert_eq!(round_trip(&binder, &time), Element::from(JULY_FOURTH_NOON));
    let _: SystemTime = binder.to_object(&Element::from(0i64)).unwrap();
}

#[test]
fn test_invalid_date_pattern_fails_build() {
    let err = Binder::builder()
        .with_registry(RegistryBuilder::new(
            ProcessorOptions::new().with_date_format(DateFormat::pattern("")),
        ))
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::Custom(_)));
}

#[test]
fn test_paths_and_urls() {
    let binder = binder_with(ProcessorOptions::new());

    let path = PathBuf::from("/var/lib/data.bin");
    assert_eq!(round_trip(&binder, &path), Element::from("/var/lib/data.bin"));

    let url = Url::parse("https://example.com/a?b=c").unwrap();
    assert_eq!(round_trip(&binder, &url), Element::from("https://example.com/a?b=c"));

    let err = binder.to_object::<Url>(&Element::from("not a url")).unwrap_err();
    assert!(matches!(err, Error::TypeConversion { .. }));
}

#[test]
fn test_null_round_trips_as_none() {
    let binder = binder_with(ProcessorOptions::new());
    assert!(binder.to_element(&None::<Uuid>).unwrap().is_null());
    assert_eq!(binder.to_object::<Option<Uuid>>(&Element::null()).unwrap(), None);
    assert_eq!(binder.to_object::<Option<Ipv4Addr>>(&Element::null()).unwrap(), None);
}
