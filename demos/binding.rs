//! Schemas, inheritance, processors and codecs in one walk-through.
//!
//! Run with: cargo run --example binding

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use std::error::Error;
use std::net::IpAddr;
use treebind::{
    Bind, Binder, BinderOptions, DateFormat, Expectation, FieldPolicy, InetAddressMode, JsonCodec,
    ProcessorOptions, RegistryBuilder, Schema, UuidMode,
};
use uuid::Uuid;

#[derive(Debug, Default)]
struct Resource {
    id: Uuid,
    created: Option<DateTime<Utc>>,
    revision: u32,
}

impl Bind for Resource {}

#[derive(Debug, Default)]
struct Server {
    resource: Resource,
    hostname: String,
    address: Option<IpAddr>,
    cores: u16,
    labels: Vec<String>,
}

impl Bind for Server {}

fn main() -> Result<(), Box<dyn Error>> {
    let est = FixedOffset::west_opt(5 * 3600).ok_or("bad offset")?;
    let options = ProcessorOptions::new()
        .with_uuid_mode(UuidMode::String)
        .with_inet_address_mode(InetAddressMode::String)
        .with_date_format(DateFormat::rfc3339().with_offset(est));

    let binder = Binder::builder()
        .with_registry(RegistryBuilder::new(options))
        .with_options(BinderOptions::new().with_ignore_empty_objects(true))
        .schema(
            Schema::<Resource>::new()
                .field("id", |r| &r.id, |r| &mut r.id)
                .field("created", |r| &r.created, |r| &mut r.created)
                .field("revision", |r| &r.revision, |r| &mut r.revision),
        )
        .schema(
            Schema::<Server>::new()
                .extends(|s| &s.resource, |s| &mut s.resource)
                .field("hostname", |s| &s.hostname, |s| &mut s.hostname)
                .field("address", |s| &s.address, |s| &mut s.address)
                .field_with(
                    "cores",
                    |s| &s.cores,
                    |s| &mut s.cores,
                    FieldPolicy::new()
                        .default_value(1)
                        .expect(Expectation::greater_than(0, false)),
                )
                .field_with(
                    "labels",
                    |s| &s.labels,
                    |s| &mut s.labels,
                    FieldPolicy::new().rename("tags"),
                ),
        )
        .build()?;

    let server = Server {
        resource: Resource {
            id: Uuid::new_v4(),
            created: Utc.timestamp_millis_opt(1_720_094_400_000).single(),
            revision: 4,
        },
        hostname: "db-01".to_string(),
        address: Some("10.0.0.12".parse()?),
        cores: 16,
        labels: vec!["primary".to_string()],
    };

    // Own fields first, then the parent's
    println!("Element tree:");
    let tree = binder.to_element(&server)?;
    println!("{}\n", tree);

    println!("Pretty JSON:");
    let bytes = treebind::to_bytes(&binder, &JsonCodec::pretty(), &server)?;
    println!("{}\n", String::from_utf8(bytes)?);

    // Absent "cores" falls back to its default literal
    let sparse = br#"{"hostname": "cache-02", "id": "e4ec171a-665d-43fa-946e-852cc67cc590"}"#;
    let read: Server = treebind::from_bytes(&binder, &JsonCodec::new(), sparse)?;
    println!("Read back: {:?}\n", read);

    // Expectations reject out-of-range values with the field path
    let invalid = br#"{"hostname": "broken", "cores": 0}"#;
    match treebind::from_bytes::<Server>(&binder, &JsonCodec::new(), invalid) {
        Ok(_) => println!("unexpectedly accepted"),
        Err(e) => println!("Rejected at {:?}: {}", e.field_path(), e),
    }

    Ok(())
}
