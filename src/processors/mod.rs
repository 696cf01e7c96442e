//! Built-in processors.
//!
//! | Type | Processor | Written as |
//! |---|---|---|
//! | [`Uuid`](::uuid::Uuid) | [`UuidProcessor`] | per [`UuidMode`](crate::UuidMode) |
//! | [`InetAddress`], [`IpAddr`], [`Ipv4Addr`], [`Ipv6Addr`] | [`InetProcessor`] | per [`InetAddressMode`](crate::InetAddressMode) |
//! | [`InetSocketAddress`], [`SocketAddr`] | [`InetProcessor`] | per [`InetAddressMode`](crate::InetAddressMode), with port |
//! | `DateTime<Utc>`, `DateTime<FixedOffset>`, [`SystemTime`] | [`TemporalProcessor`] | per [`DateMode`](crate::DateMode) and [`DateFormat`](crate::DateFormat) |
//! | [`PathBuf`], [`Url`](url::Url), `Box<str>`, `Arc<str>` | [`TextProcessor`] | string |
//!
//! Every processor writes in the configured mode but reads any form it can
//! write.

pub mod inet;
pub mod temporal;
pub mod text;
pub mod uuid;

pub use self::inet::{InetAddress, InetProcessor, InetSocketAddress};
pub use self::temporal::TemporalProcessor;
pub use self::text::TextProcessor;
pub use self::uuid::UuidProcessor;

use crate::registry::{erase, ErasedProcessor};
use crate::{Element, Error, ProcessorOptions};
use chrono::{DateTime, FixedOffset, Utc};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

/// The default processors for `options`, in registration order.
pub(crate) fn defaults(options: &ProcessorOptions) -> Vec<Arc<dyn ErasedProcessor>> {
    let inet = InetProcessor::new(options.inet_address_mode);
    let temporal = TemporalProcessor::new(options.date_mode, options.date_format.clone());

    vec![
        erase::<::uuid::Uuid, _>(UuidProcessor::new(options.uuid_mode)),
        erase::<InetAddress, _>(inet),
        erase::<IpAddr, _>(inet),
        erase::<Ipv4Addr, _>(inet),
        erase::<Ipv6Addr, _>(inet),
        erase::<InetSocketAddress, _>(inet),
        erase::<SocketAddr, _>(inet),
        erase::<DateTime<Utc>, _>(temporal.clone()),
        erase::<DateTime<FixedOffset>, _>(temporal.clone()),
        erase::<SystemTime, _>(temporal),
        erase::<PathBuf, _>(TextProcessor),
        erase::<url::Url, _>(TextProcessor),
        erase::<Box<str>, _>(TextProcessor),
        erase::<Arc<str>, _>(TextProcessor),
    ]
}

/// Conversion error for an element of the wrong shape.
pub(crate) fn unexpected(type_name: &str, expected: &str, element: &Element) -> Error {
    let found = match element {
        Element::Primitive(p) => p.describe(),
        other => other.shape().to_string(),
    };
    Error::conversion(type_name, expected, found)
}
