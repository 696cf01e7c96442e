/// Builds an [`Element`](crate::Element) from a JSON-like literal.
///
/// Object keys must be string literals; leaves are anything convertible with
/// `Element::from`. Object entries go through [`ElementMap::set`](crate::ElementMap::set),
/// so a repeated key ends up last with its final value.
///
/// ```rust
/// use treebind::{element, Element};
///
/// let value = element!({
///     "id": 7,
///     "tags": ["a", "b"],
///     "owner": null
/// });
/// assert_eq!(value.get("id").unwrap(), &Element::from(7));
/// assert!(value.get("owner").unwrap().is_null());
/// ```
#[macro_export]
macro_rules! element {
    (null) => {
        $crate::Element::null()
    };

    (true) => {
        $crate::Element::from(true)
    };

    (false) => {
        $crate::Element::from(false)
    };

    ([]) => {
        $crate::Element::array()
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Element::Array(
            vec![$($crate::element!($elem)),*].into_iter().collect::<$crate::ElementArray>()
        )
    };

    ({}) => {
        $crate::Element::object()
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut object = $crate::ElementMap::new();
        $(
            object.set($key, $crate::element!($value));
        )*
        $crate::Element::Object(object)
    }};

    ($other:expr) => {
        $crate::Element::from($other)
    };
}
