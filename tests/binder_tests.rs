use std::cell::RefCell;
use std::rc::Rc;
use treebind::{
    element, Bind, Binder, BinderOptions, Element, Error, Expectation, FieldPolicy,
    ProcessorOptions, RegistryBuilder, Result, Schema, TypeKey, TypeProcessor, UuidMode,
};
use uuid::Uuid;

#[derive(Debug, Default, PartialEq)]
struct Entity {
    id: i64,
    name: String,
    internal: String,
}

impl Bind for Entity {}

#[derive(Debug, Default, PartialEq)]
struct Employee {
    entity: Entity,
    name: String,
    salary: i32,
}

impl Bind for Employee {}

fn entity_schema() -> Schema<Entity> {
    Schema::<Entity>::new()
        .field("id", |e| &e.id, |e| &mut e.id)
        .field("name", |e| &e.name, |e| &mut e.name)
        .field_with("internal", |e| &e.internal, |e| &mut e.internal, FieldPolicy::new().skip())
}

fn employee_binder(inclusive: bool) -> Binder {
    Binder::builder()
        .schema(
            Schema::<Employee>::new()
                .extends(|e| &e.entity, |e| &mut e.entity)
                .field("name", |e| &e.name, |e| &mut e.name)
                .field_with(
                    "salary",
                    |e| &e.salary,
                    |e| &mut e.salary,
                    FieldPolicy::new()
                        .default_value(42)
                        .expect(Expectation::greater_than(0, inclusive)),
                ),
        )
        .schema(entity_schema())
        .build()
        .unwrap()
}

fn employee() -> Employee {
    Employee {
        entity: Entity {
            id: 7,
            name: "hidden".to_string(),
            internal: "secret".to_string(),
        },
        name: "Grace".to_string(),
        salary: 100,
    }
}

#[test]
fn test_own_fields_shadow_parent_fields() {
    let binder = employee_binder(false);
    let element = binder.to_element(&employee()).unwrap();

    assert_eq!(
        element.as_object().unwrap().keys().collect::<Vec<_>>(),
        vec!["name", "salary", "id"]
    );
    assert_eq!(element.get("name").unwrap(), &Element::from("Grace"));
}

#[test]
fn test_skipped_parent_field_is_never_bound() {
    let binder = employee_binder(false);
    let element = binder.to_element(&employee()).unwrap();
    assert!(element.get("internal").is_err());

    let read: Employee = binder
        .to_object(&element!({"name": "Ada", "internal": "leak", "id": 3}))
        .unwrap();
    assert_eq!(read.entity.internal, "");
    assert_eq!(read.entity.id, 3);
    assert_eq!(read.entity.name, "");
    assert_eq!(read.name, "Ada");
}

#[test]
fn test_default_literal_applies_only_when_absent() {
    let binder = employee_binder(false);

    let absent: Employee = binder.to_object(&element!({"name": "Ada"})).unwrap();
    assert_eq!(absent.salary, 42);

    let present: Employee = binder.to_object(&element!({"name": "Ada", "salary": 7})).unwrap();
    assert_eq!(present.salary, 7);
}

#[test]
fn test_expectation_boundary() {
    let exclusive = employee_binder(false);
    let err = exclusive
        .to_object::<Employee>(&element!({"salary": 0}))
        .unwrap_err();
    assert!(matches!(err.root(), Error::ExpectationFailed { .. }));
    assert_eq!(err.field_path(), vec!["salary"]);

    let inclusive = employee_binder(true);
    let read: Employee = inclusive.to_object(&element!({"salary": 0})).unwrap();
    assert_eq!(read.salary, 0);
}

#[test]
fn test_round_trip_with_parent() {
    let binder = employee_binder(false);
    let original = employee();
    let read: Employee = binder.to_object(&binder.to_element(&original).unwrap()).unwrap();

    assert_eq!(read.name, original.name);
    assert_eq!(read.salary, original.salary);
    assert_eq!(read.entity.id, original.entity.id);
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Shape {
    sides: u32,
}

impl Bind for Shape {}

#[derive(Debug, Clone, Default, PartialEq)]
struct Square {
    shape: Shape,
    length: f64,
}

impl Bind for Square {}

struct ShapeProcessor;

impl TypeProcessor<Shape> for ShapeProcessor {
    fn to_element(&self, value: Option<&Shape>) -> Result<Element> {
        Ok(value.map_or_else(Element::null, |s| Element::from(format!("shape:{}", s.sides))))
    }

    fn to_object(&self, element: &Element) -> Result<Option<Shape>> {
        if element.is_null() {
            return Ok(None);
        }
        let text = element.as_str()?;
        let sides = text
            .strip_prefix("shape:")
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| Error::conversion("Shape", "shape:<sides>", text))?;
        Ok(Some(Shape { sides }))
    }
}

struct SquareProcessor;

impl TypeProcessor<Square> for SquareProcessor {
    fn to_element(&self, value: Option<&Square>) -> Result<Element> {
        Ok(value.map_or_else(Element::null, |s| Element::from(format!("square:{}", s.length))))
    }

    fn to_object(&self, element: &Element) -> Result<Option<Square>> {
        if element.is_null() {
            return Ok(None);
        }
        let text = element.as_str()?;
        let length = text
            .strip_prefix("square:")
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| Error::conversion("Square", "square:<length>", text))?;
        Ok(Some(Square {
            shape: Shape { sides: 4 },
            length,
        }))
    }
}

fn square() -> Square {
    Square {
        shape: Shape { sides: 4 },
        length: 2.5,
    }
}

#[test]
fn test_most_specific_processor_wins_in_any_order() {
    let base_first = RegistryBuilder::default()
        .register(ShapeProcessor)
        .register(SquareProcessor)
        .extends::<Square, Shape>(|s| &s.shape);
    let sub_first = RegistryBuilder::default()
        .register(SquareProcessor)
        .register(ShapeProcessor)
        .extends::<Square, Shape>(|s| &s.shape);

    for registry in [base_first, sub_first] {
        let binder = Binder::builder().with_registry(registry).build().unwrap();
        assert_eq!(binder.to_element(&square()).unwrap(), Element::from("square:2.5"));
        assert_eq!(binder.to_element(&Shape { sides: 3 }).unwrap(), Element::from("shape:3"));
        assert_eq!(
            binder.registry().distance(TypeKey::of::<Square>(), TypeKey::of::<Shape>()),
            1
        );
    }
}

#[test]
fn test_ancestor_processor_needs_lift_to_read() {
    let view_only = Binder::builder()
        .with_registry(
            RegistryBuilder::default()
                .register(ShapeProcessor)
                .extends::<Square, Shape>(|s| &s.shape),
        )
        .build()
        .unwrap();
    assert_eq!(view_only.to_element(&square()).unwrap(), Element::from("shape:4"));
    let err = view_only
        .to_object::<Square>(&Element::from("shape:4"))
        .unwrap_err();
    assert!(matches!(err, Error::TypeConversion { .. }));

    let liftable = Binder::builder()
        .with_registry(
            RegistryBuilder::default()
                .register(ShapeProcessor)
                .extends_with_lift::<Square, Shape>(|s| &s.shape, |shape| Square { shape, length: 0.0 }),
        )
        .build()
        .unwrap();
    let read: Square = liftable.to_object(&Element::from("shape:6")).unwrap();
    assert_eq!(read.shape.sides, 6);
}

#[test]
fn test_schema_parent_with_processor() {
    // The schema edge alone makes the parent's processor apply to the child.
    let binder = Binder::builder()
        .register(ShapeProcessor)
        .schema(
            Schema::<Square>::new()
                .extends(|s| &s.shape, |s| &mut s.shape)
                .field("length", |s| &s.length, |s| &mut s.length),
        )
        .schema(Schema::<Shape>::new().field("sides", |s| &s.sides, |s| &mut s.sides))
        .build()
        .unwrap();
    assert_eq!(binder.to_element(&square()).unwrap(), Element::from("shape:4"));
}

struct BracedUuid;

impl TypeProcessor<Uuid> for BracedUuid {
    fn to_element(&self, value: Option<&Uuid>) -> Result<Element> {
        Ok(value.map_or_else(Element::null, |u| Element::from(u.braced().to_string())))
    }

    fn to_object(&self, element: &Element) -> Result<Option<Uuid>> {
        if element.is_null() {
            return Ok(None);
        }
        let text = element.as_str()?;
        Uuid::parse_str(text)
            .map(Some)
            .map_err(|_| Error::conversion("Uuid", "braced UUID", text))
    }
}

#[test]
fn test_custom_processor_replaces_default() {
    let binder = Binder::builder().register(BracedUuid).build().unwrap();
    let element = binder.to_element(&Uuid::nil()).unwrap();
    assert_eq!(element, Element::from("{00000000-0000-0000-0000-000000000000}"));
    assert_eq!(binder.to_object::<Uuid>(&element).unwrap(), Uuid::nil());
}

#[test]
fn test_defaults_can_be_disabled() {
    let binder = Binder::builder()
        .with_registry(RegistryBuilder::default().without_defaults())
        .build()
        .unwrap();
    let err = binder.to_element(&Uuid::nil()).unwrap_err();
    assert!(matches!(err, Error::UnknownType { .. }));
}

#[test]
fn test_processor_options_reach_defaults() {
    let binder = Binder::builder()
        .with_registry(RegistryBuilder::new(
            ProcessorOptions::new().with_uuid_mode(UuidMode::LongArray),
        ))
        .build()
        .unwrap();
    let element = binder.to_element(&Uuid::nil()).unwrap();
    assert_eq!(element, element!([0i64, 0i64]));
}

#[derive(Debug, Default)]
struct Node {
    label: String,
    next: Option<Rc<RefCell<Node>>>,
}

impl Bind for Node {}

fn node_binder() -> Binder {
    Binder::builder()
        .schema(
            Schema::<Node>::new()
                .field("label", |n| &n.label, |n| &mut n.label)
                .field("next", |n| &n.next, |n| &mut n.next),
        )
        .build()
        .unwrap()
}

#[test]
fn test_cycles_are_detected() {
    let binder = node_binder();
    let first = Rc::new(RefCell::new(Node {
        label: "first".to_string(),
        next: None,
    }));
    let second = Rc::new(RefCell::new(Node {
        label: "second".to_string(),
        next: Some(Rc::clone(&first)),
    }));
    first.borrow_mut().next = Some(Rc::clone(&second));

    let err = binder.to_element(&first).unwrap_err();
    assert!(matches!(err.root(), Error::CycleDetected { .. }));
    assert_eq!(err.field_path(), vec!["next", "next"]);

    first.borrow_mut().next = None;
}

#[test]
fn test_shared_values_are_not_cycles() {
    let binder = node_binder();
    let shared = Rc::new(RefCell::new(Node {
        label: "leaf".to_string(),
        next: None,
    }));
    let element = binder.to_element(&vec![Rc::clone(&shared), shared]).unwrap();
    assert_eq!(element, element!([{"label": "leaf", "next": null}, {"label": "leaf", "next": null}]));
}

#[derive(Debug, Default, PartialEq)]
struct Cell {
    value: i32,
}

impl Bind for Cell {}

#[test]
fn test_enclosed_types_need_unsafe_opt_in() {
    let schema = || {
        Schema::<Cell>::enclosed("Table", Cell::default).field("value", |c| &c.value, |c| &mut c.value)
    };

    let guarded = Binder::builder().schema(schema()).build().unwrap();
    let err = guarded.to_object::<Cell>(&element!({"value": 1})).unwrap_err();
    assert!(matches!(err, Error::Uninitializable { .. }));
    assert_eq!(guarded.to_element(&Cell { value: 1 }).unwrap(), element!({"value": 1}));

    let relaxed = Binder::builder()
        .with_options(BinderOptions::new().with_unsafe_initialization(true))
        .schema(schema())
        .build()
        .unwrap();
    assert_eq!(relaxed.to_object::<Cell>(&element!({"value": 1})).unwrap(), Cell { value: 1 });
}

#[test]
fn test_unconstructible_types_are_write_only() {
    let binder = Binder::builder()
        .schema(Schema::<Cell>::unconstructible().field("value", |c| &c.value, |c| &mut c.value))
        .build()
        .unwrap();
    assert!(binder.to_element(&Cell { value: 2 }).is_ok());
    assert!(matches!(
        binder.to_object::<Cell>(&element!({"value": 2})).unwrap_err(),
        Error::Uninitializable { .. }
    ));
}

#[test]
fn test_ignore_nulls_drops_collection_items() {
    let binder = Binder::builder()
        .with_options(BinderOptions::new().with_ignore_nulls(true))
        .build()
        .unwrap();
    let element = binder.to_element(&vec![Some(1i32), None, Some(3)]).unwrap();
    assert_eq!(element, element!([1, 3]));
}

#[test]
fn test_missing_parent_schema_fails_build() {
    let err = Binder::builder()
        .schema(Schema::<Employee>::new().extends(|e| &e.entity, |e| &mut e.entity))
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::UnknownType { .. }));
}

#[derive(Debug, PartialEq)]
struct Draft {
    title: String,
    note: Option<String>,
    items: Vec<Option<i32>>,
}

impl Default for Draft {
    fn default() -> Self {
        Draft {
            title: "untitled".to_string(),
            note: Some("init".to_string()),
            items: Vec::new(),
        }
    }
}

impl Bind for Draft {}

fn draft_binder(options: BinderOptions) -> Binder {
    Binder::builder()
        .with_options(options)
        .schema(
            Schema::<Draft>::new()
                .field("title", |d| &d.title, |d| &mut d.title)
                .field("note", |d| &d.note, |d| &mut d.note)
                .field("items", |d| &d.items, |d| &mut d.items),
        )
        .build()
        .unwrap()
}

#[derive(Debug, Default)]
struct Memo {
    note: Option<String>,
}

impl Bind for Memo {}

#[test]
fn test_ignore_defaults_keeps_null_fields() {
    let binder = Binder::builder()
        .with_options(BinderOptions::new().with_ignore_defaults(true))
        .schema(Schema::<Memo>::new().field("note", |m| &m.note, |m| &mut m.note))
        .build()
        .unwrap();
    let element = binder.to_element(&Memo { note: None }).unwrap();
    assert_eq!(element, element!({"note": null}));
}

#[test]
fn test_ignore_nulls_keeps_initial_value_on_read() {
    let binder = draft_binder(BinderOptions::new().with_ignore_nulls(true));
    let read: Draft = binder
        .to_object(&element!({"note": null, "items": [1, null, 2]}))
        .unwrap();
    assert_eq!(read.note.as_deref(), Some("init"));
    assert_eq!(read.items, vec![Some(1), Some(2)]);

    let plain = draft_binder(BinderOptions::new());
    let read: Draft = plain
        .to_object(&element!({"note": null, "items": [1, null, 2]}))
        .unwrap();
    assert_eq!(read.note, None);
    assert_eq!(read.items, vec![Some(1), None, Some(2)]);
}

#[test]
fn test_ignore_empty_objects_keeps_initial_value_on_read() {
    let binder = draft_binder(BinderOptions::new().with_ignore_empty_objects(true));
    let read: Draft = binder
        .to_object(&element!({"title": "t", "items": []}))
        .unwrap();
    assert_eq!(read.title, "t");
    assert!(read.items.is_empty());
    assert_eq!(read.note.as_deref(), Some("init"));
}
