use std::cell::{Cell, RefCell};
use std::rc::Rc;

use formsync::reactive::Observable;
use formsync::{Field, ListField, ModelWrapper, WrapperConfig, WrapperError};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// Shared-identity model: edits through the wrapper are visible to every
// holder of the same `Rc`.
#[derive(Debug, Default, PartialEq)]
struct Person {
    name: String,
    age: u32,
    nicknames: Vec<String>,
}

type SharedPerson = Rc<RefCell<Person>>;

fn horst() -> Person {
    Person {
        name: "horst".into(),
        age: 32,
        nicknames: vec!["captain".into()],
    }
}

struct PersonForm {
    wrapper: ModelWrapper<SharedPerson>,
    name: Field<SharedPerson, String>,
    age: Field<SharedPerson, u32>,
    nicknames: ListField<SharedPerson, String>,
}

fn person_form(wrapper: ModelWrapper<SharedPerson>) -> PersonForm {
    let name = wrapper
        .field(
            |p: &SharedPerson| p.borrow().name.clone(),
            |p: &mut SharedPerson, v| p.borrow_mut().name = v,
        )
        .key("name")
        .build()
        .unwrap();
    let age = wrapper
        .field(
            |p: &SharedPerson| p.borrow().age,
            |p: &mut SharedPerson, v| p.borrow_mut().age = v,
        )
        .key("age")
        .build()
        .unwrap();
    let nicknames = wrapper
        .field(
            |p: &SharedPerson| p.borrow().nicknames.clone(),
            |p: &mut SharedPerson, v| p.borrow_mut().nicknames = v,
        )
        .key("nicknames")
        .build_list()
        .unwrap();
    PersonForm {
        wrapper,
        name,
        age,
        nicknames,
    }
}

#[test]
fn shared_model_commit_scenario() {
    init_tracing();
    let person = Rc::new(RefCell::new(horst()));
    let form = person_form(ModelWrapper::with_model(Rc::clone(&person)));

    form.name.set_value("hugo".into());
    form.age.set_value(33);
    form.nicknames.push("player".into());

    assert!(form.wrapper.is_dirty());
    assert!(form.wrapper.is_different());
    assert_eq!(*person.borrow(), horst());

    form.wrapper.commit();
    assert_eq!(
        *person.borrow(),
        Person {
            name: "hugo".into(),
            age: 33,
            nicknames: vec!["captain".into(), "player".into()],
        }
    );
    assert!(!form.wrapper.is_dirty());
    assert!(!form.wrapper.is_different());
}

#[test]
fn reload_discards_edits() {
    let person = Rc::new(RefCell::new(horst()));
    let form = person_form(ModelWrapper::with_model(Rc::clone(&person)));

    form.name.set_value("hugo".into());
    form.nicknames.clear();
    form.wrapper.reload();

    assert_eq!(form.name.value(), "horst");
    assert_eq!(form.nicknames.value(), vec!["captain"]);
    assert!(!form.wrapper.is_dirty());
}

#[test]
fn reload_picks_up_external_edits() {
    let person = Rc::new(RefCell::new(horst()));
    let form = person_form(ModelWrapper::with_model(Rc::clone(&person)));

    person.borrow_mut().age = 40;
    form.wrapper.reload();
    assert_eq!(form.age.value(), 40);
    assert_eq!(form.age.committed_value(), 40);
}

#[test]
fn reset_uses_defaults_not_live_model() {
    let person = Rc::new(RefCell::new(horst()));
    let wrapper = ModelWrapper::with_model(Rc::clone(&person));
    let name = wrapper
        .field(
            |p: &SharedPerson| p.borrow().name.clone(),
            |p: &mut SharedPerson, v| p.borrow_mut().name = v,
        )
        .default_value("nobody".into())
        .build()
        .unwrap();
    let age = wrapper
        .field(
            |p: &SharedPerson| p.borrow().age,
            |p: &mut SharedPerson, v| p.borrow_mut().age = v,
        )
        .build()
        .unwrap();

    wrapper.reset();
    assert_eq!(name.value(), "nobody");
    assert_eq!(age.value(), 0);
    assert_eq!(person.borrow().name, "horst");
    assert!(wrapper.is_dirty());
    assert!(wrapper.is_different());
}

#[test]
fn current_values_become_defaults() {
    let person = Rc::new(RefCell::new(horst()));
    let form = person_form(ModelWrapper::with_model(Rc::clone(&person)));

    form.name.set_value("default-name".into());
    form.wrapper.use_current_values_as_defaults();
    form.name.set_value("later".into());
    form.wrapper.commit();
    assert_eq!(person.borrow().name, "later");

    form.wrapper.reset();
    assert_eq!(form.name.value(), "default-name");
    assert_eq!(form.age.value(), 32);
    assert_eq!(form.nicknames.value(), vec!["captain"]);
}

#[test]
fn list_blind_spot_on_direct_mutation() {
    let person = Rc::new(RefCell::new(horst()));
    let form = person_form(ModelWrapper::with_model(Rc::clone(&person)));
    assert!(!form.wrapper.is_different());

    person.borrow_mut().nicknames.push("direct".into());
    assert!(
        !form.wrapper.is_different(),
        "direct mutation is not observed"
    );

    // Any field edit recomputes against the live object.
    form.age.set_value(33);
    form.age.set_value(32);
    assert!(form.wrapper.is_different());
    assert!(!form.wrapper.is_dirty());
}

#[test]
fn list_edits_through_accessor_are_seen() {
    let person = Rc::new(RefCell::new(horst()));
    let form = person_form(ModelWrapper::with_model(Rc::clone(&person)));

    form.nicknames.push("player".into());
    assert!(form.wrapper.is_different());
    assert!(form.nicknames.remove_item(&"player".to_string()));
    assert!(!form.wrapper.is_different());
    assert!(!form.wrapper.is_dirty());
}

#[test]
fn keyed_fields_are_shared_across_registrations() {
    let person = Rc::new(RefCell::new(horst()));
    let form = person_form(ModelWrapper::with_model(Rc::clone(&person)));
    let again = person_form(form.wrapper.clone());

    assert!(Field::ptr_eq(&form.name, &again.name));
    assert!(ListField::ptr_eq(&form.nicknames, &again.nicknames));
    assert_eq!(form.wrapper.field_count(), 3);

    let err = form
        .wrapper
        .field(
            |p: &SharedPerson| p.borrow().age as i64,
            |p: &mut SharedPerson, v: i64| p.borrow_mut().age = v as u32,
        )
        .key("age")
        .build()
        .unwrap_err();
    assert!(matches!(err, WrapperError::KeyTypeMismatch { .. }));
}

// Copy-on-write model: every write produces a new object.
#[derive(Clone, Debug, Default, PartialEq)]
struct Frozen {
    name: String,
    age: u32,
    nicknames: Vec<String>,
}

impl Frozen {
    fn with_name(&self, name: String) -> Self {
        Self {
            name,
            ..self.clone()
        }
    }

    fn with_age(&self, age: u32) -> Self {
        Self { age, ..self.clone() }
    }

    fn with_nicknames(&self, nicknames: Vec<String>) -> Self {
        Self {
            nicknames,
            ..self.clone()
        }
    }
}

fn frozen_horst() -> Frozen {
    Frozen {
        name: "horst".into(),
        age: 32,
        nicknames: vec!["captain".into()],
    }
}

#[test]
fn immutable_commit_scenario() {
    let original = frozen_horst();
    let wrapper = ModelWrapper::with_model(original.clone());
    let name = wrapper
        .immutable_field(|p: &Frozen| p.name.clone(), Frozen::with_name)
        .build()
        .unwrap();
    let age = wrapper
        .immutable_field(|p: &Frozen| p.age, Frozen::with_age)
        .build()
        .unwrap();
    let nicknames = wrapper
        .immutable_field(|p: &Frozen| p.nicknames.clone(), Frozen::with_nicknames)
        .build_list()
        .unwrap();
    assert!(name.is_immutable());

    name.set_value("hugo".into());
    age.set_value(33);
    nicknames.push("player".into());
    assert!(wrapper.is_dirty());
    assert_eq!(wrapper.get(), Some(frozen_horst()));

    wrapper.commit();
    assert_eq!(original, frozen_horst());
    assert_eq!(
        wrapper.get(),
        Some(Frozen {
            name: "hugo".into(),
            age: 33,
            nicknames: vec!["captain".into(), "player".into()],
        })
    );
    assert!(!wrapper.is_dirty());
    assert!(!wrapper.is_different());
}

#[test]
fn copy_values_to_other_object() {
    let wrapper = ModelWrapper::with_model(frozen_horst());
    let name = wrapper
        .immutable_field(|p: &Frozen| p.name.clone(), Frozen::with_name)
        .build()
        .unwrap();
    name.set_value("hugo".into());

    let copy = wrapper.copy_values_to(Frozen::default());
    assert_eq!(copy.name, "hugo");
    assert_eq!(copy.age, 0);
    assert_eq!(wrapper.get(), Some(frozen_horst()));
    assert_eq!(name.committed_value(), "horst");
}

#[test]
fn null_model_uses_defaults() {
    let wrapper: ModelWrapper<Frozen> = ModelWrapper::new();
    let name = wrapper
        .immutable_field(|p: &Frozen| p.name.clone(), Frozen::with_name)
        .default_value("empty".into())
        .build()
        .unwrap();
    let age = wrapper
        .immutable_field(|p: &Frozen| p.age, Frozen::with_age)
        .build()
        .unwrap();

    assert_eq!(name.value(), "empty");
    assert_eq!(age.value(), 0);
    wrapper.commit();
    wrapper.reload();
    assert!(!wrapper.has_model());
    assert!(!wrapper.is_different());

    // A later model does not change staged values until reload.
    wrapper.set(frozen_horst());
    assert_eq!(name.value(), "empty");
    assert!(wrapper.is_different());
    wrapper.reload();
    assert_eq!(name.value(), "horst");
    assert!(!wrapper.is_different());
}

#[test]
fn model_swap_through_source() {
    init_tracing();
    let luise = Frozen {
        name: "luise".into(),
        age: 23,
        nicknames: vec![],
    };
    let source = Observable::new(Some(frozen_horst()));
    let wrapper: ModelWrapper<Frozen> = ModelWrapper::from_source(&source);
    let name = wrapper
        .immutable_field(|p: &Frozen| p.name.clone(), Frozen::with_name)
        .build()
        .unwrap();
    let age = wrapper
        .immutable_field(|p: &Frozen| p.age, Frozen::with_age)
        .build()
        .unwrap();
    wrapper.use_current_values_as_defaults();

    name.set_value("edited".into());
    source.set(Some(luise.clone()));
    assert_eq!(name.value(), "luise");
    assert_eq!(age.value(), 23);
    assert!(!wrapper.is_dirty());

    wrapper.reset();
    assert_eq!(name.value(), "horst");
    assert_eq!(age.value(), 32);
    assert_eq!(wrapper.get(), Some(luise));
}

#[test]
fn manual_set_does_not_reload() {
    let wrapper = ModelWrapper::with_model(frozen_horst());
    let name = wrapper
        .immutable_field(|p: &Frozen| p.name.clone(), Frozen::with_name)
        .build()
        .unwrap();

    wrapper.set(Frozen::default());
    assert_eq!(name.value(), "horst");
    assert!(wrapper.is_different());
    assert!(!wrapper.is_dirty());
}

#[test]
fn config_label_and_flags() {
    let wrapper = ModelWrapper::with_config(
        Some(frozen_horst()),
        WrapperConfig::new().with_label("person-form"),
    );
    assert_eq!(wrapper.config().label.as_deref(), Some("person-form"));

    let saves = Rc::new(Cell::new(0));
    let s = Rc::clone(&saves);
    let _sub = wrapper.dirty_flag().subscribe(move |dirty| {
        if *dirty {
            s.set(s.get() + 1);
        }
    });

    let name = wrapper
        .immutable_field(|p: &Frozen| p.name.clone(), Frozen::with_name)
        .build()
        .unwrap();
    name.set_value("a".into());
    name.set_value("b".into());
    assert_eq!(saves.get(), 1, "flag only notifies when it flips");
    assert!(wrapper.different_flag().get());
}

// Model whose properties are observable cells.
#[derive(Clone)]
struct CellPerson {
    name: Observable<String>,
}

#[test]
fn property_field_mirrors_model_cell() {
    let person = CellPerson {
        name: Observable::new("horst".into()),
    };
    let wrapper = ModelWrapper::with_model(person.clone());
    let name = wrapper
        .property_field(|p: &CellPerson| p.name.clone())
        .build()
        .unwrap();

    person.name.set("luise".into());
    assert_eq!(name.value(), "luise");
    assert!(wrapper.is_dirty(), "mirror updates the staged value only");
    assert!(!wrapper.is_different());

    name.set_value("hugo".into());
    wrapper.commit();
    assert_eq!(person.name.get(), "hugo");
    assert!(!wrapper.is_dirty());
}

#[test]
fn property_mirror_follows_model_swap() {
    let first = CellPerson {
        name: Observable::new("horst".into()),
    };
    let second = CellPerson {
        name: Observable::new("luise".into()),
    };
    let wrapper = ModelWrapper::with_model(first.clone());
    let name = wrapper
        .property_field(|p: &CellPerson| p.name.clone())
        .build()
        .unwrap();

    wrapper.set(second.clone());
    first.name.set("ignored".into());
    assert_eq!(name.value(), "horst");
    second.name.set("tracked".into());
    assert_eq!(name.value(), "tracked");
    assert_eq!(first.name.subscriber_count(), 0);
}

#[test]
fn field_binds_to_input_observable() {
    let wrapper = ModelWrapper::with_model(frozen_horst());
    let name = wrapper
        .immutable_field(|p: &Frozen| p.name.clone(), Frozen::with_name)
        .build()
        .unwrap();
    let input = Observable::new(String::new());
    let _binding = name.bind_bidirectional(&input);

    assert_eq!(input.get(), "horst");
    input.set("typed".into());
    assert!(wrapper.is_dirty());
    wrapper.reload();
    assert_eq!(input.get(), "horst");
}
