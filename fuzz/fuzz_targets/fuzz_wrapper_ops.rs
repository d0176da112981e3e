#![no_main]

use arbitrary::Arbitrary;
use formsync::reactive::Observable;
use formsync::ModelWrapper;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Clone, Debug, Default, PartialEq)]
struct Person {
    name: String,
    age: u16,
    tags: Vec<u8>,
}

#[derive(Arbitrary, Debug)]
enum Op {
    SetName(String),
    SetAge(u16),
    PushTag(u8),
    RemoveTag(u8),
    Commit,
    Reload,
    Reset,
    AdoptDefaults,
    Swap(Option<Person>),
    SetManually(Option<Person>),
}

fuzz_target!(|input: (Option<Person>, Vec<Op>)| {
    let (initial, ops) = input;
    let source = Observable::new(initial);
    let wrapper: ModelWrapper<Person> = ModelWrapper::from_source(&source);
    let Ok(name) = wrapper
        .field(|p: &Person| p.name.clone(), |p: &mut Person, v| p.name = v)
        .key("name")
        .build()
    else {
        return;
    };
    let Ok(age) = wrapper
        .immutable_field(|p: &Person| p.age, |p: &Person, age| Person { age, ..p.clone() })
        .key("age")
        .default_value(18)
        .build()
    else {
        return;
    };
    let Ok(tags) = wrapper
        .field(|p: &Person| p.tags.clone(), |p: &mut Person, v| p.tags = v)
        .key("tags")
        .build_list()
    else {
        return;
    };

    for op in ops.into_iter().take(256) {
        match op {
            Op::SetName(value) => name.set_value(value),
            Op::SetAge(value) => age.set_value(value),
            Op::PushTag(tag) => tags.push(tag),
            Op::RemoveTag(tag) => {
                tags.remove_item(&tag);
            }
            Op::Commit => {
                wrapper.commit();
                if wrapper.has_model() {
                    assert!(!wrapper.is_dirty());
                    assert!(!wrapper.is_different());
                    assert_eq!(source.get(), wrapper.get());
                }
            }
            Op::Reload => {
                wrapper.reload();
                if let Some(model) = wrapper.get() {
                    assert_eq!(name.value(), model.name);
                    assert_eq!(age.value(), model.age);
                    assert_eq!(tags.value(), model.tags);
                    assert!(!wrapper.is_dirty());
                }
            }
            Op::Reset => {
                wrapper.reset();
                assert_eq!(name.value(), name.default_value());
                assert_eq!(age.value(), age.default_value());
                assert_eq!(tags.value(), tags.default_value());
            }
            Op::AdoptDefaults => wrapper.use_current_values_as_defaults(),
            Op::Swap(next) => {
                let bound = next.clone();
                if source.set(next) {
                    if let Some(model) = bound {
                        assert_eq!(name.value(), model.name);
                        assert!(!wrapper.is_different());
                    }
                }
            }
            Op::SetManually(next) => wrapper.set(next),
        }
        assert_eq!(wrapper.field_count(), 3);
        if !wrapper.has_model() {
            assert!(!wrapper.is_different());
        }
    }
});
