//! Tests for `EventEmitter`.

use super::*;
use crate::emitter::CollectingSink;
use crate::id::SequentialIds;
use std::cell::{Cell, RefCell};

const EVENT: &str = "urlChanged";

fn emitter() -> (EventEmitter<String>, CollectingSink) {
    let sink = CollectingSink::new();
    let emitter = EventEmitter::with_parts(SequentialIds::new("sub"), Rc::new(sink.clone()));
    (emitter, sink)
}

fn recorder(
    log: &Rc<RefCell<Vec<String>>>,
    name: &'static str,
) -> impl Fn(&String) -> ListenerResult + 'static {
    let log = Rc::clone(log);
    move |payload: &String| {
        log.borrow_mut().push(format!("{name}:{payload}"));
        Ok(())
    }
}

mod on {
    use super::*;

    #[test]
    fn returns_distinct_ids() {
        let (emitter, _) = emitter();

        let a = emitter.on(EVENT, |_| Ok(()));
        let b = emitter.on(EVENT, |_| Ok(()));

        assert_eq!(a.as_str(), "sub-1");
        assert_eq!(b.as_str(), "sub-2");
        assert_eq!(emitter.listener_count(EVENT), 2);
    }

    #[test]
    fn events_are_independent() {
        let (emitter, _) = emitter();
        let log = Rc::new(RefCell::new(Vec::new()));
        emitter.on("a", recorder(&log, "first"));
        emitter.on("b", recorder(&log, "second"));

        emitter.emit("a", &"x".to_string());

        assert_eq!(*log.borrow(), vec!["first:x"]);
    }
}

mod emit {
    use super::*;

    #[test]
    fn dispatches_in_registration_order() {
        let (emitter, _) = emitter();
        let log = Rc::new(RefCell::new(Vec::new()));
        emitter.on(EVENT, recorder(&log, "a"));
        emitter.on(EVENT, recorder(&log, "b"));
        emitter.on(EVENT, recorder(&log, "c"));

        let delivered = emitter.emit(EVENT, &"p".to_string());

        assert_eq!(delivered, 3);
        assert_eq!(*log.borrow(), vec!["a:p", "b:p", "c:p"]);
    }

    #[test]
    fn event_without_listeners_delivers_nothing() {
        let (emitter, _) = emitter();

        assert_eq!(emitter.emit(EVENT, &"p".to_string()), 0);
    }

    #[test]
    fn failing_first_listener_does_not_stop_the_rest() {
        let (emitter, sink) = emitter();
        let log = Rc::new(RefCell::new(Vec::new()));
        emitter.on(EVENT, |_| Err("listener exploded".into()));
        emitter.on(EVENT, recorder(&log, "second"));
        emitter.on(EVENT, recorder(&log, "third"));

        let delivered = emitter.emit(EVENT, &"same".to_string());

        assert_eq!(delivered, 3);
        assert_eq!(*log.borrow(), vec!["second:same", "third:same"]);
        assert_eq!(sink.len(), 1);

        let error = &sink.errors()[0];
        assert_eq!(error.event, EVENT);
        assert_eq!(error.subscription.as_str(), "sub-1");
        assert_eq!(
            error.reason,
            ListenerFailure::Returned("listener exploded".to_string())
        );
    }

    #[test]
    fn panicking_listener_is_isolated() {
        let (emitter, sink) = emitter();
        let log = Rc::new(RefCell::new(Vec::new()));
        emitter.on(EVENT, |_| panic!("kaboom"));
        emitter.on(EVENT, recorder(&log, "after"));

        emitter.emit(EVENT, &"p".to_string());

        assert_eq!(*log.borrow(), vec!["after:p"]);
        assert_eq!(
            sink.errors()[0].reason,
            ListenerFailure::Panicked("kaboom".to_string())
        );
    }

    #[test]
    fn formatted_panic_message_is_captured() {
        let (emitter, sink) = emitter();
        emitter.on(EVENT, |p| panic!("bad payload {p}"));

        emitter.emit(EVENT, &"q".to_string());

        assert_eq!(
            sink.errors()[0].reason,
            ListenerFailure::Panicked("bad payload q".to_string())
        );
    }
}

mod off {
    use super::*;

    #[test]
    fn removes_exactly_one_listener() {
        let (emitter, _) = emitter();
        let log = Rc::new(RefCell::new(Vec::new()));
        emitter.on(EVENT, recorder(&log, "keep"));
        let removed = emitter.on(EVENT, recorder(&log, "gone"));

        assert!(emitter.off(&removed));
        emitter.emit(EVENT, &"p".to_string());

        assert_eq!(*log.borrow(), vec!["keep:p"]);
    }

    #[test]
    fn unknown_id_returns_false() {
        let (emitter, _) = emitter();

        assert!(!emitter.off(&SubscriptionId::from("nope")));
    }

    #[test]
    fn second_off_returns_false() {
        let (emitter, _) = emitter();
        let id = emitter.on(EVENT, |_| Ok(()));

        assert!(emitter.off(&id));
        assert!(!emitter.off(&id));
        assert_eq!(emitter.listener_count(EVENT), 0);
    }

    #[test]
    fn listener_removing_itself_gets_no_further_events() {
        let emitter = Rc::new(EventEmitter::<String>::new());
        let calls = Rc::new(Cell::new(0));
        let own_id: Rc<RefCell<Option<SubscriptionId>>> = Rc::new(RefCell::new(None));

        let id = {
            let weak = Rc::downgrade(&emitter);
            let calls = Rc::clone(&calls);
            let own_id = Rc::clone(&own_id);
            emitter.on(EVENT, move |_| {
                calls.set(calls.get() + 1);
                if let (Some(emitter), Some(id)) = (weak.upgrade(), own_id.borrow().as_ref()) {
                    emitter.off(id);
                }
                Ok(())
            })
        };
        *own_id.borrow_mut() = Some(id);

        emitter.emit(EVENT, &"first".to_string());
        emitter.emit(EVENT, &"second".to_string());

        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn removal_during_dispatch_applies_to_next_emit() {
        let emitter = Rc::new(EventEmitter::<String>::new());
        let log = Rc::new(RefCell::new(Vec::new()));
        let victim: Rc<RefCell<Option<SubscriptionId>>> = Rc::new(RefCell::new(None));

        {
            let weak = Rc::downgrade(&emitter);
            let victim = Rc::clone(&victim);
            emitter.on(EVENT, move |_| {
                if let (Some(emitter), Some(id)) = (weak.upgrade(), victim.borrow().as_ref()) {
                    emitter.off(id);
                }
                Ok(())
            });
        }
        let id = emitter.on(EVENT, recorder(&log, "victim"));
        *victim.borrow_mut() = Some(id);

        emitter.emit(EVENT, &"1".to_string());
        emitter.emit(EVENT, &"2".to_string());

        assert_eq!(*log.borrow(), vec!["victim:1"]);
    }

    #[test]
    fn listener_added_during_dispatch_waits_for_next_emit() {
        let emitter = Rc::new(EventEmitter::<String>::new());
        let log = Rc::new(RefCell::new(Vec::new()));

        {
            let weak = Rc::downgrade(&emitter);
            let log = Rc::clone(&log);
            let added = Cell::new(false);
            emitter.on(EVENT, move |_| {
                if !added.replace(true) {
                    if let Some(emitter) = weak.upgrade() {
                        emitter.on(EVENT, recorder(&log, "late"));
                    }
                }
                Ok(())
            });
        }

        emitter.emit(EVENT, &"1".to_string());
        emitter.emit(EVENT, &"2".to_string());

        assert_eq!(*log.borrow(), vec!["late:2"]);
    }
}

mod dispose {
    use super::*;

    #[test]
    fn clears_listeners_and_silences_emit() {
        let (emitter, _) = emitter();
        let log = Rc::new(RefCell::new(Vec::new()));
        emitter.on(EVENT, recorder(&log, "a"));

        emitter.dispose();

        assert!(emitter.is_disposed());
        assert_eq!(emitter.listener_count(EVENT), 0);
        assert_eq!(emitter.emit(EVENT, &"p".to_string()), 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn listeners_added_after_dispose_never_fire() {
        let (emitter, _) = emitter();
        let log = Rc::new(RefCell::new(Vec::new()));
        emitter.dispose();

        emitter.on(EVENT, recorder(&log, "a"));
        emitter.emit(EVENT, &"p".to_string());

        assert!(log.borrow().is_empty());
    }
}

#[test]
fn debug_shows_listener_counts() {
    let (emitter, _) = emitter();
    emitter.on(EVENT, |_| Ok(()));

    let debug = format!("{emitter:?}");

    assert!(debug.contains("EventEmitter"));
    assert!(debug.contains(EVENT));
}
