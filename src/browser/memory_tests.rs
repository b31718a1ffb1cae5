//! Tests for `MemoryWindow`.

use super::*;
use std::cell::RefCell;

fn window() -> MemoryWindow {
    MemoryWindow::new("https://a.test/").unwrap()
}

fn record(window: &MemoryWindow, log: &Rc<RefCell<Vec<&'static str>>>) -> Vec<DetachFn> {
    NativeEvent::ALL
        .into_iter()
        .map(|event| {
            let log = Rc::clone(log);
            window.attach(event, Rc::new(move || log.borrow_mut().push(event.as_str())))
        })
        .collect()
}

mod construction {
    use super::*;

    #[test]
    fn rejects_relative_initial_url() {
        let result = MemoryWindow::new("/relative");

        assert!(matches!(result, Err(NavigationError::InvalidUrl { .. })));
    }

    #[test]
    fn starts_with_single_entry() {
        let window = window();

        assert_eq!(window.href(), "https://a.test/");
        assert_eq!(window.history_len(), 1);
        assert!(window.is_native(HistoryMethod::PushState));
        assert!(window.is_native(HistoryMethod::ReplaceState));
    }

    #[test]
    fn capabilities_can_be_removed() {
        let window = window().without_history().without_events();

        assert!(window.location().is_some());
        assert!(window.history().is_none());
        assert!(window.events().is_none());

        let no_location = MemoryWindow::new("https://a.test/")
            .unwrap()
            .without_location();
        assert!(no_location.location().is_none());
    }
}

mod history {
    use super::*;

    #[test]
    fn push_resolves_relative_urls() {
        let window = window();

        window.push("/b?x=1#top").unwrap();

        assert_eq!(window.href(), "https://a.test/b?x=1#top");
        assert_eq!(window.history_len(), 2);
    }

    #[test]
    fn push_truncates_forward_entries() {
        let window = window();
        window.push("/b").unwrap();
        window.push("/c").unwrap();
        window.back();

        window.push("/d").unwrap();

        assert_eq!(window.history_len(), 3);
        assert!(!window.forward());
    }

    #[test]
    fn replace_rewrites_current_entry() {
        let window = window();
        window.push("/b").unwrap();

        window.replace("/c").unwrap();

        assert_eq!(window.href(), "https://a.test/c");
        assert_eq!(window.history_len(), 2);
    }

    #[test]
    fn cross_origin_push_is_rejected() {
        let window = window();

        let result = window.push("https://other.test/");

        assert!(matches!(result, Err(NavigationError::SecurityError { .. })));
        assert_eq!(window.href(), "https://a.test/");
    }

    #[test]
    fn state_only_call_keeps_url() {
        let window = window();

        window
            .push_state(&HistoryCall::state_only(serde_json::json!({"n": 1})))
            .unwrap();

        assert_eq!(window.href(), "https://a.test/");
        assert_eq!(window.history_len(), 2);
        assert_eq!(window.current_state()["n"], 1);
    }

    #[test]
    fn history_methods_fire_no_events() {
        let window = window();
        let log = Rc::new(RefCell::new(Vec::new()));
        let _detach = record(&window, &log);

        window.push("/b").unwrap();
        window.replace("/c").unwrap();

        assert!(log.borrow().is_empty());
    }

    #[test]
    fn installed_method_is_used_for_dispatch() {
        let window = window();
        let calls = Rc::new(RefCell::new(Vec::new()));
        let original = window.method(HistoryMethod::PushState);
        let log = Rc::clone(&calls);
        window.set_method(
            HistoryMethod::PushState,
            Rc::new(move |call: &HistoryCall| {
                log.borrow_mut().push(call.url.clone());
                original(call)
            }),
        );

        window.push("/wrapped").unwrap();

        assert_eq!(*calls.borrow(), vec![Some("/wrapped".to_string())]);
        assert_eq!(window.href(), "https://a.test/wrapped");
        assert!(!window.is_native(HistoryMethod::PushState));
    }
}

mod traversal {
    use super::*;

    #[test]
    fn back_and_forward_fire_popstate() {
        let window = window();
        window.push("/b").unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));
        let _detach = record(&window, &log);

        assert!(window.back());
        assert_eq!(window.href(), "https://a.test/");
        assert!(window.forward());
        assert_eq!(window.href(), "https://a.test/b");

        assert_eq!(*log.borrow(), vec!["popstate", "popstate"]);
    }

    #[test]
    fn traversal_across_fragment_also_fires_hashchange() {
        let window = window();
        window.push("/#x").unwrap();
        window.push("/#y").unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));
        let _detach = record(&window, &log);

        window.back();

        assert_eq!(*log.borrow(), vec!["popstate", "hashchange"]);
    }

    #[test]
    fn out_of_range_traversal_does_nothing() {
        let window = window();
        let log = Rc::new(RefCell::new(Vec::new()));
        let _detach = record(&window, &log);

        assert!(!window.back());
        assert!(!window.forward());
        assert!(!window.go(0));
        assert!(log.borrow().is_empty());
    }
}

mod fragments {
    use super::*;

    #[test]
    fn set_hash_pushes_entry_and_fires_both_events() {
        let window = window();
        let log = Rc::new(RefCell::new(Vec::new()));
        let _detach = record(&window, &log);

        assert!(window.set_hash("#y"));

        assert_eq!(window.href(), "https://a.test/#y");
        assert_eq!(window.history_len(), 2);
        assert_eq!(*log.borrow(), vec!["popstate", "hashchange"]);
    }

    #[test]
    fn setting_same_hash_is_noop() {
        let window = window();
        window.set_hash("x");
        let log = Rc::new(RefCell::new(Vec::new()));
        let _detach = record(&window, &log);

        assert!(!window.set_hash("x"));
        assert!(log.borrow().is_empty());
    }
}

mod events {
    use super::*;

    #[test]
    fn detach_removes_exactly_that_handler() {
        let window = window();
        let log = Rc::new(RefCell::new(Vec::new()));
        let first = {
            let log = Rc::clone(&log);
            window.attach(
                NativeEvent::PopState,
                Rc::new(move || log.borrow_mut().push("first")),
            )
        };
        let _second = {
            let log = Rc::clone(&log);
            window.attach(
                NativeEvent::PopState,
                Rc::new(move || log.borrow_mut().push("second")),
            )
        };
        window.push("/b").unwrap();

        first();
        window.back();

        assert_eq!(*log.borrow(), vec!["second"]);
        assert_eq!(window.listener_count(NativeEvent::PopState), 1);
    }

    #[test]
    fn silent_assignment_fires_nothing() {
        let window = window();
        let log = Rc::new(RefCell::new(Vec::new()));
        let _detach = record(&window, &log);

        window.assign_silently("/elsewhere").unwrap();

        assert_eq!(window.href(), "https://a.test/elsewhere");
        assert!(log.borrow().is_empty());
    }
}
